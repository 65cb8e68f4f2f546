//! Incremental on-disk DRY cache (§4.7, C14): `(content_hash, language) →
//! fingerprint list`, persisted across runs.

use crate::error::EngineError;
use crate::hash::ContentHash;
use crate::types::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFingerprint {
    pub hash: u64,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    schema_version: u32,
    language: Language,
    content_hash: ContentHash,
    fingerprints: Vec<StoredFingerprint>,
}

/// A directory of one file per `(content_hash, language)` pair (§6:
/// "Persisted state"). Safe to delete at any time; the next run rebuilds it.
pub struct DryCache {
    dir: PathBuf,
}

impl DryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, content_hash: &ContentHash, language: Language) -> PathBuf {
        self.dir.join(format!("{}-{language}.json", content_hash.as_str()))
    }

    /// A schema-version bump is a benign, expected miss (the cache format
    /// changed; the old entry is simply ignored). A file that fails to
    /// deserialize at all, or whose stored content hash doesn't match the
    /// hash encoded in its own filename, indicates the entry was corrupted
    /// on disk and is surfaced to the caller as an [`EngineError`] rather
    /// than silently treated as a miss (§7's "Engine errors").
    pub fn get(
        &self,
        content_hash: &ContentHash,
        language: Language,
    ) -> Result<Option<Vec<StoredFingerprint>>, EngineError> {
        let path = self.entry_path(content_hash, language);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return Ok(None),
        };
        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                return Err(EngineError::CacheCorrupted {
                    path,
                    message: format!("malformed cache entry: {e}"),
                })
            }
        };
        if entry.schema_version != SCHEMA_VERSION {
            return Ok(None);
        }
        if &entry.content_hash != content_hash {
            return Err(EngineError::CacheCorrupted {
                path,
                message: "stored content hash does not match the hash encoded in the cache filename".to_string(),
            });
        }
        Ok(Some(entry.fingerprints))
    }

    /// Writes via a temp-file-plus-rename so concurrent writers never observe
    /// a partial entry; since writers for the same key always have identical
    /// content (content hashes match), last-writer-wins is harmless (§5).
    pub fn put(
        &self,
        content_hash: &ContentHash,
        language: Language,
        fingerprints: Vec<StoredFingerprint>,
    ) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = CacheEntry {
            schema_version: SCHEMA_VERSION,
            language,
            content_hash: content_hash.clone(),
            fingerprints,
        };
        let bytes = serde_json::to_vec(&entry)?;
        let final_path = self.entry_path(content_hash, language);
        let tmp_path = self
            .dir
            .join(format!("{}-{language}.{}.tmp", content_hash.as_str(), std::process::id()));
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DryCache::new(dir.path());
        let hash = ContentHash::of_bytes(b"hello");
        let fps = vec![StoredFingerprint { hash: 42, start_line: 1, end_line: 1 }];

        assert!(cache.get(&hash, Language::Python).unwrap().is_none());
        cache.put(&hash, Language::Python, fps.clone()).unwrap();
        let reloaded = cache.get(&hash, Language::Python).unwrap().unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].hash, 42);
    }

    #[test]
    fn different_language_is_a_distinct_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DryCache::new(dir.path());
        let hash = ContentHash::of_bytes(b"hello");
        cache
            .put(&hash, Language::Python, vec![StoredFingerprint { hash: 1, start_line: 1, end_line: 1 }])
            .unwrap();
        assert!(cache.get(&hash, Language::JavaScript).unwrap().is_none());
    }

    #[test]
    fn malformed_entry_surfaces_as_an_engine_error_rather_than_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DryCache::new(dir.path());
        let hash = ContentHash::of_bytes(b"hello");
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(cache.entry_path(&hash, Language::Python), b"not json").unwrap();

        let err = cache.get(&hash, Language::Python).unwrap_err();
        assert!(matches!(err, EngineError::CacheCorrupted { .. }));
    }

    #[test]
    fn schema_version_bump_is_a_benign_miss_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DryCache::new(dir.path());
        let hash = ContentHash::of_bytes(b"hello");
        let stale = CacheEntry {
            schema_version: SCHEMA_VERSION + 1,
            language: Language::Python,
            content_hash: hash.clone(),
            fingerprints: vec![StoredFingerprint { hash: 1, start_line: 1, end_line: 1 }],
        };
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(cache.entry_path(&hash, Language::Python), serde_json::to_vec(&stale).unwrap()).unwrap();

        assert!(cache.get(&hash, Language::Python).unwrap().is_none());
    }

    #[test]
    fn content_hash_mismatch_surfaces_as_an_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DryCache::new(dir.path());
        let hash = ContentHash::of_bytes(b"hello");
        let other_hash = ContentHash::of_bytes(b"goodbye");
        let tampered = CacheEntry {
            schema_version: SCHEMA_VERSION,
            language: Language::Python,
            content_hash: other_hash,
            fingerprints: vec![StoredFingerprint { hash: 1, start_line: 1, end_line: 1 }],
        };
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(cache.entry_path(&hash, Language::Python), serde_json::to_vec(&tampered).unwrap()).unwrap();

        let err = cache.get(&hash, Language::Python).unwrap_err();
        assert!(matches!(err, EngineError::CacheCorrupted { .. }));
    }
}
