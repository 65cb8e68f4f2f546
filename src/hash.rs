#![forbid(unsafe_code)]

//! Hashing primitives shared by the parse cache (§4.2) and the DRY duplicate
//! detector (§4.7): a cryptographic content hash used as a cache key, and a
//! fast keyed hash used for k-gram fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A cryptographic hash of a file's raw bytes. Used as a cache key for both
/// the per-run parse cache and the durable DRY cache (§3: "content_hash is a
/// cryptographic hash of file bytes").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        ContentHash(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 64-bit fingerprint of a normalised k-gram (§4.7). `std::collections::hash_map::DefaultHasher`
/// is a SipHash-family hasher, matching the "fast keyed hash (e.g. 64-bit SipHash)"
/// the spec calls for without introducing a dedicated keyed-hash dependency
/// (see `junovhs-SlopChop/src/audit/fingerprint.rs` for the same precedent).
pub fn fingerprint_tokens<T: Hash>(tokens: &[T]) -> u64 {
    let mut hasher = DefaultHasher::new();
    tokens.len().hash(&mut hasher);
    for t in tokens {
        t.hash(&mut hasher);
    }
    hasher.finish()
}
