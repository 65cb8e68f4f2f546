//! Cross-file duplicate-code (DRY) detector (§4.7, C9 + C14).
//!
//! Unlike the other analysers, this rule ordinarily emits nothing from
//! `check` — it registers fingerprints into a shared [`DryAccumulator`] and
//! the violations come out of [`DryAccumulator::finalize`] once every file
//! has been processed (§2's control-flow note: "cross-file finalisation runs
//! ... after all files are processed"). The one exception is a corrupted
//! on-disk cache entry, which `check` surfaces immediately as an
//! `engine.cache-corrupted` diagnostic before falling back to recomputing the
//! fingerprints from scratch.

pub mod cache;
pub mod tokenizer;

use super::{FileContext, Rule};
use crate::types::{Language, RuleId, Severity};
use crate::violation::{build_violation, Violation};
use cache::{DryCache, StoredFingerprint};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DryConfig {
    pub min_tokens: usize,
    pub min_occurrences: usize,
    pub cache_dir: PathBuf,
}

impl Default for DryConfig {
    fn default() -> Self {
        Self {
            min_tokens: 8,
            min_occurrences: 2,
            cache_dir: PathBuf::from(".thailint-cache"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Location {
    file: PathBuf,
    start_line: u32,
    end_line: u32,
}

/// Owns the map `fingerprint → locations` (§3's DRY duplicate-cluster). Safe
/// for concurrent `add_file` from workers (§4.7's performance contract);
/// `finalize` is expected to run only after workers have joined.
pub struct DryAccumulator {
    clusters: DashMap<u64, HashSet<Location>>,
}

impl DryAccumulator {
    pub fn new() -> Self {
        Self {
            clusters: DashMap::new(),
        }
    }

    pub fn add_file(&self, file: &Path, fingerprints: &[StoredFingerprint]) {
        for fp in fingerprints {
            self.clusters.entry(fp.hash).or_default().insert(Location {
                file: file.to_path_buf(),
                start_line: fp.start_line,
                end_line: fp.end_line,
            });
        }
    }

    /// Emits one violation per `(file, logical-duplicate-cluster)` for every
    /// fingerprint with at least `min_occurrences` distinct locations (§4.7).
    ///
    /// A sliding k-gram window registers one fingerprint per overlapping
    /// window, so the same duplicated block within a single file shows up as
    /// several adjacent, overlapping `Location`s sharing a cluster. Reporting
    /// each of those separately would over-count: the spec requires one
    /// violation per `(file, span)` (§4.7's dedup rule). This merges them with
    /// a union-find pass: two locations are linked if they are exact
    /// fingerprint matches of each other (definitely the same duplicate), or
    /// if they sit in the same file with overlapping or adjacent line ranges
    /// (definitely the same sliding-window artefact). The resulting connected
    /// components are the logical duplicate clusters; within each, every
    /// file's member spans collapse into a single merged span.
    pub fn finalize(&self, min_occurrences: usize) -> Vec<Violation> {
        let min_occurrences = min_occurrences.max(1);

        let mut qualifying: Vec<(u64, Location)> = Vec::new();
        for entry in self.clusters.iter() {
            if entry.value().len() < min_occurrences {
                continue;
            }
            for loc in entry.value() {
                qualifying.push((*entry.key(), loc.clone()));
            }
        }
        if qualifying.is_empty() {
            return Vec::new();
        }

        let mut index_of: std::collections::HashMap<Location, usize> = std::collections::HashMap::new();
        for (_, loc) in &qualifying {
            let next = index_of.len();
            index_of.entry(loc.clone()).or_insert(next);
        }
        let mut parent: Vec<usize> = (0..index_of.len()).collect();

        let mut by_hash: std::collections::HashMap<u64, Vec<usize>> = std::collections::HashMap::new();
        for (hash, loc) in &qualifying {
            by_hash.entry(*hash).or_default().push(index_of[loc]);
        }
        for ids in by_hash.values() {
            for pair in ids.windows(2) {
                union(&mut parent, pair[0], pair[1]);
            }
        }

        let mut by_file: std::collections::HashMap<PathBuf, Vec<Location>> = std::collections::HashMap::new();
        for loc in index_of.keys() {
            by_file.entry(loc.file.clone()).or_default().push(loc.clone());
        }
        for locations in by_file.values_mut() {
            locations.sort_by_key(|l| l.start_line);
            for pair in locations.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.start_line <= b.end_line.saturating_add(1) && b.start_line <= a.end_line.saturating_add(1) {
                    union(&mut parent, index_of[a], index_of[b]);
                }
            }
        }

        let mut components: std::collections::HashMap<usize, std::collections::HashMap<PathBuf, (u32, u32)>> =
            std::collections::HashMap::new();
        for loc in index_of.keys() {
            let root = find(&mut parent, index_of[loc]);
            let span = components
                .entry(root)
                .or_default()
                .entry(loc.file.clone())
                .or_insert((loc.start_line, loc.end_line));
            span.0 = span.0.min(loc.start_line);
            span.1 = span.1.max(loc.end_line);
        }

        let mut violations = Vec::new();
        for spans in components.values() {
            let mut sorted: Vec<(&PathBuf, &(u32, u32))> = spans.iter().collect();
            sorted.sort_by(|a, b| (a.0, a.1 .0).cmp(&(b.0, b.1 .0)));

            for (idx, (file, (start, _end))) in sorted.iter().enumerate() {
                let siblings: Vec<String> = sorted
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != idx)
                    .map(|(_, (other_file, (other_start, _)))| format!("{}:{}", other_file.display(), other_start))
                    .collect();
                if siblings.is_empty() {
                    continue;
                }
                violations.push(build_violation(
                    &dry_rule_id(),
                    file,
                    *start,
                    1,
                    format!("duplicated code, also found at {}", siblings.join(", ")),
                    Some("extract the shared logic into a function".to_string()),
                    Severity::Error,
                ));
            }
        }
        violations
    }
}

fn find(parent: &mut [usize], x: usize) -> usize {
    if parent[x] != x {
        parent[x] = find(parent, parent[x]);
    }
    parent[x]
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra] = rb;
    }
}

impl Default for DryAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

static RULE_ID: Lazy<RuleId> = Lazy::new(|| RuleId::new("dry.duplicate-code").expect("static rule id is valid"));
static ENGINE_CACHE_CORRUPTED_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("engine.cache-corrupted").expect("static rule id is valid"));

fn dry_rule_id() -> RuleId {
    RULE_ID.clone()
}

/// The per-file half of the DRY pipeline. Owns `Arc` handles to the run's
/// shared accumulator and on-disk cache so it can live in the registry as an
/// ordinary `'static` rule object even though its state is per-run.
pub struct DryDuplicateRule {
    pub accumulator: Arc<DryAccumulator>,
    pub cache: Arc<DryCache>,
}

impl Rule for DryDuplicateRule {
    fn id(&self) -> RuleId {
        dry_rule_id()
    }

    fn languages(&self) -> &'static [Language] {
        &[
            Language::Python,
            Language::TypeScript,
            Language::JavaScript,
            Language::Bash,
            Language::Css,
        ]
    }

    fn check(&self, ctx: &FileContext, config: &serde_json::Value) -> Vec<Violation> {
        let Some(parsed) = ctx.parsed else {
            return Vec::new();
        };
        let cfg: DryConfig = serde_json::from_value(config.clone()).unwrap_or_default();

        let mut diagnostics = Vec::new();
        let recompute = || {
            let tokens = tokenizer::tokenize(parsed, ctx.text);
            tokenizer::fingerprints(&tokens, cfg.min_tokens)
                .into_iter()
                .map(|f| StoredFingerprint {
                    hash: f.hash,
                    start_line: f.start_line,
                    end_line: f.end_line,
                })
                .collect::<Vec<_>>()
        };

        let fingerprints = match self.cache.get(ctx.content_hash, ctx.language) {
            Ok(Some(cached)) => cached,
            Ok(None) => {
                let computed = recompute();
                let _ = self.cache.put(ctx.content_hash, ctx.language, computed.clone());
                computed
            }
            Err(e) => {
                diagnostics.push(build_violation(
                    &ENGINE_CACHE_CORRUPTED_ID,
                    ctx.canonical_path,
                    1,
                    0,
                    e.to_string(),
                    Some("delete the DRY cache directory and re-run".to_string()),
                    Severity::Error,
                ));
                let computed = recompute();
                let _ = self.cache.put(ctx.content_hash, ctx.language, computed.clone());
                computed
            }
        };

        self.accumulator.add_file(ctx.canonical_path, &fingerprints);
        diagnostics
    }
}
