#![forbid(unsafe_code)]

//! The orchestrator (§4.1, C12): walks paths, runs the per-file pipeline
//! (optionally in parallel via `rayon`, grounded on the teacher's
//! `executor.rs`), then runs cross-file finalisation (DRY clustering,
//! orphan-suppression detection) before handing back a sorted, deduplicated
//! violation list.

pub mod aggregator;
pub mod executor;
pub mod walker;

use crate::config::ConfigView;
use crate::error::LintError;
use crate::parsing::ParseCache;
use crate::rules::dry::DryConfig;
use crate::rules::registry::RuleRegistry;
use crate::suppression::FileSuppressions;
use crate::types::{Language, RuleId};
use crate::violation::Violation;
use aggregator::Aggregator;
use ignore::gitignore::Gitignore;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use walker::WalkEntry;

static DRY_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("dry.duplicate-code").expect("static rule id is valid"));

/// Name of the project ignore file consulted alongside the configured
/// `ignore:` globs (§6).
const IGNORE_FILE_NAME: &str = ".thailintignore";

/// The built engine (§6's `build_engine(ConfigView) -> Engine`). Owns the
/// rule registry, the resolved configuration, the project root, and the
/// run-scoped parse cache.
pub struct Engine {
    registry: Arc<RuleRegistry>,
    config: Arc<ConfigView>,
    project_root: PathBuf,
    ignore_file: Option<Gitignore>,
    timeout: Option<Duration>,
}

/// Builds an [`Engine`] from a loaded [`ConfigView`].
///
/// `project_root` is the directory the ignore file, directory-scoped
/// suppressions, and the DRY cache are resolved relative to; §6 only names
/// `ConfigView` as the input; a root is unavoidable in practice since the
/// core has to resolve relative paths against *something*.
pub fn build_engine(config: ConfigView, project_root: impl Into<PathBuf>) -> Result<Engine, LintError> {
    let project_root = project_root.into();
    let ignore_file = crate::config::ignore_file::load_ignore_file(&project_root, IGNORE_FILE_NAME)?;
    let registry = RuleRegistry::with_builtin_rules(project_root.join(".thailint-cache"))?;

    Ok(Engine {
        registry: Arc::new(registry),
        config: Arc::new(config),
        project_root,
        ignore_file,
        timeout: None,
    })
}

impl Engine {
    /// Sets a per-file timeout (§5). `None` (the default) means no timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `lint_path` (§4.1): lints one file or directory.
    pub fn lint_path(&self, path: impl AsRef<Path>, parallel: bool) -> Vec<Violation> {
        self.lint(&[path.as_ref().to_path_buf()], parallel)
    }

    /// `engine.lint(path_or_paths, parallel)` (§6): lints any number of
    /// files or directories, returning a sorted, deduplicated violation list
    /// covering all of them plus cross-file finalisation diagnostics.
    pub fn lint(&self, paths: &[PathBuf], parallel: bool) -> Vec<Violation> {
        let entries = walker::walk(
            paths,
            &self.project_root,
            self.config.ignore_globs(),
            self.ignore_file.as_ref(),
        );

        let aggregator = Aggregator::new();
        let suppressions: Mutex<Vec<FileSuppressions>> = Mutex::new(Vec::new());
        let parse_cache = Arc::new(ParseCache::new());

        let process = |entry: &WalkEntry| match entry {
            WalkEntry::Diagnostic(v) => aggregator.append(vec![v.clone()]),
            WalkEntry::File(file) => {
                let result = executor::process_file_with_timeout(
                    self.registry.clone(),
                    self.config.clone(),
                    parse_cache.clone(),
                    file.canonical_path.clone(),
                    file.relative_path.clone(),
                    self.timeout,
                );
                aggregator.append(result.violations);
                suppressions
                    .lock()
                    .expect("suppressions lock poisoned")
                    .push(result.suppressions);
            }
        };

        if parallel {
            entries.par_iter().for_each(process);
        } else {
            entries.iter().for_each(process);
        }

        // Cross-file finalisation (§4.1): DRY clustering, then orphan
        // detection — both run single-threaded after every file is done.
        let dry_config_value = self.config.for_rule(&DRY_RULE_ID, Language::Other);
        let dry_config: DryConfig = serde_json::from_value(dry_config_value).unwrap_or_default();
        aggregator.append(self.registry.dry_accumulator().finalize(dry_config.min_occurrences));

        for fs in suppressions.into_inner().expect("suppressions lock poisoned") {
            aggregator.append(fs.orphaned_violations());
        }

        aggregator.into_sorted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigView;
    use std::fs;

    #[test]
    fn empty_project_produces_no_violations() {
        let dir = tempfile::tempdir().unwrap();
        let engine = build_engine(ConfigView::empty(), dir.path()).unwrap();
        let violations = engine.lint_path(dir.path(), false);
        assert!(violations.is_empty());
    }

    #[test]
    fn sequential_and_parallel_runs_agree() {
        let dir = tempfile::tempdir().unwrap();
        let source = "def f():\n".to_string() + &"    if True:\n".repeat(6) + "        pass\n";
        fs::write(dir.path().join("a.py"), &source).unwrap();

        let config_json = serde_json::json!({ "nesting.excessive-depth": { "max_depth": 2 } });
        let raw: crate::config::schema::RawConfig = serde_json::from_value(config_json).unwrap();
        let config_seq = ConfigView::from_raw(raw.clone());
        let config_par = ConfigView::from_raw(raw);

        let engine_seq = build_engine(config_seq, dir.path()).unwrap();
        let engine_par = build_engine(config_par, dir.path()).unwrap();

        let seq = engine_seq.lint_path(dir.path(), false);
        let par = engine_par.lint_path(dir.path(), true);
        assert_eq!(seq, par);
        assert!(!seq.is_empty());
    }

    #[test]
    fn dry_violations_surface_after_finalisation() {
        let dir = tempfile::tempdir().unwrap();
        let duplicated = "def f():\n    total = compute(a, b, c, d, e, f, g, h)\n";
        fs::write(dir.path().join("a.py"), duplicated).unwrap();
        fs::write(dir.path().join("b.py"), duplicated).unwrap();

        let config_json = serde_json::json!({ "dry.duplicate-code": { "min_tokens": 4, "min_occurrences": 2 } });
        let raw: crate::config::schema::RawConfig = serde_json::from_value(config_json).unwrap();
        let engine = build_engine(ConfigView::from_raw(raw), dir.path()).unwrap();

        let violations = engine.lint_path(dir.path(), false);
        assert!(violations.iter().any(|v| v.rule_id.as_str() == "dry.duplicate-code"));
    }
}
