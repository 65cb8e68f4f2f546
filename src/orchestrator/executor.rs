#![forbid(unsafe_code)]

//! Per-file pipeline (§4.1 steps 2-7, C12): language detection through
//! suppression filtering for exactly one file.
//!
//! Grounded on the teacher's `executor.rs` for the overall "one function per
//! file, `flat_map` over the file list" shape, but without its
//! rule-downcasting workaround — `Rule::runs_without_parse` and
//! `FileContext.parsed` already tell the executor everything it needs about
//! a rule without inspecting its concrete type.

use crate::config::ConfigView;
use crate::hash::ContentHash;
use crate::languages::detect_language;
use crate::parsing::ParseCache;
use crate::rules::registry::RuleRegistry;
use crate::rules::FileContext;
use crate::suppression::FileSuppressions;
use crate::types::{Language, RuleId, Severity};
use crate::violation::{build_violation, Violation};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

static RULE_CRASHED_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("rule.crashed").expect("static rule id is valid"));
static TIMEOUT_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("fatal.file-timeout").expect("static rule id is valid"));
static UNREADABLE_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("fatal.file-unreadable").expect("static rule id is valid"));

/// The result of running the per-file pipeline once: the violations that
/// survived suppression, and the suppression set itself (kept so the
/// cross-file finaliser can run [`FileSuppressions::orphaned_violations`]
/// after every file has been processed, per §4.1).
pub struct FileResult {
    pub violations: Vec<Violation>,
    pub suppressions: FileSuppressions,
}

/// Runs §4.1 steps 2-7 for one already-admitted file.
pub fn process_file(
    registry: &RuleRegistry,
    config: &ConfigView,
    parse_cache: &ParseCache,
    canonical_path: &Path,
    relative_path: &Path,
) -> FileResult {
    let bytes = match std::fs::read(canonical_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let suppressions =
                FileSuppressions::from_source(canonical_path.to_path_buf(), Language::Other, "", None, Vec::new(), false);
            return FileResult {
                violations: vec![build_violation(
                    &UNREADABLE_RULE_ID,
                    canonical_path,
                    1,
                    0,
                    format!("could not read file: {e}"),
                    None,
                    Severity::Warning,
                )],
                suppressions,
            };
        }
    };
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let content_hash = ContentHash::of_bytes(text.as_bytes());

    let first_line = text.lines().next();
    let language = detect_language(relative_path, first_line, config.language_overrides());

    let (directory_rule_ids, suppress_all) = config.directory_suppressions(relative_path);

    if language == Language::Other {
        let suppressions = FileSuppressions::from_source(
            canonical_path.to_path_buf(),
            language,
            &text,
            None,
            directory_rule_ids,
            suppress_all,
        );
        return FileResult { violations: Vec::new(), suppressions };
    }

    let outcome = parse_cache.get_or_parse(&content_hash, language, &text);
    let parsed: Option<&crate::parsing::ParsedTree> = outcome.as_ref().as_ref().ok();
    let markdown_doc = parsed.and_then(|p| p.as_markdown());

    let suppressions = FileSuppressions::from_source(
        canonical_path.to_path_buf(),
        language,
        &text,
        markdown_doc,
        directory_rule_ids.clone(),
        suppress_all,
    );

    let ctx = FileContext {
        canonical_path,
        relative_path,
        language,
        text: &text,
        content_hash: &content_hash,
        parsed,
    };

    let mut violations = Vec::new();
    for rule in registry.rules_for(language) {
        if ctx.parsed.is_none() && !rule.runs_without_parse() {
            continue;
        }
        let rule_id = rule.id();
        if directory_rule_ids.iter().any(|id| id.matches(&rule_id)) {
            continue;
        }
        let rule_config = config.for_rule(&rule_id, language);
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| rule.check(&ctx, &rule_config))) {
            Ok(found) => violations.extend(found),
            Err(_) => violations.push(build_violation(
                &RULE_CRASHED_ID,
                canonical_path,
                1,
                0,
                format!("rule '{rule_id}' panicked while checking this file"),
                None,
                Severity::Error,
            )),
        }
    }

    let violations = suppressions.filter(violations);
    FileResult { violations, suppressions }
}

/// Runs [`process_file`] on a detached, 'static thread and waits at most
/// `timeout` for it to finish (§5: "an upper timeout per file may be
/// configured"). Rust has no safe way to preempt a running thread, so a
/// timed-out file's worker keeps running to completion in the background;
/// its result is discarded and only the `fatal.file-timeout` diagnostic is
/// reported for that file.
pub fn process_file_with_timeout(
    registry: std::sync::Arc<RuleRegistry>,
    config: std::sync::Arc<ConfigView>,
    parse_cache: std::sync::Arc<ParseCache>,
    canonical_path: PathBuf,
    relative_path: PathBuf,
    timeout: Option<Duration>,
) -> FileResult {
    let Some(timeout) = timeout else {
        return process_file(&registry, &config, &parse_cache, &canonical_path, &relative_path);
    };

    let (tx, rx) = mpsc::channel();
    let path_for_thread = canonical_path.clone();
    let rel_for_thread = relative_path.clone();
    let config_for_thread = config.clone();
    std::thread::spawn(move || {
        let result = process_file(&registry, &config_for_thread, &parse_cache, &path_for_thread, &rel_for_thread);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => {
            let language = detect_language(&relative_path, None, config.language_overrides());
            let suppressions =
                FileSuppressions::from_source(canonical_path.clone(), language, "", None, Vec::new(), false);
            FileResult {
                violations: vec![build_violation(
                    &TIMEOUT_RULE_ID,
                    &canonical_path,
                    1,
                    0,
                    "file processing exceeded the configured per-file timeout",
                    None,
                    Severity::Warning,
                )],
                suppressions,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigView;
    use crate::rules::registry::RuleRegistry;

    #[test]
    fn empty_file_produces_no_violations() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.py");
        std::fs::write(&file, "").unwrap();
        let registry = RuleRegistry::with_builtin_rules(dir.path().join("cache")).unwrap();
        let cache = ParseCache::new();
        let config = ConfigView::empty();

        let result = process_file(&registry, &config, &cache, &file, Path::new("empty.py"));
        assert!(result.violations.is_empty());
    }

    #[test]
    fn unreadable_file_is_skipped_with_a_diagnostic_rather_than_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        // Never created: read fails, unlike an actually-empty file.
        let file = dir.path().join("vanished.py");
        let registry = RuleRegistry::with_builtin_rules(dir.path().join("cache")).unwrap();
        let cache = ParseCache::new();
        let config = ConfigView::empty();

        let result = process_file(&registry, &config, &cache, &file, Path::new("vanished.py"));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule_id.as_str(), "fatal.file-unreadable");
    }

    #[test]
    fn unrecognized_language_short_circuits_with_no_violations() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("readme.txt");
        std::fs::write(&file, "hello\n").unwrap();
        let registry = RuleRegistry::with_builtin_rules(dir.path().join("cache")).unwrap();
        let cache = ParseCache::new();
        let config = ConfigView::empty();

        let result = process_file(&registry, &config, &cache, &file, Path::new("readme.txt"));
        assert!(result.violations.is_empty());
    }

    #[test]
    fn configured_language_override_changes_which_rules_run() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("build_script");
        // No extension and no shebang: without the override this resolves to
        // `Other` and no rule ever sees it.
        let source = "def f():\n".to_string() + &"    if True:\n".repeat(8) + "        pass\n";
        std::fs::write(&file, &source).unwrap();

        let registry = RuleRegistry::with_builtin_rules(dir.path().join("cache")).unwrap();
        let cache = ParseCache::new();
        let config_json = serde_json::json!({
            "nesting.excessive-depth": { "max_depth": 2 },
            "language_overrides": { "build_script": "python" }
        });
        let raw: crate::config::schema::RawConfig = serde_json::from_value(config_json).unwrap();
        let config = ConfigView::from_raw(raw);

        let result = process_file(&registry, &config, &cache, &file, Path::new("build_script"));
        assert!(result.violations.iter().any(|v| v.rule_id.as_str() == "nesting.excessive-depth"));
    }

    #[test]
    fn directory_suppression_disables_a_rule_for_that_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("deep.py");
        let source = "def f():\n".to_string() + &"    if True:\n".repeat(8) + "        pass\n";
        std::fs::write(&file, &source).unwrap();

        let registry = RuleRegistry::with_builtin_rules(dir.path().join("cache")).unwrap();
        let cache = ParseCache::new();
        let config_json = serde_json::json!({
            "nesting.excessive-depth": { "max_depth": 2 },
            "directories": { "": { "disable": ["nesting.excessive-depth"] } }
        });
        let raw: crate::config::schema::RawConfig = serde_json::from_value(config_json).unwrap();
        let config = ConfigView::from_raw(raw);

        let result = process_file(&registry, &config, &cache, &file, Path::new("deep.py"));
        assert!(result.violations.iter().all(|v| v.rule_id.as_str() != "nesting.excessive-depth"));
    }
}
