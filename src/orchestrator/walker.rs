#![forbid(unsafe_code)]

//! Directory walking and per-file admission (§4.1 steps 1-3, C12).
//!
//! Grounded on the teacher's `file_walker.rs`: `ignore::WalkBuilder` for
//! traversal, `globset` for glob compilation. Two extra concerns this core
//! needs that the teacher's walker didn't: a project-wide ignore file
//! (`config::ignore_file`) and the size/symlink guardrails of §4.1.

use crate::types::RuleId;
use crate::violation::{build_violation, Violation};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::Gitignore;
use ignore::WalkBuilder;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Files larger than this are skipped with a `fatal.file-too-large`
/// diagnostic rather than read (§4.1).
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

static TOO_LARGE_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("fatal.file-too-large").expect("static rule id is valid"));
static UNREADABLE_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("fatal.file-unreadable").expect("static rule id is valid"));

/// A file admitted past the walker's filters, ready for language detection
/// and parsing.
pub struct DiscoveredFile {
    pub canonical_path: PathBuf,
    pub relative_path: PathBuf,
}

/// Either an admitted file or a fatal per-file diagnostic produced while
/// walking (over-size, unreadable symlink target, etc).
pub enum WalkEntry {
    File(DiscoveredFile),
    Diagnostic(Violation),
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().expect("empty globset always builds"))
}

/// Walks `roots` (files or directories) under `project_root`, applying the
/// project ignore globs and ignore file (§3's `PROJECT` scope — resolved here,
/// never inside `FileSuppressions`), and de-duplicating symlink aliases.
pub fn walk(
    roots: &[PathBuf],
    project_root: &Path,
    ignore_globs: &[String],
    ignore_file: Option<&Gitignore>,
) -> Vec<WalkEntry> {
    let project_globs = build_globset(ignore_globs);
    let seen_canonical: Mutex<HashSet<PathBuf>> = Mutex::new(HashSet::new());
    let mut out = Vec::new();

    for root in roots {
        if root.is_file() {
            admit(root, project_root, &project_globs, ignore_file, &seen_canonical, &mut out);
            continue;
        }

        let walker = WalkBuilder::new(root).hidden(false).git_ignore(true).build();
        for entry in walker.flatten() {
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            admit(entry.path(), project_root, &project_globs, ignore_file, &seen_canonical, &mut out);
        }
    }

    out
}

fn admit(
    path: &Path,
    project_root: &Path,
    project_globs: &GlobSet,
    ignore_file: Option<&Gitignore>,
    seen_canonical: &Mutex<HashSet<PathBuf>>,
    out: &mut Vec<WalkEntry>,
) {
    let relative = path.strip_prefix(project_root).unwrap_or(path).to_path_buf();

    if project_globs.is_match(&relative) || project_globs.is_match(path) {
        return;
    }
    if let Some(gi) = ignore_file {
        if gi.matched(path, false).is_ignore() {
            return;
        }
    }

    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    {
        let mut seen = seen_canonical.lock().expect("walker dedup lock poisoned");
        if !seen.insert(canonical.clone()) {
            return;
        }
    }

    match std::fs::metadata(&canonical) {
        Ok(meta) if meta.len() > MAX_FILE_BYTES => {
            out.push(WalkEntry::Diagnostic(build_violation(
                &TOO_LARGE_RULE_ID,
                &canonical,
                1,
                0,
                format!("file exceeds the {} byte size guardrail and was skipped", MAX_FILE_BYTES),
                None,
                crate::types::Severity::Warning,
            )));
        }
        Ok(_) => {
            out.push(WalkEntry::File(DiscoveredFile {
                canonical_path: canonical,
                relative_path: relative,
            }));
        }
        Err(e) => {
            out.push(WalkEntry::Diagnostic(build_violation(
                &UNREADABLE_RULE_ID,
                &canonical,
                1,
                0,
                format!("could not read file metadata: {e}"),
                None,
                crate::types::Severity::Warning,
            )));
        }
    }
}
