#![forbid(unsafe_code)]

//! The five-level suppression engine (§4.3, C4 + C13).
//!
//! `PROJECT` (ignore glob) and `DIRECTORY` (directory-scoped rule toggle) are
//! resolved by the orchestrator and configuration view respectively, against
//! whole files, before a `FileSuppressions` is even built — they're passed in
//! here as `whole_file_rule_ids`/`suppress_all` rather than re-derived from
//! file bytes. `FILE_HEADER`, `BLOCK`, and `LINE` are recognised from the
//! file's own bytes by [`directive`] and [`header`].

pub mod directive;
pub mod header;

use crate::parsing::markdown::MarkdownDoc;
use crate::types::{Language, RuleId, Severity};
use crate::violation::{build_violation, Violation};
use directive::{scan_line_directives, DirectiveKind, RawDirective};
use header::{parse_header_suppressions, parse_markdown_header_suppressions, HeaderSuppression};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// The five scopes a `SuppressionDirective` may be declared at (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Project,
    Directory,
    FileHeader,
    Block,
    Line,
}

struct LineRange {
    start: u32,
    end: u32,
}

struct TrackedHeader {
    suppression: HeaderSuppression,
    used: AtomicBool,
}

/// All directives that bear on a single file, resolved once up front so the
/// per-violation check (`retain`) is a cheap linear scan.
pub struct FileSuppressions {
    file_path: PathBuf,
    ranged: Vec<(LineRange, Vec<RuleId>)>,
    header: Vec<TrackedHeader>,
    whole_file_rule_ids: Vec<RuleId>,
    suppress_all: bool,
}

impl FileSuppressions {
    /// Builds the suppression set for one file.
    ///
    /// `project_directory_rule_ids` and `suppress_all` carry the already-resolved
    /// PROJECT/DIRECTORY scopes in; they do not come from `content`.
    pub fn from_source(
        file_path: PathBuf,
        language: Language,
        content: &str,
        markdown_doc: Option<&MarkdownDoc>,
        project_directory_rule_ids: Vec<RuleId>,
        suppress_all: bool,
    ) -> Self {
        let total_lines = content.lines().count() as u32;
        let raw = scan_line_directives(language, content);
        let ranged = resolve_ranges(&raw, total_lines);

        let header_suppressions = match markdown_doc {
            Some(doc) => parse_markdown_header_suppressions(doc),
            None => parse_header_suppressions(language, content),
        };
        let header = header_suppressions
            .into_iter()
            .map(|suppression| TrackedHeader {
                suppression,
                used: AtomicBool::new(false),
            })
            .collect();

        Self {
            file_path,
            ranged,
            header,
            whole_file_rule_ids: project_directory_rule_ids,
            suppress_all,
        }
    }

    /// The filtering algorithm of §4.3: `true` if `v` survives (i.e. is NOT
    /// suppressed). Matching a header directive marks it used, which feeds
    /// [`Self::orphaned_violations`].
    pub fn retain(&self, v: &Violation) -> bool {
        if v.file_path != self.file_path {
            return true;
        }
        if self.suppress_all {
            return false;
        }
        if self
            .whole_file_rule_ids
            .iter()
            .any(|id| id.matches(&v.rule_id))
        {
            return false;
        }
        for (range, rule_ids) in &self.ranged {
            if v.line >= range.start
                && v.line <= range.end
                && (rule_ids.is_empty() || rule_ids.iter().any(|id| id.matches(&v.rule_id)))
            {
                return false;
            }
        }
        for tracked in &self.header {
            if tracked.suppression.rule_id.matches(&v.rule_id) {
                tracked.used.store(true, Ordering::Relaxed);
                return false;
            }
        }
        true
    }

    /// Filters a batch of violations for this file, returning only the
    /// survivors. Convenience wrapper around [`Self::retain`].
    pub fn filter(&self, violations: Vec<Violation>) -> Vec<Violation> {
        violations.into_iter().filter(|v| self.retain(v)).collect()
    }

    /// Orphan detection (§4.3's cross-file finaliser): every header directive
    /// never matched against a violation produces a `lazy-ignores.orphaned`
    /// violation pointing at its declaration line.
    pub fn orphaned_violations(&self) -> Vec<Violation> {
        self.header
            .iter()
            .filter(|t| !t.used.load(Ordering::Relaxed))
            .map(|t| {
                build_violation(
                    &orphan_rule_id(),
                    &self.file_path,
                    t.suppression.declared_line,
                    0,
                    format!(
                        "suppression for '{}' is declared but never suppressed a violation",
                        t.suppression.rule_id
                    ),
                    Some("remove the unused suppression or correct the rule id".to_string()),
                    Severity::Error,
                )
            })
            .collect()
    }
}

static ORPHAN_RULE_ID: Lazy<RuleId> =
    Lazy::new(|| RuleId::new("lazy-ignores.orphaned").expect("static rule id is valid"));

fn orphan_rule_id() -> RuleId {
    ORPHAN_RULE_ID.clone()
}

/// Pairs `ignore-start`/`ignore-end` into line ranges and turns bare `LINE`
/// directives into single-line ranges. An unterminated `ignore-start` runs to
/// the end of the file (lenient: a missing `ignore-end` is a user error the
/// orphan/placement rules will surface elsewhere, not a reason to ignore the
/// directive outright).
fn resolve_ranges(raw: &[RawDirective], total_lines: u32) -> Vec<(LineRange, Vec<RuleId>)> {
    let mut out = Vec::new();
    let mut open_start: Option<&RawDirective> = None;
    for d in raw {
        match d.kind {
            DirectiveKind::Line => {
                out.push((
                    LineRange {
                        start: d.line,
                        end: d.line,
                    },
                    d.rule_ids.clone(),
                ));
            }
            DirectiveKind::Start => {
                open_start = Some(d);
            }
            DirectiveKind::End => {
                if let Some(start) = open_start.take() {
                    let rule_ids = if start.rule_ids.is_empty() {
                        d.rule_ids.clone()
                    } else {
                        start.rule_ids.clone()
                    };
                    out.push((
                        LineRange {
                            start: start.line,
                            end: d.line,
                        },
                        rule_ids,
                    ));
                }
            }
        }
    }
    if let Some(start) = open_start {
        out.push((
            LineRange {
                start: start.line,
                end: total_lines.max(start.line),
            },
            start.rule_ids.clone(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::build_violation;
    use std::path::{Path, PathBuf};

    fn path() -> PathBuf {
        PathBuf::from("src/a.py")
    }

    fn v(rule: &str, line: u32) -> Violation {
        let rule_id = RuleId::new(rule).unwrap();
        build_violation(&rule_id, Path::new("src/a.py"), line, 1, "msg", None, Severity::Error)
    }

    #[test]
    fn line_directive_suppresses_same_line_only() {
        let content = "x = 1  # thailint: ignore[nesting]\ny = 2\n";
        let fs = FileSuppressions::from_source(
            path(),
            Language::Python,
            content,
            None,
            Vec::new(),
            false,
        );
        assert!(!fs.retain(&v("nesting.excessive-depth", 1)));
        assert!(fs.retain(&v("nesting.excessive-depth", 2)));
    }

    #[test]
    fn block_directive_suppresses_inclusive_range() {
        let content = "# thailint: ignore-start[nesting]\na()\nb()\n# thailint: ignore-end\nc()\n";
        let fs = FileSuppressions::from_source(
            path(),
            Language::Python,
            content,
            None,
            Vec::new(),
            false,
        );
        assert!(!fs.retain(&v("nesting.excessive-depth", 2)));
        assert!(!fs.retain(&v("nesting.excessive-depth", 4)));
        assert!(fs.retain(&v("nesting.excessive-depth", 5)));
    }

    #[test]
    fn empty_rule_list_suppresses_every_rule_on_scope() {
        let content = "x = 1  # thailint: ignore\n";
        let fs = FileSuppressions::from_source(
            path(),
            Language::Python,
            content,
            None,
            Vec::new(),
            false,
        );
        assert!(!fs.retain(&v("anything.not-yet-configured", 1)));
    }

    #[test]
    fn header_suppression_marks_used_and_applies_file_wide() {
        let content = "\"\"\"\nSuppressions:\n  srp.too-many-methods: legacy, TICKET-7\n\"\"\"\nclass Foo:\n    pass\n";
        let fs = FileSuppressions::from_source(
            path(),
            Language::Python,
            content,
            None,
            Vec::new(),
            false,
        );
        assert!(!fs.retain(&v("srp.too-many-methods", 200)));
        assert!(fs.orphaned_violations().is_empty());
    }

    #[test]
    fn unused_header_suppression_is_orphaned() {
        let content = "\"\"\"\nSuppressions:\n  srp.too-many-methods: legacy, TICKET-7\n\"\"\"\nclass Foo:\n    pass\n";
        let fs = FileSuppressions::from_source(
            path(),
            Language::Python,
            content,
            None,
            Vec::new(),
            false,
        );
        let orphans = fs.orphaned_violations();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].rule_id.as_str(), "lazy-ignores.orphaned");
    }

    #[test]
    fn file_and_line_suppression_do_not_double_suppress() {
        // Invariant (i): idempotent filtering regardless of how many matching
        // scopes apply — retain() simply returns false once.
        let content = "\"\"\"\nSuppressions:\n  nesting: whole file, TICKET-1\n\"\"\"\nx = 1  # thailint: ignore[nesting]\n";
        let fs = FileSuppressions::from_source(
            path(),
            Language::Python,
            content,
            None,
            Vec::new(),
            false,
        );
        assert!(!fs.retain(&v("nesting.excessive-depth", 4)));
    }

    #[test]
    fn project_scope_suppresses_whole_file_regardless_of_bytes() {
        let fs = FileSuppressions::from_source(
            path(),
            Language::Python,
            "x = 1\n",
            None,
            vec![RuleId::new("nesting").unwrap()],
            false,
        );
        assert!(!fs.retain(&v("nesting.excessive-depth", 1)));
    }
}
