#![forbid(unsafe_code)]

//! The `Violation` record (§3) and its builder (§4.10, C16).

use crate::types::{RuleId, Severity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single, immutable problem report.
///
/// Two violations are equal iff every field is equal (§3); the engine, not
/// individual rules, is responsible for deduplicating these (see
/// `orchestrator::aggregator`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: RuleId,
    pub file_path: PathBuf,
    /// 1-based.
    pub line: u32,
    /// 1-based; 0 only permitted when the position is whole-line.
    pub column: u32,
    pub message: String,
    pub suggestion: Option<String>,
    pub severity: Severity,
}

/// Builds a `Violation`, enforcing the invariants of §4.10.
///
/// In debug builds, violated invariants panic (a rule author's bug should fail
/// loudly in development); in release builds they are corrected best-effort so a
/// misbehaving rule degrades gracefully instead of crashing a run.
pub fn build_violation(
    rule_id: &RuleId,
    file_path: &Path,
    line: u32,
    column: u32,
    message: impl Into<String>,
    suggestion: Option<String>,
    severity: Severity,
) -> Violation {
    let message = message.into();

    debug_assert!(line >= 1, "violation line must be 1-based, got {line}");
    debug_assert!(!message.is_empty(), "violation message must not be empty");
    debug_assert!(
        !message.ends_with('.'),
        "violation message must not end with a period: {message:?}"
    );
    if let Some(ref s) = suggestion {
        debug_assert!(!s.is_empty(), "suggestion must not be empty when present");
    }

    let line = line.max(1);
    let message = if message.is_empty() {
        "unspecified violation".to_string()
    } else {
        message.trim_end_matches('.').to_string()
    };
    let suggestion = suggestion.filter(|s| !s.is_empty());

    Violation {
        rule_id: rule_id.clone(),
        file_path: file_path.to_path_buf(),
        line,
        column,
        message,
        suggestion,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn builder_trims_trailing_period_and_clamps_line() {
        let rule_id = RuleId::new("nesting.excessive-depth").unwrap();
        let v = build_violation(
            &rule_id,
            Path::new("a.py"),
            0,
            1,
            "too deep.",
            None,
            Severity::Error,
        );
        assert_eq!(v.line, 1);
        assert_eq!(v.message, "too deep");
    }

    #[test]
    fn violations_with_same_fields_are_equal() {
        let rule_id = RuleId::new("x.y").unwrap();
        let a = build_violation(&rule_id, Path::new("a.py"), 1, 1, "m", None, Severity::Error);
        let b = build_violation(&rule_id, Path::new("a.py"), 1, 1, "m", None, Severity::Error);
        assert_eq!(a, b);
    }
}
