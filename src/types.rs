#![forbid(unsafe_code)]

//! Core domain types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the core can route files to. Closed set; anything else maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Bash,
    Markdown,
    Css,
    /// No rule is ever invoked for this tag.
    Other,
}

impl Language {
    /// All languages that rules may register against (excludes `Other`).
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::TypeScript,
        Language::JavaScript,
        Language::Bash,
        Language::Markdown,
        Language::Css,
    ];
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Bash => "bash",
            Language::Markdown => "markdown",
            Language::Css => "css",
            Language::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Violation severity. Closed set; no numeric priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

/// A validated, dotted rule identifier (e.g. `nesting.excessive-depth`).
///
/// Canonical form is lower-case; construction lower-cases the input so rule-id
/// comparisons elsewhere in the engine can be plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new RuleId, validating and lower-casing the input.
    ///
    /// Returns `None` if empty or containing characters other than
    /// alphanumerics, `-`, `_`, and `.` (the dotted-namespace separator).
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            return None;
        }
        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return None;
        }
        Some(RuleId(id.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `self` matches `other` by exact equality or by dotted-prefix
    /// (e.g. `nesting` matches `nesting.excessive-depth`), per §4.3.
    pub fn matches(&self, other: &RuleId) -> bool {
        if self.0 == other.0 {
            return true;
        }
        other
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RuleId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RuleId::new(value).ok_or_else(|| "invalid rule id".to_string())
    }
}

impl From<RuleId> for String {
    fn from(id: RuleId) -> Self {
        id.0
    }
}
