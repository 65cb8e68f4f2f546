//! Error taxonomy for the engine, following §7.
//!
//! Four kinds of failure, each with its own enum, plus a top-level error that
//! wraps all of them and carries the exit-code mapping from §6/§7. Resource and
//! rule failures that happen *during* a run are not represented here — they are
//! surfaced as ordinary `Violation`s under the `fatal.*` / `rule.*` namespaces so
//! output stays uniform (§7); this module covers failures that precede or
//! terminate a run outright.

use std::path::PathBuf;

/// User errors: bad configuration discovered at load time. Exit code 2.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration syntax in {path}: {message}")]
    InvalidSyntax { path: PathBuf, message: String },

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("invalid regex pattern for rule '{rule_id}': {message}")]
    InvalidRegex { rule_id: String, message: String },

    #[error("duplicate rule id '{0}' at startup")]
    DuplicateRuleId(String),

    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Rule-definition errors: malformed rule wiring discovered at registry build time.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid rule definition: {0}")]
    InvalidDefinition(String),

    #[error("rule not found: {0}")]
    NotFound(String),
}

/// Engine errors: cache corruption, worker-pool failure. Exit code 2.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("DRY cache corrupted at {path}: {message}")]
    CacheCorrupted { path: PathBuf, message: String },

    #[error("worker pool failed to initialize: {0}")]
    WorkerPool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for the engine's public API.
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("path not found or unreadable: {0}")]
    PathUnreadable(PathBuf),
}

impl LintError {
    /// The exit code a CLI caller should use for this error, per §6.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// The exit-code contract for a completed (non-erroring) run (§6/§7/§8's
/// "exit-code correspondence"): 0 if the reported list carries no
/// violations at all; 2 if any `engine.*` diagnostic fired during the run;
/// otherwise 1. Checked in this order since an engine-level failure takes
/// priority over ordinary rule violations.
pub fn exit_code_for(violations: &[crate::violation::Violation]) -> i32 {
    if violations.is_empty() {
        return 0;
    }
    if violations.iter().any(|v| v.rule_id.as_str().starts_with("engine.")) {
        return 2;
    }
    1
}
