#![forbid(unsafe_code)]

//! `lintcore`: the orchestration, suppression, and rule-analysis engine
//! behind a multi-language static-analysis linter.
//!
//! This crate is the core library only. The CLI front-end, configuration
//! file I/O glue, output formatters (human text / JSON / SARIF), and
//! packaging are external collaborators that sit on top of the API
//! re-exported here: [`load_config`], [`build_engine`], and
//! [`Engine::lint`].

pub mod config;
pub mod error;
pub mod hash;
pub mod languages;
pub mod orchestrator;
pub mod parsing;
pub mod rules;
pub mod suppression;
pub mod types;
pub mod violation;

pub use config::{load_config, ConfigView};
pub use error::LintError;
pub use orchestrator::{build_engine, Engine};
pub use types::{Language, RuleId, Severity};
pub use violation::Violation;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn public_api_lints_a_small_project_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let config = ConfigView::empty();
        let engine = build_engine(config, dir.path()).unwrap();
        let violations = engine.lint_path(dir.path(), false);
        assert!(violations.is_empty());
    }
}
