//! File-placement analyser (§4.8, C10): regex allow/deny keyed by directory
//! prefix. Path-only — runs even on files that failed to parse.

use super::{FileContext, Rule};
use crate::types::{Language, RuleId, Severity};
use crate::violation::build_violation;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DirectoryScope {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<DenyPattern>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DenyPattern {
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FilePlacementConfig {
    /// Directory prefix (relative to the project root) → scope.
    pub directories: HashMap<String, DirectoryScope>,
    pub global_deny: Vec<DenyPattern>,
}

static RULE_ID: Lazy<RuleId> = Lazy::new(|| RuleId::new("file-placement.disallowed").expect("static rule id is valid"));

pub struct FilePlacementRule;

impl Rule for FilePlacementRule {
    fn id(&self) -> RuleId {
        RULE_ID.clone()
    }

    fn languages(&self) -> &'static [Language] {
        &Language::ALL
    }

    fn runs_without_parse(&self) -> bool {
        true
    }

    fn check(&self, ctx: &FileContext, config: &serde_json::Value) -> Vec<crate::violation::Violation> {
        let cfg: FilePlacementConfig = serde_json::from_value(config.clone()).unwrap_or_default();
        let rel = ctx.relative_path.to_string_lossy().replace('\\', "/");

        let mut violations = Vec::new();

        if let Some(scope) = longest_matching_scope(&cfg.directories, &rel) {
            if !scope.allow.is_empty() {
                let allowed = scope
                    .allow
                    .iter()
                    .filter_map(|p| Regex::new(p).ok())
                    .any(|re| re.is_match(&rel));
                if !allowed {
                    violations.push(build_violation(
                        &self.id(),
                        ctx.canonical_path,
                        1,
                        0,
                        format!("'{rel}' does not match any allowed pattern for its directory"),
                        None,
                        Severity::Error,
                    ));
                }
            }
            for deny in &scope.deny {
                if Regex::new(&deny.pattern).is_ok_and(|re| re.is_match(&rel)) {
                    violations.push(build_violation(
                        &self.id(),
                        ctx.canonical_path,
                        1,
                        0,
                        deny.reason.clone(),
                        None,
                        Severity::Error,
                    ));
                }
            }
        }

        for deny in &cfg.global_deny {
            if Regex::new(&deny.pattern).is_ok_and(|re| re.is_match(&rel)) {
                violations.push(build_violation(
                    &self.id(),
                    ctx.canonical_path,
                    1,
                    0,
                    deny.reason.clone(),
                    None,
                    Severity::Error,
                ));
            }
        }

        violations
    }
}

/// Longest-prefix match among configured directory scopes (§4.8 step i).
fn longest_matching_scope<'a>(
    directories: &'a HashMap<String, DirectoryScope>,
    relative_path: &str,
) -> Option<&'a DirectoryScope> {
    directories
        .iter()
        .filter(|(prefix, _)| relative_path.starts_with(prefix.as_str()))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, scope)| scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ContentHash;
    use std::path::Path;

    fn check(relative: &str, config: serde_json::Value) -> Vec<crate::violation::Violation> {
        let hash = ContentHash::of_bytes(b"");
        let ctx = FileContext {
            canonical_path: Path::new(relative),
            relative_path: Path::new(relative),
            language: Language::Other,
            text: "",
            content_hash: &hash,
            parsed: None,
        };
        FilePlacementRule.check(&ctx, &config)
    }

    #[test]
    fn runs_without_parse_is_true() {
        assert!(FilePlacementRule.runs_without_parse());
    }

    #[test]
    fn allow_pattern_miss_is_a_violation() {
        let config = serde_json::json!({
            "directories": { "src/": { "allow": [r"^src/[a-z_]+\.py$"] } }
        });
        let violations = check("src/BadName.py", config);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn deny_takes_precedence_within_same_scope() {
        let config = serde_json::json!({
            "directories": {
                "src/": {
                    "allow": [r".*"],
                    "deny": [{ "pattern": r"_test\.py$", "reason": "tests belong under tests/" }]
                }
            }
        });
        let violations = check("src/foo_test.py", config);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "tests belong under tests/");
    }

    #[test]
    fn longest_prefix_wins() {
        let config = serde_json::json!({
            "directories": {
                "src/": { "deny": [{ "pattern": r".*\.tmp$", "reason": "no tmp files" }] },
                "src/generated/": { "allow": [r".*"] }
            }
        });
        let violations = check("src/generated/out.tmp", config);
        assert!(violations.is_empty(), "the more specific scope has no deny rule");
    }

    #[test]
    fn global_deny_applies_everywhere() {
        let config = serde_json::json!({
            "global_deny": [{ "pattern": r"\.bak$", "reason": "backup files should not be committed" }]
        });
        let violations = check("anywhere/file.bak", config);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn no_configured_scope_is_not_a_violation() {
        assert!(check("src/anything.py", serde_json::json!({})).is_empty());
    }
}
