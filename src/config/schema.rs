#![forbid(unsafe_code)]

//! On-disk configuration schema (§6, C6): YAML or JSON where top-level keys
//! are rule ids, plus two reserved keys (`ignore`, `directories`).

use serde::Deserialize;
use std::collections::HashMap;

/// The raw, mostly-untyped shape of a loaded configuration file. Per-rule
/// values stay as [`serde_json::Value`] since the schema for each rule id is
/// owned by that rule, not by this module (§3: "rules must not observe
/// config belonging to other rules", which cuts both ways — this loader must
/// not need to know every rule's schema either).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    /// Project-wide ignore globs (§3's `PROJECT` suppression scope; §4.1
    /// step 1 uses this to skip matching paths before they are read).
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Directory-prefix-scoped rule toggles (§3's `DIRECTORY` scope).
    #[serde(default)]
    pub directories: HashMap<String, DirectoryToggle>,

    /// Explicit per-path language overrides (§4.2: override beats extension
    /// beats shebang), keyed by project-root-relative path, valued by
    /// lower-case language name (`"python"`, `"typescript"`, ...).
    #[serde(default)]
    pub language_overrides: HashMap<String, String>,

    /// Everything else: `rule_id -> rule-specific config object`.
    #[serde(flatten)]
    pub rules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryToggle {
    /// Rule ids disabled for files under this directory prefix.
    #[serde(default)]
    pub disable: Vec<String>,
    /// Disables every rule for files under this directory prefix.
    #[serde(default)]
    pub disable_all: bool,
}

impl RawConfig {
    /// Catches malformed configuration at load time rather than letting it
    /// surface later as a silently-ignored pattern (§7: bad configuration is
    /// a "User error", exit code 2). Checked here: every `ignore` entry is a
    /// valid glob, and every `file-placement.disallowed` regex (both
    /// per-directory `allow`/`deny` and `global_deny`) compiles.
    ///
    /// Other rules' pattern-shaped fields are validated by the rule itself at
    /// check time (most already fail soft on a bad pattern per their own
    /// docs); this function only covers the one place spec §7's startup
    /// validation story names by example: file placement's regex fields.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        for pattern in &self.ignore {
            globset::Glob::new(pattern)
                .map_err(|e| crate::error::ConfigError::InvalidValue {
                    field: "ignore".to_string(),
                    message: format!("'{pattern}': {e}"),
                })?;
        }

        for name in self.language_overrides.values() {
            parse_language(name).ok_or_else(|| crate::error::ConfigError::InvalidValue {
                field: "language_overrides".to_string(),
                message: format!("'{name}' is not a recognised language"),
            })?;
        }

        let Some(placement) = self.rules.get("file-placement.disallowed") else {
            return Ok(());
        };
        let cfg: crate::rules::file_placement::FilePlacementConfig =
            serde_json::from_value(placement.clone()).map_err(|e| crate::error::ConfigError::InvalidValue {
                field: "file-placement.disallowed".to_string(),
                message: e.to_string(),
            })?;
        let check = |pattern: &str| {
            regex::Regex::new(pattern).map(|_| ()).map_err(|e| crate::error::ConfigError::InvalidRegex {
                rule_id: "file-placement.disallowed".to_string(),
                message: format!("'{pattern}': {e}"),
            })
        };
        for scope in cfg.directories.values() {
            for pattern in &scope.allow {
                check(pattern)?;
            }
            for deny in &scope.deny {
                check(&deny.pattern)?;
            }
        }
        for deny in &cfg.global_deny {
            check(&deny.pattern)?;
        }
        Ok(())
    }
}

/// Parses a lower-case language name the way the schema spells it
/// (`"python"`, `"typescript"`, ...) into a [`crate::types::Language`].
pub(crate) fn parse_language(name: &str) -> Option<crate::types::Language> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reserved_keys_and_leaves_rest_as_rule_configs() {
        let json = serde_json::json!({
            "ignore": ["**/vendor/**"],
            "directories": { "legacy/": { "disable": ["nesting.excessive-depth"] } },
            "nesting.excessive-depth": { "max_depth": 6 },
            "srp.too-many-responsibilities": { "max_methods": 10 }
        });
        let cfg: RawConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.ignore, vec!["**/vendor/**".to_string()]);
        assert!(cfg.directories.contains_key("legacy/"));
        assert_eq!(cfg.rules.len(), 2);
        assert!(cfg.rules.contains_key("nesting.excessive-depth"));
    }

    #[test]
    fn missing_reserved_keys_default_to_empty() {
        let json = serde_json::json!({ "nesting.excessive-depth": { "max_depth": 6 } });
        let cfg: RawConfig = serde_json::from_value(json).unwrap();
        assert!(cfg.ignore.is_empty());
        assert!(cfg.directories.is_empty());
    }

    #[test]
    fn valid_configuration_passes_validation() {
        let json = serde_json::json!({
            "ignore": ["**/vendor/**"],
            "file-placement.disallowed": {
                "directories": { "src/": { "allow": [r".*\.py$"], "deny": [{ "pattern": r".*test.*", "reason": "x" }] } },
                "global_deny": [{ "pattern": r".*\.tmp$", "reason": "y" }]
            }
        });
        let cfg: RawConfig = serde_json::from_value(json).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn malformed_ignore_glob_fails_validation() {
        let json = serde_json::json!({ "ignore": ["["] });
        let cfg: RawConfig = serde_json::from_value(json).unwrap();
        assert!(matches!(cfg.validate(), Err(crate::error::ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn unrecognised_language_override_fails_validation() {
        let json = serde_json::json!({ "language_overrides": { "scripts/build": "fortran" } });
        let cfg: RawConfig = serde_json::from_value(json).unwrap();
        assert!(matches!(cfg.validate(), Err(crate::error::ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn recognised_language_override_passes_validation() {
        let json = serde_json::json!({ "language_overrides": { "scripts/build": "bash" } });
        let cfg: RawConfig = serde_json::from_value(json).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn malformed_file_placement_regex_fails_validation() {
        let json = serde_json::json!({
            "file-placement.disallowed": { "global_deny": [{ "pattern": "(unterminated", "reason": "x" }] }
        });
        let cfg: RawConfig = serde_json::from_value(json).unwrap();
        assert!(matches!(cfg.validate(), Err(crate::error::ConfigError::InvalidRegex { .. })));
    }
}
