#![forbid(unsafe_code)]

//! The resolved configuration view (§4.4, C6): rules read their own config
//! through `view.for_rule(rule_id, language)`, never touching another rule's
//! section.

use super::schema::{parse_language, DirectoryToggle, RawConfig};
use crate::types::{Language, RuleId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigView {
    rules: HashMap<String, serde_json::Value>,
    directories: HashMap<String, DirectoryToggle>,
    ignore_globs: Vec<String>,
    language_overrides: HashMap<PathBuf, Language>,
}

impl ConfigView {
    pub fn from_raw(raw: RawConfig) -> Self {
        let language_overrides = raw
            .language_overrides
            .iter()
            .filter_map(|(path, name)| parse_language(name).map(|lang| (PathBuf::from(path), lang)))
            .collect();
        Self {
            rules: raw.rules,
            directories: raw.directories,
            ignore_globs: raw.ignore,
            language_overrides,
        }
    }

    pub fn empty() -> Self {
        Self::from_raw(RawConfig::default())
    }

    /// The project-wide ignore globs (§3's `PROJECT` scope), merged by the
    /// caller with whatever the ignore file (§6) contributes.
    pub fn ignore_globs(&self) -> &[String] {
        &self.ignore_globs
    }

    /// Explicit per-path language overrides (§4.2), resolved and ready to
    /// hand to [`crate::languages::detect_language`].
    pub fn language_overrides(&self) -> &HashMap<PathBuf, Language> {
        &self.language_overrides
    }

    /// Resolves the effective configuration for `rule_id` under `language`:
    /// the rule's base object with any matching `<language>:` subsection's
    /// fields overlaid, and every language subsection stripped so it never
    /// reaches the rule as an unrecognised field (§6).
    pub fn for_rule(&self, rule_id: &RuleId, language: Language) -> serde_json::Value {
        let Some(base) = self.rules.get(rule_id.as_str()) else {
            return serde_json::Value::Null;
        };
        merge_language_override(base, language)
    }

    /// Union of `disable` rule ids, and whether `disable_all` is set, across
    /// every configured directory prefix of `relative_path` (§3's
    /// `DIRECTORY` scope; §4.1 step 6 resolves this before invoking rules).
    pub fn directory_suppressions(&self, relative_path: &Path) -> (Vec<RuleId>, bool) {
        let rel = relative_path.to_string_lossy().replace('\\', "/");
        let mut rule_ids = Vec::new();
        let mut suppress_all = false;
        for (prefix, toggle) in &self.directories {
            if rel.starts_with(prefix.as_str()) {
                suppress_all |= toggle.disable_all;
                rule_ids.extend(toggle.disable.iter().filter_map(|s| RuleId::new(s.clone())));
            }
        }
        (rule_ids, suppress_all)
    }

    /// Logs a warning for every top-level rule id in the configuration that
    /// is not registered (§3, §6: "unknown keys ... surfaced as a
    /// warning-class diagnostic but do not abort the run").
    pub fn warn_unknown_rule_ids(&self, known: &[RuleId]) {
        for key in self.rules.keys() {
            let known_match = known.iter().any(|id| id.as_str() == key);
            if !known_match {
                tracing::warn!(rule_id = %key, "configuration references an unregistered rule id");
            }
        }
    }
}

fn merge_language_override(base: &serde_json::Value, language: Language) -> serde_json::Value {
    let Some(obj) = base.as_object() else {
        return base.clone();
    };
    let mut merged = obj.clone();
    let lang_key = language.to_string();
    let overrides = merged.get(&lang_key).and_then(|v| v.as_object()).cloned();
    for lang in Language::ALL {
        merged.remove(&lang.to_string());
    }
    if let Some(overrides) = overrides {
        for (k, v) in overrides {
            merged.insert(k, v);
        }
    }
    serde_json::Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_from(json: serde_json::Value) -> ConfigView {
        let raw: RawConfig = serde_json::from_value(json).unwrap();
        ConfigView::from_raw(raw)
    }

    #[test]
    fn unconfigured_rule_resolves_to_null() {
        let view = ConfigView::empty();
        let id = RuleId::new("nesting.excessive-depth").unwrap();
        assert!(view.for_rule(&id, Language::Python).is_null());
    }

    #[test]
    fn language_override_replaces_base_fields() {
        let view = view_from(serde_json::json!({
            "nesting.excessive-depth": { "max_depth": 4, "python": { "max_depth": 6 } }
        }));
        let id = RuleId::new("nesting.excessive-depth").unwrap();
        let py = view.for_rule(&id, Language::Python);
        assert_eq!(py["max_depth"], 6);
        let ts = view.for_rule(&id, Language::TypeScript);
        assert_eq!(ts["max_depth"], 4);
        assert!(ts.get("python").is_none(), "language subsections must not leak through");
    }

    #[test]
    fn directory_suppressions_union_across_matching_prefixes() {
        let view = view_from(serde_json::json!({
            "directories": {
                "legacy/": { "disable": ["nesting.excessive-depth"] },
                "legacy/vendored/": { "disable_all": true }
            }
        }));
        let (rule_ids, suppress_all) = view.directory_suppressions(Path::new("legacy/vendored/a.py"));
        assert!(suppress_all);
        assert_eq!(rule_ids.len(), 1);
        assert_eq!(rule_ids[0].as_str(), "nesting.excessive-depth");
    }

    #[test]
    fn non_matching_directory_yields_no_suppressions() {
        let view = view_from(serde_json::json!({
            "directories": { "legacy/": { "disable_all": true } }
        }));
        let (rule_ids, suppress_all) = view.directory_suppressions(Path::new("src/a.py"));
        assert!(!suppress_all);
        assert!(rule_ids.is_empty());
    }

    #[test]
    fn language_overrides_resolve_to_the_named_language() {
        let view = view_from(serde_json::json!({
            "language_overrides": { "tools/deploy": "bash" }
        }));
        assert_eq!(view.language_overrides().get(&PathBuf::from("tools/deploy")), Some(&Language::Bash));
    }
}
