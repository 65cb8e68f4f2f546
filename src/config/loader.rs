#![forbid(unsafe_code)]

//! Top-level loader (§6): `load_config(path) -> ConfigView`. Format (YAML or
//! JSON) is chosen by extension; `serde_json::Value` is used as the common
//! in-memory representation since it implements `Deserialize` against any
//! serde data format, including `serde_yaml`'s.

use super::schema::RawConfig;
use super::view::ConfigView;
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigView, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<ConfigView, ConfigError> {
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");

    let value: serde_json::Value = if is_json {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::InvalidSyntax { path: path.to_path_buf(), message: e.to_string() })?
    } else {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidSyntax { path: path.to_path_buf(), message: e.to_string() })?
    };

    let raw: RawConfig = serde_json::from_value(value)
        .map_err(|e| ConfigError::InvalidSyntax { path: path.to_path_buf(), message: e.to_string() })?;
    raw.validate()?;

    Ok(ConfigView::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Language, RuleId};
    use std::fs;

    #[test]
    fn loads_yaml_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".thailint.yaml");
        fs::write(&path, "ignore:\n  - \"**/vendor/**\"\nnesting.excessive-depth:\n  max_depth: 6\n").unwrap();

        let view = load_config(&path).unwrap();
        assert_eq!(view.ignore_globs(), &["**/vendor/**".to_string()]);
        let id = RuleId::new("nesting.excessive-depth").unwrap();
        assert_eq!(view.for_rule(&id, Language::Python)["max_depth"], 6);
    }

    #[test]
    fn loads_json_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".thailint.json");
        fs::write(&path, r#"{ "srp.too-many-responsibilities": { "max_methods": 10 } }"#).unwrap();

        let view = load_config(&path).unwrap();
        let id = RuleId::new("srp.too-many-responsibilities").unwrap();
        assert_eq!(view.for_rule(&id, Language::Python)["max_methods"], 10);
    }

    #[test]
    fn malformed_yaml_is_an_invalid_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".thailint.yaml");
        fs::write(&path, "ignore: [\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { .. }));
    }

    #[test]
    fn unbalanced_file_placement_regex_is_rejected_at_load_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".thailint.json");
        fs::write(
            &path,
            r#"{ "file-placement.disallowed": { "directories": { "src/": { "allow": ["(unterminated"] } } } }"#,
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { .. }));
    }
}
