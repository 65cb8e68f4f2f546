#![forbid(unsafe_code)]

//! Language detection (§4.2, C2): map a path (and, for extension-less
//! executables, a shebang) to the closed `Language` tag set.

use crate::types::Language;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Detects the language of a file, consulting an explicit per-path override
/// before falling back to extension, then shebang.
///
/// `overrides` models "explicit override in configuration" from §4.2: a map
/// from a path (as configured, typically relative to the project root) to a
/// forced language tag.
pub fn detect_language(
    path: &Path,
    content_first_line: Option<&str>,
    overrides: &HashMap<PathBuf, Language>,
) -> Language {
    if let Some(lang) = overrides.get(path) {
        return *lang;
    }

    if let Some(lang) = detect_by_extension(path) {
        return lang;
    }

    if let Some(first_line) = content_first_line {
        if let Some(lang) = detect_by_shebang(first_line) {
            return lang;
        }
    }

    Language::Other
}

fn detect_by_extension(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;
    match ext {
        "py" | "pyi" => Some(Language::Python),
        "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
        "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
        "sh" | "bash" => Some(Language::Bash),
        "md" | "markdown" => Some(Language::Markdown),
        "css" => Some(Language::Css),
        _ => None,
    }
}

/// Only consulted for files without a recognized extension (§4.2: "for
/// executable files without a known extension").
fn detect_by_shebang(first_line: &str) -> Option<Language> {
    if !first_line.starts_with("#!") {
        return None;
    }
    let line = first_line.to_ascii_lowercase();
    if line.contains("python") {
        Some(Language::Python)
    } else if line.contains("bash") || line.contains("/sh") || line.ends_with("sh") {
        Some(Language::Bash)
    } else if line.contains("node") {
        Some(Language::JavaScript)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> HashMap<PathBuf, Language> {
        HashMap::new()
    }

    #[test]
    fn detects_by_extension() {
        assert_eq!(
            detect_language(Path::new("a.py"), None, &no_overrides()),
            Language::Python
        );
        assert_eq!(
            detect_language(Path::new("a.tsx"), None, &no_overrides()),
            Language::TypeScript
        );
        assert_eq!(
            detect_language(Path::new("a.unknown"), None, &no_overrides()),
            Language::Other
        );
    }

    #[test]
    fn detects_by_shebang_when_no_extension() {
        assert_eq!(
            detect_language(Path::new("myscript"), Some("#!/usr/bin/env python3"), &no_overrides()),
            Language::Python
        );
        assert_eq!(
            detect_language(Path::new("myscript"), Some("#!/bin/bash"), &no_overrides()),
            Language::Bash
        );
    }

    #[test]
    fn extension_wins_over_shebang() {
        assert_eq!(
            detect_language(Path::new("a.py"), Some("#!/bin/bash"), &no_overrides()),
            Language::Python
        );
    }

    #[test]
    fn explicit_override_wins_over_everything() {
        let mut overrides = HashMap::new();
        overrides.insert(PathBuf::from("a.py"), Language::JavaScript);
        assert_eq!(
            detect_language(Path::new("a.py"), None, &overrides),
            Language::JavaScript
        );
    }

    #[test]
    fn ambiguous_extension_is_other() {
        assert_eq!(
            detect_language(Path::new("a.txt"), None, &no_overrides()),
            Language::Other
        );
    }
}
