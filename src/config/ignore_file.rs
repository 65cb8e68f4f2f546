#![forbid(unsafe_code)]

//! The project ignore file (§6): a gitignore-style glob file at the project
//! root, applied before language detection.

use crate::error::ConfigError;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Loads `<root>/<file_name>` as a gitignore-style matcher. Returns `None`
/// (not an error) when the file does not exist — the ignore file is
/// optional.
pub fn load_ignore_file(root: &Path, file_name: &str) -> Result<Option<Gitignore>, ConfigError> {
    let path = root.join(file_name);
    if !path.is_file() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&path) {
        return Err(ConfigError::InvalidSyntax { path, message: err.to_string() });
    }
    let gitignore = builder
        .build()
        .map_err(|e| ConfigError::InvalidSyntax { path: path.clone(), message: e.to_string() })?;
    Ok(Some(gitignore))
}
