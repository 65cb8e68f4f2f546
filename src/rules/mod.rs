#![forbid(unsafe_code)]

//! The rule API boundary (§4.4, C5) and the five representative analysers
//! (§4.5-4.9, C7-C11).

pub mod dry;
pub mod file_placement;
pub mod loop_patterns;
pub mod nesting;
pub mod registry;
pub mod srp;

use crate::hash::ContentHash;
use crate::parsing::ParsedTree;
use crate::types::{Language, RuleId};
use crate::violation::Violation;
use std::path::Path;

/// The per-file value a rule's `check` sees (§3). Shared read-only across
/// every rule that runs against a given file.
pub struct FileContext<'a> {
    pub canonical_path: &'a Path,
    pub relative_path: &'a Path,
    pub language: Language,
    pub text: &'a str,
    pub content_hash: &'a ContentHash,
    /// `None` when the file failed to parse; rules other than file-placement
    /// must treat this as "emit nothing" (§7: parse failure is a value).
    pub parsed: Option<&'a ParsedTree>,
}

/// A rule registered against the engine (§4.4).
///
/// Rules are dyn-compatible so the registry can hold heterogeneous rules in
/// one `HashMap<RuleId, Box<dyn Rule>>`. Per-rule configuration arrives
/// pre-resolved (language overrides already merged) as a `serde_json::Value`;
/// each rule deserialises it into its own schema, defaulting on missing
/// fields per §4.4.
pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;

    fn languages(&self) -> &'static [Language];

    fn check(&self, ctx: &FileContext, config: &serde_json::Value) -> Vec<Violation>;

    /// Whether this rule runs even on files that failed to parse (§4.8's
    /// file-placement rule is the only one that does, since it is path-only).
    fn runs_without_parse(&self) -> bool {
        false
    }
}
