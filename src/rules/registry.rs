#![forbid(unsafe_code)]

//! The rule registry (§4.4, C5): a fixed map of `RuleId -> Box<dyn Rule>`
//! built once when the engine is constructed and read-only for the life of a
//! run.

use super::dry::cache::DryCache;
use super::dry::{DryAccumulator, DryDuplicateRule};
use super::file_placement::FilePlacementRule;
use super::loop_patterns::{CallInLoopRule, RegexCompileInLoopRule, StringConcatInLoopRule};
use super::nesting::NestingDepthRule;
use super::srp::SrpHeuristicRule;
use super::Rule;
use crate::error::RuleError;
use crate::types::{Language, RuleId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A fixed, read-only set of rules keyed by id. Construction is the only
/// place duplicate registration is checked (§4.4: "registration is static at
/// startup" — here, "startup" means the moment the engine is built, not
/// process start, since the DRY rule's accumulator and cache are per-run).
pub struct RuleRegistry {
    rules: HashMap<RuleId, Box<dyn Rule>>,
    dry_accumulator: Arc<DryAccumulator>,
}

impl RuleRegistry {
    fn build(rules: Vec<Box<dyn Rule>>, dry_accumulator: Arc<DryAccumulator>) -> Result<Self, RuleError> {
        let mut map = HashMap::with_capacity(rules.len());
        for rule in rules {
            let id = rule.id();
            if map.insert(id.clone(), rule).is_some() {
                return Err(RuleError::InvalidDefinition(format!("duplicate rule id '{id}' at startup")));
            }
        }
        Ok(Self { rules: map, dry_accumulator })
    }

    /// Registers the built-in analysers (C7-C11). `dry_cache_dir` seeds the
    /// on-disk DRY cache for this run; the accumulator itself is always
    /// fresh.
    pub fn with_builtin_rules(dry_cache_dir: impl AsRef<Path>) -> Result<Self, RuleError> {
        let dry_accumulator = Arc::new(DryAccumulator::new());
        let dry_cache = Arc::new(DryCache::new(dry_cache_dir.as_ref()));

        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(NestingDepthRule),
            Box::new(SrpHeuristicRule),
            Box::new(DryDuplicateRule { accumulator: dry_accumulator.clone(), cache: dry_cache }),
            Box::new(FilePlacementRule),
            Box::new(CallInLoopRule),
            Box::new(StringConcatInLoopRule),
            Box::new(RegexCompileInLoopRule),
        ];
        Self::build(rules, dry_accumulator)
    }

    /// The shared accumulator backing this registry's DRY rule. The
    /// orchestrator calls `finalize` on it once every file has been checked
    /// (§4.7).
    pub fn dry_accumulator(&self) -> Arc<DryAccumulator> {
        self.dry_accumulator.clone()
    }

    pub fn get(&self, id: &RuleId) -> Option<&dyn Rule> {
        self.rules.get(id).map(|b| b.as_ref())
    }

    pub fn rules_for(&self, language: Language) -> impl Iterator<Item = &dyn Rule> {
        self.rules
            .values()
            .filter(move |r| r.languages().contains(&language))
            .map(|b| b.as_ref())
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.values().map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
