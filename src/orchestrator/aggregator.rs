#![forbid(unsafe_code)]

//! Violation collection: thread-safe append during the per-file phase,
//! then sort-and-dedup into the list the caller sees (§4.1's ordering
//! guarantee, §3's "the engine must never emit two equal violations").

use crate::violation::Violation;
use std::sync::Mutex;

/// The run's single shared violation sink (§5: "two shared mutable sinks").
/// `append` holds the lock only long enough to extend the vector.
#[derive(Default)]
pub struct Aggregator {
    violations: Mutex<Vec<Violation>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, mut violations: Vec<Violation>) {
        if violations.is_empty() {
            return;
        }
        let mut guard = self.violations.lock().expect("aggregator lock poisoned");
        guard.append(&mut violations);
    }

    /// Consumes the aggregator, returning a sorted, deduplicated violation
    /// list (§4.1: sorted by `(file_path, line, column, rule_id)`, ties
    /// impossible after dedup).
    pub fn into_sorted(self) -> Vec<Violation> {
        let mut violations = self.violations.into_inner().expect("aggregator lock poisoned");
        sort_and_dedup(&mut violations);
        violations
    }
}

pub fn sort_and_dedup(violations: &mut Vec<Violation>) {
    violations.sort_by(|a, b| {
        (&a.file_path, a.line, a.column, a.rule_id.as_str()).cmp(&(
            &b.file_path,
            b.line,
            b.column,
            b.rule_id.as_str(),
        ))
    });
    violations.dedup();
}
