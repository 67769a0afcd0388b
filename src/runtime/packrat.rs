//! Packrat memoization table.
//!
//! One entry per `(rule, offset)` pair bounds total work to the number of
//! rules times the input length, no matter how much ordered choice
//! backtracks. A [`PackratState`] belongs to exactly one parse run and is
//! never shared across runs or threads.

use std::collections::HashMap;

use crate::diagnostics::ErrorInfo;
use crate::grammar::RuleId;
use crate::runtime::ParsingResult;

/// What the cache knows about one `(rule, offset)` pair. Absence from the
/// table means the pair has not been attempted yet.
#[derive(Debug, Clone)]
pub enum CacheEntry<'s, V> {
    /// The rule is currently being evaluated at this offset. Seeing this on
    /// lookup means the rule re-entered itself without consuming input.
    InProgress,
    /// The rule matched here; the stored result is returned verbatim on
    /// every later attempt.
    Parsed(ParsingResult<'s, V>),
    /// The rule failed here with this error.
    Failed(ErrorInfo),
}

/// The memoization table of one parse run.
#[derive(Debug)]
pub struct PackratState<'s, V> {
    cache: HashMap<(RuleId, usize), CacheEntry<'s, V>>,
}

impl<'s, V> PackratState<'s, V> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    pub fn get(&self, rule: RuleId, offset: usize) -> Option<&CacheEntry<'s, V>> {
        self.cache.get(&(rule, offset))
    }

    /// Marks the pair as being evaluated, so re-entry can be detected.
    pub fn mark_in_progress(&mut self, rule: RuleId, offset: usize) {
        self.cache.insert((rule, offset), CacheEntry::InProgress);
    }

    pub fn put_parsed(&mut self, rule: RuleId, offset: usize, result: ParsingResult<'s, V>) {
        self.cache.insert((rule, offset), CacheEntry::Parsed(result));
    }

    pub fn put_failed(&mut self, rule: RuleId, offset: usize, error: ErrorInfo) {
        self.cache.insert((rule, offset), CacheEntry::Failed(error));
    }
}

impl<'s, V> Default for PackratState<'s, V> {
    fn default() -> Self {
        Self::new()
    }
}
