//! Parse instrumentation.
//!
//! The evaluator reports every rule attempt, outcome, and cache hit to an
//! injected [`ParseRecorder`]. [`NullRecorder`] is the default and does
//! nothing, so tracing costs nothing when disabled. [`CollectingRecorder`]
//! gathers serializable [`TraceEvent`]s for debugging and tests.

use std::sync::Mutex;

use serde::Serialize;

use crate::diagnostics::ErrorInfo;
use crate::grammar::RuleId;
use crate::runtime::source::Position;

/// Receiver for rule-level parse events.
pub trait ParseRecorder {
    /// The rule is being evaluated at `position` for the first time.
    fn attempt(&self, rule: &str, id: RuleId, position: Position);

    /// The rule matched, consuming input from `start` to `end`.
    fn success(&self, rule: &str, id: RuleId, start: Position, end: Position);

    /// The rule failed at `start` with `error`.
    fn failure(&self, rule: &str, id: RuleId, start: Position, error: &ErrorInfo);

    /// A memoized outcome was returned without re-evaluating the rule.
    fn cache_hit(&self, rule: &str, id: RuleId, position: Position);
}

/// The zero-cost default recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl ParseRecorder for NullRecorder {
    fn attempt(&self, _rule: &str, _id: RuleId, _position: Position) {}
    fn success(&self, _rule: &str, _id: RuleId, _start: Position, _end: Position) {}
    fn failure(&self, _rule: &str, _id: RuleId, _start: Position, _error: &ErrorInfo) {}
    fn cache_hit(&self, _rule: &str, _id: RuleId, _position: Position) {}
}

/// One recorded parse event, serializable for dumps and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    Attempt {
        rule: String,
        id: RuleId,
        position: Position,
    },
    Success {
        rule: String,
        id: RuleId,
        start: Position,
        end: Position,
    },
    Failure {
        rule: String,
        id: RuleId,
        start: Position,
        message: String,
    },
    CacheHit {
        rule: String,
        id: RuleId,
        position: Position,
    },
}

/// Collects every event behind a mutex so the recorder can be shared by
/// reference with the evaluator.
#[derive(Debug, Default)]
pub struct CollectingRecorder {
    events: Mutex<Vec<TraceEvent>>,
}

impl CollectingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn record(&self, event: TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ParseRecorder for CollectingRecorder {
    fn attempt(&self, rule: &str, id: RuleId, position: Position) {
        self.record(TraceEvent::Attempt {
            rule: rule.to_string(),
            id,
            position,
        });
    }

    fn success(&self, rule: &str, id: RuleId, start: Position, end: Position) {
        self.record(TraceEvent::Success {
            rule: rule.to_string(),
            id,
            start,
            end,
        });
    }

    fn failure(&self, rule: &str, id: RuleId, start: Position, error: &ErrorInfo) {
        self.record(TraceEvent::Failure {
            rule: rule.to_string(),
            id,
            start,
            message: error.message().to_string(),
        });
    }

    fn cache_hit(&self, rule: &str, id: RuleId, position: Position) {
        self.record(TraceEvent::CacheHit {
            rule: rule.to_string(),
            id,
            position,
        });
    }
}
