//! The public parsing entry point.
//!
//! A [`Parser`] pairs a sealed [`Grammar`] with a start expression. The
//! grammar is read-only after construction, and every `parse` call allocates
//! its own cursor, tag scope, and memo table, so one parser can serve
//! concurrent callers.

use crate::diagnostics::PegError;
use crate::grammar::syntax::{Grammar, PegExpression, PegPrimary};
use crate::grammar::RuleId;
use crate::runtime::context::ParserContext;
use crate::runtime::eval::Evaluator;
use crate::runtime::source::ParserSource;
use crate::runtime::ParsingResult;
use crate::trace::{CollectingRecorder, NullRecorder, ParseRecorder, TraceEvent};

/// An executable grammar: the rule table plus the expression parsing starts
/// from.
pub struct Parser<V> {
    grammar: Grammar<V>,
    start: PegExpression,
}

impl<V: Clone> Parser<V> {
    /// A parser that starts at an arbitrary expression.
    pub fn new(grammar: Grammar<V>, start: impl Into<PegExpression>) -> Self {
        Self {
            grammar,
            start: start.into(),
        }
    }

    /// A parser whose start expression is a single rule reference, so the
    /// top-level result is that rule's constructed value.
    pub fn for_rule(grammar: Grammar<V>, rule: RuleId) -> Self {
        Self::new(grammar, PegPrimary::identifier(rule))
    }

    /// Parses `input`, returning the matched result and the remaining
    /// source, or the most informative failure. Callers wanting a
    /// whole-input parse check that the remainder is empty.
    pub fn parse<'s>(&self, input: &'s str) -> Result<ParsingResult<'s, V>, PegError> {
        self.parse_with(input, &NullRecorder)
    }

    /// Parses `input`, reporting every rule attempt, outcome, and cache hit
    /// to `recorder`.
    pub fn parse_with<'s>(
        &self,
        input: &'s str,
        recorder: &dyn ParseRecorder,
    ) -> Result<ParsingResult<'s, V>, PegError> {
        let source = ParserSource::new(input);
        let mut context = ParserContext::new("<start>");
        let mut evaluator = Evaluator::new(&self.grammar, recorder);
        evaluator
            .eval_expression(&self.start, source, &mut context)
            .map_err(|fault| PegError::from_fault(fault, input))
    }

    /// Parses `input` with a collecting recorder, returning the outcome
    /// together with the full event trace.
    pub fn parse_traced<'s>(
        &self,
        input: &'s str,
    ) -> (Result<ParsingResult<'s, V>, PegError>, Vec<TraceEvent>) {
        let recorder = CollectingRecorder::new();
        let result = self.parse_with(input, &recorder);
        (result, recorder.events())
    }

    pub fn grammar(&self) -> &Grammar<V> {
        &self.grammar
    }
}
