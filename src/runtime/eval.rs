//! The recursive PEG evaluator.
//!
//! Walks a grammar tree against a [`ParserSource`], threading the cursor
//! forward on success and dropping it on failure so ordered choice can retry
//! from the unconsumed original. Rule invocations are the only memoization
//! and tag-scope boundaries: each one consults the [`PackratState`], pushes
//! a fresh [`ParserContext`], and runs the rule's semantic action over the
//! captures when the body matches.
//!
//! Two failure channels flow through every evaluation: recoverable
//! [`ErrorInfo`] mismatches, which choice/optional/repetition/lookahead
//! absorb, and [`GrammarViolation`]s, which every site re-raises untouched.

use std::collections::BTreeSet;

use crate::diagnostics::{ErrorInfo, GrammarViolation, ParseFault};
use crate::grammar::syntax::{
    Grammar, Lookahead, Occurrence, PegExpression, PegPrefix, PegPrimary, PegSequence, PegSuffix,
};
use crate::grammar::RuleId;
use crate::runtime::context::ParserContext;
use crate::runtime::packrat::{CacheEntry, PackratState};
use crate::runtime::source::ParserSource;
use crate::runtime::ParsingResult;
use crate::trace::ParseRecorder;

pub type EvalResult<'s, V> = Result<ParsingResult<'s, V>, ParseFault>;

/// One parse run: a read-only grammar plus the run-owned memo table.
pub struct Evaluator<'g, 's, V> {
    grammar: &'g Grammar<V>,
    packrat: PackratState<'s, V>,
    recorder: &'g dyn ParseRecorder,
}

impl<'g, 's, V: Clone> Evaluator<'g, 's, V> {
    pub fn new(grammar: &'g Grammar<V>, recorder: &'g dyn ParseRecorder) -> Self {
        Self {
            grammar,
            packrat: PackratState::new(),
            recorder,
        }
    }

    // ------------------------------------------------------------------------
    // Expression: ordered choice
    // ------------------------------------------------------------------------

    /// Tries the alternatives in declaration order from the same cursor; the
    /// first success wins. On total failure reports the alternative that got
    /// furthest, ties going to the earlier one.
    pub fn eval_expression(
        &mut self,
        expression: &PegExpression,
        source: ParserSource<'s>,
        context: &mut ParserContext<'s, V>,
    ) -> EvalResult<'s, V> {
        let mut furthest: Option<ErrorInfo> = None;
        for alternative in expression.alternatives() {
            match self.eval_sequence(alternative, source, context) {
                Ok(result) => return Ok(result),
                Err(ParseFault::Fail(error)) => {
                    let further = furthest
                        .as_ref()
                        .map_or(true, |best| error.position().offset > best.position().offset);
                    if further {
                        furthest = Some(error);
                    }
                }
                Err(violation) => return Err(violation),
            }
        }
        match furthest {
            Some(error) => Err(ParseFault::Fail(error)),
            // Unreachable for well-formed expressions; they are never empty.
            None => Err(ParseFault::Fail(ErrorInfo::new(
                "expression has no alternatives",
                source.position(),
            ))),
        }
    }

    // ------------------------------------------------------------------------
    // Sequence: conjunction
    // ------------------------------------------------------------------------

    /// Evaluates each element where the previous one stopped, sharing the
    /// rule's tag scope. Any failure fails the whole sequence; the caller
    /// still holds the unconsumed starting cursor.
    fn eval_sequence(
        &mut self,
        sequence: &PegSequence,
        source: ParserSource<'s>,
        context: &mut ParserContext<'s, V>,
    ) -> EvalResult<'s, V> {
        // A lone element keeps its own result, so constructed values survive
        // the canonical expression > sequence > prefix > suffix wrappers.
        if let [only] = sequence.elements() {
            return self.eval_prefix(only, source, context);
        }

        let mut current = source;
        for element in sequence.elements() {
            current = self.eval_prefix(element, current, context)?.rest();
        }
        Ok(ParsingResult::raw(current.consumed_since(&source), current))
    }

    // ------------------------------------------------------------------------
    // Prefix: lookahead predicates
    // ------------------------------------------------------------------------

    fn eval_prefix(
        &mut self,
        prefix: &PegPrefix,
        source: ParserSource<'s>,
        context: &mut ParserContext<'s, V>,
    ) -> EvalResult<'s, V> {
        match prefix.lookahead() {
            Lookahead::None => self.eval_suffix(prefix.suffix(), source, context),
            Lookahead::And => {
                self.eval_suffix(prefix.suffix(), source, context)?;
                Ok(ParsingResult::raw("", source))
            }
            Lookahead::Not => match self.eval_suffix(prefix.suffix(), source, context) {
                Ok(_) => Err(ParseFault::Fail(ErrorInfo::new(
                    "negative lookahead matched unexpectedly",
                    source.position(),
                ))),
                Err(ParseFault::Fail(_)) => Ok(ParsingResult::raw("", source)),
                Err(violation) => Err(violation),
            },
        }
    }

    // ------------------------------------------------------------------------
    // Suffix: repetition and tagging
    // ------------------------------------------------------------------------

    fn eval_suffix(
        &mut self,
        suffix: &PegSuffix,
        source: ParserSource<'s>,
        context: &mut ParserContext<'s, V>,
    ) -> EvalResult<'s, V> {
        let result = match suffix.occurrence() {
            Occurrence::Once => self.eval_primary(suffix.primary(), source, context)?,
            Occurrence::Optional => {
                match self.eval_primary(suffix.primary(), source, context) {
                    Ok(result) => result,
                    Err(ParseFault::Fail(_)) => ParsingResult::raw("", source),
                    Err(violation) => return Err(violation),
                }
            }
            Occurrence::Star => self.eval_repetition(suffix.primary(), source, context, 0)?,
            Occurrence::Plus => self.eval_repetition(suffix.primary(), source, context, 1)?,
        };

        if let Some(tag) = suffix.tag() {
            context
                .tagging(tag.clone(), result.clone())
                .map_err(ParseFault::from)?;
        }
        Ok(result)
    }

    /// Applies `primary` repeatedly until an attempt fails, then succeeds
    /// with everything consumed so far, provided at least `min` attempts
    /// matched. A zero-width success ends the loop immediately so repetition
    /// always makes progress.
    fn eval_repetition(
        &mut self,
        primary: &PegPrimary,
        source: ParserSource<'s>,
        context: &mut ParserContext<'s, V>,
        min: usize,
    ) -> EvalResult<'s, V> {
        let mut current = source;
        let mut matched = 0usize;
        loop {
            match self.eval_primary(primary, current, context) {
                Ok(result) => {
                    let next = result.rest();
                    let zero_width = next.offset() == current.offset();
                    current = next;
                    matched += 1;
                    if zero_width {
                        break;
                    }
                }
                Err(ParseFault::Fail(error)) => {
                    if matched < min {
                        return Err(ParseFault::Fail(error));
                    }
                    break;
                }
                Err(violation) => return Err(violation),
            }
        }
        Ok(ParsingResult::raw(current.consumed_since(&source), current))
    }

    // ------------------------------------------------------------------------
    // Primary: the leaves
    // ------------------------------------------------------------------------

    fn eval_primary(
        &mut self,
        primary: &PegPrimary,
        source: ParserSource<'s>,
        context: &mut ParserContext<'s, V>,
    ) -> EvalResult<'s, V> {
        match primary {
            PegPrimary::Dot { .. } => {
                let (_, rest) = source.next().map_err(ParseFault::from)?;
                Ok(ParsingResult::raw(rest.consumed_since(&source), rest))
            }
            PegPrimary::Literal { text, .. } => self.eval_literal(text, source),
            PegPrimary::Class { chars, .. } => self.eval_class(chars, source),
            PegPrimary::Group { expr, .. } => {
                // Grouping is not a rule boundary: same tag scope.
                self.eval_expression(expr, source, context)
            }
            PegPrimary::Identifier { rule, .. } => self.eval_rule(*rule, source),
        }
    }

    fn eval_literal(&mut self, text: &str, source: ParserSource<'s>) -> EvalResult<'s, V> {
        if text.is_empty() {
            return Ok(ParsingResult::raw("", source));
        }
        match source.take_literal(text) {
            Some(rest) => Ok(ParsingResult::raw(rest.consumed_since(&source), rest)),
            None => {
                let message = if source.rest().len() < text.len() {
                    format!("unexpected end of input; expected literal `{text}`")
                } else {
                    format!("expected literal `{text}`")
                };
                Err(ParseFault::Fail(ErrorInfo::new(message, source.position())))
            }
        }
    }

    fn eval_class(&mut self, chars: &BTreeSet<char>, source: ParserSource<'s>) -> EvalResult<'s, V> {
        match source.peek() {
            Some(c) if chars.contains(&c) => {
                let (_, rest) = source.next().map_err(ParseFault::from)?;
                Ok(ParsingResult::raw(rest.consumed_since(&source), rest))
            }
            Some(c) => Err(ParseFault::Fail(ErrorInfo::new(
                format!(
                    "unexpected character `{c}`; expected one of {}",
                    class_display(chars)
                ),
                source.position(),
            ))),
            None => Err(ParseFault::Fail(source.end_of_input())),
        }
    }

    // ------------------------------------------------------------------------
    // Rule invocation: memoization boundary
    // ------------------------------------------------------------------------

    fn eval_rule(&mut self, rule: RuleId, source: ParserSource<'s>) -> EvalResult<'s, V> {
        let Some(definition) = self.grammar.get(rule) else {
            return Err(ParseFault::Violation(GrammarViolation::UndefinedRule {
                name: rule.to_string(),
            }));
        };
        let offset = source.offset();

        match self.packrat.get(rule, offset) {
            Some(CacheEntry::Parsed(result)) => {
                let result = result.clone();
                self.recorder
                    .cache_hit(definition.name(), rule, source.position());
                return Ok(result);
            }
            Some(CacheEntry::Failed(error)) => {
                let error = error.clone();
                self.recorder
                    .cache_hit(definition.name(), rule, source.position());
                return Err(ParseFault::Fail(error));
            }
            Some(CacheEntry::InProgress) => {
                // The rule reached itself at the same offset without
                // consuming anything: unguarded left recursion.
                return Err(ParseFault::Violation(GrammarViolation::LeftRecursion {
                    rule: definition.name().to_string(),
                    position: source.position(),
                }));
            }
            None => {}
        }

        self.packrat.mark_in_progress(rule, offset);
        self.recorder
            .attempt(definition.name(), rule, source.position());

        let mut scope = ParserContext::new(definition.name());
        match self.eval_expression(definition.body(), source, &mut scope) {
            Ok(result) => {
                let rest = result.rest();
                let captures = scope.into_captures(rest.consumed_since(&source));
                let action = std::sync::Arc::clone(definition.action());
                let value = action(&captures);
                let constructed = ParsingResult::constructed(value, rest);
                self.packrat.put_parsed(rule, offset, constructed.clone());
                self.recorder
                    .success(definition.name(), rule, source.position(), rest.position());
                Ok(constructed)
            }
            Err(ParseFault::Fail(error)) => {
                self.packrat.put_failed(rule, offset, error.clone());
                self.recorder
                    .failure(definition.name(), rule, source.position(), &error);
                Err(ParseFault::Fail(error))
            }
            Err(violation) => Err(violation),
        }
    }
}

fn class_display(chars: &BTreeSet<char>) -> String {
    let mut out = String::with_capacity(chars.len() + 2);
    out.push('[');
    for c in chars {
        out.push(*c);
    }
    out.push(']');
    out
}
