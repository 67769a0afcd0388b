//! Per-parse runtime: the input cursor, the tag scope, the packrat memo
//! table, and the recursive evaluator that walks a grammar against them.
//!
//! Everything in this module is created fresh for one `parse` call and
//! dropped at its end; only the grammar outlives a run.

pub mod context;
pub mod eval;
pub mod packrat;
pub mod source;

use crate::runtime::source::ParserSource;

/// The outcome of a successful match: either the raw consumed span, or the
/// value a rule's semantic action constructed. Both carry the cursor the
/// next element continues from.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsingResult<'s, V> {
    Raw {
        matched: &'s str,
        rest: ParserSource<'s>,
    },
    Constructed {
        value: V,
        rest: ParserSource<'s>,
    },
}

impl<'s, V> ParsingResult<'s, V> {
    pub fn raw(matched: &'s str, rest: ParserSource<'s>) -> Self {
        ParsingResult::Raw { matched, rest }
    }

    pub fn constructed(value: V, rest: ParserSource<'s>) -> Self {
        ParsingResult::Constructed { value, rest }
    }

    /// The cursor after this match.
    pub fn rest(&self) -> ParserSource<'s> {
        match self {
            ParsingResult::Raw { rest, .. } | ParsingResult::Constructed { rest, .. } => *rest,
        }
    }

    /// The raw matched span, if this result was never constructed.
    pub fn matched(&self) -> Option<&'s str> {
        match self {
            ParsingResult::Raw { matched, .. } => Some(matched),
            ParsingResult::Constructed { .. } => None,
        }
    }

    /// The constructed value, if any.
    pub fn value(&self) -> Option<&V> {
        match self {
            ParsingResult::Constructed { value, .. } => Some(value),
            ParsingResult::Raw { .. } => None,
        }
    }

    /// Consumes the result, yielding the constructed value if any.
    pub fn into_value(self) -> Option<V> {
        match self {
            ParsingResult::Constructed { value, .. } => Some(value),
            ParsingResult::Raw { .. } => None,
        }
    }
}
