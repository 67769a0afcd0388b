//! Unified diagnostics for the peggen engine.
//!
//! Two layers. Inside the evaluator, failures travel as [`ParseFault`]: a
//! recoverable [`ErrorInfo`] that drives backtracking, or a fatal
//! [`GrammarViolation`] that no backtracking site may absorb. At the `parse`
//! boundary a fault becomes a [`PegError`], a `miette` diagnostic with a
//! labeled span into the input.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grammar::Tag;
use crate::runtime::source::Position;

// Type aliases for clarity and brevity
pub type SourceArc = Arc<NamedSource<String>>;

// ============================================================================
// SPANS
// ============================================================================

/// A byte range in the input, used for diagnostic labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// A one-character-wide span at `position`, clamped to the input length.
    /// At end of input the span collapses to zero width.
    pub fn caret(position: Position, input_len: usize) -> Self {
        let start = position.offset.min(input_len);
        Self {
            start,
            end: (start + 1).min(input_len),
        }
    }
}

// ============================================================================
// RECOVERABLE PARSE FAILURES
// ============================================================================

/// A parse failure: what was expected and where. Recoverable; ordered
/// choice, repetition, and lookahead all backtrack over these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    message: String,
    position: Position,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.position)
    }
}

// ============================================================================
// GRAMMAR VIOLATIONS
// ============================================================================

/// A malformed grammar, not a malformed input. Fatal to the parse run and
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarViolation {
    #[error("tag `{tag}` is already registered in rule `{scope}`")]
    DuplicateTag { tag: Tag, scope: String },
    #[error("left recursion detected in rule `{rule}` at {position}")]
    LeftRecursion { rule: String, position: Position },
    #[error("rule `{name}` is referenced but never defined")]
    UndefinedRule { name: String },
}

/// Internal evaluator result channel: recoverable failure or fatal
/// violation. Backtracking sites match on `Fail` and re-raise `Violation`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFault {
    Fail(ErrorInfo),
    Violation(GrammarViolation),
}

impl From<ErrorInfo> for ParseFault {
    fn from(error: ErrorInfo) -> Self {
        ParseFault::Fail(error)
    }
}

impl From<GrammarViolation> for ParseFault {
    fn from(violation: GrammarViolation) -> Self {
        ParseFault::Violation(violation)
    }
}

// ============================================================================
// PUBLIC ERROR TYPE
// ============================================================================

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The input being parsed, if available.
    pub source: Option<SourceArc>,
    /// The primary label span.
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

/// The single error type surfaced by [`Parser::parse`](crate::engine::Parser::parse).
#[derive(Debug, Error)]
pub enum PegError {
    #[error("parse error: {message}")]
    Parse {
        message: String,
        position: Position,
        ctx: ErrorContext,
    },
    #[error("invalid grammar: {violation}")]
    Grammar {
        violation: GrammarViolation,
        ctx: ErrorContext,
    },
}

impl PegError {
    /// Converts an evaluator fault into the public diagnostic, attaching the
    /// input as a named source so reports can render the offending line.
    pub(crate) fn from_fault(fault: ParseFault, input: &str) -> Self {
        let source: SourceArc = Arc::new(NamedSource::new("input", input.to_string()));
        match fault {
            ParseFault::Fail(error) => {
                let span = Span::caret(error.position(), input.len());
                PegError::Parse {
                    message: error.message().to_string(),
                    position: error.position(),
                    ctx: ErrorContext {
                        source: Some(source),
                        span: Some(span),
                        help: None,
                    },
                }
            }
            ParseFault::Violation(violation) => {
                let (span, help) = match &violation {
                    GrammarViolation::LeftRecursion { position, .. } => (
                        Some(Span::caret(*position, input.len())),
                        Some(
                            "packrat evaluation cannot handle left-recursive rules; \
                             rewrite the rule to consume input before the self-reference"
                                .to_string(),
                        ),
                    ),
                    GrammarViolation::DuplicateTag { .. } => (
                        None,
                        Some(
                            "each tag may be registered once per rule invocation; \
                             rename one of the captures"
                                .to_string(),
                        ),
                    ),
                    GrammarViolation::UndefinedRule { .. } => (None, None),
                };
                PegError::Grammar {
                    violation,
                    ctx: ErrorContext {
                        source: Some(source),
                        span,
                        help,
                    },
                }
            }
        }
    }

    fn get_ctx(&self) -> &ErrorContext {
        match self {
            PegError::Parse { ctx, .. } => ctx,
            PegError::Grammar { ctx, .. } => ctx,
        }
    }

    /// The position the failure occurred at, for parse errors.
    pub fn position(&self) -> Option<Position> {
        match self {
            PegError::Parse { position, .. } => Some(*position),
            PegError::Grammar {
                violation: GrammarViolation::LeftRecursion { position, .. },
                ..
            } => Some(*position),
            PegError::Grammar { .. } => None,
        }
    }

    /// The grammar violation, if this is one.
    pub fn violation(&self) -> Option<&GrammarViolation> {
        match self {
            PegError::Grammar { violation, .. } => Some(violation),
            PegError::Parse { .. } => None,
        }
    }
}

impl Diagnostic for PegError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        None
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx();
        let span = ctx.span?;
        let text = match self {
            PegError::Parse { message, .. } => message.clone(),
            PegError::Grammar { violation, .. } => violation.to_string(),
        };
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(text),
            span.start,
            span.end.saturating_sub(span.start),
        ))))
    }
}
