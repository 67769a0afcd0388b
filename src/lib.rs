pub use crate::diagnostics::{ErrorInfo, GrammarViolation, ParseFault, PegError, Span};
pub use crate::engine::Parser;
pub use crate::grammar::{
    Grammar, GrammarBuilder, Lookahead, Occurrence, PegDefinition, PegExpression, PegPrefix,
    PegPrimary, PegSequence, PegSuffix, RuleId, SemanticAction, SyntaxId, Tag,
};
pub use crate::runtime::context::Captures;
pub use crate::runtime::source::{ParserSource, Position};
pub use crate::runtime::ParsingResult;
pub use crate::trace::{CollectingRecorder, NullRecorder, ParseRecorder, TraceEvent};

pub mod diagnostics;
pub mod engine;
pub mod grammar;
pub mod runtime;
pub mod trace;
