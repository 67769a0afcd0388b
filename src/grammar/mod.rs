//! Grammar module for the peggen engine
//!
//! This module provides the PEG syntax tree types, the identities attached to
//! every node, and the builder used by callers to assemble a [`Grammar`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

pub mod builder;
pub mod syntax;

pub use builder::GrammarBuilder;
pub use syntax::{
    Grammar, Lookahead, Occurrence, PegDefinition, PegExpression, PegPrefix, PegPrimary,
    PegSequence, PegSuffix, SemanticAction,
};

// ============================================================================
// NODE IDENTITY
// ============================================================================

static NEXT_SYNTAX_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a single syntax node, assigned once at construction.
///
/// Identities are drawn from a process-wide counter so that nodes from
/// different grammars never collide in traces or diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntaxId(u64);

impl SyntaxId {
    /// Allocates a fresh, never-before-seen identity.
    pub fn fresh() -> Self {
        SyntaxId(NEXT_SYNTAX_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a named rule inside one [`Grammar`].
///
/// Together with an input offset this is the packrat memoization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub(crate) usize);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

// ============================================================================
// TAGS
// ============================================================================

/// A name under which a sequence element's result is registered for the
/// enclosing rule's semantic action. Scoped to one rule invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag(name.to_string())
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag(name)
    }
}

impl std::borrow::Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}
