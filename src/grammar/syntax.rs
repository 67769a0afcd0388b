//! The PEG syntax tree: a closed set of node kinds assembled by the builder
//! and interpreted by the runtime evaluator.
//!
//! Nodes are immutable once built and may be shared across many parse runs.
//! Every node carries a [`SyntaxId`]; rule references go through [`RuleId`]
//! indirection into the owning [`Grammar`] so that recursive grammars need no
//! cyclic ownership.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::grammar::{RuleId, SyntaxId, Tag};
use crate::runtime::context::Captures;

// ============================================================================
// SEMANTIC ACTIONS
// ============================================================================

/// Caller-supplied function that turns a rule's captures into a domain value.
///
/// Actions are infallible: a rule that matched always constructs a value.
pub type SemanticAction<V> = Arc<dyn for<'s> Fn(&Captures<'s, V>) -> V + Send + Sync>;

// ============================================================================
// SYNTAX NODES
// ============================================================================

/// Ordered choice over one or more alternatives. Alternatives are tried in
/// declaration order; the first success wins.
#[derive(Debug, Clone)]
pub struct PegExpression {
    id: SyntaxId,
    alternatives: Vec<PegSequence>,
}

/// Conjunction of one or more elements, each continuing from where the
/// previous one stopped.
#[derive(Debug, Clone)]
pub struct PegSequence {
    id: SyntaxId,
    elements: Vec<PegPrefix>,
}

/// Lookahead operator applied in front of a suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookahead {
    /// Pass the inner result through.
    None,
    /// Positive lookahead: succeed without consuming.
    And,
    /// Negative lookahead: succeed on inner failure, without consuming.
    Not,
}

/// A suffix wrapped in an optional lookahead predicate.
#[derive(Debug, Clone)]
pub struct PegPrefix {
    id: SyntaxId,
    lookahead: Lookahead,
    suffix: PegSuffix,
}

/// Repetition operator applied behind a primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// Exactly one application.
    Once,
    /// Zero or one.
    Optional,
    /// Zero or more.
    Star,
    /// One or more.
    Plus,
}

/// A primary wrapped in an occurrence operator, optionally tagged so the
/// enclosing rule's semantic action can pick up the result.
#[derive(Debug, Clone)]
pub struct PegSuffix {
    id: SyntaxId,
    occurrence: Occurrence,
    tag: Option<Tag>,
    primary: PegPrimary,
}

/// The leaf alternatives of the grammar tree.
#[derive(Debug, Clone)]
pub enum PegPrimary {
    /// Match any single character.
    Dot { id: SyntaxId },
    /// Match an exact, possibly empty, string.
    Literal { id: SyntaxId, text: String },
    /// Match one character out of a set.
    Class { id: SyntaxId, chars: BTreeSet<char> },
    /// A parenthesized sub-expression; not a rule boundary.
    Group { id: SyntaxId, expr: Box<PegExpression> },
    /// A reference to a named rule; the sole recursion point.
    Identifier { id: SyntaxId, rule: RuleId },
}

// ============================================================================
// RULES & GRAMMAR
// ============================================================================

/// A named rule: body expression plus the semantic action run on success.
pub struct PegDefinition<V> {
    id: SyntaxId,
    name: String,
    body: PegExpression,
    action: SemanticAction<V>,
}

impl<V> PegDefinition<V> {
    pub(crate) fn new(name: String, body: PegExpression, action: SemanticAction<V>) -> Self {
        Self {
            id: SyntaxId::fresh(),
            name,
            body,
            action,
        }
    }

    pub fn id(&self) -> SyntaxId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &PegExpression {
        &self.body
    }

    pub fn action(&self) -> &SemanticAction<V> {
        &self.action
    }
}

impl<V> fmt::Debug for PegDefinition<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PegDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// The rule table of one grammar. Read-only after construction, so a single
/// grammar can back concurrent parse runs.
#[derive(Debug)]
pub struct Grammar<V> {
    rules: Vec<PegDefinition<V>>,
}

impl<V> Grammar<V> {
    pub(crate) fn from_rules(rules: Vec<PegDefinition<V>>) -> Self {
        Self { rules }
    }

    /// Starts building a new grammar.
    pub fn builder() -> crate::grammar::GrammarBuilder<V> {
        crate::grammar::GrammarBuilder::new()
    }

    /// Looks up a rule by its identity.
    pub fn get(&self, id: RuleId) -> Option<&PegDefinition<V>> {
        self.rules.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

impl PegPrimary {
    /// `.` — any single character.
    pub fn dot() -> Self {
        PegPrimary::Dot {
            id: SyntaxId::fresh(),
        }
    }

    /// An exact string literal. The empty literal always matches.
    pub fn literal(text: impl Into<String>) -> Self {
        PegPrimary::Literal {
            id: SyntaxId::fresh(),
            text: text.into(),
        }
    }

    /// One character out of a set.
    pub fn class(chars: impl IntoIterator<Item = char>) -> Self {
        PegPrimary::Class {
            id: SyntaxId::fresh(),
            chars: chars.into_iter().collect(),
        }
    }

    /// A parenthesized sub-expression, evaluated in the enclosing tag scope.
    pub fn group(expr: impl Into<PegExpression>) -> Self {
        PegPrimary::Group {
            id: SyntaxId::fresh(),
            expr: Box::new(expr.into()),
        }
    }

    /// A reference to a rule of the owning grammar.
    pub fn identifier(rule: RuleId) -> Self {
        PegPrimary::Identifier {
            id: SyntaxId::fresh(),
            rule,
        }
    }

    pub fn id(&self) -> SyntaxId {
        match self {
            PegPrimary::Dot { id }
            | PegPrimary::Literal { id, .. }
            | PegPrimary::Class { id, .. }
            | PegPrimary::Group { id, .. }
            | PegPrimary::Identifier { id, .. } => *id,
        }
    }
}

impl PegSuffix {
    fn with(occurrence: Occurrence, primary: PegPrimary) -> Self {
        Self {
            id: SyntaxId::fresh(),
            occurrence,
            tag: None,
            primary,
        }
    }

    /// Exactly one application of `primary`.
    pub fn once(primary: PegPrimary) -> Self {
        Self::with(Occurrence::Once, primary)
    }

    /// Zero or one application.
    pub fn optional(primary: PegPrimary) -> Self {
        Self::with(Occurrence::Optional, primary)
    }

    /// Zero or more applications.
    pub fn star(primary: PegPrimary) -> Self {
        Self::with(Occurrence::Star, primary)
    }

    /// One or more applications.
    pub fn plus(primary: PegPrimary) -> Self {
        Self::with(Occurrence::Plus, primary)
    }

    /// Registers this element's aggregated result under `tag` for the
    /// enclosing rule's semantic action.
    pub fn tagged(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn id(&self) -> SyntaxId {
        self.id
    }

    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    pub fn primary(&self) -> &PegPrimary {
        &self.primary
    }
}

impl PegPrefix {
    fn with(lookahead: Lookahead, suffix: PegSuffix) -> Self {
        Self {
            id: SyntaxId::fresh(),
            lookahead,
            suffix,
        }
    }

    /// Pass-through: no lookahead predicate.
    pub fn plain(suffix: impl Into<PegSuffix>) -> Self {
        Self::with(Lookahead::None, suffix.into())
    }

    /// `&x` — positive lookahead.
    pub fn and(suffix: impl Into<PegSuffix>) -> Self {
        Self::with(Lookahead::And, suffix.into())
    }

    /// `!x` — negative lookahead.
    pub fn not(suffix: impl Into<PegSuffix>) -> Self {
        Self::with(Lookahead::Not, suffix.into())
    }

    pub fn id(&self) -> SyntaxId {
        self.id
    }

    pub fn lookahead(&self) -> Lookahead {
        self.lookahead
    }

    pub fn suffix(&self) -> &PegSuffix {
        &self.suffix
    }
}

impl PegSequence {
    /// Builds a sequence from its elements. A sequence is never empty.
    pub fn of(elements: Vec<PegPrefix>) -> Self {
        assert!(
            !elements.is_empty(),
            "a PEG sequence must contain at least one element"
        );
        Self {
            id: SyntaxId::fresh(),
            elements,
        }
    }

    pub fn id(&self) -> SyntaxId {
        self.id
    }

    pub fn elements(&self) -> &[PegPrefix] {
        &self.elements
    }
}

impl PegExpression {
    /// Builds an ordered choice from its alternatives. Never empty.
    pub fn choice(alternatives: Vec<PegSequence>) -> Self {
        assert!(
            !alternatives.is_empty(),
            "a PEG expression must contain at least one alternative"
        );
        Self {
            id: SyntaxId::fresh(),
            alternatives,
        }
    }

    /// The single-alternative expression.
    pub fn single(sequence: impl Into<PegSequence>) -> Self {
        Self::choice(vec![sequence.into()])
    }

    pub fn id(&self) -> SyntaxId {
        self.id
    }

    pub fn alternatives(&self) -> &[PegSequence] {
        &self.alternatives
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================
//
// Lifting conversions so grammars can be written tersely: a bare primary is
// an untagged, unrepeated, predicate-free element.

impl From<PegPrimary> for PegSuffix {
    fn from(primary: PegPrimary) -> Self {
        PegSuffix::once(primary)
    }
}

impl From<PegPrimary> for PegPrefix {
    fn from(primary: PegPrimary) -> Self {
        PegPrefix::plain(PegSuffix::once(primary))
    }
}

impl From<PegSuffix> for PegPrefix {
    fn from(suffix: PegSuffix) -> Self {
        PegPrefix::plain(suffix)
    }
}

impl From<PegPrimary> for PegSequence {
    fn from(primary: PegPrimary) -> Self {
        PegSequence::of(vec![primary.into()])
    }
}

impl From<PegSuffix> for PegSequence {
    fn from(suffix: PegSuffix) -> Self {
        PegSequence::of(vec![suffix.into()])
    }
}

impl From<PegPrefix> for PegSequence {
    fn from(prefix: PegPrefix) -> Self {
        PegSequence::of(vec![prefix])
    }
}

impl From<PegPrimary> for PegExpression {
    fn from(primary: PegPrimary) -> Self {
        PegExpression::single(PegSequence::from(primary))
    }
}

impl From<PegSuffix> for PegExpression {
    fn from(suffix: PegSuffix) -> Self {
        PegExpression::single(PegSequence::from(suffix))
    }
}

impl From<PegPrefix> for PegExpression {
    fn from(prefix: PegPrefix) -> Self {
        PegExpression::single(PegSequence::from(prefix))
    }
}

impl From<PegSequence> for PegExpression {
    fn from(sequence: PegSequence) -> Self {
        PegExpression::single(sequence)
    }
}
