//! Grammar construction front-end.
//!
//! A [`GrammarBuilder`] separates *declaring* a rule (which yields the
//! [`RuleId`] other rules reference) from *defining* its body, so mutually
//! recursive rules can be expressed without cyclic ownership. `finish`
//! refuses grammars that declare a rule and never define it.

use crate::diagnostics::{ErrorContext, GrammarViolation, PegError};
use crate::grammar::syntax::{Grammar, PegDefinition, PegExpression, SemanticAction};
use crate::grammar::RuleId;
use crate::runtime::context::Captures;
use std::sync::Arc;

struct RuleSlot<V> {
    name: String,
    definition: Option<PegDefinition<V>>,
}

/// Assembles a [`Grammar`] rule by rule.
pub struct GrammarBuilder<V> {
    slots: Vec<RuleSlot<V>>,
}

impl<V> GrammarBuilder<V> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Reserves an identity for a rule whose body comes later.
    pub fn declare(&mut self, name: impl Into<String>) -> RuleId {
        let id = RuleId(self.slots.len());
        self.slots.push(RuleSlot {
            name: name.into(),
            definition: None,
        });
        id
    }

    /// Supplies the body and semantic action of a previously declared rule.
    pub fn define(
        &mut self,
        id: RuleId,
        body: impl Into<PegExpression>,
        action: impl for<'s> Fn(&Captures<'s, V>) -> V + Send + Sync + 'static,
    ) {
        let slot = self
            .slots
            .get_mut(id.0)
            .unwrap_or_else(|| panic!("{id} does not belong to this builder"));
        assert!(
            slot.definition.is_none(),
            "rule `{}` is already defined",
            slot.name
        );
        let action: SemanticAction<V> = Arc::new(action);
        slot.definition = Some(PegDefinition::new(slot.name.clone(), body.into(), action));
    }

    /// Declares and defines a rule in one step.
    pub fn rule(
        &mut self,
        name: impl Into<String>,
        body: impl Into<PegExpression>,
        action: impl for<'s> Fn(&Captures<'s, V>) -> V + Send + Sync + 'static,
    ) -> RuleId {
        let id = self.declare(name);
        self.define(id, body, action);
        id
    }

    /// Seals the grammar. Every declared rule must have received a body.
    pub fn finish(self) -> Result<Grammar<V>, PegError> {
        let mut rules = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            match slot.definition {
                Some(definition) => rules.push(definition),
                None => {
                    return Err(PegError::Grammar {
                        violation: GrammarViolation::UndefinedRule { name: slot.name },
                        ctx: ErrorContext::default(),
                    })
                }
            }
        }
        Ok(Grammar::from_rules(rules))
    }
}

impl<V> Default for GrammarBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}
