//! Tag scoping for semantic-value construction.
//!
//! Entering a rule pushes a fresh [`ParserContext`]; groups and sequence
//! elements inside that rule share it. When the rule body succeeds the
//! context is frozen into [`Captures`] and handed to the semantic action,
//! then discarded. Registering the same tag twice inside one invocation is
//! a grammar bug, not a parse failure.

use std::collections::HashMap;

use crate::diagnostics::GrammarViolation;
use crate::grammar::Tag;
use crate::runtime::ParsingResult;

/// The mutable tag scope of one rule invocation.
#[derive(Debug)]
pub struct ParserContext<'s, V> {
    scope: String,
    tags: HashMap<Tag, ParsingResult<'s, V>>,
}

impl<'s, V> ParserContext<'s, V> {
    /// A fresh, empty scope. `scope` names the enclosing rule and only
    /// surfaces in violation diagnostics.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            tags: HashMap::new(),
        }
    }

    /// Registers `result` under `tag` in this scope.
    pub fn tagging(
        &mut self,
        tag: Tag,
        result: ParsingResult<'s, V>,
    ) -> Result<(), GrammarViolation> {
        if self.tags.contains_key(&tag) {
            return Err(GrammarViolation::DuplicateTag {
                tag,
                scope: self.scope.clone(),
            });
        }
        self.tags.insert(tag, result);
        Ok(())
    }

    /// Looks up a previously registered result.
    pub fn tagged(&self, tag: &str) -> Option<&ParsingResult<'s, V>> {
        self.tags.get(tag)
    }

    /// Freezes this scope for the semantic action, recording the full span
    /// the rule body consumed.
    pub fn into_captures(self, matched: &'s str) -> Captures<'s, V> {
        Captures {
            matched,
            tags: self.tags,
        }
    }
}

/// The read-only view a semantic action receives: the whole span the rule
/// consumed plus every tagged sub-result.
#[derive(Debug)]
pub struct Captures<'s, V> {
    matched: &'s str,
    tags: HashMap<Tag, ParsingResult<'s, V>>,
}

impl<'s, V> Captures<'s, V> {
    /// The full text the rule body consumed.
    pub fn matched(&self) -> &'s str {
        self.matched
    }

    /// The tagged result, if the tag was registered during this invocation.
    pub fn tagged(&self, tag: &str) -> Option<&ParsingResult<'s, V>> {
        self.tags.get(tag)
    }

    /// The raw span of a tagged result, if it was never constructed.
    pub fn raw(&self, tag: &str) -> Option<&'s str> {
        self.tagged(tag).and_then(ParsingResult::matched)
    }

    /// The constructed value of a tagged result, if any.
    pub fn value(&self, tag: &str) -> Option<&V> {
        self.tagged(tag).and_then(ParsingResult::value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::source::ParserSource;

    #[test]
    fn duplicate_registration_is_a_violation() {
        let source = ParserSource::new("x");
        let mut context = ParserContext::<()>::new("pair");
        context
            .tagging(Tag::from("lhs"), ParsingResult::raw("x", source))
            .unwrap();
        let err = context
            .tagging(Tag::from("lhs"), ParsingResult::raw("x", source))
            .unwrap_err();
        let GrammarViolation::DuplicateTag { tag, scope } = err else {
            panic!("expected a duplicate-tag violation");
        };
        assert_eq!(tag.as_str(), "lhs");
        assert_eq!(scope, "pair");
    }

    #[test]
    fn captures_expose_raw_and_constructed_results() {
        let source = ParserSource::new("42");
        let mut context = ParserContext::<i64>::new("sum");
        context
            .tagging(Tag::from("n"), ParsingResult::raw("42", source))
            .unwrap();
        context
            .tagging(Tag::from("v"), ParsingResult::constructed(7, source))
            .unwrap();
        let captures = context.into_captures("42");
        assert_eq!(captures.matched(), "42");
        assert_eq!(captures.raw("n"), Some("42"));
        assert_eq!(captures.value("v"), Some(&7));
        assert!(captures.raw("v").is_none());
        assert!(captures.tagged("missing").is_none());
    }
}
