// tests/engine_tests.rs
//
// End-to-end grammars: semantic actions over tagged captures, packrat
// memoization, grammar violations, tracing, and shared-parser concurrency.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use peggen::{
    Captures, GrammarBuilder, GrammarViolation, Parser, PegExpression, PegPrimary, PegSequence,
    PegSuffix, TraceEvent,
};

fn digits() -> PegPrimary {
    PegPrimary::class('0'..='9')
}

#[test]
fn a_rule_constructs_its_value_from_the_matched_span() {
    let mut builder = GrammarBuilder::new();
    let number = builder.rule(
        "number",
        PegSuffix::plus(digits()),
        |c: &Captures<'_, i64>| c.matched().parse().unwrap_or(0),
    );
    let parser = Parser::for_rule(builder.finish().unwrap(), number);

    let result = parser.parse("42rest").unwrap();
    assert_eq!(result.value(), Some(&42));
    assert_eq!(result.rest().rest(), "rest");
}

#[test]
fn composite_rules_assemble_values_from_tagged_captures() {
    let mut builder = GrammarBuilder::new();
    let number = builder.rule(
        "number",
        PegSuffix::plus(digits()),
        |c: &Captures<'_, i64>| c.matched().parse().unwrap_or(0),
    );
    let sum = builder.rule(
        "sum",
        PegSequence::of(vec![
            PegSuffix::once(PegPrimary::identifier(number))
                .tagged("lhs")
                .into(),
            PegPrimary::literal("+").into(),
            PegSuffix::once(PegPrimary::identifier(number))
                .tagged("rhs")
                .into(),
        ]),
        |c: &Captures<'_, i64>| {
            c.value("lhs").copied().unwrap_or(0) + c.value("rhs").copied().unwrap_or(0)
        },
    );
    let parser = Parser::for_rule(builder.finish().unwrap(), sum);

    let result = parser.parse("12+30").unwrap();
    assert_eq!(result.value(), Some(&42));
    assert!(result.rest().is_empty());
}

#[test]
fn memoization_runs_the_semantic_action_once_per_position() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    let mut builder = GrammarBuilder::new();
    let word = builder.rule("word", PegPrimary::literal("ab"), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    // Both alternatives re-parse `word` at offset zero; the second attempt
    // must come out of the cache.
    let start = PegExpression::choice(vec![
        PegSequence::of(vec![
            PegPrimary::identifier(word).into(),
            PegPrimary::literal("X").into(),
        ]),
        PegSequence::of(vec![
            PegPrimary::identifier(word).into(),
            PegPrimary::literal("Y").into(),
        ]),
    ]);
    let parser = Parser::new(builder.finish().unwrap(), start);

    let (result, events) = parser.parse_traced("abY");
    assert!(result.is_ok());
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let attempts = events
        .iter()
        .filter(|e| matches!(e, TraceEvent::Attempt { rule, .. } if rule == "word"))
        .count();
    let cache_hits = events
        .iter()
        .filter(|e| matches!(e, TraceEvent::CacheHit { rule, .. } if rule == "word"))
        .count();
    assert_eq!(attempts, 1);
    assert_eq!(cache_hits, 1);
}

#[test]
fn failed_rules_are_memoized_too() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    let mut builder = GrammarBuilder::new();
    let word = builder.rule("word", PegPrimary::literal("zz"), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let start = PegExpression::choice(vec![
        PegSequence::of(vec![
            PegPrimary::identifier(word).into(),
            PegPrimary::literal("X").into(),
        ]),
        PegSequence::of(vec![
            PegPrimary::identifier(word).into(),
            PegPrimary::literal("Y").into(),
        ]),
        PegPrimary::literal("ab").into(),
    ]);
    let parser = Parser::new(builder.finish().unwrap(), start);

    let (result, events) = parser.parse_traced("ab");
    assert!(result.is_ok());
    // The body never matched, so the action never ran; the second
    // alternative saw the cached failure.
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    let failures = events
        .iter()
        .filter(|e| matches!(e, TraceEvent::Failure { rule, .. } if rule == "word"))
        .count();
    let cache_hits = events
        .iter()
        .filter(|e| matches!(e, TraceEvent::CacheHit { rule, .. } if rule == "word"))
        .count();
    assert_eq!(failures, 1);
    assert_eq!(cache_hits, 1);
}

#[test]
fn duplicate_tags_abort_the_parse() {
    let mut builder = GrammarBuilder::new();
    let pair = builder.rule(
        "pair",
        PegSequence::of(vec![
            PegSuffix::once(PegPrimary::literal("a")).tagged("x").into(),
            PegSuffix::once(PegPrimary::literal("b")).tagged("x").into(),
        ]),
        |_| (),
    );
    let parser = Parser::for_rule(builder.finish().unwrap(), pair);

    let err = parser.parse("ab").unwrap_err();
    let Some(GrammarViolation::DuplicateTag { tag, scope }) = err.violation() else {
        panic!("expected a duplicate-tag violation, got {err:?}");
    };
    assert_eq!(tag.as_str(), "x");
    assert_eq!(scope, "pair");
}

#[test]
fn violations_are_not_absorbed_by_ordered_choice() {
    let mut builder = GrammarBuilder::new();
    let pair = builder.rule(
        "pair",
        PegSequence::of(vec![
            PegSuffix::once(PegPrimary::literal("a")).tagged("x").into(),
            PegSuffix::once(PegPrimary::literal("b")).tagged("x").into(),
        ]),
        |_| (),
    );
    // The second alternative would match, but the violation in the first
    // is fatal, not a backtrackable failure.
    let start = PegExpression::choice(vec![
        PegPrimary::identifier(pair).into(),
        PegPrimary::literal("ab").into(),
    ]);
    let parser = Parser::new(builder.finish().unwrap(), start);

    let err = parser.parse("ab").unwrap_err();
    assert!(matches!(
        err.violation(),
        Some(GrammarViolation::DuplicateTag { .. })
    ));
}

#[test]
fn left_recursion_fails_fast_instead_of_recursing() {
    let mut builder = GrammarBuilder::new();
    let expr = builder.declare("expr");
    builder.define(
        expr,
        PegExpression::choice(vec![
            PegSequence::of(vec![
                PegPrimary::identifier(expr).into(),
                PegPrimary::literal("+").into(),
            ]),
            PegPrimary::literal("n").into(),
        ]),
        |_| (),
    );
    let parser = Parser::for_rule(builder.finish().unwrap(), expr);

    let err = parser.parse("n+n").unwrap_err();
    let Some(GrammarViolation::LeftRecursion { rule, position }) = err.violation() else {
        panic!("expected a left-recursion violation, got {err:?}");
    };
    assert_eq!(rule, "expr");
    assert_eq!(position.offset, 0);
}

#[test]
fn guarded_self_recursion_is_fine() {
    // The self-reference sits behind a consumed literal, so every re-entry
    // happens at a new offset.
    let mut builder = GrammarBuilder::new();
    let list = builder.declare("list");
    builder.define(
        list,
        PegExpression::choice(vec![
            PegSequence::of(vec![
                PegPrimary::literal("n").into(),
                PegPrimary::literal(",").into(),
                PegPrimary::identifier(list).into(),
            ]),
            PegPrimary::literal("n").into(),
        ]),
        |c: &Captures<'_, usize>| c.matched().matches('n').count(),
    );
    let parser = Parser::for_rule(builder.finish().unwrap(), list);

    let result = parser.parse("n,n,n").unwrap();
    assert_eq!(result.value(), Some(&3));
}

#[test]
fn traces_serialize_to_json() {
    let mut builder = GrammarBuilder::new();
    let word = builder.rule("word", PegPrimary::literal("ab"), |_| ());
    let parser = Parser::for_rule(builder.finish().unwrap(), word);

    let (result, events) = parser.parse_traced("ab");
    assert!(result.is_ok());

    let json = serde_json::to_string(&events).unwrap();
    assert!(json.contains("\"kind\":\"attempt\""));
    assert!(json.contains("\"kind\":\"success\""));
    assert!(json.contains("\"rule\":\"word\""));
}

#[test]
fn one_parser_serves_concurrent_parse_calls() {
    let mut builder = GrammarBuilder::new();
    let number = builder.rule(
        "number",
        PegSuffix::plus(digits()),
        |c: &Captures<'_, i64>| c.matched().parse().unwrap_or(0),
    );
    let parser = Parser::for_rule(builder.finish().unwrap(), number);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let parser = &parser;
                scope.spawn(move || {
                    let input = format!("{n}{n}");
                    let expected = input.parse::<i64>().unwrap();
                    let result = parser.parse(&input).unwrap();
                    assert_eq!(result.into_value(), Some(expected));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}

#[test]
fn consecutive_parses_share_no_state() {
    let mut builder = GrammarBuilder::new();
    let word = builder.rule("word", PegPrimary::literal("ab"), |_| ());
    let parser = Parser::for_rule(builder.finish().unwrap(), word);

    assert!(parser.parse("xy").is_err());
    assert!(parser.parse("ab").is_ok());
    assert!(parser.parse("xy").is_err());
}
