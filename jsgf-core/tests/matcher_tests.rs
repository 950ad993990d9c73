mod common;

use common::*;
use jsgf_core::{Expansion, Grammar, MatcherBuildError, TokenSpan, Walk};

#[test]
fn test_literal_full_match() {
    let mut rule = public_rule("hello", lit("hello world"));
    assert!(rule.matches("hello world").unwrap());
    assert!(rule.matches("  hello   world ").unwrap());
    assert!(!rule.matches("hello").unwrap());
    assert!(!rule.matches("hello world again").unwrap());
    assert!(!rule.matches("").unwrap());
}

#[test]
fn test_no_partial_word_matches() {
    let mut rule = public_rule("hello", lit("hello"));
    assert!(!rule.matches("hellothere").unwrap());
    assert!(!rule.matches("shello").unwrap());
}

#[test]
fn test_optional_grouping() {
    let mut rule = public_rule("stop", seq(vec![opt(lit("please")), lit("stop")]));
    assert!(rule.matches("please stop").unwrap());
    assert!(rule.matches("stop").unwrap());
    assert!(!rule.matches("please").unwrap());
}

#[test]
fn test_kleene_star() {
    let mut rule = public_rule("go", star(lit("go")));
    assert!(rule.matches("").unwrap());
    assert!(rule.matches("go").unwrap());
    assert!(rule.matches("go go").unwrap());
    assert!(!rule.matches("go stop").unwrap());
}

#[test]
fn test_repeat_requires_one() {
    let mut rule = public_rule("go", plus(lit("go")));
    assert!(!rule.matches("").unwrap());
    assert!(rule.matches("go").unwrap());
    assert!(rule.matches("go go go").unwrap());
}

#[test]
fn test_repeat_greedy_with_retreat() {
    // The repeat consumes two of the three tokens, giving the last one back
    // to the trailing literal.
    let e = seq(vec![plus(lit("a")), lit("a")]);
    let repeat_node = e.children(e.root())[0];
    let literal_node = e.children(e.root())[1];
    let mut rule = public_rule("r", e);

    assert!(rule.matches("a a a").unwrap());
    let exp = rule.expansion();
    assert_eq!(exp.match_span(repeat_node), Some(TokenSpan::new(0, 2)));
    assert_eq!(exp.match_span(literal_node), Some(TokenSpan::new(2, 3)));
    assert_eq!(
        exp.repeat_spans(repeat_node),
        &[TokenSpan::new(0, 1), TokenSpan::new(1, 2)]
    );
}

#[test]
fn test_alternatives_in_declaration_order() {
    let e = alt(vec![lit("hi"), lit("hi there")]);
    let alt_node = e.root();
    let mut rule = public_rule("r", e);

    // The first alternative fails to cover the input, so the second wins.
    assert!(rule.matches("hi there").unwrap());
    assert_eq!(
        rule.expansion().match_span(alt_node),
        Some(TokenSpan::new(0, 2))
    );
}

#[test]
fn test_null_and_void() {
    let mut rule = public_rule("r", seq(vec![Expansion::null_ref(), lit("x")]));
    assert!(rule.matches("x").unwrap());

    let mut never = public_rule("r", seq(vec![Expansion::void_ref(), lit("x")]));
    assert!(!never.matches("x").unwrap());
}

#[test]
fn test_case_policy() {
    let mut rule = public_rule("r", lit("Hello"));
    // Case-insensitive by default.
    assert!(rule.matches("hello").unwrap());

    rule.set_case_sensitivity(Some(true));
    assert!(!rule.matches("hello").unwrap());
    assert!(rule.matches("Hello").unwrap());

    rule.set_case_sensitivity(Some(false));
    assert!(rule.matches("HELLO").unwrap());
}

#[test]
fn test_grammar_case_default_cascades() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar.set_case_sensitive(true);
    grammar.add_rule(public_rule("r", lit("Hello"))).unwrap();
    assert!(grammar.find_matching_rules("hello").unwrap().is_empty());
    assert_eq!(grammar.find_matching_rules("Hello").unwrap().len(), 1);

    // The rule flag overrides the grammar flag.
    grammar
        .get_rule_mut("r")
        .unwrap()
        .set_case_sensitivity(Some(false));
    assert_eq!(grammar.find_matching_rules("hello").unwrap().len(), 1);
}

#[test]
fn test_span_coverage() {
    let e = seq(vec![lit("turn"), alt(vec![lit("left"), lit("right")])]);
    let mut rule = public_rule("turn", e);
    assert!(rule.matches("turn left").unwrap());

    let exp = rule.expansion();
    let root_span = exp.match_span(exp.root()).unwrap();
    assert_eq!(root_span, TokenSpan::new(0, 2));

    // Every participating node's span nests inside its parent's; sequence
    // children are contiguous.
    exp.walk(&mut |id| {
        if let (Some(span), Some(parent)) = (exp.match_span(id), exp.parent(id)) {
            let parent_span = exp.match_span(parent).expect("parents participate");
            assert!(span.within(&parent_span));
        }
        Walk::Continue
    });
    let children = exp.children(exp.root());
    assert_eq!(exp.match_span(children[0]), Some(TokenSpan::new(0, 1)));
    assert_eq!(exp.match_span(children[1]), Some(TokenSpan::new(1, 2)));
}

#[test]
fn test_spans_cleared_between_attempts() {
    let mut rule = public_rule("r", lit("hello"));
    assert!(rule.matches("hello").unwrap());
    assert!(rule.was_matched());

    assert!(!rule.matches("goodbye").unwrap());
    assert!(!rule.was_matched());
}

#[test]
fn test_unmatched_branches_carry_no_span() {
    let e = alt(vec![lit("left"), lit("right")]);
    let left = e.children(e.root())[0];
    let right = e.children(e.root())[1];
    let mut rule = public_rule("r", e);

    assert!(rule.matches("right").unwrap());
    assert_eq!(rule.expansion().match_span(left), None);
    assert!(rule.expansion().match_span(right).is_some());
}

#[test]
fn test_rule_references_through_grammar() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(private_rule("word", alt(vec![lit("hello"), lit("hi")])))
        .unwrap();
    grammar
        .add_rule(public_rule(
            "greeting",
            seq(vec![rule_ref("word"), lit("world")]),
        ))
        .unwrap();

    let matched = grammar.find_matching_rules("hi world").unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name(), "greeting");

    // Private rules are not matched directly.
    assert!(grammar.find_matching_rules("hi").unwrap().is_empty());
}

#[test]
fn test_unresolved_reference_is_an_error() {
    let mut rule = public_rule("r", rule_ref("missing"));
    assert!(matches!(
        rule.matches("anything"),
        Err(MatcherBuildError::Reference(_))
    ));
}

#[test]
fn test_recursive_rule_bounded_by_input() {
    // <count> = a [<count>] consumes one token per level.
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(public_rule(
            "count",
            seq(vec![lit("a"), opt(rule_ref("count"))]),
        ))
        .unwrap();

    assert_eq!(grammar.find_matching_rules("a").unwrap().len(), 1);
    assert_eq!(grammar.find_matching_rules("a a a a").unwrap().len(), 1);
    assert!(grammar.find_matching_rules("b").unwrap().is_empty());
}

#[test]
fn test_direct_left_recursion_rejected() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(public_rule(
            "bad",
            seq(vec![opt(rule_ref("bad")), lit("a")]),
        ))
        .unwrap();
    assert!(matches!(
        grammar.find_matching_rules("a"),
        Err(MatcherBuildError::LeftRecursion(name)) if name == "bad"
    ));
}

#[test]
fn test_dictation_consumes_trailing_tokens() {
    let e = seq(vec![lit("note"), dict()]);
    let dictation_node = e.children(e.root())[1];
    let mut rule = public_rule("note", e);

    assert!(rule.matches("note buy more milk").unwrap());
    assert_eq!(
        rule.expansion()
            .matched_text(dictation_node, "note buy more milk"),
        Some("buy more milk".to_string())
    );
    // Dictation needs at least one token.
    assert!(!rule.matches("note").unwrap());
}

#[test]
fn test_dictation_stops_at_following_literal() {
    let e = seq(vec![lit("say"), dict(), lit("stop")]);
    let dictation_node = e.children(e.root())[1];
    let mut rule = public_rule("say", e);

    assert!(rule.matches("say one two stop").unwrap());
    assert_eq!(
        rule.expansion().match_span(dictation_node),
        Some(TokenSpan::new(1, 3))
    );
    assert!(!rule.matches("say stop").unwrap());
}

#[test]
fn test_find_matching_part_returns_tagged_node_and_tail() {
    let mut e = seq(vec![lit("hello"), lit("world")]);
    let second = e.children(e.root())[1];
    e.add_tag(second, "target");
    let mut rule = public_rule("greet", e);

    let (node, tail) = rule
        .find_matching_part("hello world how are you")
        .unwrap()
        .expect("prefix should match");
    assert_eq!(tail, "how are you");
    assert_eq!(rule.expansion().tags(node), ["target".to_string()]);
    assert_eq!(rule.matched_tags(), ["target".to_string()]);
}

#[test]
fn test_find_matching_part_no_match() {
    let mut rule = public_rule("greet", lit("hello"));
    assert!(rule.find_matching_part("goodbye").unwrap().is_none());
}

#[test]
fn test_tags_collected_on_match() {
    let mut yes = lit("yes");
    yes.add_tag(yes.root(), "affirm");
    let mut no = lit("no");
    no.add_tag(no.root(), "deny");
    let mut rule = public_rule("answer", alt(vec![yes, no]));

    assert!(rule.matches("no").unwrap());
    assert_eq!(rule.matched_tags(), ["deny".to_string()]);
}

#[test]
fn test_matcher_cache_rebuilds_after_mutation() {
    let mut rule = public_rule("r", lit("hello"));
    assert!(rule.matches("hello").unwrap());

    let root = rule.expansion().root();
    rule.expansion_mut()
        .set_literal_text(root, "goodbye")
        .unwrap();
    assert!(!rule.matches("hello").unwrap());
    assert!(rule.matches("goodbye").unwrap());
}

#[test]
fn test_grammar_revision_invalidates_matchers() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(public_rule("greeting", rule_ref("word")))
        .unwrap();
    grammar
        .add_rule(private_rule("word", lit("hello")))
        .unwrap();
    assert_eq!(grammar.find_matching_rules("hello").unwrap().len(), 1);

    // Replacing the referenced rule changes what the reference matches.
    grammar.remove_rule("word", true).unwrap();
    grammar
        .add_rule(private_rule("word", lit("goodbye")))
        .unwrap();
    assert!(grammar.find_matching_rules("hello").unwrap().is_empty());
    assert_eq!(grammar.find_matching_rules("goodbye").unwrap().len(), 1);
}
