mod common;

use common::*;
use jsgf_core::ext::{expand_dictation_expansion, SequenceRule, MAX_DICTATION_VARIANTS};
use jsgf_core::{Expansion, GrammarError};

#[test]
fn test_sequence_rule_requires_dictation() {
    let rule = public_rule("plain", lit("hello"));
    assert!(matches!(
        SequenceRule::new(&rule),
        Err(GrammarError::NoDictation(name)) if name == "plain"
    ));
}

#[test]
fn test_basic_progression() {
    let rule = public_rule("greet", seq(vec![lit("hello"), dict()]));
    let mut sequence = SequenceRule::new(&rule).unwrap();

    assert_eq!(sequence.current_index(), 0);
    assert!(sequence.matches("hello").unwrap());
    assert!(sequence.entire_match().is_none());
    assert!(sequence.has_next_part());

    sequence.set_next();
    assert_eq!(sequence.current_index(), 1);
    assert!(sequence.current_is_dictation_only());
    assert!(sequence.matches("world").unwrap());
    assert_eq!(sequence.entire_match(), Some("hello world".to_string()));
}

#[test]
fn test_split_fidelity_against_unsplit_rule() {
    // Fragment-by-fragment matching accumulates the same text the unsplit
    // rule accepts in one utterance.
    let expansion = seq(vec![lit("send message"), dict(), lit("now")]);
    let mut whole = public_rule("send", expansion.clone());
    assert!(whole.matches("send message feed the cat now").unwrap());

    let mut sequence = SequenceRule::new(&public_rule("send", expansion)).unwrap();
    assert!(sequence.matches("send message").unwrap());
    sequence.set_next();
    assert!(sequence.matches("feed the cat").unwrap());
    sequence.set_next();
    assert!(sequence.matches("now").unwrap());
    assert_eq!(
        sequence.entire_match(),
        Some("send message feed the cat now".to_string())
    );
}

#[test]
fn test_refuse_matches_past_the_end_and_restart() {
    let rule = public_rule("greet", seq(vec![lit("hello"), dict()]));
    let mut sequence = SequenceRule::new(&rule).unwrap();

    assert!(sequence.matches("hello").unwrap());
    sequence.set_next();
    assert!(sequence.matches("there").unwrap());
    assert!(!sequence.refuse_matches());

    // Advancing past the last part refuses further matches; there is no
    // wrap-around to the first part.
    sequence.set_next();
    assert!(sequence.refuse_matches());
    assert!(!sequence.matches("hello").unwrap());

    sequence.restart_dictation_context();
    assert_eq!(sequence.current_index(), 0);
    assert!(!sequence.refuse_matches());
    assert!(sequence.entire_match().is_none());
    assert!(sequence.matches("hello").unwrap());
}

#[test]
fn test_failed_fragment_leaves_progression_intact() {
    let rule = public_rule("greet", seq(vec![lit("hello"), dict()]));
    let mut sequence = SequenceRule::new(&rule).unwrap();

    assert!(!sequence.matches("wrong words").unwrap());
    // The failure did not consume the progression.
    assert!(sequence.matches("hello").unwrap());
}

#[test]
fn test_optional_dictation_variants_run_in_parallel() {
    // greet = hello [<DICTATION>]: one variant stops after "hello", the
    // other expects dictation next.
    let rule = public_rule("greet", seq(vec![lit("hello"), opt(dict())]));
    let mut sequence = SequenceRule::new(&rule).unwrap();

    assert!(sequence.matches("hello").unwrap());
    // The optional-absent variant is already complete.
    assert_eq!(sequence.entire_match(), Some("hello".to_string()));

    sequence.set_next();
    assert!(!sequence.refuse_matches());
    assert!(sequence.matches("some words").unwrap());
    assert_eq!(sequence.entire_match(), Some("hello some words".to_string()));
}

#[test]
fn test_branch_pruning() {
    // answer = (yes | <DICTATION>) now: the plain variant and the dictation
    // variant both try the first fragment; a non-"yes" fragment prunes the
    // plain one.
    let rule = public_rule(
        "answer",
        seq(vec![alt(vec![lit("yes"), dict()]), lit("now")]),
    );
    let mut sequence = SequenceRule::new(&rule).unwrap();

    assert!(sequence.matches("definitely maybe").unwrap());
    sequence.set_next();
    assert!(sequence.matches("now").unwrap());
    assert_eq!(
        sequence.entire_match(),
        Some("definitely maybe now".to_string())
    );
}

#[test]
fn test_expansion_variant_ceiling() {
    // Seven optional dictations want 2^7 variants, past the ceiling.
    let children: Vec<Expansion> = (0..7).map(|_| opt(dict())).collect();
    let rule = public_rule("big", seq(children));
    assert!(matches!(
        SequenceRule::new(&rule),
        Err(GrammarError::TooManyExpansions { limit, .. }) if limit == MAX_DICTATION_VARIANTS
    ));
}

#[test]
fn test_expand_plain_alternatives_kept_together() {
    let e = seq(vec![
        alt(vec![lit("open"), lit("close"), dict()]),
        lit("sesame"),
    ]);
    let variants = expand_dictation_expansion(&e).unwrap();
    assert_eq!(variants.len(), 2);
    assert_eq!(
        variants[0],
        seq(vec![alt(vec![lit("open"), lit("close")]), lit("sesame")])
    );
    assert_eq!(variants[1], seq(vec![dict(), lit("sesame")]));
}

#[test]
fn test_compile_emits_only_plain_parts() {
    let rule = public_rule("greet", seq(vec![lit("hello"), dict()]));
    let mut sequence = SequenceRule::new(&rule).unwrap();

    assert_eq!(sequence.compile().unwrap(), "public <greet> = hello;");

    assert!(sequence.matches("hello").unwrap());
    sequence.set_next();
    // The current part is now dictation-only.
    assert_eq!(sequence.compile().unwrap(), "");
}
