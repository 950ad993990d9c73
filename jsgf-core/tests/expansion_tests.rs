mod common;

use common::*;
use jsgf_core::{Expansion, GrammarError, NodeKind, Walk};

/// Every node's parent is the unique node whose child list contains it.
fn assert_parent_invariant(exp: &Expansion) {
    exp.walk(&mut |id| {
        for &child in exp.children(id) {
            assert_eq!(exp.parent(child), Some(id));
        }
        Walk::Continue
    });
    assert_eq!(exp.parent(exp.root()), None);
}

#[test]
fn test_parent_invariant_after_builders() {
    let e = seq(vec![
        lit("turn"),
        alt(vec![lit("left"), lit("right")]),
        opt(lit("now")),
        plus(req(vec![lit("again")])),
    ]);
    assert_parent_invariant(&e);
}

#[test]
fn test_parent_invariant_after_mutations() {
    let mut e = seq(vec![lit("a"), lit("b")]);
    let root = e.root();
    e.add_child(root, lit("c")).unwrap();
    e.insert_child(root, 0, lit("z")).unwrap();
    assert_parent_invariant(&e);

    let detached = e.remove_child(root, 1).unwrap();
    assert_eq!(detached, lit("a"));
    assert_parent_invariant(&e);
    assert_parent_invariant(&detached);

    let second = e.children(root)[1];
    e.replace(second, opt(lit("maybe")));
    assert_parent_invariant(&e);
    assert_eq!(
        e,
        seq(vec![lit("z"), opt(lit("maybe")), lit("c")])
    );
}

#[test]
fn test_subtree_copies_are_independent() {
    let e = seq(vec![lit("hello"), opt(lit("there"))]);
    let optional = e.children(e.root())[1];
    let mut copy = e.subtree(optional);
    assert_eq!(copy, opt(lit("there")));
    assert_eq!(copy.parent(copy.root()), None);

    // Mutating the copy leaves the original untouched.
    let inner = copy.children(copy.root())[0];
    copy.replace(inner, lit("friend"));
    assert_eq!(e.children(e.root()).len(), 2);
    assert_eq!(e.subtree(optional), opt(lit("there")));
}

#[test]
fn test_weights_arity_is_checked() {
    let mut e = alt(vec![lit("yes"), lit("no")]);
    let root = e.root();
    assert!(matches!(
        e.set_weights(root, vec![0.5]),
        Err(GrammarError::InvalidOperation(_))
    ));
    e.set_weights(root, vec![0.5, 0.5]).unwrap();
}

#[test]
fn test_weights_only_on_alternative_sets() {
    let mut e = lit("hello");
    let root = e.root();
    assert!(e.set_weights(root, vec![1.0]).is_err());
}

#[test]
fn test_tags_preserved_in_equality() {
    let mut a = lit("hello");
    let mut b = lit("hello");
    a.add_tag(a.root(), "greeting");
    assert_ne!(a, b);
    b.add_tag(b.root(), "greeting");
    assert_eq!(a, b);
}

#[test]
fn test_leaves_and_filter() {
    let e = seq(vec![lit("a"), opt(lit("b")), rule_ref("other")]);
    assert_eq!(e.leaves().len(), 3);
    let literals = e.filter(|tree, id| matches!(tree.kind(id), NodeKind::Literal { .. }));
    assert_eq!(literals.len(), 2);
}

#[test]
fn test_single_child_kind_preserved() {
    // A required grouping with one child stays a grouping; flattening it
    // would change how later mutations bind.
    let e = req(vec![lit("hello")]);
    assert!(matches!(e.kind(e.root()), NodeKind::RequiredGrouping));
    assert_eq!(e.children(e.root()).len(), 1);
}

#[test]
fn test_literal_leaves_reject_children() {
    let mut e = lit("hello");
    let root = e.root();
    assert!(matches!(
        e.add_child(root, lit("x")),
        Err(GrammarError::InvalidOperation(_))
    ));
}
