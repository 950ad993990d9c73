//! Predicates and tree rewrites for dictation-bearing expansions.

use std::collections::VecDeque;

use crate::types::errors::GrammarError;
use crate::types::expansion::{Expansion, NodeId, NodeKind};

/// Ceiling on the number of trees [`expand_dictation_expansion`] may
/// produce. Each optional wrapping dictation doubles the variant count, so
/// runaway grammars are cut off with a clear error instead of exploding.
pub const MAX_DICTATION_VARIANTS: usize = 32;

/// Whether the tree contains a dictation node anywhere.
pub fn contains_dictation(exp: &Expansion) -> bool {
    subtree_contains_dictation(exp, exp.root())
}

/// Whether the tree is free of dictation nodes.
pub fn is_dictation_free(exp: &Expansion) -> bool {
    !contains_dictation(exp)
}

/// Whether every leaf of the tree is a dictation node.
pub fn is_dictation_only(exp: &Expansion) -> bool {
    let leaves = exp.leaves();
    !leaves.is_empty()
        && leaves
            .iter()
            .all(|id| matches!(exp.kind(*id), NodeKind::Dictation))
}

fn subtree_contains_dictation(exp: &Expansion, id: NodeId) -> bool {
    let mut found = false;
    let mut check = |exp: &Expansion, node: NodeId| {
        if matches!(exp.kind(node), NodeKind::Dictation) {
            found = true;
        }
    };
    walk_subtree(exp, id, &mut check);
    found
}

fn walk_subtree(exp: &Expansion, id: NodeId, f: &mut impl FnMut(&Expansion, NodeId)) {
    f(exp, id);
    for child in exp.children(id) {
        walk_subtree(exp, *child, f);
    }
}

/// Enumerates the trees arising from the present/absent choice of every
/// optional construct wrapping dictation, and splits alternative sets that
/// mix dictation and plain alternatives.
///
/// A dictation-free tree expands to itself. The result never exceeds
/// [`MAX_DICTATION_VARIANTS`] trees.
pub fn expand_dictation_expansion(exp: &Expansion) -> Result<Vec<Expansion>, GrammarError> {
    let mut result: Vec<Expansion> = Vec::new();
    let mut queue: VecDeque<Expansion> = VecDeque::new();
    queue.push_back(exp.clone());

    while let Some(tree) = queue.pop_front() {
        match first_unprocessed(&tree) {
            None => {
                if !result.contains(&tree) {
                    result.push(tree);
                }
            }
            Some(id) => {
                for variant in process_node(&tree, id)? {
                    queue.push_back(variant);
                }
            }
        }
        let pending = result.len() + queue.len();
        if pending > MAX_DICTATION_VARIANTS {
            return Err(GrammarError::TooManyExpansions {
                count: pending,
                limit: MAX_DICTATION_VARIANTS,
            });
        }
    }
    Ok(result)
}

/// The first node, children before parents, that still needs rewriting.
fn first_unprocessed(exp: &Expansion) -> Option<NodeId> {
    let mut found = None;
    exp.walk_post(&mut |id| {
        if found.is_none() && needs_processing(exp, id) {
            found = Some(id);
        }
    });
    found
}

fn needs_processing(exp: &Expansion, id: NodeId) -> bool {
    match exp.kind(id) {
        NodeKind::AlternativeSet { .. } => {
            let mut dictation_alts = 0;
            let mut plain_alts = 0;
            for child in exp.children(id) {
                if subtree_contains_dictation(exp, *child) {
                    dictation_alts += 1;
                } else {
                    plain_alts += 1;
                }
            }
            // Mixed sets and sets with several dictation alternatives must
            // be split so each variant is uniform.
            (plain_alts > 0 && dictation_alts > 0) || dictation_alts > 1
        }
        NodeKind::OptionalGrouping | NodeKind::KleeneStar => {
            if subtree_contains_dictation(exp, id) {
                return true;
            }
            // A dictation-free optional inside a sequence that carries
            // dictation elsewhere still doubles: its presence changes where
            // the dictation parts split.
            let mut scope = id;
            loop {
                if matches!(
                    exp.kind(scope),
                    NodeKind::Sequence | NodeKind::RequiredGrouping
                ) {
                    break;
                }
                match exp.parent(scope) {
                    Some(parent) => scope = parent,
                    None => break,
                }
            }
            matches!(
                exp.kind(scope),
                NodeKind::Sequence | NodeKind::RequiredGrouping
            ) && subtree_contains_dictation(exp, scope)
        }
        _ => false,
    }
}

/// Rewrites one unprocessed node into its variant trees.
fn process_node(exp: &Expansion, id: NodeId) -> Result<Vec<Expansion>, GrammarError> {
    let mut variants = Vec::new();
    match exp.kind(id) {
        NodeKind::AlternativeSet { .. } => {
            let mut plain: Vec<Expansion> = Vec::new();
            let mut dictation: Vec<Expansion> = Vec::new();
            for child in exp.children(id) {
                let sub = exp.subtree(*child);
                if contains_dictation(&sub) {
                    dictation.push(sub);
                } else {
                    plain.push(sub);
                }
            }
            let mut replacements: Vec<Expansion> = Vec::new();
            if plain.len() == 1 {
                replacements.push(plain.pop().expect("one plain alternative"));
            } else if plain.len() > 1 {
                replacements.push(Expansion::alternatives(plain));
            }
            replacements.extend(dictation);
            for replacement in replacements {
                let mut copy = exp.clone();
                copy.replace(id, replacement);
                variants.push(copy);
            }
        }
        NodeKind::OptionalGrouping | NodeKind::KleeneStar => {
            if let Some(absent) = remove_for_absent(exp, id) {
                variants.push(absent);
            }
            let child = exp.children(id)[0];
            let child_sub = exp.subtree(child);
            let replacement = match exp.kind(id) {
                NodeKind::OptionalGrouping => child_sub,
                _ => Expansion::repeat(child_sub),
            };
            let mut copy = exp.clone();
            copy.replace(id, replacement);
            variants.push(copy);
        }
        other => {
            return Err(GrammarError::InvalidOperation(format!(
                "cannot expand {other:?}"
            )))
        }
    }
    Ok(variants)
}

/// A copy of the tree with `target` removed, or `None` when removal would
/// leave nothing. The removal climbs to the nearest ancestor with siblings
/// so no single-child wrapper is left empty.
fn remove_for_absent(exp: &Expansion, target: NodeId) -> Option<Expansion> {
    let mut copy = exp.clone();
    let mut current = target;
    loop {
        let parent = copy.parent(current)?;
        if copy.children(parent).len() > 1 {
            let index = copy
                .children(parent)
                .iter()
                .position(|c| *c == current)
                .expect("parent links its children");
            let weights = match copy.kind(parent) {
                NodeKind::AlternativeSet {
                    weights: Some(weights),
                } => {
                    let mut weights = weights.clone();
                    weights.remove(index);
                    Some(weights)
                }
                _ => None,
            };
            copy.remove_child(parent, index)
                .expect("index is in bounds");
            if let Some(weights) = weights {
                copy.set_weights(parent, weights)
                    .expect("one weight per remaining alternative");
            }
            return Some(copy);
        }
        current = parent;
    }
}
