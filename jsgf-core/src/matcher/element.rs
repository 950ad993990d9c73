//! Compiling expansion trees into matcher elements.
//!
//! Rule references are not inlined: every referenced rule gets a body slot
//! in the compiled matcher and reference sites point at slots, which keeps
//! recursive grammars finite. Nodes of referenced rules are built without a
//! node id, so only the referencing node records a span.

use std::collections::HashMap;

use log::warn;

use crate::matcher::RuleResolver;
use crate::types::errors::{MatcherBuildError, ReferenceError};
use crate::types::expansion::{Expansion, NodeId, NodeKind};
use crate::types::rules::Rule;

#[derive(Debug, Clone)]
pub(crate) enum Element {
    Literal {
        node: Option<NodeId>,
        words: Vec<String>,
        case_sensitive: bool,
    },
    Sequence {
        node: Option<NodeId>,
        items: Vec<Element>,
    },
    Alternatives {
        node: Option<NodeId>,
        items: Vec<Element>,
    },
    Optional {
        node: Option<NodeId>,
        item: Box<Element>,
    },
    KleeneStar {
        node: Option<NodeId>,
        item: Box<Element>,
    },
    Repeat {
        node: Option<NodeId>,
        item: Box<Element>,
    },
    /// Consumes nothing and succeeds.
    Empty { node: Option<NodeId> },
    /// Never matches.
    Never { node: Option<NodeId> },
    Dictation {
        node: Option<NodeId>,
        /// Nothing can follow this dictation, so it swallows every
        /// remaining token instead of searching for an anchor.
        unbounded: bool,
    },
    RuleFrame {
        node: Option<NodeId>,
        slot: usize,
    },
}

/// A matcher compiled from one rule's expansion tree.
#[derive(Debug, Clone)]
pub(crate) struct CompiledMatcher {
    pub(crate) root: Element,
    /// Bodies of referenced rules, addressed by `RuleFrame::slot`.
    pub(crate) bodies: Vec<Element>,
    pub(crate) tree_version: u64,
    pub(crate) grammar_revision: u64,
    pub(crate) case_sensitive: bool,
}

/// Builds the matcher for `rule`, resolving named references through
/// `resolver`. `default_case` is the grammar-level case policy the rule's
/// own flag may override; `grammar_revision` is recorded for cache checks.
pub(crate) fn build_matcher(
    rule: &Rule,
    resolver: &dyn RuleResolver,
    default_case: bool,
    grammar_revision: u64,
) -> Result<CompiledMatcher, MatcherBuildError> {
    check_left_recursion(rule)?;

    let case = rule.case_sensitivity().unwrap_or(default_case);
    let mut builder = Builder {
        resolver,
        default_case,
        slots: HashMap::new(),
        bodies: Vec::new(),
    };
    let exp = rule.expansion();
    let root = builder.build(exp, exp.root(), case, true, false)?;
    Ok(CompiledMatcher {
        root,
        bodies: builder
            .bodies
            .into_iter()
            .map(|b| b.expect("every allocated slot is filled"))
            .collect(),
        tree_version: exp.version(),
        grammar_revision,
        case_sensitive: case,
    })
}

struct Builder<'a> {
    resolver: &'a dyn RuleResolver,
    default_case: bool,
    slots: HashMap<String, usize>,
    bodies: Vec<Option<Element>>,
}

impl<'a> Builder<'a> {
    /// `record` controls whether built elements stamp spans onto the tree;
    /// it is false inside referenced rule bodies. `follows` is whether any
    /// expansion can still consume input after this node, which decides
    /// dictation consumption.
    fn build(
        &mut self,
        exp: &Expansion,
        id: NodeId,
        case: bool,
        record: bool,
        follows: bool,
    ) -> Result<Element, MatcherBuildError> {
        let node = record.then_some(id);
        let element = match exp.kind(id) {
            NodeKind::Literal { text } => {
                if text.is_empty() {
                    warn!("literal with empty text matches nothing");
                    Element::Empty { node }
                } else {
                    Element::Literal {
                        node,
                        words: text.split(' ').map(str::to_string).collect(),
                        case_sensitive: case,
                    }
                }
            }
            NodeKind::Sequence | NodeKind::RequiredGrouping => {
                let children = exp.children(id);
                let mut items = Vec::with_capacity(children.len());
                for (i, child) in children.iter().enumerate() {
                    let child_follows = i + 1 < children.len() || follows;
                    items.push(self.build(exp, *child, case, record, child_follows)?);
                }
                Element::Sequence { node, items }
            }
            NodeKind::AlternativeSet { .. } => {
                let items = exp
                    .children(id)
                    .iter()
                    .map(|c| self.build(exp, *c, case, record, follows))
                    .collect::<Result<Vec<_>, _>>()?;
                Element::Alternatives { node, items }
            }
            NodeKind::OptionalGrouping => {
                let child = exp.children(id)[0];
                Element::Optional {
                    node,
                    item: Box::new(self.build(exp, child, case, record, follows)?),
                }
            }
            NodeKind::KleeneStar => {
                let child = exp.children(id)[0];
                // Another iteration may follow the current one.
                Element::KleeneStar {
                    node,
                    item: Box::new(self.build(exp, child, case, record, true)?),
                }
            }
            NodeKind::Repeat => {
                let child = exp.children(id)[0];
                Element::Repeat {
                    node,
                    item: Box::new(self.build(exp, child, case, record, true)?),
                }
            }
            NodeKind::NamedRuleRef { name } => Element::RuleFrame {
                node,
                slot: self.named_slot(name)?,
            },
            NodeKind::RuleRef { rule } => Element::RuleFrame {
                node,
                slot: self.snapshot_slot(rule)?,
            },
            NodeKind::NullRef => Element::Empty { node },
            NodeKind::VoidRef => Element::Never { node },
            NodeKind::Dictation => Element::Dictation {
                node,
                unbounded: !follows,
            },
        };
        Ok(element)
    }

    fn named_slot(&mut self, name: &str) -> Result<usize, MatcherBuildError> {
        if let Some(slot) = self.slots.get(name) {
            return Ok(*slot);
        }
        let resolver = self.resolver;
        let rule = resolver
            .resolve_rule(name)
            .ok_or_else(|| ReferenceError::UnresolvedRule(name.to_string()))?;
        let slot = self.bodies.len();
        self.bodies.push(None);
        self.slots.insert(name.to_string(), slot);
        let body = self.rule_body(rule)?;
        self.bodies[slot] = Some(body);
        Ok(slot)
    }

    fn snapshot_slot(&mut self, rule: &Rule) -> Result<usize, MatcherBuildError> {
        let slot = self.bodies.len();
        self.bodies.push(None);
        let body = self.rule_body(rule)?;
        self.bodies[slot] = Some(body);
        Ok(slot)
    }

    fn rule_body(&mut self, rule: &Rule) -> Result<Element, MatcherBuildError> {
        let case = rule.case_sensitivity().unwrap_or(self.default_case);
        let exp = rule.expansion();
        // Conservatively assume input can follow a referenced rule.
        self.build(exp, exp.root(), case, false, true)
    }
}

/// Rejects rules whose own expansion can re-enter the rule before consuming
/// any input. Indirect recursion is left to the matcher's runtime guard,
/// which bounds it by input length.
fn check_left_recursion(rule: &Rule) -> Result<(), MatcherBuildError> {
    let exp = rule.expansion();
    let mut leading = Vec::new();
    leading_refs(exp, exp.root(), &mut leading);
    if leading.iter().any(|name| rule.name() == name.as_str()) {
        return Err(MatcherBuildError::LeftRecursion(rule.name().to_string()));
    }
    Ok(())
}

/// Collects references reachable before any token is consumed, returning
/// whether the node can match without consuming anything.
fn leading_refs(exp: &Expansion, id: NodeId, out: &mut Vec<String>) -> bool {
    match exp.kind(id) {
        NodeKind::Literal { text } => text.is_empty(),
        NodeKind::Sequence | NodeKind::RequiredGrouping => {
            for child in exp.children(id) {
                if !leading_refs(exp, *child, out) {
                    return false;
                }
            }
            true
        }
        NodeKind::AlternativeSet { .. } => {
            let mut any_empty = false;
            for child in exp.children(id) {
                if leading_refs(exp, *child, out) {
                    any_empty = true;
                }
            }
            any_empty
        }
        NodeKind::OptionalGrouping | NodeKind::KleeneStar => {
            leading_refs(exp, exp.children(id)[0], out);
            true
        }
        NodeKind::Repeat => leading_refs(exp, exp.children(id)[0], out),
        NodeKind::NamedRuleRef { name } => {
            out.push(name.clone());
            false
        }
        NodeKind::RuleRef { rule } => {
            out.push(rule.name().to_string());
            false
        }
        NodeKind::NullRef => true,
        NodeKind::VoidRef => false,
        NodeKind::Dictation => false,
    }
}
