//! Sequence rules: incremental matching of rules that contain dictation.

use log::debug;

use crate::compiler::compile_expansion;
use crate::ext::expansions::{contains_dictation, expand_dictation_expansion, is_dictation_free};
use crate::types::errors::{GrammarError, MatcherBuildError};
use crate::types::expansion::{Expansion, NodeId, NodeKind};
use crate::types::references::ReferenceName;
use crate::types::rules::Rule;

/// One expanded variant of the source rule, split at dictation boundaries.
#[derive(Debug, Clone)]
struct Branch {
    parts: Vec<Rule>,
    matched: Vec<Option<String>>,
    alive: bool,
}

impl Branch {
    fn new(parts: Vec<Rule>) -> Self {
        let matched = vec![None; parts.len()];
        Branch {
            parts,
            matched,
            alive: true,
        }
    }

    fn is_complete(&self) -> bool {
        self.matched.iter().all(Option::is_some)
    }
}

/// A rule whose expansion contains dictation, split into an ordered
/// sequence of plain and dictation-only parts matched one utterance
/// fragment at a time.
///
/// Optionals wrapping dictation multiply into variant branches that are
/// tried in parallel on each fragment; branches that stop matching are
/// pruned for the rest of the progression.
#[derive(Debug, Clone)]
pub struct SequenceRule {
    name: ReferenceName,
    visible: bool,
    original: Expansion,
    branches: Vec<Branch>,
    fragment_index: usize,
    refuse_matches: bool,
}

impl SequenceRule {
    /// Builds a sequence rule from a dictation-bearing rule.
    pub fn new(rule: &Rule) -> Result<Self, GrammarError> {
        if !contains_dictation(rule.expansion()) {
            return Err(GrammarError::NoDictation(rule.name().to_string()));
        }
        let variants = expand_dictation_expansion(rule.expansion())?;
        let mut branches = Vec::with_capacity(variants.len());
        for (branch_index, variant) in variants.into_iter().enumerate() {
            let pieces = split_at_dictation(&variant);
            let mut parts = Vec::with_capacity(pieces.len());
            for (part_index, piece) in pieces.into_iter().enumerate() {
                let mut part = Rule::private(
                    format!("{}_{branch_index}_{part_index}", rule.name()),
                    piece,
                )?;
                part.set_case_sensitivity(rule.case_sensitivity());
                parts.push(part);
            }
            branches.push(Branch::new(parts));
        }
        Ok(SequenceRule {
            name: ReferenceName::new(rule.name(), "rule")?,
            visible: rule.visible(),
            original: rule.expansion().clone(),
            branches,
            fragment_index: 0,
            refuse_matches: false,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// The unsplit expansion the rule was built from.
    pub fn original_expansion(&self) -> &Expansion {
        &self.original
    }

    /// Index of the fragment the rule currently expects.
    pub fn current_index(&self) -> usize {
        self.fragment_index
    }

    /// Whether matching is refused until the progression is restarted.
    /// Becomes true when [`SequenceRule::set_next`] advances past the last
    /// part of every live branch; there is no wrap-around.
    pub fn refuse_matches(&self) -> bool {
        self.refuse_matches
    }

    pub fn set_refuse_matches(&mut self, refuse: bool) {
        self.refuse_matches = refuse;
    }

    /// Whether some live branch still has a part after the current one.
    pub fn has_next_part(&self) -> bool {
        self.branches
            .iter()
            .any(|b| b.alive && self.fragment_index + 1 < b.parts.len())
    }

    /// Whether every live branch's current part is pure dictation. Such a
    /// rule cannot appear in compiled JSGF output until it advances.
    pub fn current_is_dictation_only(&self) -> bool {
        !self
            .branches
            .iter()
            .filter(|b| b.alive && self.fragment_index < b.parts.len())
            .any(|b| is_dictation_free(b.parts[self.fragment_index].expansion()))
    }

    /// Matches `speech` against the current part of every live branch.
    /// Branches that fail while another succeeds are pruned; a fragment
    /// that matches nowhere leaves all branches untouched so the caller
    /// can retry with different speech.
    pub fn matches(&mut self, speech: &str) -> Result<bool, MatcherBuildError> {
        if self.refuse_matches {
            return Ok(false);
        }
        let index = self.fragment_index;
        let mut outcomes = vec![None; self.branches.len()];
        for (i, branch) in self.branches.iter_mut().enumerate() {
            if !branch.alive || index >= branch.parts.len() {
                continue;
            }
            outcomes[i] = Some(branch.parts[index].matches(speech)?);
        }
        let any = outcomes.iter().any(|o| *o == Some(true));
        if any {
            let text = speech.split_whitespace().collect::<Vec<_>>().join(" ");
            for (i, branch) in self.branches.iter_mut().enumerate() {
                match outcomes[i] {
                    Some(true) => branch.matched[index] = Some(text.clone()),
                    Some(false) => branch.alive = false,
                    None => {}
                }
            }
        }
        debug!(
            "sequence rule <{}> fragment {index}: matched={any} speech={speech:?}",
            self.name
        );
        Ok(any)
    }

    /// Advances to the next fragment. Advancing past the last part of every
    /// live branch makes the rule refuse further matches.
    pub fn set_next(&mut self) {
        self.fragment_index += 1;
        let exhausted = !self
            .branches
            .iter()
            .any(|b| b.alive && self.fragment_index < b.parts.len());
        if exhausted {
            self.refuse_matches = true;
        }
    }

    /// The fragments matched so far joined by single spaces, once some
    /// branch has matched its entire sequence. With several complete
    /// branches, the one covering the most fragments wins: later fragments
    /// rule out interpretations that stopped early.
    pub fn entire_match(&self) -> Option<String> {
        self.branches
            .iter()
            .filter(|b| b.alive && b.is_complete())
            .max_by_key(|b| b.parts.len())
            .map(|b| {
                b.matched
                    .iter()
                    .map(|m| m.as_deref().expect("complete branches are fully matched"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
    }

    /// Resets the whole progression: the fragment index returns to 0,
    /// pruned branches are revived and accumulated matches are cleared.
    pub fn restart_dictation_context(&mut self) {
        self.fragment_index = 0;
        self.refuse_matches = false;
        for branch in &mut self.branches {
            branch.alive = true;
            for slot in &mut branch.matched {
                *slot = None;
            }
        }
    }

    /// Compiles the current part when it is plain JSGF, under the rule's
    /// own name. Dictation-only parts and refused rules compile to nothing;
    /// the dictation side is matched in the host instead of the decoder.
    pub fn compile(&self) -> Result<String, GrammarError> {
        if self.refuse_matches {
            return Ok(String::new());
        }
        let part = self
            .branches
            .iter()
            .filter(|b| b.alive && self.fragment_index < b.parts.len())
            .map(|b| &b.parts[self.fragment_index])
            .find(|part| is_dictation_free(part.expansion()));
        match part {
            Some(part) => {
                let body = compile_expansion(part.expansion())?;
                if self.visible {
                    Ok(format!("public <{}> = {};", self.name, body))
                } else {
                    Ok(format!("<{}> = {};", self.name, body))
                }
            }
            None => Ok(String::new()),
        }
    }
}

impl PartialEq for SequenceRule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.visible == other.visible
            && self.original == other.original
    }
}

/// Splits a tree into the ordered pieces a sequence rule matches one at a
/// time: maximal dictation-free runs and dictation pieces, each wrapped in
/// the structure that surrounded it.
pub(crate) fn split_at_dictation(exp: &Expansion) -> Vec<Expansion> {
    split_node(exp, exp.root())
}

fn split_node(exp: &Expansion, id: NodeId) -> Vec<Expansion> {
    if matches!(exp.kind(id), NodeKind::Dictation) {
        // Rebuild the ancestor chain around the dictation so repetition or
        // grouping context survives the split.
        let mut piece = exp.subtree(id);
        let mut ancestor = exp.parent(id);
        while let Some(a) = ancestor {
            piece = wrap_like(exp, a, piece);
            ancestor = exp.parent(a);
        }
        return vec![piece];
    }
    if exp.children(id).is_empty() {
        return vec![exp.subtree(id)];
    }

    let mut out: Vec<Expansion> = Vec::new();
    let mut group: Vec<Expansion> = Vec::new();
    for child in exp.children(id) {
        for piece in split_node(exp, *child) {
            if contains_dictation(&piece) {
                flush_group(exp, id, &mut group, &mut out);
                out.push(piece);
            } else {
                group.push(piece);
            }
        }
    }
    flush_group(exp, id, &mut group, &mut out);
    out
}

fn flush_group(exp: &Expansion, id: NodeId, group: &mut Vec<Expansion>, out: &mut Vec<Expansion>) {
    if group.is_empty() {
        return;
    }
    let children = std::mem::take(group);
    out.push(wrap_all_like(exp, id, children));
}

fn wrap_like(exp: &Expansion, id: NodeId, inner: Expansion) -> Expansion {
    wrap_all_like(exp, id, vec![inner])
}

fn wrap_all_like(exp: &Expansion, id: NodeId, children: Vec<Expansion>) -> Expansion {
    match exp.kind(id) {
        NodeKind::Sequence => Expansion::sequence(children),
        NodeKind::RequiredGrouping => Expansion::required(children),
        NodeKind::AlternativeSet { .. } => Expansion::alternatives(children),
        NodeKind::OptionalGrouping => {
            let mut children = children;
            Expansion::optional(children.remove(0))
        }
        NodeKind::KleeneStar => {
            let mut children = children;
            Expansion::kleene_star(children.remove(0))
        }
        NodeKind::Repeat => {
            let mut children = children;
            Expansion::repeat(children.remove(0))
        }
        other => unreachable!("{other:?} nodes have no children to wrap"),
    }
}
