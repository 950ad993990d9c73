//! Rule expansion trees.
//!
//! An [`Expansion`] is the right-hand side of a JSGF rule: a tree over
//! literals, sequences, alternative sets, optional and required groupings,
//! repetitions, rule references and dictation. Nodes live in an arena owned
//! by the tree; [`NodeId`] values index into it and parent links are plain
//! indices, so no node ever shares ownership of another.
//!
//! Trees are acyclic by construction: every operation that attaches children
//! consumes an owned `Expansion` and splices its nodes in, so a node can
//! never become its own descendant.

use std::fmt;

use crate::types::errors::GrammarError;
use crate::types::rules::Rule;

/// Index of a node within its owning [`Expansion`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A half-open `[start, end)` range of input tokens consumed by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        TokenSpan { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether this span lies within `other`.
    pub fn within(&self, other: &TokenSpan) -> bool {
        self.start >= other.start && self.end <= other.end
    }
}

/// The kind of an expansion node, with kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// One or more words matched as whole tokens.
    Literal { text: String },
    /// Concatenation of the children.
    Sequence,
    /// One of the children, tried in declaration order. Weights are
    /// preserved for compilation only and never affect matching.
    AlternativeSet { weights: Option<Vec<f64>> },
    /// The child or nothing.
    OptionalGrouping,
    /// A parenthesized group. A single child is preserved as-is because
    /// flattening would change how later mutations bind.
    RequiredGrouping,
    /// Zero or more repetitions of the child.
    KleeneStar,
    /// One or more repetitions of the child.
    Repeat,
    /// A reference to a rule by name, resolved through a grammar when the
    /// matcher is built.
    NamedRuleRef { name: String },
    /// A direct reference carrying its own snapshot of the referenced rule.
    RuleRef { rule: Box<Rule> },
    /// Matches nothing and always succeeds; compiles to `<NULL>`.
    NullRef,
    /// Never matches; compiles to `<VOID>`.
    VoidRef,
    /// One or more arbitrary tokens of free speech; compiles to
    /// `<DICTATION>`.
    Dictation,
}

impl NodeKind {
    /// Whether nodes of this kind may carry children.
    fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Sequence
                | NodeKind::AlternativeSet { .. }
                | NodeKind::OptionalGrouping
                | NodeKind::RequiredGrouping
                | NodeKind::KleeneStar
                | NodeKind::Repeat
        )
    }

    /// Whether nodes of this kind hold exactly one child.
    fn is_single_child(&self) -> bool {
        matches!(
            self,
            NodeKind::OptionalGrouping | NodeKind::KleeneStar | NodeKind::Repeat
        )
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    tags: Vec<String>,
    span: Option<TokenSpan>,
    repeat_spans: Vec<TokenSpan>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            tags: Vec::new(),
            span: None,
            repeat_spans: Vec::new(),
        }
    }
}

/// Flow control for [`Expansion::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
    Stop,
}

/// An expansion tree. See the module documentation.
#[derive(Debug, Clone)]
pub struct Expansion {
    nodes: Vec<NodeData>,
    root: NodeId,
    version: u64,
}

impl Expansion {
    fn leaf(kind: NodeKind) -> Self {
        Expansion {
            nodes: vec![NodeData::new(kind)],
            root: NodeId(0),
            version: 0,
        }
    }

    fn with_children(kind: NodeKind, children: Vec<Expansion>) -> Self {
        let mut tree = Expansion::leaf(kind);
        let root = tree.root;
        for child in children {
            let child_root = tree.splice(child);
            tree.attach(root, child_root, None);
        }
        tree.version = 0;
        tree
    }

    /// A literal over one or more words. Interior whitespace is normalized
    /// to single spaces.
    pub fn literal(text: impl AsRef<str>) -> Self {
        let text = normalize_text(text.as_ref());
        Expansion::leaf(NodeKind::Literal { text })
    }

    pub fn sequence(children: Vec<Expansion>) -> Self {
        Expansion::with_children(NodeKind::Sequence, children)
    }

    pub fn alternatives(children: Vec<Expansion>) -> Self {
        Expansion::with_children(NodeKind::AlternativeSet { weights: None }, children)
    }

    /// An alternative set with a weight attached to every alternative.
    pub fn weighted_alternatives(children: Vec<(f64, Expansion)>) -> Self {
        let (weights, children): (Vec<f64>, Vec<Expansion>) = children.into_iter().unzip();
        Expansion::with_children(
            NodeKind::AlternativeSet {
                weights: Some(weights),
            },
            children,
        )
    }

    pub fn optional(child: Expansion) -> Self {
        Expansion::with_children(NodeKind::OptionalGrouping, vec![child])
    }

    pub fn required(children: Vec<Expansion>) -> Self {
        Expansion::with_children(NodeKind::RequiredGrouping, children)
    }

    pub fn kleene_star(child: Expansion) -> Self {
        Expansion::with_children(NodeKind::KleeneStar, vec![child])
    }

    pub fn repeat(child: Expansion) -> Self {
        Expansion::with_children(NodeKind::Repeat, vec![child])
    }

    pub fn named_rule_ref(name: impl Into<String>) -> Self {
        Expansion::leaf(NodeKind::NamedRuleRef { name: name.into() })
    }

    /// A direct reference to `rule`, carrying a snapshot of it.
    pub fn rule_ref(rule: Rule) -> Self {
        Expansion::leaf(NodeKind::RuleRef {
            rule: Box::new(rule),
        })
    }

    pub fn null_ref() -> Self {
        Expansion::leaf(NodeKind::NullRef)
    }

    pub fn void_ref() -> Self {
        Expansion::leaf(NodeKind::VoidRef)
    }

    pub fn dictation() -> Self {
        Expansion::leaf(NodeKind::Dictation)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Monotonic counter bumped by every structural mutation. Caches key on
    /// it to notice staleness lazily.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn tags(&self, id: NodeId) -> &[String] {
        &self.nodes[id.index()].tags
    }

    /// The token span consumed by `id` during the most recent successful
    /// match, or `None` if the node did not participate.
    pub fn match_span(&self, id: NodeId) -> Option<TokenSpan> {
        self.nodes[id.index()].span
    }

    /// Per-iteration spans recorded for a `Repeat` node during the most
    /// recent successful match.
    pub fn repeat_spans(&self, id: NodeId) -> &[TokenSpan] {
        &self.nodes[id.index()].repeat_spans
    }

    /// The text of `speech` covered by the node's last match span.
    pub fn matched_text(&self, id: NodeId, speech: &str) -> Option<String> {
        let span = self.match_span(id)?;
        let tokens: Vec<&str> = speech.split_whitespace().collect();
        Some(tokens[span.start..span.end.min(tokens.len())].join(" "))
    }

    /// Appends a tag to the node. Tags compile as `{ tag }` suffixes and are
    /// collected into the tag set of a successful match.
    pub fn add_tag(&mut self, id: NodeId, tag: impl Into<String>) {
        self.nodes[id.index()].tags.push(tag.into());
        self.touch();
    }

    /// Replaces the text of a literal node.
    pub fn set_literal_text(
        &mut self,
        id: NodeId,
        text: impl AsRef<str>,
    ) -> Result<(), GrammarError> {
        let normalized = normalize_text(text.as_ref());
        match &mut self.nodes[id.index()].kind {
            NodeKind::Literal { text: slot } => *slot = normalized,
            other => {
                return Err(GrammarError::InvalidOperation(format!(
                    "cannot set literal text on {other:?}"
                )))
            }
        }
        self.touch();
        Ok(())
    }

    /// Sets one weight per alternative on an alternative set.
    pub fn set_weights(&mut self, id: NodeId, weights: Vec<f64>) -> Result<(), GrammarError> {
        let child_count = self.nodes[id.index()].children.len();
        if weights.len() != child_count {
            return Err(GrammarError::InvalidOperation(format!(
                "{} weights given for {} alternatives",
                weights.len(),
                child_count
            )));
        }
        match &mut self.nodes[id.index()].kind {
            NodeKind::AlternativeSet { weights: slot } => *slot = Some(weights),
            other => {
                return Err(GrammarError::InvalidOperation(format!(
                    "cannot set weights on {other:?}"
                )))
            }
        }
        self.touch();
        Ok(())
    }

    /// Appends `child` to the children of `id`, maintaining the parent link.
    pub fn add_child(&mut self, id: NodeId, child: Expansion) -> Result<NodeId, GrammarError> {
        let count = self.children(id).len();
        self.insert_child(id, count, child)
    }

    /// Inserts `child` at `index` among the children of `id`.
    pub fn insert_child(
        &mut self,
        id: NodeId,
        index: usize,
        child: Expansion,
    ) -> Result<NodeId, GrammarError> {
        let kind = self.kind(id);
        if !kind.is_container() {
            return Err(GrammarError::InvalidOperation(format!(
                "{kind:?} cannot take children"
            )));
        }
        if kind.is_single_child() && !self.children(id).is_empty() {
            return Err(GrammarError::InvalidOperation(format!(
                "{kind:?} holds exactly one child"
            )));
        }
        if index > self.children(id).len() {
            return Err(GrammarError::InvalidOperation(format!(
                "child index {index} out of bounds"
            )));
        }
        let child_root = self.splice(child);
        self.attach(id, child_root, Some(index));
        self.touch();
        Ok(child_root)
    }

    /// Detaches the child of `id` at `index` and returns it as its own tree.
    pub fn remove_child(&mut self, id: NodeId, index: usize) -> Result<Expansion, GrammarError> {
        if index >= self.children(id).len() {
            return Err(GrammarError::InvalidOperation(format!(
                "child index {index} out of bounds"
            )));
        }
        let child = self.nodes[id.index()].children[index];
        let detached = self.subtree(child);
        self.nodes[id.index()].children.remove(index);
        self.nodes[child.index()].parent = None;
        self.touch();
        Ok(detached)
    }

    /// Replaces the subtree rooted at `id` with `replacement`, preserving the
    /// parent linkage, and returns the old subtree. This is the flat-map
    /// operation: the replacement takes the node's position in its parent.
    pub fn replace(&mut self, id: NodeId, replacement: Expansion) -> Expansion {
        let old = self.subtree(id);
        let new_root = self.splice(replacement);
        match self.nodes[id.index()].parent {
            Some(parent) => {
                let index = self.nodes[parent.index()]
                    .children
                    .iter()
                    .position(|c| *c == id)
                    .expect("parent links its children");
                self.nodes[parent.index()].children[index] = new_root;
                self.nodes[new_root.index()].parent = Some(parent);
                self.nodes[id.index()].parent = None;
            }
            None => {
                self.root = new_root;
            }
        }
        self.touch();
        old
    }

    /// A deep copy of the subtree rooted at `id`.
    pub fn subtree(&self, id: NodeId) -> Expansion {
        let mut nodes = Vec::new();
        let root = self.copy_into(id, &mut nodes);
        let mut tree = Expansion {
            nodes,
            root,
            version: 0,
        };
        tree.nodes[root.index()].parent = None;
        tree
    }

    fn copy_into(&self, id: NodeId, nodes: &mut Vec<NodeData>) -> NodeId {
        let new_id = NodeId(nodes.len() as u32);
        nodes.push(NodeData {
            children: Vec::new(),
            ..self.nodes[id.index()].clone()
        });
        for child in self.nodes[id.index()].children.clone() {
            let new_child = self.copy_into(child, nodes);
            nodes[new_child.index()].parent = Some(new_id);
            nodes[new_id.index()].children.push(new_child);
        }
        new_id
    }

    /// Pre-order traversal with short-circuit control.
    pub fn walk(&self, f: &mut impl FnMut(NodeId) -> Walk) {
        self.walk_from(self.root, f);
    }

    fn walk_from(&self, id: NodeId, f: &mut impl FnMut(NodeId) -> Walk) -> Walk {
        match f(id) {
            Walk::Stop => Walk::Stop,
            Walk::SkipChildren => Walk::Continue,
            Walk::Continue => {
                for child in self.children(id).to_vec() {
                    if self.walk_from(child, f) == Walk::Stop {
                        return Walk::Stop;
                    }
                }
                Walk::Continue
            }
        }
    }

    /// Post-order traversal: children first, then the node.
    pub fn walk_post(&self, f: &mut impl FnMut(NodeId)) {
        self.walk_post_from(self.root, f);
    }

    fn walk_post_from(&self, id: NodeId, f: &mut impl FnMut(NodeId)) {
        for child in self.children(id).to_vec() {
            self.walk_post_from(child, f);
        }
        f(id);
    }

    /// All nodes satisfying `pred`, in pre-order.
    pub fn filter(&self, mut pred: impl FnMut(&Expansion, NodeId) -> bool) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.walk(&mut |id| {
            if pred(self, id) {
                result.push(id);
            }
            Walk::Continue
        });
        result
    }

    /// The first node in pre-order satisfying `pred`.
    pub fn find(&self, mut pred: impl FnMut(&Expansion, NodeId) -> bool) -> Option<NodeId> {
        let mut found = None;
        self.walk(&mut |id| {
            if pred(self, id) {
                found = Some(id);
                Walk::Stop
            } else {
                Walk::Continue
            }
        });
        found
    }

    /// All childless nodes, in pre-order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.filter(|tree, id| tree.children(id).is_empty())
    }

    /// Distance from `id` to the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    /// Copies the nodes of `other` into this arena and returns the id of the
    /// copied root. The copied subtree is detached until attached.
    fn splice(&mut self, other: Expansion) -> NodeId {
        let offset = self.nodes.len() as u32;
        let root = NodeId(other.root.0 + offset);
        for mut node in other.nodes {
            node.parent = node.parent.map(|p| NodeId(p.0 + offset));
            for child in &mut node.children {
                *child = NodeId(child.0 + offset);
            }
            self.nodes.push(node);
        }
        self.nodes[root.index()].parent = None;
        root
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.nodes[child.index()].parent = Some(parent);
        match index {
            Some(i) => self.nodes[parent.index()].children.insert(i, child),
            None => self.nodes[parent.index()].children.push(child),
        }
    }

    pub(crate) fn clear_match_data(&mut self) {
        for node in &mut self.nodes {
            node.span = None;
            node.repeat_spans.clear();
        }
    }

    pub(crate) fn set_match_span(&mut self, id: NodeId, span: TokenSpan) {
        self.nodes[id.index()].span = Some(span);
    }

    pub(crate) fn push_repeat_span(&mut self, id: NodeId, span: TokenSpan) {
        self.nodes[id.index()].repeat_spans.push(span);
    }

    fn node_eq(&self, id: NodeId, other: &Expansion, other_id: NodeId) -> bool {
        let a = &self.nodes[id.index()];
        let b = &other.nodes[other_id.index()];
        a.kind == b.kind
            && a.tags == b.tags
            && a.children.len() == b.children.len()
            && a.children
                .iter()
                .zip(&b.children)
                .all(|(x, y)| self.node_eq(*x, other, *y))
    }
}

/// Structural equality: kinds, payloads, tags and child order. Parents and
/// match spans are ignored.
impl PartialEq for Expansion {
    fn eq(&self, other: &Self) -> bool {
        self.node_eq(self.root, other, other.root)
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::compiler::compile_expansion(self) {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("<invalid expansion>"),
        }
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
