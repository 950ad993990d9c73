//! JSGF rules: a name, a visibility, and an expansion.

use std::collections::BTreeSet;

use log::debug;

use crate::compiler::compile_expansion;
use crate::matcher::{build_matcher, CompiledMatcher, Event, MatchMode, MatchRecord, NoRules, RuleResolver};
use crate::types::errors::{GrammarError, MatcherBuildError};
use crate::types::expansion::{Expansion, NodeId, NodeKind};
use crate::types::references::ReferenceName;

#[derive(Debug)]
struct CompiledText {
    tree_version: u64,
    text: String,
}

/// A named rule binding an expansion, with compiled-text and matcher caches
/// that are invalidated whenever the expansion tree mutates.
#[derive(Debug)]
pub struct Rule {
    name: ReferenceName,
    visible: bool,
    expansion: Expansion,
    /// Per-rule case policy; `None` falls back to the grammar's.
    case_sensitive: Option<bool>,
    enabled: bool,
    compiled: Option<CompiledText>,
    matcher: Option<CompiledMatcher>,
    last_tags: Vec<String>,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        visible: bool,
        expansion: Expansion,
    ) -> Result<Self, GrammarError> {
        Ok(Rule {
            name: ReferenceName::new(name, "rule")?,
            visible,
            expansion,
            case_sensitive: None,
            enabled: true,
            compiled: None,
            matcher: None,
            last_tags: Vec::new(),
        })
    }

    /// A rule compiled with the `public` keyword and eligible for grammar
    /// matching.
    pub fn public(name: impl Into<String>, expansion: Expansion) -> Result<Self, GrammarError> {
        Rule::new(name, true, expansion)
    }

    /// A rule only reachable through references from other rules.
    pub fn private(name: impl Into<String>, expansion: Expansion) -> Result<Self, GrammarError> {
        Rule::new(name, false, expansion)
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.compiled = None;
    }

    pub fn expansion(&self) -> &Expansion {
        &self.expansion
    }

    /// Mutable access to the expansion. Mutations bump the tree version,
    /// which lazily invalidates the compiled-text and matcher caches.
    pub fn expansion_mut(&mut self) -> &mut Expansion {
        &mut self.expansion
    }

    pub fn set_expansion(&mut self, expansion: Expansion) {
        self.expansion = expansion;
        self.invalidate_matcher();
        self.compiled = None;
    }

    pub fn case_sensitivity(&self) -> Option<bool> {
        self.case_sensitive
    }

    pub fn set_case_sensitivity(&mut self, case_sensitive: Option<bool>) {
        self.case_sensitive = case_sensitive;
        self.invalidate_matcher();
    }

    /// Whether this rule takes part in matching and compilation.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Drops the cached matcher element. Mutations through
    /// [`Rule::expansion_mut`] are caught by version checks; this is for
    /// callers that hold external state the matcher was built against.
    pub fn invalidate_matcher(&mut self) {
        self.matcher = None;
    }

    /// Compiles the rule to its JSGF definition. Disabled rules compile to
    /// the empty string.
    pub fn compile(&mut self) -> Result<String, GrammarError> {
        if !self.enabled {
            return Ok(String::new());
        }
        let version = self.expansion.version();
        if let Some(cached) = &self.compiled {
            if cached.tree_version == version {
                return Ok(cached.text.clone());
            }
        }
        let body = compile_expansion(&self.expansion)?;
        let text = if self.visible {
            format!("public <{}> = {};", self.name, body)
        } else {
            format!("<{}> = {};", self.name, body)
        };
        self.compiled = Some(CompiledText {
            tree_version: version,
            text: text.clone(),
        });
        Ok(text)
    }

    /// Whether `speech` matches this rule completely.
    ///
    /// Standalone rules resolve no named references; match rules through a
    /// [`crate::Grammar`] when they reference other rules.
    pub fn matches(&mut self, speech: &str) -> Result<bool, MatcherBuildError> {
        if !self.enabled {
            return Ok(false);
        }
        let case = self.case_sensitive.unwrap_or(false);
        self.ensure_matcher(&NoRules, case, 0)?;
        Ok(self.run_cached_matcher(speech, MatchMode::Full).is_some())
    }

    /// Matches a prefix of `speech` and returns the deepest tagged or
    /// rule-reference node that participated, along with the unconsumed
    /// tail. Returns `None` when no prefix matches.
    pub fn find_matching_part(
        &mut self,
        speech: &str,
    ) -> Result<Option<(NodeId, String)>, MatcherBuildError> {
        if !self.enabled {
            return Ok(None);
        }
        let case = self.case_sensitive.unwrap_or(false);
        self.ensure_matcher(&NoRules, case, 0)?;
        let record = match self.run_cached_matcher(speech, MatchMode::Prefix) {
            Some(record) => record,
            None => return Ok(None),
        };
        let tokens: Vec<&str> = speech.split_whitespace().collect();
        let tail = tokens[record.end..].join(" ");

        let mut best: Option<(usize, NodeId)> = None;
        for id in self.expansion.filter(|tree, id| {
            tree.match_span(id).is_some()
                && (!tree.tags(id).is_empty()
                    || matches!(
                        tree.kind(id),
                        NodeKind::NamedRuleRef { .. } | NodeKind::RuleRef { .. }
                    ))
        }) {
            let depth = self.expansion.depth(id);
            if best.map_or(true, |(d, _)| depth > d) {
                best = Some((depth, id));
            }
        }
        let node = best.map(|(_, id)| id).unwrap_or_else(|| self.expansion.root());
        Ok(Some((node, tail)))
    }

    /// Whether the last call to a matching method succeeded on this rule.
    pub fn was_matched(&self) -> bool {
        self.expansion.match_span(self.expansion.root()).is_some()
    }

    /// Tags collected from the last successful match, in completion order.
    pub fn matched_tags(&self) -> &[String] {
        &self.last_tags
    }

    /// Every tag appearing in this rule's expansion. Tags of referenced
    /// rules are not included.
    pub fn tags(&self) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        for id in self.expansion.filter(|tree, id| !tree.tags(id).is_empty()) {
            result.extend(self.expansion.tags(id).iter().cloned());
        }
        result
    }

    /// Names of every rule this rule references, directly or through
    /// reference snapshots.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        collect_dependencies(&self.expansion, &mut result);
        result
    }

    pub(crate) fn matcher_current(&self, grammar_revision: u64, case: bool) -> bool {
        self.matcher.as_ref().is_some_and(|m| {
            m.tree_version == self.expansion.version()
                && m.grammar_revision == grammar_revision
                && m.case_sensitive == case
        })
    }

    pub(crate) fn install_matcher(&mut self, matcher: CompiledMatcher) {
        self.matcher = Some(matcher);
    }

    pub(crate) fn ensure_matcher(
        &mut self,
        resolver: &dyn RuleResolver,
        case: bool,
        grammar_revision: u64,
    ) -> Result<(), MatcherBuildError> {
        if !self.matcher_current(grammar_revision, case) {
            debug!("building matcher for rule <{}>", self.name);
            let matcher = build_matcher(self, resolver, case, grammar_revision)?;
            self.matcher = Some(matcher);
        }
        Ok(())
    }

    /// Runs the cached matcher and commits the span journal to the tree.
    /// Spans are cleared up front, so after a failed attempt no node
    /// carries one. Requires the matcher to be installed and current.
    pub(crate) fn run_cached_matcher(
        &mut self,
        speech: &str,
        mode: MatchMode,
    ) -> Option<MatchRecord> {
        self.expansion.clear_match_data();
        self.last_tags.clear();
        let record = self
            .matcher
            .as_ref()
            .expect("matcher is installed before running")
            .run_match(speech, mode)?;
        self.commit(&record);
        Some(record)
    }

    fn commit(&mut self, record: &MatchRecord) {
        for event in &record.events {
            match *event {
                Event::Node(id, span) => {
                    self.expansion.set_match_span(id, span);
                    self.last_tags
                        .extend(self.expansion.tags(id).iter().cloned());
                }
                Event::Iteration(id, span) => self.expansion.push_repeat_span(id, span),
            }
        }
    }
}

fn collect_dependencies(exp: &Expansion, out: &mut BTreeSet<String>) {
    for id in exp.filter(|tree, id| {
        matches!(
            tree.kind(id),
            NodeKind::NamedRuleRef { .. } | NodeKind::RuleRef { .. }
        )
    }) {
        match exp.kind(id) {
            NodeKind::NamedRuleRef { name } => {
                out.insert(name.clone());
            }
            NodeKind::RuleRef { rule } => {
                if out.insert(rule.name().to_string()) {
                    collect_dependencies(rule.expansion(), out);
                }
            }
            _ => unreachable!("filtered to reference kinds"),
        }
    }
}

/// Rules are equal when their names, visibility and expansions are;
/// caches and match state are ignored.
impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.visible == other.visible
            && self.expansion == other.expansion
    }
}

impl Clone for Rule {
    fn clone(&self) -> Self {
        Rule {
            name: self.name.clone(),
            visible: self.visible,
            expansion: self.expansion.clone(),
            case_sensitive: self.case_sensitive,
            enabled: self.enabled,
            compiled: None,
            matcher: None,
            last_tags: Vec::new(),
        }
    }
}
