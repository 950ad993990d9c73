//! Speech matching for expansion trees.
//!
//! An expansion is compiled into an element tree: a recognizer that
//! consumes whitespace-separated tokens with backtracking and journals the
//! token span of every participating node. The journal is committed back
//! onto the expansion tree only for the branch that produced the overall
//! match, so a node carries a span iff it took part in the successful parse.

mod element;
mod exec;

pub(crate) use element::{build_matcher, CompiledMatcher};
pub(crate) use exec::{Event, MatchMode, MatchRecord};

use crate::types::rules::Rule;

/// Resolves rule names for references encountered while building a matcher.
///
/// [`crate::Grammar`] implements this over its own rules; standalone rules
/// are built against [`NoRules`].
pub trait RuleResolver {
    fn resolve_rule(&self, name: &str) -> Option<&Rule>;
}

/// A resolver with no rules in scope.
pub struct NoRules;

impl RuleResolver for NoRules {
    fn resolve_rule(&self, _name: &str) -> Option<&Rule> {
        None
    }
}
