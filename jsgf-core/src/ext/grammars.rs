//! A grammar wrapper that accepts dictation-bearing rules.

use log::debug;

use crate::ext::expansions::contains_dictation;
use crate::ext::rules::SequenceRule;
use crate::types::errors::{GrammarError, MatcherBuildError};
use crate::types::grammars::Grammar;
use crate::types::rules::Rule;

/// One rule matched by [`DictationGrammar::find_matching_rules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Name of the matched rule.
    pub name: String,
    /// For sequence rules, the fragment index the match was made at.
    pub fragment_index: Option<usize>,
    /// The accumulated text once a whole sequence has been matched; for
    /// plain rules, the matched speech.
    pub entire_match: Option<String>,
}

/// A grammar that stores plain rules as-is and converts dictation-bearing
/// rules into [`SequenceRule`]s matched incrementally.
///
/// Compilation only ever emits plain JSGF: the dictation parts are matched
/// in the host while the external decoder sees the dictation-free parts.
#[derive(Debug, Clone)]
pub struct DictationGrammar {
    plain: Grammar,
    sequences: Vec<SequenceRule>,
}

impl DictationGrammar {
    pub fn new(name: impl Into<String>) -> Result<Self, GrammarError> {
        Ok(DictationGrammar {
            plain: Grammar::new(name)?,
            sequences: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.plain.name()
    }

    /// The wrapped grammar holding the dictation-free rules.
    pub fn plain_grammar(&self) -> &Grammar {
        &self.plain
    }

    pub fn rule_names(&self) -> Vec<&str> {
        let mut names = self.plain.rule_names();
        names.extend(self.sequences.iter().map(|s| s.name()));
        names
    }

    pub fn sequence_rule(&self, name: &str) -> Option<&SequenceRule> {
        self.sequences.iter().find(|s| s.name() == name)
    }

    pub fn sequence_rule_mut(&mut self, name: &str) -> Option<&mut SequenceRule> {
        self.sequences.iter_mut().find(|s| s.name() == name)
    }

    /// Adds a rule, splitting it into a sequence rule when it contains
    /// dictation. Duplicate names follow [`Grammar::add_rule`]: equal rules
    /// are a no-op, different ones an error.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), GrammarError> {
        if let Some(existing) = self.sequences.iter().find(|s| s.name() == rule.name()) {
            if existing.visible() == rule.visible()
                && existing.original_expansion() == rule.expansion()
            {
                return Ok(());
            }
            return Err(GrammarError::DuplicateRule(rule.name().to_string()));
        }
        if contains_dictation(rule.expansion()) {
            if self.plain.get_rule(rule.name()).is_some() {
                return Err(GrammarError::DuplicateRule(rule.name().to_string()));
            }
            debug!("splitting rule <{}> at dictation boundaries", rule.name());
            self.sequences.push(SequenceRule::new(&rule)?);
            Ok(())
        } else {
            self.plain.add_rule(rule)
        }
    }

    /// Removes a rule from whichever store holds it.
    pub fn remove_rule(&mut self, name: &str) -> Result<(), GrammarError> {
        if let Some(index) = self.sequences.iter().position(|s| s.name() == name) {
            self.sequences.remove(index);
            return Ok(());
        }
        self.plain.remove_rule(name, true).map(|_| ())
    }

    /// Every visible rule whose current expectation matches `speech`.
    ///
    /// Plain rules match as usual. A sequence rule matches when its current
    /// part accepts the fragment; with `advance` set, matched sequence
    /// rules move on to their next fragment automatically.
    pub fn find_matching_rules(
        &mut self,
        speech: &str,
        advance: bool,
    ) -> Result<Vec<RuleMatch>, MatcherBuildError> {
        let mut matches = Vec::new();
        for rule in self.plain.find_matching_rules(speech)? {
            let entire = rule.expansion().matched_text(rule.expansion().root(), speech);
            matches.push(RuleMatch {
                name: rule.name().to_string(),
                fragment_index: None,
                entire_match: entire,
            });
        }
        for sequence in &mut self.sequences {
            if !sequence.visible() {
                continue;
            }
            let index = sequence.current_index();
            if sequence.matches(speech)? {
                matches.push(RuleMatch {
                    name: sequence.name().to_string(),
                    fragment_index: Some(index),
                    entire_match: sequence.entire_match(),
                });
                if advance {
                    sequence.set_next();
                }
            }
        }
        Ok(matches)
    }

    /// Restarts every sequence rule's progression.
    pub fn reset_sequence_rules(&mut self) {
        for sequence in &mut self.sequences {
            sequence.restart_dictation_context();
        }
    }

    /// Compiles the dictation-free view of this grammar: all plain rules,
    /// plus each sequence rule whose current part is plain JSGF.
    pub fn compile(&mut self) -> Result<String, GrammarError> {
        let mut result = self.plain.compile()?;
        for sequence in &self.sequences {
            let compiled = sequence.compile()?;
            if !compiled.is_empty() {
                result.push_str(&compiled);
                result.push('\n');
            }
        }
        Ok(result)
    }

    /// Compiles the grammar and writes the result to `path`.
    pub fn compile_to_file(
        &mut self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), GrammarError> {
        let compiled = self.compile()?;
        std::fs::write(path, compiled)?;
        Ok(())
    }
}
