//! JSGF grammars: ordered, name-unique rule collections with header
//! metadata and imports.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::matcher::{build_matcher, MatchMode, RuleResolver};
use crate::types::errors::{GrammarError, MatcherBuildError};
use crate::types::expansion::Expansion;
use crate::types::references::{valid_import_name, ReferenceName};
use crate::types::rules::Rule;

/// An import of a rule, or of all public rules, from another grammar.
///
/// Import names are fully qualified; a trailing `.*` imports every public
/// rule of the named grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    name: String,
}

impl Import {
    pub fn new(name: impl Into<String>) -> Result<Self, GrammarError> {
        let name = name.into();
        if valid_import_name(&name) {
            Ok(Import { name })
        } else {
            Err(GrammarError::InvalidName {
                name,
                kind: "import",
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_wildcard(&self) -> bool {
        self.name.ends_with(".*")
    }

    /// The name of the grammar being imported from.
    pub fn grammar_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .expect("import names are qualified")
            .0
    }

    /// The imported rule name, unless this is a wildcard import.
    pub fn rule_name(&self) -> Option<&str> {
        let (_, last) = self
            .name
            .rsplit_once('.')
            .expect("import names are qualified");
        (last != "*").then_some(last)
    }

    pub fn compile(&self) -> String {
        format!("import <{}>;", self.name)
    }
}

/// Default JSGF header values: version, charset, language.
pub const DEFAULT_HEADER: (&str, &str, &str) = ("1.0", "UTF-8", "en");

/// A JSGF grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: ReferenceName,
    pub jsgf_version: String,
    pub charset_name: String,
    pub language_name: String,
    rules: Vec<Rule>,
    imports: Vec<Import>,
    case_sensitive: bool,
    /// Bumped whenever the rule set changes, so cached matchers built
    /// against this grammar notice staleness.
    revision: u64,
}

impl Grammar {
    pub fn new(name: impl Into<String>) -> Result<Self, GrammarError> {
        let (version, charset, language) = DEFAULT_HEADER;
        Ok(Grammar {
            name: ReferenceName::new(name, "grammar")?,
            jsgf_version: version.to_string(),
            charset_name: charset.to_string(),
            language_name: language.to_string(),
            rules: Vec::new(),
            imports: Vec::new(),
            case_sensitive: false,
            revision: 0,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        if self.case_sensitive != case_sensitive {
            self.case_sensitive = case_sensitive;
            self.revision += 1;
        }
    }

    /// The `#JSGF ...;` header line.
    pub fn header(&self) -> String {
        format!(
            "#JSGF V{} {} {};\n",
            self.jsgf_version, self.charset_name, self.language_name
        )
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn visible_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.visible())
    }

    /// Adds a rule. Adding a rule structurally equal to an existing one is
    /// a silent no-op; a name clash with a different rule is an error.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), GrammarError> {
        if let Some(existing) = self.rules.iter().find(|r| r.name() == rule.name()) {
            if *existing == rule {
                return Ok(());
            }
            return Err(GrammarError::DuplicateRule(rule.name().to_string()));
        }
        self.rules.push(rule);
        self.revision += 1;
        Ok(())
    }

    pub fn add_rules(&mut self, rules: Vec<Rule>) -> Result<(), GrammarError> {
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(())
    }

    /// Removes the named rule and returns it. Fails if another rule in the
    /// grammar depends on it, unless `ignore_dependent` is set.
    pub fn remove_rule(
        &mut self,
        name: &str,
        ignore_dependent: bool,
    ) -> Result<Rule, GrammarError> {
        let index = self
            .rules
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| GrammarError::NoSuchRule(name.to_string()))?;
        if !ignore_dependent
            && self
                .rules
                .iter()
                .any(|r| r.name() != name && r.dependencies().contains(name))
        {
            return Err(GrammarError::RuleInUse(name.to_string()));
        }
        let rule = self.rules.remove(index);
        self.revision += 1;
        Ok(rule)
    }

    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    pub fn get_rule_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.name() == name)
    }

    /// Looks a rule up by simple or qualified name, accepting the
    /// `<grammar>.<rule>` form used by imports.
    pub fn get_rules_by_name(&self, name: &str) -> Vec<&Rule> {
        let simple = name
            .strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        self.rules
            .iter()
            .filter(|r| r.name() == simple)
            .collect()
    }

    pub fn enable_rule(&mut self, name: &str) -> Result<(), GrammarError> {
        self.get_rule_mut(name)
            .ok_or_else(|| GrammarError::NoSuchRule(name.to_string()))?
            .enable();
        Ok(())
    }

    pub fn disable_rule(&mut self, name: &str) -> Result<(), GrammarError> {
        self.get_rule_mut(name)
            .ok_or_else(|| GrammarError::NoSuchRule(name.to_string()))?
            .disable();
        Ok(())
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn import_names(&self) -> Vec<&str> {
        self.imports.iter().map(|i| i.name()).collect()
    }

    pub fn add_import(&mut self, import: Import) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    /// Removes an import. Only an [`Import`] value identifies one; there is
    /// deliberately no removal by bare string.
    pub fn remove_import(&mut self, import: &Import) -> Result<(), GrammarError> {
        let index = self
            .imports
            .iter()
            .position(|i| i == import)
            .ok_or_else(|| GrammarError::NoSuchImport(import.name().to_string()))?;
        self.imports.remove(index);
        Ok(())
    }

    /// Every visible, enabled rule that matches `speech` completely.
    pub fn find_matching_rules(
        &mut self,
        speech: &str,
    ) -> Result<Vec<&Rule>, MatcherBuildError> {
        let mut matched = Vec::new();
        for index in 0..self.rules.len() {
            if !self.rules[index].visible() || !self.rules[index].is_enabled() {
                continue;
            }
            if self.match_rule_at(index, speech, MatchMode::Full)? {
                matched.push(index);
            }
        }
        debug!(
            "grammar '{}': {} of {} rules match {speech:?}",
            self.name,
            matched.len(),
            self.rules.len()
        );
        Ok(self
            .rules
            .iter()
            .enumerate()
            .filter(|(i, _)| matched.contains(i))
            .map(|(_, r)| r)
            .collect())
    }

    fn match_rule_at(
        &mut self,
        index: usize,
        speech: &str,
        mode: MatchMode,
    ) -> Result<bool, MatcherBuildError> {
        let case = self.rules[index]
            .case_sensitivity()
            .unwrap_or(self.case_sensitive);
        if !self.rules[index].matcher_current(self.revision, case) {
            let matcher =
                build_matcher(&self.rules[index], self, self.case_sensitive, self.revision)?;
            self.rules[index].install_matcher(matcher);
        }
        Ok(self.rules[index]
            .run_cached_matcher(speech, mode)
            .is_some())
    }

    /// Compiles the full grammar: header, grammar declaration, imports,
    /// then rules in declaration order.
    pub fn compile(&mut self) -> Result<String, GrammarError> {
        let mut result = self.header();
        result.push_str(&format!("grammar {};\n", self.name));
        for import in &self.imports {
            result.push_str(&import.compile());
            result.push('\n');
        }
        for index in 0..self.rules.len() {
            let compiled = self.rules[index].compile()?;
            if !compiled.is_empty() {
                result.push_str(&compiled);
                result.push('\n');
            }
        }
        Ok(result)
    }

    /// Compiles with a synthesized `public <root>` rule referencing every
    /// visible rule, and every other rule private. Decoders that accept a
    /// single entry rule take grammars in this shape.
    pub fn compile_as_root_grammar(&mut self) -> Result<String, GrammarError> {
        let mut result = self.header();
        result.push_str(&format!("grammar {};\n", self.name));
        for import in &self.imports {
            result.push_str(&import.compile());
            result.push('\n');
        }

        let mut names: Vec<String> = Vec::new();
        let mut compiled_rules = String::new();
        for index in 0..self.rules.len() {
            let was_visible = self.rules[index].visible();
            self.rules[index].set_visible(false);
            let compiled = self.rules[index].compile();
            self.rules[index].set_visible(was_visible);
            let compiled = compiled?;
            if compiled.is_empty() {
                continue;
            }
            compiled_rules.push_str(&compiled);
            compiled_rules.push('\n');
            if was_visible {
                names.push(self.rules[index].name().to_string());
            }
        }

        if !names.is_empty() {
            let refs = Expansion::alternatives(
                names
                    .iter()
                    .map(|n| Expansion::named_rule_ref(n.as_str()))
                    .collect(),
            );
            let mut root = Rule::public("root", Expansion::required(vec![refs]))?;
            result.push_str(&root.compile()?);
            result.push('\n');
            result.push_str(&compiled_rules);
        }
        Ok(result)
    }

    /// Compiles the grammar and writes the result to `path`.
    pub fn compile_to_file(&mut self, path: impl AsRef<Path>) -> Result<(), GrammarError> {
        let compiled = self.compile()?;
        let mut file = File::create(path)?;
        file.write_all(compiled.as_bytes())?;
        Ok(())
    }
}

impl RuleResolver for Grammar {
    fn resolve_rule(&self, name: &str) -> Option<&Rule> {
        self.get_rules_by_name(name).into_iter().next()
    }
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.header() == other.header()
            && self.rules == other.rules
            && self.imports == other.imports
    }
}
