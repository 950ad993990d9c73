//! Parsing JSGF text into [`jsgf_core`] grammars, rules and expansion
//! trees.
//!
//! Three entry points mirror the three levels of the format:
//! [`parse_grammar`] for whole grammar documents, [`parse_rule`] for a
//! single `<name> = expansion;` definition, and [`parse_expansion`] for a
//! bare right-hand side. [`parse_grammar_with_imports`] additionally binds
//! references to rules of already-parsed grammars.

pub mod lexer;
pub mod parser;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use jsgf_core::{
    Expansion, Grammar, GrammarError, NodeKind, ParseError, Rule,
};

pub use parser::Parser;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Parses a grammar document. The `#JSGF` header is optional; missing
/// header fields default to version 1.0, UTF-8 and English.
pub fn parse_grammar(text: &str) -> Result<Grammar> {
    Parser::new(text)?.parse_grammar_document(false)
}

/// Parses a grammar document, requiring the `#JSGF` header line.
pub fn parse_grammar_strict(text: &str) -> Result<Grammar> {
    Parser::new(text)?.parse_grammar_document(true)
}

/// Reads and parses a grammar file.
pub fn parse_grammar_file(path: impl AsRef<Path>) -> Result<Grammar> {
    let text = std::fs::read_to_string(path).map_err(GrammarError::from)?;
    parse_grammar(&text)
}

/// Parses a grammar document and binds references to rules defined by
/// `imports`: a reference naming an imported rule, either by its
/// `<grammar>.<rule>` qualified form or by the simple name an import
/// statement brings into scope, is replaced with a direct reference
/// carrying a snapshot of that rule. References to the grammar's own rules
/// are left by name so recursive rules keep working.
pub fn parse_grammar_with_imports(text: &str, imports: &[Grammar]) -> Result<Grammar> {
    let mut grammar = parse_grammar(text)?;
    bind_imported_references(&mut grammar, imports);
    Ok(grammar)
}

/// Parses a single rule definition of the form `[public] <name> = …;`.
pub fn parse_rule(text: &str) -> Result<Rule> {
    let mut parser = Parser::new(text)?;
    let rule = parser.parse_rule_definition()?;
    parser.ensure_consumed()?;
    Ok(rule)
}

/// Parses a bare expansion.
pub fn parse_expansion(text: &str) -> Result<Expansion> {
    Parser::new(text)?.parse_expansion_text()
}

/// Whether `text` is a well-formed grammar document.
pub fn valid_grammar(text: &str) -> bool {
    parse_grammar(text).is_ok()
}

fn bind_imported_references(grammar: &mut Grammar, imports: &[Grammar]) {
    // Targets reachable by qualified name, and by simple name where an
    // import statement brings the rule into scope. Only public rules are
    // importable.
    let mut targets: HashMap<String, Rule> = HashMap::new();
    for imported in imports {
        for rule in imported.rules() {
            if rule.visible() {
                targets.insert(format!("{}.{}", imported.name(), rule.name()), rule.clone());
            }
        }
    }
    for import in grammar.imports().to_vec() {
        let Some(imported) = imports.iter().find(|g| g.name() == import.grammar_name()) else {
            continue;
        };
        match import.rule_name() {
            Some(rule_name) => {
                if let Some(rule) = imported.get_rule(rule_name) {
                    if rule.visible() {
                        targets.insert(rule_name.to_string(), rule.clone());
                    }
                }
            }
            None => {
                for rule in imported.visible_rules() {
                    targets.insert(rule.name().to_string(), rule.clone());
                }
            }
        }
    }

    let own_names: Vec<String> = grammar
        .rule_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    for name in &own_names {
        let rule = grammar.get_rule_mut(name).expect("name was just listed");
        let refs: Vec<_> = rule
            .expansion()
            .filter(|tree, id| matches!(tree.kind(id), NodeKind::NamedRuleRef { .. }))
            .into_iter()
            .map(|id| {
                let NodeKind::NamedRuleRef { name } = rule.expansion().kind(id) else {
                    unreachable!("filtered to named references");
                };
                (id, name.clone())
            })
            .collect();
        for (id, ref_name) in refs {
            if own_names.contains(&ref_name) {
                continue;
            }
            if let Some(target) = targets.get(&ref_name) {
                rule.expansion_mut()
                    .replace(id, Expansion::rule_ref(target.clone()));
            }
        }
    }
}
