mod common;

use common::*;
use jsgf_core::{Grammar, GrammarError, Import};

#[test]
fn test_add_rule_duplicates() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(public_rule("hello", lit("hello world")))
        .unwrap();

    // A structurally equal duplicate is a silent no-op.
    grammar
        .add_rule(public_rule("hello", lit("hello world")))
        .unwrap();
    assert_eq!(grammar.rules().len(), 1);

    // A different rule under the same name is rejected.
    assert!(matches!(
        grammar.add_rule(public_rule("hello", lit("goodbye"))),
        Err(GrammarError::DuplicateRule(name)) if name == "hello"
    ));
}

#[test]
fn test_invalid_grammar_names() {
    assert!(matches!(
        Grammar::new("NULL"),
        Err(GrammarError::InvalidName { .. })
    ));
    assert!(Grammar::new("com.example.grammar").is_ok());
}

#[test]
fn test_find_matching_rules() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(public_rule("hello", lit("hello world")))
        .unwrap();
    grammar
        .add_rule(public_rule("bye", lit("goodbye")))
        .unwrap();

    let matched = grammar.find_matching_rules("hello world").unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name(), "hello");
    assert!(grammar.find_matching_rules("nothing here").unwrap().is_empty());
}

#[test]
fn test_compile_full_grammar() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar.add_import(Import::new("other.rule_name").unwrap());
    grammar
        .add_rule(public_rule("hello", lit("hello world")))
        .unwrap();
    grammar
        .add_rule(private_rule("helper", lit("helper words")))
        .unwrap();

    assert_eq!(
        grammar.compile().unwrap(),
        "#JSGF V1.0 UTF-8 en;\n\
         grammar test;\n\
         import <other.rule_name>;\n\
         public <hello> = hello world;\n\
         <helper> = helper words;\n"
    );
}

#[test]
fn test_compile_as_root_grammar() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar.add_rule(public_rule("one", lit("one"))).unwrap();
    grammar.add_rule(public_rule("two", lit("two"))).unwrap();

    let compiled = grammar.compile_as_root_grammar().unwrap();
    assert!(compiled.contains("public <root> = (<one> | <two>);"));
    assert!(compiled.contains("<one> = one;"));
    assert!(compiled.contains("<two> = two;"));
    assert!(!compiled.contains("public <one>"));

    // Visibility is restored afterwards.
    assert!(grammar.get_rule("one").unwrap().visible());
}

#[test]
fn test_imports() {
    let mut grammar = Grammar::new("test").unwrap();
    let import = Import::new("com.example.other.*").unwrap();
    assert!(import.is_wildcard());
    assert_eq!(import.grammar_name(), "com.example.other");
    assert_eq!(import.rule_name(), None);

    grammar.add_import(import.clone());
    grammar.add_import(import.clone());
    assert_eq!(grammar.import_names(), vec!["com.example.other.*"]);

    grammar.remove_import(&import).unwrap();
    assert!(grammar.import_names().is_empty());

    // Removing an import that is not present is an error.
    assert!(matches!(
        grammar.remove_import(&import),
        Err(GrammarError::NoSuchImport(_))
    ));
}

#[test]
fn test_invalid_import_names() {
    // Imports must be qualified.
    assert!(matches!(
        Import::new("rule_name"),
        Err(GrammarError::InvalidName { .. })
    ));
    assert!(Import::new("grammar.rule_name").is_ok());
    assert!(Import::new("grammar.*").is_ok());
}

#[test]
fn test_remove_rule_dependency_protection() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(private_rule("word", lit("hello")))
        .unwrap();
    grammar
        .add_rule(public_rule("greeting", rule_ref("word")))
        .unwrap();

    assert!(matches!(
        grammar.remove_rule("word", false),
        Err(GrammarError::RuleInUse(name)) if name == "word"
    ));
    assert!(grammar.remove_rule("word", true).is_ok());
    assert!(matches!(
        grammar.remove_rule("missing", false),
        Err(GrammarError::NoSuchRule(_))
    ));
}

#[test]
fn test_enable_disable_rules() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(public_rule("hello", lit("hello")))
        .unwrap();

    grammar.disable_rule("hello").unwrap();
    assert!(grammar.find_matching_rules("hello").unwrap().is_empty());
    assert!(!grammar.compile().unwrap().contains("<hello>"));

    grammar.enable_rule("hello").unwrap();
    assert_eq!(grammar.find_matching_rules("hello").unwrap().len(), 1);
    assert!(grammar.compile().unwrap().contains("public <hello> = hello;"));

    assert!(matches!(
        grammar.disable_rule("missing"),
        Err(GrammarError::NoSuchRule(_))
    ));
}

#[test]
fn test_get_rules_by_name_accepts_qualified_form() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(public_rule("hello", lit("hello")))
        .unwrap();

    assert_eq!(grammar.get_rules_by_name("hello").len(), 1);
    assert_eq!(grammar.get_rules_by_name("test.hello").len(), 1);
    assert!(grammar.get_rules_by_name("other.hello").is_empty());
}

#[test]
fn test_compile_to_file() {
    let mut grammar = Grammar::new("test").unwrap();
    grammar
        .add_rule(public_rule("hello", lit("hello world")))
        .unwrap();

    let path = std::env::temp_dir().join("jsgf_core_grammar_test.gram");
    grammar.compile_to_file(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, grammar.compile().unwrap());
    std::fs::remove_file(&path).ok();
}
