use thiserror::Error;

/// Error produced while parsing JSGF text.
#[derive(Error, Debug)]
#[error("parse error at line {line}, offset {offset}: expected {production}, found {found}")]
pub struct ParseError {
    /// Byte offset into the source text.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// The production that failed to parse.
    pub production: &'static str,
    /// The offending token text, or a description of it.
    pub found: String,
}

#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("grammar already contains a different rule named '{0}'")]
    DuplicateRule(String),

    #[error("'{name}' is not a valid {kind} name")]
    InvalidName { name: String, kind: &'static str },

    #[error("'{0}' is not a rule in this grammar")]
    NoSuchRule(String),

    #[error("cannot remove rule '{0}' because another rule references it")]
    RuleInUse(String),

    #[error("import '{0}' is not present in this grammar")]
    NoSuchImport(String),

    #[error("cannot compile a literal with empty text")]
    EmptyLiteral,

    #[error("invalid expansion operation: {0}")]
    InvalidOperation(String),

    #[error("expanding dictation alternatives produced {count} variants (limit {limit})")]
    TooManyExpansions { count: usize, limit: usize },

    #[error("rule '{0}' does not contain dictation")]
    NoDictation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error produced when a rule reference cannot be resolved.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("reference to unknown rule '{0}'")]
    UnresolvedRule(String),
}

/// Error produced while building a matcher from an expansion tree.
#[derive(Error, Debug)]
pub enum MatcherBuildError {
    #[error("rule '{0}' is directly left recursive")]
    LeftRecursion(String),

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}
