pub mod compiler;
pub mod ext;
pub mod matcher;
pub mod types;

pub use types::*;

// Re-export commonly used types
pub use types::errors::{GrammarError, MatcherBuildError, ParseError, ReferenceError};
pub use types::expansion::{Expansion, NodeId, NodeKind, TokenSpan, Walk};
pub use types::grammars::{Grammar, Import};
pub use types::references::ReferenceName;
pub use types::rules::Rule;
