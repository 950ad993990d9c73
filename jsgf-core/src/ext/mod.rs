//! The dictation extension: free-speech placeholders inside grammars.
//!
//! A `Dictation` node stands for arbitrary spoken words supplied by an
//! external language model. Rules containing dictation cannot be handed to
//! a JSGF decoder as-is, so this module splits them into sequences of
//! plain and dictation-only parts that are matched incrementally against
//! utterance fragments.

pub mod expansions;
pub mod grammars;
pub mod rules;

pub use expansions::{
    contains_dictation, expand_dictation_expansion, is_dictation_free, is_dictation_only,
    MAX_DICTATION_VARIANTS,
};
pub use grammars::{DictationGrammar, RuleMatch};
pub use rules::SequenceRule;
