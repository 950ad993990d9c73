pub mod errors;
pub mod expansion;
pub mod grammars;
pub mod references;
pub mod rules;
