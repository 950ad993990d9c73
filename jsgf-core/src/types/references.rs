//! Validation for rule, grammar and import names.
//!
//! Names follow the JSGF conventions: one or more name characters, optionally
//! joined by dots into a qualified name (Java package syntax). `NULL` and
//! `VOID` are reserved and rejected, case-sensitively, so `null` and `void`
//! remain usable.

use std::fmt;

use crate::types::errors::GrammarError;

/// Characters allowed in a single name segment besides Unicode alphanumerics.
const NAME_SPECIALS: &str = "+-:@#%!^&~$_'";

/// Reserved rule names that cannot be used for rules, grammars or imports.
pub const RESERVED_NAMES: [&str; 2] = ["NULL", "VOID"];

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || NAME_SPECIALS.contains(c)
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.chars().all(is_name_char)
        && !RESERVED_NAMES.contains(&segment)
}

/// Whether `name` is a valid simple or dot-qualified reference name.
pub fn valid_reference_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(valid_segment)
}

/// Whether `name` is a valid import name: a qualified name with at least two
/// segments, where the final segment may be the wildcard `*`.
pub fn valid_import_name(name: &str) -> bool {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 2 {
        return false;
    }
    let (last, init) = segments.split_last().expect("at least two segments");
    init.iter().all(|s| valid_segment(s)) && (*last == "*" || valid_segment(last))
}

/// A validated rule or grammar name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceName(String);

impl ReferenceName {
    pub fn new(name: impl Into<String>, kind: &'static str) -> Result<Self, GrammarError> {
        let name = name.into();
        if valid_reference_name(&name) {
            Ok(ReferenceName(name))
        } else {
            Err(GrammarError::InvalidName { name, kind })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final segment of a qualified name, or the whole name if simple.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().expect("names are non-empty")
    }
}

impl fmt::Display for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ReferenceName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
