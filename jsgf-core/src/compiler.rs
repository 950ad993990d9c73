//! Rendering expansion trees back to canonical JSGF text.
//!
//! Output is a pure function of the tree. Precedence from tightest to
//! loosest: atoms (single-word literals, references, groupings), the unary
//! `*` and `+` operators, sequences, alternative sets. Parentheses are only
//! emitted where a looser construct appears in a tighter position.

use crate::types::errors::GrammarError;
use crate::types::expansion::{Expansion, NodeId, NodeKind};

/// Compiles an expansion tree to JSGF text.
pub fn compile_expansion(exp: &Expansion) -> Result<String, GrammarError> {
    render(exp, exp.root())
}

fn render(exp: &Expansion, id: NodeId) -> Result<String, GrammarError> {
    let body = match exp.kind(id) {
        NodeKind::Literal { text } => {
            if text.is_empty() {
                return Err(GrammarError::EmptyLiteral);
            }
            text.clone()
        }
        NodeKind::Sequence => {
            let parts = exp
                .children(id)
                .iter()
                .map(|c| render_grouped(exp, *c, sequence_child_needs_parens(exp, *c)))
                .collect::<Result<Vec<_>, _>>()?;
            parts.join(" ")
        }
        NodeKind::AlternativeSet { weights } => {
            let mut parts = Vec::new();
            for (i, child) in exp.children(id).iter().enumerate() {
                let rendered =
                    render_grouped(exp, *child, matches!(exp.kind(*child), NodeKind::AlternativeSet { .. }))?;
                match weights {
                    Some(weights) => {
                        parts.push(format!("/{}/ {}", format_weight(weights[i]), rendered))
                    }
                    None => parts.push(rendered),
                }
            }
            parts.join(" | ")
        }
        NodeKind::OptionalGrouping => {
            let parts = exp
                .children(id)
                .iter()
                .map(|c| render(exp, *c))
                .collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", parts.join(" "))
        }
        NodeKind::RequiredGrouping => {
            let parts = exp
                .children(id)
                .iter()
                .map(|c| render(exp, *c))
                .collect::<Result<Vec<_>, _>>()?;
            format!("({})", parts.join(" "))
        }
        NodeKind::KleeneStar => {
            let child = exp.children(id)[0];
            format!(
                "{}*",
                render_grouped(exp, child, postfix_child_needs_parens(exp, child))?
            )
        }
        NodeKind::Repeat => {
            let child = exp.children(id)[0];
            format!(
                "{}+",
                render_grouped(exp, child, postfix_child_needs_parens(exp, child))?
            )
        }
        NodeKind::NamedRuleRef { name } => format!("<{name}>"),
        NodeKind::RuleRef { rule } => format!("<{}>", rule.name()),
        NodeKind::NullRef => "<NULL>".to_string(),
        NodeKind::VoidRef => "<VOID>".to_string(),
        NodeKind::Dictation => "<DICTATION>".to_string(),
    };
    Ok(format!("{}{}", body, tag_suffix(exp.tags(id))))
}

fn render_grouped(exp: &Expansion, id: NodeId, parens: bool) -> Result<String, GrammarError> {
    let rendered = render(exp, id)?;
    if parens {
        Ok(format!("({rendered})"))
    } else {
        Ok(rendered)
    }
}

/// An alternative set directly inside a sequence must be parenthesized, or
/// the `|` would claim the whole sequence on re-parse.
fn sequence_child_needs_parens(exp: &Expansion, id: NodeId) -> bool {
    matches!(exp.kind(id), NodeKind::AlternativeSet { .. })
}

/// The unary operators bind to a single atom, so anything wider than one
/// needs a group.
fn postfix_child_needs_parens(exp: &Expansion, id: NodeId) -> bool {
    match exp.kind(id) {
        NodeKind::Literal { text } => text.contains(' '),
        NodeKind::Sequence
        | NodeKind::AlternativeSet { .. }
        | NodeKind::KleeneStar
        | NodeKind::Repeat => true,
        _ => false,
    }
}

fn tag_suffix(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!(" {{ {} }}", escape_tag(t)))
        .collect::<Vec<_>>()
        .concat()
}

/// Escapes `\`, `{` and `}` so tags containing them survive a round-trip,
/// as the JSGF specification suggests.
fn escape_tag(tag: &str) -> String {
    tag.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.1}")
    } else {
        format!("{weight}")
    }
}
