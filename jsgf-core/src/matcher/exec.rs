//! The backtracking executor for compiled matcher elements.
//!
//! Matching runs in continuation-passing style: each element consumes
//! tokens, journals its span, and hands the end position to a continuation
//! standing for the rest of the rule. Failure unwinds the journal, so by
//! the time the top-level call returns, the journal holds exactly the spans
//! of the branch that succeeded.

use log::trace;

use crate::matcher::element::{CompiledMatcher, Element};
use crate::types::expansion::{NodeId, TokenSpan};

/// How much of the input a successful match must consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchMode {
    /// Every token must be consumed.
    Full,
    /// Trailing tokens may remain; they become the caller's tail.
    Prefix,
}

/// One journaled observation during a match.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Event {
    /// The node consumed the span.
    Node(NodeId, TokenSpan),
    /// One iteration of a repetition node consumed the span.
    Iteration(NodeId, TokenSpan),
}

/// The outcome of a successful match.
#[derive(Debug)]
pub(crate) struct MatchRecord {
    /// End of the consumed prefix, in tokens.
    pub(crate) end: usize,
    /// Total number of input tokens.
    pub(crate) token_count: usize,
    /// Spans of every participating node, in completion order.
    pub(crate) events: Vec<Event>,
}

struct MatchState<'a> {
    tokens: &'a [&'a str],
    journal: Vec<Event>,
    /// Rule frames currently being expanded, by (slot, position). A frame
    /// may not re-enter itself without consuming input.
    active: Vec<(usize, usize)>,
}

type Cont<'c, 'a> = &'c mut dyn FnMut(&mut MatchState<'a>, usize) -> bool;

impl CompiledMatcher {
    /// Runs the matcher over `speech`. Returns `None` on a non-match; never
    /// errors.
    pub(crate) fn run_match(&self, speech: &str, mode: MatchMode) -> Option<MatchRecord> {
        let tokens: Vec<&str> = speech.split_whitespace().collect();
        let token_count = tokens.len();
        let mut state = MatchState {
            tokens: &tokens,
            journal: Vec::new(),
            active: Vec::new(),
        };
        let mut match_end = 0;
        let matched = run(self, &mut state, &self.root, 0, &mut |_state, end| {
            if mode == MatchMode::Full && end != token_count {
                return false;
            }
            match_end = end;
            true
        });
        trace!(
            "matched={matched} end={match_end}/{token_count} tokens={tokens:?}"
        );
        matched.then_some(MatchRecord {
            end: match_end,
            token_count,
            events: state.journal,
        })
    }
}

/// Journals the element's own span, then defers to the continuation. The
/// span is withdrawn if the rest of the rule cannot be made to match.
fn finish<'a>(
    state: &mut MatchState<'a>,
    node: Option<NodeId>,
    span: TokenSpan,
    cont: Cont<'_, 'a>,
) -> bool {
    if let Some(id) = node {
        state.journal.push(Event::Node(id, span));
    }
    if cont(state, span.end) {
        true
    } else {
        if node.is_some() {
            state.journal.pop();
        }
        false
    }
}

fn run<'a>(
    m: &CompiledMatcher,
    state: &mut MatchState<'a>,
    element: &Element,
    pos: usize,
    cont: Cont<'_, 'a>,
) -> bool {
    match element {
        Element::Literal {
            node,
            words,
            case_sensitive,
        } => {
            if pos + words.len() > state.tokens.len() {
                return false;
            }
            for (i, word) in words.iter().enumerate() {
                if !token_eq(state.tokens[pos + i], word, *case_sensitive) {
                    return false;
                }
            }
            finish(state, *node, TokenSpan::new(pos, pos + words.len()), cont)
        }
        Element::Sequence { node, items } => run_sequence(m, state, items, 0, pos, &mut |state,
                                                                                        end| {
            finish(state, *node, TokenSpan::new(pos, end), &mut *cont)
        }),
        Element::Alternatives { node, items } => {
            // Declaration order; the first alternative that leads to an
            // overall match wins.
            for item in items {
                let matched = run(m, state, item, pos, &mut |state, end| {
                    finish(state, *node, TokenSpan::new(pos, end), &mut *cont)
                });
                if matched {
                    return true;
                }
            }
            false
        }
        Element::Optional { node, item } => {
            // Present first, then absent. An absent optional participates
            // with an empty span.
            let present = run(m, state, item, pos, &mut |state, end| {
                finish(state, *node, TokenSpan::new(pos, end), &mut *cont)
            });
            if present {
                return true;
            }
            finish(state, *node, TokenSpan::new(pos, pos), cont)
        }
        Element::KleeneStar { node, item } => {
            run_repetitions(m, state, item, *node, pos, pos, true, cont)
        }
        Element::Repeat { node, item } => {
            run_repetitions(m, state, item, *node, pos, pos, false, cont)
        }
        Element::Empty { node } => finish(state, *node, TokenSpan::new(pos, pos), cont),
        Element::Never { .. } => false,
        Element::Dictation { node, unbounded } => {
            let len = state.tokens.len();
            if pos >= len {
                return false;
            }
            if *unbounded {
                return finish(state, *node, TokenSpan::new(pos, len), cont);
            }
            // Stop at the earliest position where the rest of the rule can
            // take over.
            for end in pos + 1..=len {
                if finish(state, *node, TokenSpan::new(pos, end), &mut *cont) {
                    return true;
                }
            }
            false
        }
        Element::RuleFrame { node, slot } => {
            let key = (*slot, pos);
            if state.active.contains(&key) {
                return false;
            }
            state.active.push(key);
            let body = &m.bodies[*slot];
            let matched = run(m, state, body, pos, &mut |state, end| {
                // The frame is left before the rest of the rule runs, and
                // re-armed if the body has to keep backtracking.
                state.active.retain(|k| *k != key);
                if finish(state, *node, TokenSpan::new(pos, end), &mut *cont) {
                    return true;
                }
                state.active.push(key);
                false
            });
            if !matched {
                state.active.retain(|k| *k != key);
            }
            matched
        }
    }
}

fn run_sequence<'a>(
    m: &CompiledMatcher,
    state: &mut MatchState<'a>,
    items: &[Element],
    index: usize,
    pos: usize,
    cont: Cont<'_, 'a>,
) -> bool {
    match items.get(index) {
        None => cont(state, pos),
        Some(item) => run(m, state, item, pos, &mut |state, end| {
            run_sequence(m, state, items, index + 1, end, &mut *cont)
        }),
    }
}

/// Greedy repetition with retreat: consume as many iterations as possible,
/// then give back one at a time while the rest of the rule keeps failing.
/// Iterations must consume at least one token so repetition over nullable
/// content terminates.
fn run_repetitions<'a>(
    m: &CompiledMatcher,
    state: &mut MatchState<'a>,
    item: &Element,
    node: Option<NodeId>,
    start: usize,
    pos: usize,
    min_reached: bool,
    cont: Cont<'_, 'a>,
) -> bool {
    let more = run(m, state, item, pos, &mut |state, end| {
        if end == pos {
            return false;
        }
        let mark = state.journal.len();
        if let Some(id) = node {
            state.journal.push(Event::Iteration(id, TokenSpan::new(pos, end)));
        }
        if run_repetitions(m, state, item, node, start, end, true, &mut *cont) {
            return true;
        }
        state.journal.truncate(mark);
        false
    });
    if more {
        return true;
    }
    if min_reached {
        finish(state, node, TokenSpan::new(start, pos), cont)
    } else {
        false
    }
}

fn token_eq(input: &str, expected: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        input == expected
    } else {
        input.to_lowercase() == expected.to_lowercase()
    }
}
