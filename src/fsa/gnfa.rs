//! Generalized NFA: every pair of states carries a regex fragment, and
//! states are eliminated one at a time until only the fragment between the
//! fresh start and the fresh accept remains. This is the machinery behind
//! `Dfa::encode`.

use std::collections::{BTreeMap, BTreeSet};
use std::iter::once;

use itertools::iproduct;

use crate::fsa::dfa::Dfa;
use crate::fsa::State;

const EMPTY_SET: &str = "Ø";
const EMPTY_STRING: &str = "€";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Node<S> {
    Start,
    Body(S),
    Accept,
}

pub(crate) struct Gnfa<S: State> {
    transitions: BTreeMap<(Node<S>, Node<S>), String>,
    body: BTreeSet<S>,
}

impl<S: State> Gnfa<S> {
    /// Wrap a DFA: symbols between the same pair of states merge into one
    /// alternation fragment, a fresh start reaches the old start by ε, every
    /// old accept reaches a fresh accept by ε, and all remaining pairs get
    /// the empty-set fragment.
    pub(crate) fn from_dfa(dfa: &Dfa<S>) -> Self {
        let mut transitions: BTreeMap<(Node<S>, Node<S>), String> = BTreeMap::new();
        for ((state, symbol), target) in &dfa.transitions {
            let edge = (Node::Body(state.clone()), Node::Body(target.clone()));
            match transitions.get_mut(&edge) {
                Some(fragment) => {
                    fragment.push('|');
                    fragment.push_str(symbol);
                }
                None => {
                    transitions.insert(edge, symbol.clone());
                }
            }
        }
        transitions.insert(
            (Node::Start, Node::Body(dfa.start.clone())),
            EMPTY_STRING.to_string(),
        );
        for accept in &dfa.accept {
            transitions.insert(
                (Node::Body(accept.clone()), Node::Accept),
                EMPTY_STRING.to_string(),
            );
        }
        let sources: Vec<Node<S>> = once(Node::Start)
            .chain(dfa.states.iter().cloned().map(Node::Body))
            .collect();
        let targets: Vec<Node<S>> = dfa
            .states
            .iter()
            .cloned()
            .map(Node::Body)
            .chain(once(Node::Accept))
            .collect();
        for (source, target) in iproduct!(&sources, &targets) {
            transitions
                .entry((source.clone(), target.clone()))
                .or_insert_with(|| EMPTY_SET.to_string());
        }
        Gnfa {
            transitions,
            body: dfa.states.clone(),
        }
    }

    pub(crate) fn is_reduced(&self) -> bool {
        self.body.is_empty()
    }

    /// Eliminate one body state: every surviving edge absorbs the paths
    /// that used to run through the ripped state, by `r1 r2* r3 | r4`.
    pub(crate) fn reduce(self) -> Self {
        let mut body = self.body;
        let rip = match body.pop_first() {
            Some(state) => Node::Body(state),
            None => {
                return Gnfa {
                    transitions: self.transitions,
                    body,
                }
            }
        };
        let self_loop = star_fragment(&self.transitions[&(rip.clone(), rip.clone())]);
        let sources: Vec<Node<S>> = once(Node::Start)
            .chain(body.iter().cloned().map(Node::Body))
            .collect();
        let targets: Vec<Node<S>> = body
            .iter()
            .cloned()
            .map(Node::Body)
            .chain(once(Node::Accept))
            .collect();
        let mut reduced = BTreeMap::new();
        for (source, target) in iproduct!(&sources, &targets) {
            let into_rip = &self.transitions[&(source.clone(), rip.clone())];
            let out_of_rip = &self.transitions[&(rip.clone(), target.clone())];
            let direct = &self.transitions[&(source.clone(), target.clone())];
            let through = concat_fragments(&concat_fragments(into_rip, &self_loop), out_of_rip);
            reduced.insert(
                (source.clone(), target.clone()),
                union_fragments(&through, direct),
            );
        }
        Gnfa {
            transitions: reduced,
            body,
        }
    }

    /// The fragment on the only edge left once every body state is gone.
    pub(crate) fn regex(&self) -> String {
        self.transitions[&(Node::Start, Node::Accept)].clone()
    }
}

/// Whether the fragment has an alternation at parenthesis depth zero, in
/// which case concatenation has to parenthesize it.
fn union_main_scope(fragment: &str) -> bool {
    let mut depth = 0u32;
    for c in fragment.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

fn star_fragment(fragment: &str) -> String {
    if fragment == EMPTY_SET || fragment == EMPTY_STRING {
        EMPTY_STRING.to_string()
    } else if fragment.chars().count() == 1 {
        format!("{}*", fragment)
    } else {
        format!("({})*", fragment)
    }
}

fn concat_fragments(left: &str, right: &str) -> String {
    if left == EMPTY_SET || right == EMPTY_SET {
        EMPTY_SET.to_string()
    } else if left == EMPTY_STRING {
        right.to_string()
    } else if right == EMPTY_STRING {
        left.to_string()
    } else {
        let left = if union_main_scope(left) {
            format!("({})", left)
        } else {
            left.to_string()
        };
        let right = if union_main_scope(right) {
            format!("({})", right)
        } else {
            right.to_string()
        };
        format!("{}{}", left, right)
    }
}

fn union_fragments(left: &str, right: &str) -> String {
    if left == EMPTY_SET {
        right.to_string()
    } else if right == EMPTY_SET {
        left.to_string()
    } else {
        format!("{}|{}", left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_algebra_identities() {
        assert_eq!(star_fragment("Ø"), "€");
        assert_eq!(star_fragment("€"), "€");
        assert_eq!(star_fragment("a"), "a*");
        assert_eq!(star_fragment("ab"), "(ab)*");
        assert_eq!(concat_fragments("a", "Ø"), "Ø");
        assert_eq!(concat_fragments("€", "b"), "b");
        assert_eq!(concat_fragments("a|b", "c"), "(a|b)c");
        assert_eq!(concat_fragments("(a|b)", "c"), "(a|b)c");
        assert_eq!(union_fragments("Ø", "b"), "b");
        assert_eq!(union_fragments("a", "b"), "a|b");
    }

    #[test]
    fn single_state_loop_encodes_to_a_star() {
        let dfa = Dfa::new(
            [
                (("q".to_string(), "a".to_string()), "q".to_string()),
            ],
            "q".to_string(),
            ["q".to_string()],
        )
        .unwrap();
        assert_eq!(dfa.encode(), "a*");
    }
}
