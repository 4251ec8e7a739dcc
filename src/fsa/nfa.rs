//! Nondeterministic finite automata.
//!
//! Transition tables map `(state, symbol)` to a *set* of successor states.
//! ε-moves use the empty-string key and are optional: an absent ε entry
//! means the empty set. The table must cover every `(state, symbol)` pair
//! for the proper (non-ε) alphabet, which is how the alphabet is inferred
//! in the first place.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::{Add, BitOr};

use itertools::iproduct;

use crate::error::ValidationError;
use crate::fsa::dfa::Dfa;
use crate::fsa::{
    check_alphabet, check_input, extract_states_alphabet, format_offenders, State, Symbol, EPSILON,
};

/// State of a union machine: the fresh ε-branching start, or a state of
/// either operand, renamed apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Branch<L, R> {
    Start,
    Left(L),
    Right(R),
}

/// State of a concatenation machine: a state of either operand, renamed
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Merged<L, R> {
    Left(L),
    Right(R),
}

/// State of a starred machine: the fresh accepting start, or a state of the
/// original machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Looped<S> {
    Start,
    Inner(S),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa<S: State> {
    pub(crate) transitions: BTreeMap<(S, Symbol), BTreeSet<S>>,
    pub(crate) states: BTreeSet<S>,
    pub(crate) alphabet: BTreeSet<Symbol>,
    pub(crate) start: S,
    pub(crate) accept: BTreeSet<S>,
}

impl<S: State> Nfa<S> {
    /// Validated construction. Rejections name the offending states,
    /// symbols or pairs; see the crate error type for the categories.
    pub fn new<T, V>(
        transitions: T,
        start: S,
        accept: impl IntoIterator<Item = S>,
    ) -> Result<Self, ValidationError>
    where
        T: IntoIterator<Item = ((S, Symbol), V)>,
        V: IntoIterator<Item = S>,
    {
        let transitions: BTreeMap<(S, Symbol), BTreeSet<S>> = transitions
            .into_iter()
            .map(|(key, targets)| (key, targets.into_iter().collect()))
            .collect();
        let accept: BTreeSet<S> = accept.into_iter().collect();
        let (states, alphabet) = extract_states_alphabet(transitions.keys());

        check_alphabet(&alphabet, "alphabet")?;
        if !states.contains(&start) {
            return Err(ValidationError::StartNotInStates(format!("{:?}", start)));
        }
        let stray_accept: Vec<&S> = accept.difference(&states).collect();
        if !stray_accept.is_empty() {
            return Err(ValidationError::AcceptNotInStates(format_offenders(
                stray_accept,
            )));
        }
        let bad_range: BTreeSet<&S> = transitions
            .values()
            .flatten()
            .filter(|target| !states.contains(*target))
            .collect();
        if !bad_range.is_empty() {
            return Err(ValidationError::RangeNotInStates(format_offenders(
                bad_range,
            )));
        }
        let missing: Vec<(&S, &Symbol)> = iproduct!(&states, &alphabet)
            .filter(|(state, symbol)| {
                !transitions.contains_key(&((*state).clone(), (*symbol).clone()))
            })
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingCases(format_offenders(missing)));
        }

        Ok(Nfa {
            transitions,
            states,
            alphabet,
            start,
            accept,
        })
    }

    /// Assembles a machine whose parts are already known to be coherent.
    /// Every combinator goes through here; re-validating their outputs
    /// would only re-prove what the construction guarantees.
    pub(crate) fn from_parts(
        transitions: BTreeMap<(S, Symbol), BTreeSet<S>>,
        states: BTreeSet<S>,
        alphabet: BTreeSet<Symbol>,
        start: S,
        accept: BTreeSet<S>,
    ) -> Self {
        Nfa {
            transitions,
            states,
            alphabet,
            start,
            accept,
        }
    }

    pub fn states(&self) -> BTreeSet<S> {
        self.states.clone()
    }

    pub fn alphabet(&self) -> BTreeSet<Symbol> {
        self.alphabet.clone()
    }

    pub fn start_state(&self) -> S {
        self.start.clone()
    }

    pub fn accept_states(&self) -> BTreeSet<S> {
        self.accept.clone()
    }

    pub fn transition_function(&self) -> BTreeMap<(S, Symbol), BTreeSet<S>> {
        self.transitions.clone()
    }

    /// All states reachable from `from` through ε-moves alone: the least
    /// superset of `from` closed under the ε-rows of the table.
    pub fn epsilon_closure(&self, from: impl IntoIterator<Item = S>) -> BTreeSet<S> {
        let mut closure = BTreeSet::new();
        let mut queue: VecDeque<S> = from.into_iter().collect();
        while let Some(state) = queue.pop_front() {
            if !closure.insert(state.clone()) {
                continue;
            }
            if let Some(targets) = self.transitions.get(&(state, EPSILON.to_string())) {
                for target in targets {
                    if !closure.contains(target) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }
        closure
    }

    /// Image of a configuration under one proper symbol, before ε-closure.
    fn successors(&self, from: &BTreeSet<S>, symbol: &str) -> BTreeSet<S> {
        let mut image = BTreeSet::new();
        for state in from {
            if let Some(targets) = self.transitions.get(&(state.clone(), symbol.to_string())) {
                image.extend(targets.iter().cloned());
            }
        }
        image
    }

    /// Whether the machine accepts `input`. Errs if `input` contains a
    /// character outside the machine's alphabet.
    pub fn accepts(&self, input: &str) -> Result<bool, ValidationError> {
        check_input(input, &self.alphabet)?;
        let mut current = self.epsilon_closure([self.start.clone()]);
        for c in input.chars() {
            current = self.epsilon_closure(self.successors(&current, &c.to_string()));
        }
        Ok(!current.is_disjoint(&self.accept))
    }

    /// Language union. A fresh start state ε-branches into both operands,
    /// whose states are renamed apart by the `Branch` tags; the operands
    /// may have different alphabets, each side being padded with empty rows
    /// for the symbols only the other side knows.
    pub fn union<T: State>(&self, other: &Nfa<T>) -> Nfa<Branch<S, T>> {
        let alphabet: BTreeSet<Symbol> = self.alphabet.union(&other.alphabet).cloned().collect();
        let mut transitions = BTreeMap::new();
        rename_into(
            &self.transitions,
            &self.states,
            &alphabet,
            &mut transitions,
            Branch::Left,
        );
        rename_into(
            &other.transitions,
            &other.states,
            &alphabet,
            &mut transitions,
            Branch::Right,
        );
        transitions.insert(
            (Branch::Start, EPSILON.to_string()),
            BTreeSet::from([
                Branch::Left(self.start.clone()),
                Branch::Right(other.start.clone()),
            ]),
        );
        for symbol in &alphabet {
            transitions.insert((Branch::Start, symbol.clone()), BTreeSet::new());
        }

        let mut states: BTreeSet<Branch<S, T>> = self
            .states
            .iter()
            .cloned()
            .map(Branch::Left)
            .chain(other.states.iter().cloned().map(Branch::Right))
            .collect();
        states.insert(Branch::Start);
        let accept = self
            .accept
            .iter()
            .cloned()
            .map(Branch::Left)
            .chain(other.accept.iter().cloned().map(Branch::Right))
            .collect();
        Nfa::from_parts(transitions, states, alphabet, Branch::Start, accept)
    }

    /// Language concatenation: every accept state of the left operand gains
    /// an ε-edge to the right operand's start; only the right operand's
    /// accept states remain accepting.
    pub fn concat<T: State>(&self, other: &Nfa<T>) -> Nfa<Merged<S, T>> {
        let alphabet: BTreeSet<Symbol> = self.alphabet.union(&other.alphabet).cloned().collect();
        let mut transitions = BTreeMap::new();
        rename_into(
            &self.transitions,
            &self.states,
            &alphabet,
            &mut transitions,
            Merged::Left,
        );
        rename_into(
            &other.transitions,
            &other.states,
            &alphabet,
            &mut transitions,
            Merged::Right,
        );
        for accept in &self.accept {
            transitions
                .entry((Merged::Left(accept.clone()), EPSILON.to_string()))
                .or_default()
                .insert(Merged::Right(other.start.clone()));
        }

        let states = self
            .states
            .iter()
            .cloned()
            .map(Merged::Left)
            .chain(other.states.iter().cloned().map(Merged::Right))
            .collect();
        let accept = other.accept.iter().cloned().map(Merged::Right).collect();
        Nfa::from_parts(
            transitions,
            states,
            alphabet,
            Merged::Left(self.start.clone()),
            accept,
        )
    }

    /// Kleene star. The fresh start is itself accepting (for the empty
    /// string), and every original accept state loops back to the original
    /// start by a new ε-edge added into its existing ε-row.
    pub fn star(&self) -> Nfa<Looped<S>> {
        let mut transitions = BTreeMap::new();
        rename_into(
            &self.transitions,
            &self.states,
            &self.alphabet,
            &mut transitions,
            Looped::Inner,
        );
        transitions.insert(
            (Looped::Start, EPSILON.to_string()),
            BTreeSet::from([Looped::Inner(self.start.clone())]),
        );
        for symbol in &self.alphabet {
            transitions.insert((Looped::Start, symbol.clone()), BTreeSet::new());
        }
        for accept in &self.accept {
            transitions
                .entry((Looped::Inner(accept.clone()), EPSILON.to_string()))
                .or_default()
                .insert(Looped::Inner(self.start.clone()));
        }

        let mut states: BTreeSet<Looped<S>> =
            self.states.iter().cloned().map(Looped::Inner).collect();
        states.insert(Looped::Start);
        let mut accept: BTreeSet<Looped<S>> =
            self.accept.iter().cloned().map(Looped::Inner).collect();
        accept.insert(Looped::Start);
        Nfa::from_parts(
            transitions,
            states,
            self.alphabet.clone(),
            Looped::Start,
            accept,
        )
    }

    /// Subset construction. Only subsets reachable from the ε-closure of
    /// the start state are materialized, each represented once by its
    /// canonical `BTreeSet` form; the empty subset doubles as the trap
    /// state when a step has no successors. Worst case is still
    /// exponential in the number of states.
    pub fn determinize(&self) -> Dfa<BTreeSet<S>> {
        let start = self.epsilon_closure([self.start.clone()]);
        let mut states: BTreeSet<BTreeSet<S>> = BTreeSet::new();
        let mut transitions: BTreeMap<(BTreeSet<S>, Symbol), BTreeSet<S>> = BTreeMap::new();
        let mut queue: VecDeque<BTreeSet<S>> = VecDeque::from([start.clone()]);
        while let Some(subset) = queue.pop_front() {
            if !states.insert(subset.clone()) {
                continue;
            }
            for symbol in &self.alphabet {
                let target = self.epsilon_closure(self.successors(&subset, symbol));
                if !states.contains(&target) {
                    queue.push_back(target.clone());
                }
                transitions.insert((subset.clone(), symbol.clone()), target);
            }
        }
        let accept = states
            .iter()
            .filter(|subset| !subset.is_disjoint(&self.accept))
            .cloned()
            .collect();
        Dfa::from_parts(transitions, states, self.alphabet.clone(), start, accept)
    }

    /// Canonical dense renaming of the states to `0..n`, in sorted order.
    /// Keeps the combinator tag types from nesting unboundedly when
    /// machines are assembled in a loop, as the regex compiler does.
    pub fn relabel(&self) -> Nfa<u32> {
        let index: BTreeMap<&S, u32> = self.states.iter().zip(0..).collect();
        let transitions = self
            .transitions
            .iter()
            .map(|((state, symbol), targets)| {
                (
                    (index[state], symbol.clone()),
                    targets.iter().map(|target| index[target]).collect(),
                )
            })
            .collect();
        Nfa::from_parts(
            transitions,
            (0..self.states.len() as u32).collect(),
            self.alphabet.clone(),
            index[&self.start],
            self.accept.iter().map(|state| index[state]).collect(),
        )
    }
}

/// Copy a transition table into `out` under a renaming tag, then pad every
/// `(state, symbol)` pair of the target alphabet that is still uncovered
/// with an empty row, so the combined table stays total.
fn rename_into<S: State, U: State>(
    transitions: &BTreeMap<(S, Symbol), BTreeSet<S>>,
    states: &BTreeSet<S>,
    alphabet: &BTreeSet<Symbol>,
    out: &mut BTreeMap<(U, Symbol), BTreeSet<U>>,
    tag: impl Fn(S) -> U + Copy,
) {
    for ((state, symbol), targets) in transitions {
        out.insert(
            (tag(state.clone()), symbol.clone()),
            targets.iter().cloned().map(tag).collect(),
        );
    }
    for (state, symbol) in iproduct!(states, alphabet) {
        out.entry((tag(state.clone()), symbol.clone())).or_default();
    }
}

impl<S: State, T: State> BitOr<&Nfa<T>> for &Nfa<S> {
    type Output = Nfa<Branch<S, T>>;

    fn bitor(self, other: &Nfa<T>) -> Self::Output {
        self.union(other)
    }
}

impl<S: State, T: State> Add<&Nfa<T>> for &Nfa<S> {
    type Output = Nfa<Merged<S, T>>;

    fn add(self, other: &Nfa<T>) -> Self::Output {
        self.concat(other)
    }
}
