//! Deterministic finite automata.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::ops::{Add, BitOr};

use itertools::iproduct;

use crate::cfg::{Cfg, Production};
use crate::error::ValidationError;
use crate::fsa::gnfa::Gnfa;
use crate::fsa::nfa::{Merged, Nfa};
use crate::fsa::{
    check_alphabet, check_input, extract_states_alphabet, format_offenders, State, Symbol,
};

/// A machine state lifted into a product construction. Symbols outside a
/// machine's own alphabet route it into `Sink`, which can never accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifted<S> {
    State(S),
    Sink,
}

/// A deterministic finite automaton over states `S`.
///
/// The transition table implicitly defines the state set and the alphabet:
/// first key components are states, second key components are symbols. The
/// table must be total on states × alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa<S: State> {
    pub(crate) transitions: BTreeMap<(S, Symbol), S>,
    pub(crate) states: BTreeSet<S>,
    pub(crate) alphabet: BTreeSet<Symbol>,
    pub(crate) start: S,
    pub(crate) accept: BTreeSet<S>,
}

impl<S: State> Dfa<S> {
    /// Validated construction. Rejections name the offending states,
    /// symbols or pairs; see the crate error type for the categories.
    pub fn new(
        transitions: impl IntoIterator<Item = ((S, Symbol), S)>,
        start: S,
        accept: impl IntoIterator<Item = S>,
    ) -> Result<Self, ValidationError> {
        let transitions: BTreeMap<(S, Symbol), S> = transitions.into_iter().collect();
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

        Ok(Dfa {
            transitions,
            states,
            alphabet,
            start,
            accept,
        })
    }

    /// Assembles a machine whose parts are already known to be coherent
    /// (used by the conversions and combinators).
    pub(crate) fn from_parts(
        transitions: BTreeMap<(S, Symbol), S>,
        states: BTreeSet<S>,
        alphabet: BTreeSet<Symbol>,
        start: S,
        accept: BTreeSet<S>,
    ) -> Self {
        Dfa {
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

    pub fn transition_function(&self) -> BTreeMap<(S, Symbol), S> {
        self.transitions.clone()
    }

    /// Whether the machine accepts `input`. Errs if `input` contains a
    /// character outside the machine's alphabet.
    pub fn accepts(&self, input: &str) -> Result<bool, ValidationError> {
        check_input(input, &self.alphabet)?;
        let mut current = self.start.clone();
        for c in input.chars() {
            current = self.transitions[&(current, c.to_string())].clone();
        }
        Ok(self.accept.contains(&current))
    }

    /// Language union by the product construction over the lifted state
    /// sets. The operands may have different alphabets: symbols one side
    /// does not know route it into its `Sink`. Accepting pairs are those
    /// where either side accepts.
    pub fn union<T: State>(&self, other: &Dfa<T>) -> Dfa<(Lifted<S>, Lifted<T>)> {
        let alphabet: BTreeSet<Symbol> = self.alphabet.union(&other.alphabet).cloned().collect();
        let left = lift(self, &alphabet);
        let right = lift(other, &alphabet);

        let states: BTreeSet<(Lifted<S>, Lifted<T>)> = iproduct!(&left.states, &right.states)
            .map(|(p, q)| (p.clone(), q.clone()))
            .collect();
        let transitions = iproduct!(&left.states, &right.states, &alphabet)
            .map(|(p, q, symbol)| {
                let target = (
                    left.transitions[&(p.clone(), symbol.clone())].clone(),
                    right.transitions[&(q.clone(), symbol.clone())].clone(),
                );
                (((p.clone(), q.clone()), symbol.clone()), target)
            })
            .collect();
        let accept = states
            .iter()
            .filter(|(p, q)| {
                matches!(p, Lifted::State(s) if self.accept.contains(s))
                    || matches!(q, Lifted::State(t) if other.accept.contains(t))
            })
            .cloned()
            .collect();
        let start = (
            Lifted::State(self.start.clone()),
            Lifted::State(other.start.clone()),
        );
        Dfa::from_parts(transitions, states, alphabet, start, accept)
    }

    /// Language concatenation, routed through the nondeterministic
    /// combinators and determinized again; the state count of the result
    /// can be exponential in the inputs.
    pub fn concat<T: State>(&self, other: &Dfa<T>) -> Dfa<BTreeSet<Merged<S, T>>> {
        (&self.non_determinize() + &other.non_determinize()).determinize()
    }

    /// The same machine with every transition target lifted into a
    /// singleton set.
    pub fn non_determinize(&self) -> Nfa<S> {
        let transitions = self
            .transitions
            .iter()
            .map(|((state, symbol), target)| {
                (
                    (state.clone(), symbol.clone()),
                    BTreeSet::from([target.clone()]),
                )
            })
            .collect();
        Nfa::from_parts(
            transitions,
            self.states.clone(),
            self.alphabet.clone(),
            self.start.clone(),
            self.accept.clone(),
        )
    }

    /// A regex string generating the machine's language, obtained by state
    /// elimination on a generalized NFA. The result is correct but rarely
    /// pretty; no simplification is attempted.
    pub fn encode(&self) -> String {
        let mut gnfa = Gnfa::from_dfa(self);
        while !gnfa.is_reduced() {
            gnfa = gnfa.reduce();
        }
        gnfa.regex()
    }

    /// A right-linear grammar for the machine's language: one variable per
    /// state, a production `q → a q'` per transition, and `q → €` per
    /// accept state. Construction can still reject, e.g. when a state name
    /// collides with an alphabet symbol.
    pub fn cf_grammarize(&self) -> Result<Cfg, ValidationError>
    where
        S: Display,
    {
        let mut rules: BTreeMap<String, BTreeSet<Production>> = self
            .states
            .iter()
            .map(|state| (state.to_string(), BTreeSet::new()))
            .collect();
        for ((state, symbol), target) in &self.transitions {
            rules
                .entry(state.to_string())
                .or_default()
                .insert(Production::new([symbol.clone(), target.to_string()]));
        }
        for state in &self.accept {
            rules
                .entry(state.to_string())
                .or_default()
                .insert(Production::empty());
        }
        Cfg::new(rules, self.start.to_string())
    }
}

struct LiftedHalf<S: State> {
    states: BTreeSet<Lifted<S>>,
    transitions: BTreeMap<(Lifted<S>, Symbol), Lifted<S>>,
}

/// Extend one operand of a product to the union alphabet: its own table is
/// kept, and if the other operand brought new symbols, those all lead to a
/// fresh sink that loops on everything.
fn lift<S: State>(dfa: &Dfa<S>, alphabet: &BTreeSet<Symbol>) -> LiftedHalf<S> {
    let mut states: BTreeSet<Lifted<S>> =
        dfa.states.iter().cloned().map(Lifted::State).collect();
    let mut transitions: BTreeMap<(Lifted<S>, Symbol), Lifted<S>> = dfa
        .transitions
        .iter()
        .map(|((state, symbol), target)| {
            (
                (Lifted::State(state.clone()), symbol.clone()),
                Lifted::State(target.clone()),
            )
        })
        .collect();
    let extra: Vec<&Symbol> = alphabet.difference(&dfa.alphabet).collect();
    if !extra.is_empty() {
        states.insert(Lifted::Sink);
        for symbol in alphabet {
            transitions.insert((Lifted::Sink, symbol.clone()), Lifted::Sink);
        }
        for (state, symbol) in iproduct!(&dfa.states, &extra) {
            transitions.insert(
                (Lifted::State(state.clone()), (*symbol).clone()),
                Lifted::Sink,
            );
        }
    }
    LiftedHalf {
        states,
        transitions,
    }
}

impl<S: State, T: State> BitOr<&Dfa<T>> for &Dfa<S> {
    type Output = Dfa<(Lifted<S>, Lifted<T>)>;

    fn bitor(self, other: &Dfa<T>) -> Self::Output {
        self.union(other)
    }
}

impl<S: State, T: State> Add<&Dfa<T>> for &Dfa<S> {
    type Output = Dfa<BTreeSet<Merged<S, T>>>;

    fn add(self, other: &Dfa<T>) -> Self::Output {
        self.concat(other)
    }
}
