//! Finite-state transducers: deterministic machines that emit one output
//! symbol per input symbol.

use std::collections::{BTreeMap, BTreeSet};

use itertools::iproduct;

use crate::error::ValidationError;
use crate::fsa::{
    check_alphabet, check_input, extract_states_alphabet, format_offenders, State, Symbol,
};

/// Transition values pair the successor state with the emitted symbol; the
/// output alphabet is inferred from them, the same way states and the input
/// alphabet are inferred from the keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fst<S: State> {
    pub(crate) transitions: BTreeMap<(S, Symbol), (S, Symbol)>,
    pub(crate) states: BTreeSet<S>,
    pub(crate) input_alphabet: BTreeSet<Symbol>,
    pub(crate) output_alphabet: BTreeSet<Symbol>,
    pub(crate) start: S,
}

impl<S: State> Fst<S> {
    pub fn new(
        transitions: impl IntoIterator<Item = ((S, Symbol), (S, Symbol))>,
        start: S,
    ) -> Result<Self, ValidationError> {
        let transitions: BTreeMap<(S, Symbol), (S, Symbol)> = transitions.into_iter().collect();
        let (states, input_alphabet) = extract_states_alphabet(transitions.keys());
        let (range, output_alphabet) = extract_states_alphabet(transitions.values());

        check_alphabet(&input_alphabet, "input alphabet")?;
        check_alphabet(&output_alphabet, "output alphabet")?;
        if !states.contains(&start) {
            return Err(ValidationError::StartNotInStates(format!("{:?}", start)));
        }
        let bad_range: Vec<&S> = range.difference(&states).collect();
        if !bad_range.is_empty() {
            return Err(ValidationError::RangeNotInStates(format_offenders(
                bad_range,
            )));
        }
        let missing: Vec<(&S, &Symbol)> = iproduct!(&states, &input_alphabet)
            .filter(|(state, symbol)| {
                !transitions.contains_key(&((*state).clone(), (*symbol).clone()))
            })
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingCases(format_offenders(missing)));
        }

        Ok(Fst {
            transitions,
            states,
            input_alphabet,
            output_alphabet,
            start,
        })
    }

    pub fn states(&self) -> BTreeSet<S> {
        self.states.clone()
    }

    pub fn input_alphabet(&self) -> BTreeSet<Symbol> {
        self.input_alphabet.clone()
    }

    pub fn output_alphabet(&self) -> BTreeSet<Symbol> {
        self.output_alphabet.clone()
    }

    pub fn start_state(&self) -> S {
        self.start.clone()
    }

    pub fn transition_function(&self) -> BTreeMap<(S, Symbol), (S, Symbol)> {
        self.transitions.clone()
    }

    /// Run the machine over `input`, concatenating the emitted symbols.
    /// Errs if `input` contains a character outside the input alphabet.
    pub fn process(&self, input: &str) -> Result<String, ValidationError> {
        check_input(input, &self.input_alphabet)?;
        let mut current = self.start.clone();
        let mut output = String::new();
        for c in input.chars() {
            let (next, emitted) = self.transitions[&(current, c.to_string())].clone();
            output.push_str(&emitted);
            current = next;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[((&str, &str), (&str, &str))]) -> Vec<((String, Symbol), (String, Symbol))> {
        entries
            .iter()
            .map(|((state, input), (target, output))| {
                (
                    ((*state).to_string(), (*input).to_string()),
                    ((*target).to_string(), (*output).to_string()),
                )
            })
            .collect()
    }

    /// Swaps a and b.
    fn swapper() -> Fst<String> {
        Fst::new(
            table(&[
                (("s", "a"), ("s", "b")),
                (("s", "b"), ("s", "a")),
            ]),
            "s".to_string(),
        )
        .unwrap()
    }

    /// Emits x on the first 1 of each 11 pair, y otherwise: a stateful
    /// transduction, so order matters.
    fn pairer() -> Fst<String> {
        Fst::new(
            table(&[
                (("even", "1"), ("odd", "x")),
                (("odd", "1"), ("even", "y")),
            ]),
            "even".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn process_swaps_symbols() {
        assert_eq!(swapper().process("abba").unwrap(), "baab");
        assert_eq!(swapper().process("").unwrap(), "");
    }

    #[test]
    fn process_tracks_state() {
        assert_eq!(pairer().process("1111").unwrap(), "xyxy");
    }

    #[test]
    fn alphabets_are_inferred_separately() {
        let fst = swapper();
        assert_eq!(fst.input_alphabet(), fst.output_alphabet());
        let fst = pairer();
        assert_eq!(fst.input_alphabet().len(), 1);
        assert_eq!(fst.output_alphabet().len(), 2);
    }

    #[test]
    fn unknown_input_symbol_is_an_error() {
        let err = swapper().process("abc").unwrap_err();
        assert_eq!(err, ValidationError::InputOutsideAlphabet("\"c\"".into()));
    }

    #[test]
    fn output_arity_is_checked() {
        let err = Fst::new(
            table(&[(("s", "a"), ("s", "bb"))]),
            "s".to_string(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::SymbolArity {
                symbols: "\"bb\"".to_string(),
                alphabet: "output alphabet",
            }
        );
    }

    #[test]
    fn domain_must_be_total() {
        let err = Fst::new(
            table(&[
                (("s", "a"), ("t", "a")),
                (("t", "a"), ("s", "a")),
                (("s", "b"), ("s", "b")),
            ]),
            "s".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::MissingCases(_)));
    }
}
