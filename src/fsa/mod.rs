//! Finite-state machines: shared state/symbol machinery and the validation
//! helpers used by every machine constructor.

pub mod dfa;
mod fit;
pub mod fst;
mod gnfa;
pub mod nfa;


use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::ValidationError;

pub use fit::DEFAULT_ALPHABET;

/// A one-character string. The empty string is reserved for ε-moves in NFA
/// transition keys and is never a member of any alphabet.
pub type Symbol = String;

/// The ε-move key in NFA transition tables.
pub const EPSILON: &str = "";

/// Anything usable as a machine state: value equality, a total order for
/// canonical subset/product states, and `Debug` so errors can name it.
pub trait State: Clone + Eq + Ord + Hash + Debug {}

impl<T: Clone + Eq + Ord + Hash + Debug> State for T {}

/// Sorted, quoted, comma-separated rendering of a set of offenders, for
/// error payloads. Deterministic regardless of the input container.
pub(crate) fn format_offenders<T: Debug>(items: impl IntoIterator<Item = T>) -> String {
    let mut quoted: Vec<String> = items
        .into_iter()
        .map(|item| format!("{:?}", item))
        .collect();
    quoted.sort();
    quoted.join(", ")
}

/// Infer the state set and the alphabet from the keys of a transition
/// table. First components are states; second components are symbols, with
/// the ε key excluded from the alphabet.
pub(crate) fn extract_states_alphabet<'a, S: State + 'a>(
    keys: impl IntoIterator<Item = &'a (S, Symbol)>,
) -> (BTreeSet<S>, BTreeSet<Symbol>) {
    let mut states = BTreeSet::new();
    let mut alphabet = BTreeSet::new();
    for (state, symbol) in keys {
        states.insert(state.clone());
        if symbol != EPSILON {
            alphabet.insert(symbol.clone());
        }
    }
    (states, alphabet)
}

/// Every alphabet member must be exactly one character. `name` tells the
/// error which alphabet was at fault (a transducer has two).
pub(crate) fn check_alphabet(
    alphabet: &BTreeSet<Symbol>,
    name: &'static str,
) -> Result<(), ValidationError> {
    let bad: Vec<&Symbol> = alphabet
        .iter()
        .filter(|symbol| symbol.chars().count() != 1)
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::SymbolArity {
            symbols: format_offenders(bad),
            alphabet: name,
        })
    }
}

/// Call-time check that every character of an input string is a symbol of
/// the alphabet.
pub(crate) fn check_input(input: &str, alphabet: &BTreeSet<Symbol>) -> Result<(), ValidationError> {
    let bad: BTreeSet<String> = input
        .chars()
        .map(|c| c.to_string())
        .filter(|symbol| !alphabet.contains(symbol))
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::InputOutsideAlphabet(format_offenders(bad)))
    }
}

#[cfg(test)]
mod helper_tests {
    use super::*;

    #[test]
    fn extraction_strips_epsilon_from_the_alphabet() {
        let table = [
            (("q1".to_string(), "0".to_string()), ()),
            (("q1".to_string(), EPSILON.to_string()), ()),
            (("q2".to_string(), "1".to_string()), ()),
        ];
        let (states, alphabet) = extract_states_alphabet(table.iter().map(|(k, _)| k));
        assert_eq!(states.len(), 2);
        assert!(alphabet.contains("0") && alphabet.contains("1"));
        assert!(!alphabet.iter().any(|s| s == EPSILON));
    }

    #[test]
    fn offenders_are_sorted_and_quoted() {
        let rendered = format_offenders(["b", "a"]);
        assert_eq!(rendered, "\"a\", \"b\"");
    }

    #[test]
    fn arity_check_names_the_bad_symbols() {
        let alphabet: BTreeSet<Symbol> = ["0".to_string(), "!#".to_string()].into();
        let err = check_alphabet(&alphabet, "alphabet").unwrap_err();
        assert_eq!(
            err,
            ValidationError::SymbolArity {
                symbols: "\"!#\"".to_string(),
                alphabet: "alphabet",
            }
        );
    }
}
