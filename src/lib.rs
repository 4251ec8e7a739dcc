//! Automata, transducers and grammars: construction with strict
//! validation, recognition, language combinators, conversions between the
//! formalisms, regex compilation and Chomsky normalization.
//!
//! Everything is immutable after construction and every operation returns
//! a fresh machine, so values can be shared freely across threads.

pub mod utils;

pub mod cfg;
pub mod error;
pub mod fsa;

pub use cfg::{Cfg, Production};
pub use error::ValidationError;
pub use fsa::dfa::{Dfa, Lifted};
pub use fsa::fst::Fst;
pub use fsa::nfa::{Branch, Looped, Merged, Nfa};
pub use fsa::{Symbol, DEFAULT_ALPHABET, EPSILON};
