//! Categorized validation errors.
//!
//! Every rejection path in the crate goes through one of these variants, and
//! every variant names the offending states, symbols or pairs. There is no
//! retry and no fallback: callers recover by correcting their inputs.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("start state {0} is not a member of the inferred state set")]
    StartNotInStates(String),

    #[error("accept states {0} are not members of the inferred state set")]
    AcceptNotInStates(String),

    #[error("transition targets {0} are not members of the inferred state set")]
    RangeNotInStates(String),

    #[error("symbols {symbols} in the {alphabet} are not single-character strings")]
    SymbolArity {
        symbols: String,
        alphabet: &'static str,
    },

    #[error("pairs {0} are missing from the transition function domain")]
    MissingCases(String),

    #[error("input symbols {0} are not in the alphabet")]
    InputOutsideAlphabet(String),

    #[error("the grammar has no terminals among its productions")]
    NoTerminals,

    #[error("start variable {0} is not among the grammar's variables")]
    StartNotVariable(String),

    #[error("alphabet cannot contain the reserved characters {0}")]
    ReservedInAlphabet(String),

    #[error("character {0} is neither in the alphabet nor a regex operator")]
    StrayCharacter(String),

    #[error("binary operator {0} is immediately followed by operator {1}")]
    OperatorAfterOperator(String, String),

    #[error("unbalanced parentheses in regex")]
    UnmatchedParenthesis,

    #[error("malformed regex: {0}")]
    MalformedRegex(String),
}
