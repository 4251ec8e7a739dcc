//! The regex surface language and its compiler.
//!
//! Seven characters are reserved: `(` `)` `|` `*` for grouping, choice and
//! iteration, `•` for explicit concatenation, `€` for the empty string and
//! `Ø` for the empty language. Everything else must come from the alphabet.
//! Parsing is the classic pipeline: tokenize, insert the implicit `•`s,
//! shunting-yard to postfix, then evaluate the postfix on a stack of
//! machines. No syntax tree is ever built.

use std::collections::{BTreeMap, BTreeSet};

use itertools::iproduct;
use once_cell::sync::Lazy;

use crate::error::ValidationError;
use crate::fsa::nfa::Nfa;
use crate::fsa::{check_alphabet, format_offenders, Symbol};

/// Characters with fixed meaning in the surface language.
const RESERVED: [char; 7] = ['(', ')', '|', '*', '•', '€', 'Ø'];

/// The printable characters (ASCII, plus the usual whitespace) minus the
/// four grouping/choice/iteration operators: the alphabet `fit` uses when
/// given none. `•`, `€` and `Ø` are already non-ASCII, so they need no
/// carve-out.
pub static DEFAULT_ALPHABET: Lazy<BTreeSet<Symbol>> = Lazy::new(|| {
    ('!'..='~')
        .chain([' ', '\t', '\n', '\r', '\x0b', '\x0c'])
        .filter(|&c| !matches!(c, '(' | ')' | '|' | '*'))
        .map(|c| c.to_string())
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    Union,
    Concat,
    Star,
    Epsilon,
    EmptySet,
    Open,
    Close,
}

impl Token {
    fn is_binary(self) -> bool {
        matches!(self, Token::Union | Token::Concat)
    }

    fn is_operator(self) -> bool {
        matches!(self, Token::Union | Token::Concat | Token::Star)
    }

    fn glyph(self) -> char {
        match self {
            Token::Literal(c) => c,
            Token::Union => '|',
            Token::Concat => '•',
            Token::Star => '*',
            Token::Epsilon => '€',
            Token::EmptySet => 'Ø',
            Token::Open => '(',
            Token::Close => ')',
        }
    }
}

impl Nfa<u32> {
    /// Compile `regex` over the default printable alphabet.
    pub fn fit(regex: &str) -> Result<Nfa<u32>, ValidationError> {
        Self::fit_over(regex, DEFAULT_ALPHABET.iter().cloned())
    }

    /// Compile `regex` into a machine recognizing its language over
    /// `alphabet`.
    pub fn fit_over(
        regex: &str,
        alphabet: impl IntoIterator<Item = Symbol>,
    ) -> Result<Nfa<u32>, ValidationError> {
        let alphabet: BTreeSet<Symbol> = alphabet.into_iter().collect();
        check_alphabet(&alphabet, "alphabet")?;
        let collisions: Vec<&Symbol> = alphabet
            .iter()
            .filter(|symbol| RESERVED.iter().any(|r| symbol.as_str() == r.to_string()))
            .collect();
        if !collisions.is_empty() {
            return Err(ValidationError::ReservedInAlphabet(format_offenders(
                collisions,
            )));
        }

        let tokens = tokenize(regex, &alphabet)?;
        check_operator_placement(&tokens)?;
        let tokens = insert_implicit_concat(tokens);
        let postfix = to_postfix(tokens)?;
        eval_postfix(postfix, &alphabet)
    }
}

fn tokenize(regex: &str, alphabet: &BTreeSet<Symbol>) -> Result<Vec<Token>, ValidationError> {
    regex
        .chars()
        .map(|c| match c {
            '(' => Ok(Token::Open),
            ')' => Ok(Token::Close),
            '|' => Ok(Token::Union),
            '•' => Ok(Token::Concat),
            '*' => Ok(Token::Star),
            '€' => Ok(Token::Epsilon),
            'Ø' => Ok(Token::EmptySet),
            _ if alphabet.contains(&c.to_string()) => Ok(Token::Literal(c)),
            _ => Err(ValidationError::StrayCharacter(format!("{:?}", c))),
        })
        .collect()
}

/// A regex may not start with an operator, a binary operator may not be
/// followed by another operator, and parentheses must balance.
fn check_operator_placement(tokens: &[Token]) -> Result<(), ValidationError> {
    if let Some(first) = tokens.first() {
        if first.is_operator() {
            return Err(ValidationError::MalformedRegex(format!(
                "regex cannot start with '{}'",
                first.glyph()
            )));
        }
    }
    for pair in tokens.windows(2) {
        if pair[0].is_binary() && pair[1].is_operator() {
            return Err(ValidationError::OperatorAfterOperator(
                format!("'{}'", pair[0].glyph()),
                format!("'{}'", pair[1].glyph()),
            ));
        }
    }
    let mut depth = 0i32;
    for token in tokens {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth < 0 {
                    return Err(ValidationError::UnmatchedParenthesis);
                }
            }
            _ => {}
        }
    }
    if depth > 0 {
        return Err(ValidationError::UnmatchedParenthesis);
    }
    Ok(())
}

/// Make the usual elided concatenations explicit: one `•` between every
/// adjacent pair where the left token ends an operand and the right one
/// begins an operand.
fn insert_implicit_concat(tokens: Vec<Token>) -> Vec<Token> {
    let ends_operand = |token: Token| {
        matches!(
            token,
            Token::Literal(_) | Token::Close | Token::Star | Token::Epsilon | Token::EmptySet
        )
    };
    let begins_operand = |token: Token| {
        matches!(
            token,
            Token::Literal(_) | Token::Open | Token::Epsilon | Token::EmptySet
        )
    };
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len() * 2);
    for token in tokens {
        if let Some(&previous) = out.last() {
            if ends_operand(previous) && begins_operand(token) {
                out.push(Token::Concat);
            }
        }
        out.push(token);
    }
    out
}

fn precedence(token: Token) -> u8 {
    match token {
        Token::Union => 1,
        Token::Concat => 2,
        Token::Star => 3,
        _ => 0,
    }
}

/// Dijkstra's shunting yard. `*` is postfix and binds tightest, so it can
/// go straight to the output; `|` and `•` are left-associative.
fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, ValidationError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();
    for token in tokens {
        match token {
            Token::Literal(_) | Token::Epsilon | Token::EmptySet | Token::Star => {
                output.push(token)
            }
            Token::Union | Token::Concat => {
                while let Some(&top) = operators.last() {
                    if top == Token::Open || precedence(top) < precedence(token) {
                        break;
                    }
                    operators.pop();
                    output.push(top);
                }
                operators.push(token);
            }
            Token::Open => operators.push(token),
            Token::Close => loop {
                match operators.pop() {
                    Some(Token::Open) => break,
                    Some(op) => output.push(op),
                    None => return Err(ValidationError::UnmatchedParenthesis),
                }
            },
        }
    }
    while let Some(op) = operators.pop() {
        if op == Token::Open {
            return Err(ValidationError::UnmatchedParenthesis);
        }
        output.push(op);
    }
    Ok(output)
}

/// Evaluate a postfix token stream on a stack of machines. Every machine is
/// relabelled to dense `u32` states after each combination, so the stack
/// stays monomorphic.
fn eval_postfix(
    postfix: Vec<Token>,
    alphabet: &BTreeSet<Symbol>,
) -> Result<Nfa<u32>, ValidationError> {
    let underflow = || ValidationError::MalformedRegex("operator is missing an operand".into());
    let mut machines: Vec<Nfa<u32>> = Vec::new();
    for token in postfix {
        match token {
            Token::Literal(c) => machines.push(literal_machine(c, alphabet)),
            Token::Epsilon => machines.push(epsilon_machine(alphabet)),
            Token::EmptySet => machines.push(empty_machine(alphabet)),
            Token::Star => {
                let machine = machines.pop().ok_or_else(underflow)?;
                machines.push(machine.star().relabel());
            }
            Token::Union => {
                let right = machines.pop().ok_or_else(underflow)?;
                let left = machines.pop().ok_or_else(underflow)?;
                machines.push(left.union(&right).relabel());
            }
            Token::Concat => {
                let right = machines.pop().ok_or_else(underflow)?;
                let left = machines.pop().ok_or_else(underflow)?;
                machines.push(left.concat(&right).relabel());
            }
            Token::Open | Token::Close => {
                return Err(ValidationError::MalformedRegex(
                    "parenthesis survived parsing".into(),
                ))
            }
        }
    }
    match (machines.pop(), machines.is_empty()) {
        (Some(machine), true) => Ok(machine),
        _ => Err(ValidationError::MalformedRegex(
            "expected exactly one machine on the stack".into(),
        )),
    }
}

/// Every primitive machine carries an empty row for each `(state, symbol)`
/// pair, so the whole alphabet is inferable from any machine the evaluator
/// builds.
fn padded_rows(states: &[u32], alphabet: &BTreeSet<Symbol>) -> BTreeMap<(u32, Symbol), BTreeSet<u32>> {
    iproduct!(states, alphabet)
        .map(|(state, symbol)| ((*state, symbol.clone()), BTreeSet::new()))
        .collect()
}

/// Two states, one transition: accepts exactly the one-symbol string.
fn literal_machine(symbol: char, alphabet: &BTreeSet<Symbol>) -> Nfa<u32> {
    let mut transitions = padded_rows(&[0, 1], alphabet);
    transitions.insert((0, symbol.to_string()), BTreeSet::from([1]));
    Nfa::from_parts(
        transitions,
        BTreeSet::from([0, 1]),
        alphabet.clone(),
        0,
        BTreeSet::from([1]),
    )
}

/// One state, start and accepting, no moves: accepts exactly the empty
/// string.
fn epsilon_machine(alphabet: &BTreeSet<Symbol>) -> Nfa<u32> {
    Nfa::from_parts(
        padded_rows(&[0], alphabet),
        BTreeSet::from([0]),
        alphabet.clone(),
        0,
        BTreeSet::from([0]),
    )
}

/// Two states with the accept state unreachable: accepts nothing at all.
fn empty_machine(alphabet: &BTreeSet<Symbol>) -> Nfa<u32> {
    Nfa::from_parts(
        padded_rows(&[0, 1], alphabet),
        BTreeSet::from([0, 1]),
        alphabet.clone(),
        0,
        BTreeSet::from([1]),
    )
}
