//! Grammar suites: construction contracts, derivation checking on the
//! classic fixtures, and normalization checked both for CNF shape and for
//! language preservation on all short strings.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::cfg::{Cfg, Production};
use crate::error::ValidationError;

fn rules(entries: &[(&str, &[&[&str]])]) -> BTreeMap<String, BTreeSet<Production>> {
    entries
        .iter()
        .map(|(variable, productions)| {
            (
                (*variable).to_string(),
                productions
                    .iter()
                    .map(|body| Production::new(body.iter().copied()))
                    .collect(),
            )
        })
        .collect()
}

fn form(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| (*s).to_string()).collect()
}

/// {aⁿbⁿ : n ≥ 0}, the canonical non-regular language.
fn balanced() -> Cfg {
    Cfg::new(rules(&[("S", &[&["a", "S", "b"], &["€"]])]), "S").unwrap()
}

/// The toy English fragment: sentences like `a boy sees`.
fn sentence() -> Cfg {
    Cfg::new(
        rules(&[
            ("<SENTENCE>", &[&["<NOUN-PHRASE>", " ", "<VERB-PHRASE>"]]),
            (
                "<NOUN-PHRASE>",
                &[&["<CMPLX-NOUN>"], &["<CMPLX-NOUN>", " ", "<PREP-PHRASE>"]],
            ),
            (
                "<VERB-PHRASE>",
                &[&["<CMPLX-VERB>"], &["<CMPLX-VERB>", " ", "<PREP-PHRASE>"]],
            ),
            ("<PREP-PHRASE>", &[&["<PREP>", " ", "<CMPLX-NOUN>"]]),
            ("<CMPLX-NOUN>", &[&["<ARTICLE>", " ", "<NOUN>"]]),
            (
                "<CMPLX-VERB>",
                &[&["<VERB>"], &["<VERB>", " ", "<NOUN-PHRASE>"]],
            ),
            ("<ARTICLE>", &[&["a"], &["the"]]),
            ("<NOUN>", &[&["boy"], &["girl"], &["flower"]]),
            ("<VERB>", &[&["touches"], &["likes"], &["sees"]]),
            ("<PREP>", &[&["with"]]),
        ]),
        "<SENTENCE>",
    )
    .unwrap()
}

/// Arithmetic expressions over `+`, `*`, parentheses and the atom `a`.
fn arithmetic() -> Cfg {
    Cfg::new(
        rules(&[
            ("<EXPR>", &[&["<EXPR>", "+", "<TERM>"], &["<TERM>"]]),
            ("<TERM>", &[&["<TERM>", "*", "<FACTOR>"], &["<FACTOR>"]]),
            ("<FACTOR>", &[&["(", "<EXPR>", ")"], &["a"]]),
        ]),
        "<EXPR>",
    )
    .unwrap()
}

/// Every string the grammar generates whose length is at most `max_len`,
/// by breadth-first leftmost expansion of sentential forms. Forms are
/// pruned once they carry more terminals than could fit, or grow past
/// twice the bound; that keeps the search finite for the small grammars
/// used here.
fn language_up_to(cfg: &Cfg, max_len: usize) -> BTreeSet<String> {
    let cap = 2 * max_len + 2;
    let rules = cfg.rules();
    let variables = cfg.variables();
    let mut words = BTreeSet::new();
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut queue: VecDeque<Vec<String>> = VecDeque::from([vec![cfg.start_variable()]]);
    while let Some(sentential) = queue.pop_front() {
        if sentential.len() > cap || !seen.insert(sentential.clone()) {
            continue;
        }
        let terminal_count = sentential
            .iter()
            .filter(|symbol| !variables.contains(*symbol))
            .count();
        if terminal_count > max_len {
            continue;
        }
        match sentential.iter().position(|symbol| variables.contains(symbol)) {
            None => {
                let word = sentential.concat();
                if word.chars().count() <= max_len {
                    words.insert(word);
                }
            }
            Some(at) => {
                for production in &rules[&sentential[at]] {
                    let mut next = sentential[..at].to_vec();
                    next.extend(production.symbols().iter().cloned());
                    next.extend(sentential[at + 1..].iter().cloned());
                    queue.push_back(next);
                }
            }
        }
    }
    words
}

/// Every production must be a single terminal or a pair of variables; only
/// the start variable may keep an empty production.
fn assert_cnf(cfg: &Cfg) {
    for (variable, productions) in cfg.rules() {
        for production in productions {
            match production.symbols() {
                [] => assert_eq!(
                    variable,
                    cfg.start_variable(),
                    "only the start may derive ε"
                ),
                [single] => assert!(
                    cfg.terminals().contains(single),
                    "unit production {} → {} survived",
                    variable,
                    single
                ),
                [left, right] => assert!(
                    cfg.variables().contains(left) && cfg.variables().contains(right),
                    "{} → {} {} mixes terminals in",
                    variable,
                    left,
                    right
                ),
                body => panic!("overlong production {} → {:?}", variable, body),
            }
        }
    }
}

#[test]
fn variables_and_terminals_are_inferred() {
    let cfg = balanced();
    assert_eq!(cfg.variables(), ["S".to_string()].into());
    assert_eq!(
        cfg.terminals(),
        ["a", "b"].map(str::to_string).into_iter().collect()
    );
}

#[test]
fn empty_marker_strings_canonicalize_to_the_empty_production() {
    assert_eq!(Production::from("€"), Production::empty());
    assert_eq!(Production::new(["€"]), Production::empty());
    assert_eq!(Production::new([""]), Production::empty());
    assert_eq!(Production::new(["a", "€", "b"]), Production::new(["a", "b"]));
    assert!(balanced().rules()["S"].contains(&Production::empty()));
}

#[test]
fn a_bare_string_is_one_symbol() {
    let production = Production::from("aSb");
    assert_eq!(production.symbols(), ["aSb".to_string()]);
}

#[test]
fn grammars_without_terminals_are_rejected() {
    let err = Cfg::new(rules(&[("A", &[&["A"], &["B"]]), ("B", &[&["A"]])]), "A").unwrap_err();
    assert_eq!(err, ValidationError::NoTerminals);
}

#[test]
fn start_must_be_a_variable() {
    let err = Cfg::new(rules(&[("S", &[&["a"]])]), "#").unwrap_err();
    assert_eq!(err, ValidationError::StartNotVariable("\"#\"".into()));
}

#[test]
fn balanced_derivation_is_valid() {
    assert!(balanced().is_valid_derivation(&[
        form(&["S"]),
        form(&["a", "S", "b"]),
        form(&["a", "a", "S", "b", "b"]),
        form(&["a", "a", "b", "b"]),
    ]));
}

#[test]
fn derivations_must_start_at_the_start_variable() {
    assert!(!balanced().is_valid_derivation(&[form(&["a", "S", "b"]), form(&["a", "b"])]));
    assert!(!balanced().is_valid_derivation(&[]));
    // the lone start form is a complete (if trivial) derivation
    assert!(balanced().is_valid_derivation(&[form(&["S"])]));
}

#[test]
fn a_skipped_symbol_invalidates_a_step() {
    let cfg = sentence();
    let good = [
        form(&["<SENTENCE>"]),
        form(&["<NOUN-PHRASE>", " ", "<VERB-PHRASE>"]),
        form(&["<CMPLX-NOUN>", " ", "<VERB-PHRASE>"]),
        form(&["<ARTICLE>", " ", "<NOUN>", " ", "<VERB-PHRASE>"]),
        form(&["a", " ", "<NOUN>", " ", "<VERB-PHRASE>"]),
        form(&["a", " ", "boy", " ", "<VERB-PHRASE>"]),
        form(&["a", " ", "boy", " ", "<CMPLX-VERB>"]),
        form(&["a", " ", "boy", " ", "<VERB>"]),
        form(&["a", " ", "boy", " ", "sees"]),
    ];
    assert!(cfg.is_valid_derivation(&good));

    let mut bad = good.to_vec();
    // drops the space between article and noun
    bad[3] = form(&["<ARTICLE>", "<NOUN>", " ", "<VERB-PHRASE>"]);
    assert!(!cfg.is_valid_derivation(&bad));
}

#[test]
fn two_rewrites_in_one_step_are_invalid() {
    let cfg = arithmetic();
    assert!(cfg.is_valid_derivation(&[
        form(&["<EXPR>"]),
        form(&["<EXPR>", "+", "<TERM>"]),
        form(&["<TERM>", "+", "<TERM>"]),
        form(&["<TERM>", "+", "<TERM>", "*", "<FACTOR>"]),
    ]));
    // rewriting both <EXPR> and <TERM> at once is not a single step
    assert!(!cfg.is_valid_derivation(&[
        form(&["<EXPR>"]),
        form(&["<EXPR>", "+", "<TERM>"]),
        form(&["<TERM>", "+", "<TERM>", "*", "<FACTOR>"]),
    ]));
}

#[test]
fn normalized_balanced_grammar_is_cnf_and_equivalent() {
    let original = balanced();
    let normalized = original.chomsky_normalize();
    assert_cnf(&normalized);
    // fresh start, still nullable because ε is in the language
    assert!(normalized.rules()[&normalized.start_variable()].contains(&Production::empty()));
    assert_eq!(language_up_to(&original, 6), language_up_to(&normalized, 6));
}

#[test]
fn normalization_handles_mutually_nullable_variables() {
    // the textbook worked example: S → ASA | aB, A → B | S, B → b | ε
    let original = Cfg::new(
        rules(&[
            ("S", &[&["A", "S", "A"], &["a", "B"]]),
            ("A", &[&["B"], &["S"]]),
            ("B", &[&["b"], &["€"]]),
        ]),
        "S",
    )
    .unwrap();
    let normalized = original.chomsky_normalize();
    assert_cnf(&normalized);
    assert_eq!(language_up_to(&original, 4), language_up_to(&normalized, 4));
}

#[test]
fn normalization_resolves_units_through_epsilon_only_variables() {
    // A's entire production set is the bare ε, so DEL strips its last rule
    // entry; the unit chain S → Y → A must still be recognized and removed
    let original = Cfg::new(
        rules(&[
            ("S", &[&["Y"], &["b"]]),
            ("Y", &[&["A"]]),
            ("A", &[&["€"]]),
        ]),
        "S",
    )
    .unwrap();
    let normalized = original.chomsky_normalize();
    assert_cnf(&normalized);
    // the language is {ε, b}, so the fresh start keeps its empty production
    assert!(normalized.rules()[&normalized.start_variable()].contains(&Production::empty()));
    assert_eq!(language_up_to(&original, 3), language_up_to(&normalized, 3));
}

#[test]
fn normalization_keeps_epsilon_only_for_a_nullable_start() {
    // bb* has no ε, so no production of the normalized grammar may be empty
    let original = Cfg::new(
        rules(&[("S", &[&["b"], &["b", "S"]])]),
        "S",
    )
    .unwrap();
    let normalized = original.chomsky_normalize();
    assert_cnf(&normalized);
    assert!(normalized
        .rules()
        .values()
        .flatten()
        .all(|production| !production.is_empty()));
    assert_eq!(language_up_to(&original, 5), language_up_to(&normalized, 5));
}

#[test]
fn fresh_names_do_not_collide_with_existing_symbols() {
    // the grammar already uses V0 and V1 as symbols
    let original = Cfg::new(
        rules(&[
            ("V0", &[&["V1", "V0"], &["x"]]),
            ("V1", &[&["y"]]),
        ]),
        "V0",
    )
    .unwrap();
    let normalized = original.chomsky_normalize();
    assert_cnf(&normalized);
    assert_eq!(language_up_to(&original, 4), language_up_to(&normalized, 4));
}

#[test]
fn normalized_arithmetic_grammar_generates_the_same_short_expressions() {
    let original = arithmetic();
    let normalized = original.chomsky_normalize();
    assert_cnf(&normalized);
    let language = language_up_to(&original, 3);
    assert!(language.contains("a"));
    assert!(language.contains("a+a"));
    assert!(language.contains("a*a"));
    assert!(language.contains("(a)"));
    assert!(!language.contains(""));
    assert_eq!(language, language_up_to(&normalized, 3));
}

#[test]
fn accessors_return_defensive_copies() {
    let cfg = balanced();
    let mut copy = cfg.rules();
    copy.clear();
    assert!(!cfg.rules().is_empty());
    let mut terminals = cfg.terminals();
    terminals.insert("z".to_string());
    assert!(!cfg.terminals().contains("z"));
}
