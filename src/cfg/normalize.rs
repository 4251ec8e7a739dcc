//! Chomsky normalization.
//!
//! The pipeline runs on a flat set of `(variable, production)` rules, one
//! pass per function, in the mandatory order: START, TERM, BIN, DEL, UNIT.
//! Fresh variable names come from a counter scoped to one transformation,
//! skipping everything the grammar already uses.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use super::{Cfg, Production};

type Rule = (String, Production);

struct FreshNames {
    taken: BTreeSet<String>,
    counter: usize,
}

impl FreshNames {
    fn new(taken: BTreeSet<String>) -> Self {
        FreshNames { taken, counter: 0 }
    }

    fn next(&mut self) -> String {
        loop {
            let candidate = format!("V{}", self.counter);
            self.counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

impl Cfg {
    /// An equivalent grammar in Chomsky Normal Form: every production is a
    /// single terminal or a pair of variables, with the one exception that
    /// the (fresh) start variable may still derive ε when the original
    /// grammar did.
    pub fn chomsky_normalize(&self) -> Cfg {
        let mut names = FreshNames::new(
            self.variables
                .iter()
                .chain(self.terminals.iter())
                .cloned()
                .collect(),
        );
        let mut rules: BTreeSet<Rule> = self
            .rules
            .iter()
            .flat_map(|(variable, productions)| {
                productions
                    .iter()
                    .map(move |production| (variable.clone(), production.clone()))
            })
            .collect();

        let start = start_step(&mut rules, &self.start, &mut names);
        term_step(&mut rules, &self.terminals, &mut names);
        bin_step(&mut rules, &mut names);
        del_step(&mut rules, &start);
        unit_step(&mut rules, &self.variables);

        // reassemble; original variables keep their (possibly now empty)
        // rule entries so their occurrences in surviving bodies stay
        // variables
        let mut assembled: BTreeMap<String, BTreeSet<Production>> = self
            .variables
            .iter()
            .map(|variable| (variable.clone(), BTreeSet::new()))
            .collect();
        for (variable, production) in rules {
            assembled.entry(variable).or_default().insert(production);
        }
        Cfg::from_parts(assembled, start)
    }
}

/// START: a fresh start variable that derives the old one and never occurs
/// on a right-hand side.
fn start_step(rules: &mut BTreeSet<Rule>, start: &str, names: &mut FreshNames) -> String {
    let fresh = names.next();
    rules.insert((fresh.clone(), Production::from(start)));
    fresh
}

/// TERM: inside every production of length ≥ 2, each terminal is replaced
/// by a proxy variable (one per distinct terminal) deriving exactly it.
fn term_step(rules: &mut BTreeSet<Rule>, terminals: &BTreeSet<String>, names: &mut FreshNames) {
    let mut proxies: BTreeMap<String, String> = BTreeMap::new();
    let offending: Vec<Rule> = rules
        .iter()
        .filter(|(_, production)| {
            production.len() >= 2
                && production
                    .symbols()
                    .iter()
                    .any(|symbol| terminals.contains(symbol))
        })
        .cloned()
        .collect();
    for (variable, production) in offending {
        rules.remove(&(variable.clone(), production.clone()));
        let body: Vec<String> = production
            .symbols()
            .iter()
            .map(|symbol| {
                if terminals.contains(symbol) {
                    proxies
                        .entry(symbol.clone())
                        .or_insert_with(|| names.next())
                        .clone()
                } else {
                    symbol.clone()
                }
            })
            .collect();
        rules.insert((variable, Production::new(body)));
    }
    for (terminal, proxy) in proxies {
        rules.insert((proxy, Production::from(terminal.as_str())));
    }
}

/// BIN: every production longer than two symbols becomes a right-leaning
/// chain of fresh variables.
fn bin_step(rules: &mut BTreeSet<Rule>, names: &mut FreshNames) {
    let long: Vec<Rule> = rules
        .iter()
        .filter(|(_, production)| production.len() > 2)
        .cloned()
        .collect();
    for (variable, production) in long {
        rules.remove(&(variable.clone(), production.clone()));
        let body = production.symbols();
        let mut head = variable;
        for symbol in &body[..body.len() - 2] {
            let fresh = names.next();
            rules.insert((head, Production::new([symbol.clone(), fresh.clone()])));
            head = fresh;
        }
        rules.insert((head, Production::new(body[body.len() - 2..].to_vec())));
    }
}

/// DEL: compute the nullable variables, add every variant of every
/// production with some nullable positions omitted, then drop all
/// ε-productions, restoring `start → ε` alone if the start was nullable.
fn del_step(rules: &mut BTreeSet<Rule>, start: &str) {
    let mut nullable: BTreeSet<String> = BTreeSet::new();
    loop {
        let before = nullable.len();
        let newly: Vec<String> = rules
            .iter()
            .filter(|(_, production)| {
                production
                    .symbols()
                    .iter()
                    .all(|symbol| nullable.contains(symbol))
            })
            .map(|(variable, _)| variable.clone())
            .collect();
        nullable.extend(newly);
        if nullable.len() == before {
            break;
        }
    }

    let snapshot: Vec<Rule> = rules.iter().cloned().collect();
    for (variable, production) in snapshot {
        let positions: Vec<usize> = production
            .symbols()
            .iter()
            .enumerate()
            .filter(|(_, symbol)| nullable.contains(*symbol))
            .map(|(at, _)| at)
            .collect();
        for dropped in positions.iter().copied().powerset() {
            if dropped.is_empty() {
                continue;
            }
            let dropped: BTreeSet<usize> = dropped.into_iter().collect();
            let body: Vec<String> = production
                .symbols()
                .iter()
                .enumerate()
                .filter(|(at, _)| !dropped.contains(at))
                .map(|(_, symbol)| symbol.clone())
                .collect();
            if body.is_empty() {
                continue;
            }
            rules.insert((variable.clone(), Production::new(body)));
        }
    }

    rules.retain(|(_, production)| !production.is_empty());
    if nullable.contains(start) {
        rules.insert((start.to_string(), Production::empty()));
    }
}

/// UNIT: close the variable-to-variable rules transitively, hand every
/// variable the non-unit productions of everything it unit-reaches, and
/// drop the unit rules themselves.
fn unit_step(rules: &mut BTreeSet<Rule>, original_variables: &BTreeSet<String>) {
    // the surviving left-hand sides alone are not enough: a variable whose
    // only production was ε has no rule entries left after DEL, but a body
    // symbol naming it is still a unit production
    let mut variables: BTreeSet<String> =
        rules.iter().map(|(variable, _)| variable.clone()).collect();
    variables.extend(original_variables.iter().cloned());
    let is_unit =
        |production: &Production| production.len() == 1 && variables.contains(&production.symbols()[0]);

    let mut reach: BTreeSet<(String, String)> = rules
        .iter()
        .filter(|(_, production)| is_unit(production))
        .map(|(variable, production)| (variable.clone(), production.symbols()[0].clone()))
        .collect();
    loop {
        let chained: Vec<(String, String)> = reach
            .iter()
            .cartesian_product(reach.iter())
            .filter(|((_, b), (c, _))| b == c)
            .map(|((a, _), (_, d))| (a.clone(), d.clone()))
            .filter(|(a, d)| a != d && !reach.contains(&(a.clone(), d.clone())))
            .collect();
        if chained.is_empty() {
            break;
        }
        reach.extend(chained);
    }

    let inherited: Vec<Rule> = reach
        .iter()
        .flat_map(|(inheritor, source)| {
            rules
                .iter()
                .filter(|(variable, production)| {
                    variable == source && !is_unit(production) && !production.is_empty()
                })
                .map(|(_, production)| (inheritor.clone(), production.clone()))
                .collect::<Vec<Rule>>()
        })
        .collect();
    rules.extend(inherited);
    rules.retain(|(_, production)| !is_unit(production));
}
