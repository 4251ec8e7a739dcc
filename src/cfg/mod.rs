//! Context-free grammars: validated construction, derivation checking and
//! Chomsky normalization.

mod normalize;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ValidationError;

/// The marker accepted (and canonicalized away) for the empty production.
pub const EMPTY_MARKER: &str = "€";

/// One production body: an ordered sequence of symbol names. The empty
/// sequence is the empty production; `€` and the empty string, whether
/// standing alone or appearing as elements, canonicalize to nothing.
/// Symbol boundaries are never inferred inside a name: `"aSb"` is one
/// symbol called `aSb`, not three.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Production(Vec<String>);

impl Production {
    pub fn new<I, T>(symbols: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Production(
            symbols
                .into_iter()
                .map(Into::into)
                .filter(|symbol| symbol != EMPTY_MARKER && !symbol.is_empty())
                .collect(),
        )
    }

    pub fn empty() -> Self {
        Production(Vec::new())
    }

    pub fn symbols(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A bare string is the one-element production (or the empty production,
/// for `€`).
impl From<&str> for Production {
    fn from(symbol: &str) -> Self {
        Production::new([symbol])
    }
}

/// A context-free grammar. The rule map's keys are the variables; every
/// body symbol that is not a variable is a terminal. A grammar without
/// terminals, or whose start symbol is not a variable, is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cfg {
    rules: BTreeMap<String, BTreeSet<Production>>,
    variables: BTreeSet<String>,
    terminals: BTreeSet<String>,
    start: String,
}

impl Cfg {
    pub fn new<R, P>(rules: R, start: impl Into<String>) -> Result<Cfg, ValidationError>
    where
        R: IntoIterator<Item = (String, P)>,
        P: IntoIterator<Item = Production>,
    {
        let rules: BTreeMap<String, BTreeSet<Production>> = rules
            .into_iter()
            .map(|(variable, productions)| (variable, productions.into_iter().collect()))
            .collect();
        let start = start.into();
        let (variables, terminals) = split_symbols(&rules);
        if terminals.is_empty() {
            return Err(ValidationError::NoTerminals);
        }
        if !variables.contains(&start) {
            return Err(ValidationError::StartNotVariable(format!("{:?}", start)));
        }
        Ok(Cfg {
            rules,
            variables,
            terminals,
            start,
        })
    }

    /// Assembles a grammar the normalizer has already shaped; skips the
    /// terminal/start checks, which hold by construction there.
    pub(crate) fn from_parts(rules: BTreeMap<String, BTreeSet<Production>>, start: String) -> Cfg {
        let (variables, terminals) = split_symbols(&rules);
        Cfg {
            rules,
            variables,
            terminals,
            start,
        }
    }

    pub fn rules(&self) -> BTreeMap<String, BTreeSet<Production>> {
        self.rules.clone()
    }

    pub fn start_variable(&self) -> String {
        self.start.clone()
    }

    pub fn variables(&self) -> BTreeSet<String> {
        self.variables.clone()
    }

    pub fn terminals(&self) -> BTreeSet<String> {
        self.terminals.clone()
    }

    /// Whether `derivation` is a valid derivation in this grammar: it must
    /// begin with the start variable alone, and each sentential form must
    /// follow from the previous one by rewriting exactly one variable
    /// occurrence with one of its productions.
    pub fn is_valid_derivation(&self, derivation: &[Vec<String>]) -> bool {
        let starts_right = derivation
            .first()
            .is_some_and(|form| form.len() == 1 && form[0] == self.start);
        starts_right
            && derivation
                .windows(2)
                .all(|step| self.yields(&step[0], &step[1]))
    }

    fn yields(&self, current: &[String], next: &[String]) -> bool {
        for (at, symbol) in current.iter().enumerate() {
            let Some(productions) = self.rules.get(symbol) else {
                continue;
            };
            for production in productions {
                let body = production.symbols();
                if next.len() == current.len() - 1 + body.len()
                    && next[..at] == current[..at]
                    && next[at..at + body.len()] == *body
                    && next[at + body.len()..] == current[at + 1..]
                {
                    return true;
                }
            }
        }
        false
    }
}

fn split_symbols(
    rules: &BTreeMap<String, BTreeSet<Production>>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let variables: BTreeSet<String> = rules.keys().cloned().collect();
    let terminals = rules
        .values()
        .flatten()
        .flat_map(|production| production.symbols())
        .filter(|symbol| !variables.contains(*symbol))
        .cloned()
        .collect();
    (variables, terminals)
}
