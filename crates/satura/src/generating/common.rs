//! Shared helpers for generating rules

use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::core::term::TermId;
use crate::logic::env::Environment;
use crate::logic::ordering::{Kbo, TermOrdering};
use crate::logic::core::term::TermBank;
use crate::unification::substitution::{Bank, BankedTerm, BindingStore, Renaming};
use std::collections::HashSet;

/// Image of one literal under a banked substitution.
pub fn flatten_literal(
    lit: &Literal,
    bank: Bank,
    subst: &BindingStore,
    renaming: &mut Renaming,
    env: &mut Environment,
) -> Literal {
    Literal {
        predicate: lit.predicate,
        args: lit
            .args
            .iter()
            .map(|&a| {
                subst.apply(
                    BankedTerm::new(a, bank),
                    &mut env.terms,
                    renaming,
                    &mut env.interner,
                )
            })
            .collect(),
        polarity: lit.polarity,
        sort: lit.sort,
    }
}

/// Images of a clause's literals, excluding the given indices.
pub fn collect_flattened_except(
    clause: &Clause,
    exclude: &[usize],
    bank: Bank,
    subst: &BindingStore,
    renaming: &mut Renaming,
    env: &mut Environment,
) -> Vec<Literal> {
    clause
        .literals
        .iter()
        .enumerate()
        .filter(|(i, _)| !exclude.contains(i))
        .map(|(_, lit)| flatten_literal(lit, bank, subst, renaming, env))
        .collect()
}

/// Drop duplicate literals, keeping first occurrences
pub fn remove_duplicate_literals(literals: Vec<Literal>) -> Vec<Literal> {
    let mut seen = HashSet::new();
    literals
        .into_iter()
        .filter(|lit| seen.insert(lit.clone()))
        .collect()
}

/// The superposition ordering constraint "not smaller": Greater or
/// Incomparable.
pub fn is_ordered_greater(t1: TermId, t2: TermId, kbo: &Kbo, terms: &TermBank) -> bool {
    matches!(
        kbo.compare(t1, t2, terms),
        TermOrdering::Greater | TermOrdering::Incomparable
    )
}
