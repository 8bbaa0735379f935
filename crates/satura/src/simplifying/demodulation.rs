//! Demodulation: rewriting with oriented unit equalities
//!
//! Forward demodulation queries the demodulator term index in
//! generalization mode for each non-variable subterm of the clause being
//! simplified; the ordering constraint lσ ≻ rσ is checked after the match
//! because both sides of unorientable equalities are indexed. Backward
//! demodulation runs when a unit equality enters the simplification
//! container and rewrites existing passive/active clauses directly.

use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::core::term::{TermBank, TermData, TermId};
use crate::logic::env::Environment;
use crate::logic::ordering::TermOrdering;
use crate::index::{RetrievalMode, SimplifyingIndices};
use crate::state::{SaturationState, SimplifyingInference, StateChange, StoreLocation};
use crate::unification::mgu::{match_onto, Substitution};
use crate::unification::substitution::{BankedTerm, BindingStore, Renaming, RESULT_BANK};
use std::sync::Arc;

pub struct DemodulationRule;

impl DemodulationRule {
    pub fn new() -> Self {
        DemodulationRule
    }
}

impl Default for DemodulationRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique non-variable subterms of a literal's arguments
fn rewritable_subterms(lit: &Literal, terms: &TermBank) -> Vec<TermId> {
    let mut all = Vec::new();
    for &arg in &lit.args {
        terms.subterms(arg, &mut all);
    }
    let mut unique = Vec::new();
    for t in all {
        if matches!(terms.data(t), TermData::App { .. }) && !unique.contains(&t) {
            unique.push(t);
        }
    }
    unique
}

/// Replace every occurrence of `from` with `to` across a clause
fn rewrite_clause(clause: &Clause, from: TermId, to: TermId, terms: &mut TermBank) -> Clause {
    let literals = clause
        .literals
        .iter()
        .map(|lit| Literal {
            predicate: lit.predicate,
            args: lit
                .args
                .iter()
                .map(|&a| terms.replace(a, from, to))
                .collect(),
            polarity: lit.polarity,
            sort: lit.sort,
        })
        .collect();
    Clause::new(literals, terms)
}

impl SimplifyingInference for DemodulationRule {
    fn name(&self) -> &str {
        "Demodulation"
    }

    fn simplify_forward(
        &self,
        clause_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        indices: &SimplifyingIndices,
    ) -> Option<StateChange> {
        if indices.unit_equalities.is_empty() {
            return None;
        }
        let clause = Arc::clone(state.clause(clause_idx));

        for lit in &clause.literals {
            for sub in rewritable_subterms(lit, &env.terms) {
                let mut store = BindingStore::new();
                let mut retrieval = indices.demodulators.retrieve(
                    sub,
                    RetrievalMode::Generalizations,
                    &mut store,
                    &env.terms,
                );
                while let Some(ld) = retrieval.next_match(&env.terms) {
                    let unit_idx = ld.clause;
                    if unit_idx == clause_idx {
                        continue;
                    }
                    let slot = &state.slots[unit_idx];
                    if !matches!(slot.store, StoreLocation::Passive | StoreLocation::Active) {
                        continue;
                    }

                    let side = ld.term.expect("demodulator entry without its term");
                    let unit_lit = &state.clause(unit_idx).literals[0];
                    let other = if unit_lit.args[0] == side {
                        unit_lit.args[1]
                    } else {
                        unit_lit.args[0]
                    };

                    // Build rσ; lσ is the matched subterm itself
                    let mut renaming = Renaming::new();
                    let rhs = retrieval.substitution().apply(
                        BankedTerm::new(other, RESULT_BANK),
                        &mut env.terms,
                        &mut renaming,
                        &mut env.interner,
                    );

                    if env.ordering.compare(sub, rhs, &env.terms) != TermOrdering::Greater {
                        continue;
                    }

                    let mut replacement = rewrite_clause(&clause, sub, rhs, &mut env.terms);
                    env.orient_equalities(&mut replacement);
                    return Some(StateChange::Simplify(
                        clause_idx,
                        Some(Arc::new(replacement)),
                        self.name().into(),
                        vec![clause_idx, unit_idx],
                    ));
                }
            }
        }
        None
    }

    fn simplify_backward(
        &self,
        clause_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        _indices: &SimplifyingIndices,
    ) -> Vec<StateChange> {
        let unit = Arc::clone(state.clause(clause_idx));
        if !unit.is_unit_equality(&env.interner) {
            return vec![];
        }
        let (l, r) = match unit.literals[0].args.as_slice() {
            [l, r] => (*l, *r),
            _ => return vec![],
        };

        let mut changes = Vec::new();
        let targets: Vec<usize> = state
            .passive
            .iter()
            .chain(state.active.iter())
            .copied()
            .filter(|&idx| idx != clause_idx)
            .collect();
        for target_idx in targets {
            let target = Arc::clone(state.clause(target_idx));
            if let Some(mut replacement) = demodulate_into(l, r, &target, env) {
                env.orient_equalities(&mut replacement);
                changes.push(StateChange::Simplify(
                    target_idx,
                    Some(Arc::new(replacement)),
                    self.name().into(),
                    vec![target_idx, clause_idx],
                ));
            }
        }
        changes
    }
}

/// Try to rewrite `target` with the unit equality `l = r` (either
/// orientation); returns the rewritten clause on the first success.
fn demodulate_into(l: TermId, r: TermId, target: &Clause, env: &mut Environment) -> Option<Clause> {
    for lit in &target.literals {
        for sub in rewritable_subterms(lit, &env.terms) {
            for (pattern, replacement) in [(l, r), (r, l)] {
                let mut subst = Substitution::new();
                if match_onto(pattern, sub, &mut subst, &env.terms).is_err() {
                    continue;
                }
                let rhs = subst.apply(replacement, &mut env.terms);
                if env.ordering.compare(sub, rhs, &env.terms) != TermOrdering::Greater {
                    continue;
                }
                return Some(rewrite_clause(target, sub, rhs, &mut env.terms));
            }
        }
    }
    None
}
