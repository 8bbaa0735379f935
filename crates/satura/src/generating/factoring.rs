//! Factoring inference rule

use super::common::remove_duplicate_literals;
use crate::logic::core::clause::Clause;
use crate::logic::env::Environment;
use crate::index::GeneratingIndices;
use crate::state::{GeneratingInference, SaturationState, StateChange};
use crate::unification::mgu::{unify_literals, Substitution};
use std::sync::Arc;

/// Factoring: unify a selected literal with another literal of the same
/// polarity and predicate, dropping the factored copy.
pub struct FactoringRule;

impl FactoringRule {
    pub fn new() -> Self {
        FactoringRule
    }
}

impl Default for FactoringRule {
    fn default() -> Self {
        Self::new()
    }
}

pub fn factoring(clause: &Clause, idx: usize, selected: &[usize], env: &mut Environment) -> Vec<StateChange> {
    let mut results = Vec::new();

    for &i in selected {
        let lit1 = &clause.literals[i];
        for j in 0..clause.literals.len() {
            if i == j {
                continue;
            }
            let lit2 = &clause.literals[j];
            if lit1.polarity != lit2.polarity || lit1.predicate != lit2.predicate {
                continue;
            }
            let mut subst = Substitution::new();
            if unify_literals(lit1, lit2, &mut subst, &env.terms, &env.interner).is_err() {
                continue;
            }

            let literals: Vec<_> = clause
                .literals
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != j)
                .map(|(_, lit)| subst.apply_literal(lit, &mut env.terms))
                .collect();
            let literals = remove_duplicate_literals(literals);

            let mut conclusion = Clause::new(literals, &env.terms);
            env.orient_equalities(&mut conclusion);
            results.push(StateChange::Add(
                Arc::new(conclusion),
                "Factoring".into(),
                vec![idx],
            ));
        }
    }
    results
}

impl GeneratingInference for FactoringRule {
    fn name(&self) -> &str {
        "Factoring"
    }

    fn generate(
        &self,
        given_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        _indices: &GeneratingIndices,
    ) -> Vec<StateChange> {
        let given = Arc::clone(state.clause(given_idx));
        let selected = state.selected(given_idx).to_vec();
        factoring(&given, given_idx, &selected, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::literal::{Literal, PredicateSymbol};
    use crate::logic::core::term::{FunctionSymbol, TermBank};
    use crate::logic::interner::Interner;
    use crate::selection::SelectAll;

    #[test]
    fn test_factoring_merges_unifiable_literals() {
        let mut env = Environment::new(Interner::new(), TermBank::new(), Box::new(SelectAll));
        let p = PredicateSymbol::new(env.interner.intern_predicate("p", 1), 1);
        let x = env.terms.var(env.interner.intern_variable("X"));
        let a = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("a", 0), 0));

        // p(X) | p(a) factors to p(a)
        let clause = Clause::new(
            vec![
                Literal::positive(p, vec![x]),
                Literal::positive(p, vec![a]),
            ],
            &env.terms,
        );
        let results = factoring(&clause, 0, &[0, 1], &mut env);
        assert!(!results.is_empty());
        if let StateChange::Add(conclusion, rule, premises) = &results[0] {
            assert_eq!(rule, "Factoring");
            assert_eq!(premises, &vec![0]);
            assert_eq!(conclusion.literals.len(), 1);
            assert_eq!(conclusion.literals[0].args, vec![a]);
        } else {
            panic!("expected an Add change");
        }
    }

    #[test]
    fn test_factoring_respects_polarity() {
        let mut env = Environment::new(Interner::new(), TermBank::new(), Box::new(SelectAll));
        let p = PredicateSymbol::new(env.interner.intern_predicate("p", 1), 1);
        let x = env.terms.var(env.interner.intern_variable("X"));
        let a = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("a", 0), 0));

        // p(X) | ~p(a) has no factor
        let clause = Clause::new(
            vec![
                Literal::positive(p, vec![x]),
                Literal::negative(p, vec![a]),
            ],
            &env.terms,
        );
        assert!(factoring(&clause, 0, &[0, 1], &mut env).is_empty());
    }
}
