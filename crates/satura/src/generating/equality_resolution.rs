//! Equality resolution inference rule

use crate::logic::core::clause::Clause;
use crate::logic::env::Environment;
use crate::index::GeneratingIndices;
use crate::state::{GeneratingInference, SaturationState, StateChange};
use crate::unification::mgu::{unify, Substitution};
use std::sync::Arc;

/// Equality resolution: from `s != t ∨ C` with σ = mgu(s, t), derive `Cσ`.
pub struct EqualityResolutionRule;

impl EqualityResolutionRule {
    pub fn new() -> Self {
        EqualityResolutionRule
    }
}

impl Default for EqualityResolutionRule {
    fn default() -> Self {
        Self::new()
    }
}

pub fn equality_resolution(
    clause: &Clause,
    idx: usize,
    selected: &[usize],
    env: &mut Environment,
) -> Vec<StateChange> {
    let mut results = Vec::new();

    for &i in selected {
        let lit = &clause.literals[i];
        if lit.polarity || !lit.is_equality(&env.interner) {
            continue;
        }
        let (s, t) = match lit.args.as_slice() {
            [s, t] => (*s, *t),
            _ => continue,
        };
        let mut subst = Substitution::new();
        if unify(s, t, &mut subst, &env.terms).is_err() {
            continue;
        }

        let literals: Vec<_> = clause
            .literals
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != i)
            .map(|(_, l)| subst.apply_literal(l, &mut env.terms))
            .collect();

        let mut conclusion = Clause::new(literals, &env.terms);
        env.orient_equalities(&mut conclusion);
        results.push(StateChange::Add(
            Arc::new(conclusion),
            "EqualityResolution".into(),
            vec![idx],
        ));
    }
    results
}

impl GeneratingInference for EqualityResolutionRule {
    fn name(&self) -> &str {
        "EqualityResolution"
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
        equality_resolution(&given, given_idx, &selected, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::literal::Literal;
    use crate::logic::core::term::{FunctionSymbol, TermBank};
    use crate::logic::interner::Interner;
    use crate::selection::SelectAll;

    #[test]
    fn test_reflexivity_resolution_gives_empty_clause() {
        let mut env = Environment::new(Interner::new(), TermBank::new(), Box::new(SelectAll));
        let a = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("a", 0), 0));
        let sort = env.interner.individual_sort();

        // a != a resolves to the empty clause
        let clause = Clause::new(
            vec![Literal::equality(&env.interner, a, a, false, sort)],
            &env.terms,
        );
        let results = equality_resolution(&clause, 0, &[0], &mut env);
        assert_eq!(results.len(), 1);
        if let StateChange::Add(conclusion, rule, premises) = &results[0] {
            assert!(conclusion.is_empty());
            assert_eq!(rule, "EqualityResolution");
            assert_eq!(premises, &vec![0]);
        } else {
            panic!("expected an Add change");
        }
    }

    #[test]
    fn test_ununifiable_sides_do_nothing() {
        let mut env = Environment::new(Interner::new(), TermBank::new(), Box::new(SelectAll));
        let a = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("a", 0), 0));
        let b = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("b", 0), 0));
        let sort = env.interner.individual_sort();

        let clause = Clause::new(
            vec![Literal::equality(&env.interner, a, b, false, sort)],
            &env.terms,
        );
        assert!(equality_resolution(&clause, 0, &[0], &mut env).is_empty());
    }
}
