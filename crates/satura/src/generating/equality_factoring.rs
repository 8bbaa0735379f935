//! Equality factoring inference rule

use super::common::{is_ordered_greater, remove_duplicate_literals};
use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::env::Environment;
use crate::index::GeneratingIndices;
use crate::state::{GeneratingInference, SaturationState, StateChange};
use crate::unification::mgu::{unify, Substitution};
use std::sync::Arc;

/// Equality factoring.
///
/// From `l = r ∨ s = t ∨ C` with σ = mgu(l, s) and `l = r` selected,
/// derive `(r != t ∨ l = r ∨ C)σ` under the constraints that `lσ` is not
/// smaller than `rσ` or `tσ`, and `rσ` not smaller than `tσ`.
pub struct EqualityFactoringRule;

impl EqualityFactoringRule {
    pub fn new() -> Self {
        EqualityFactoringRule
    }
}

impl Default for EqualityFactoringRule {
    fn default() -> Self {
        Self::new()
    }
}

pub fn equality_factoring(
    clause: &Clause,
    idx: usize,
    selected: &[usize],
    env: &mut Environment,
) -> Vec<StateChange> {
    let mut results = Vec::new();

    let positive_eqs: Vec<usize> = clause
        .literals
        .iter()
        .enumerate()
        .filter(|(_, lit)| lit.polarity && lit.is_equality(&env.interner))
        .map(|(i, _)| i)
        .collect();
    if positive_eqs.len() < 2 {
        return results;
    }

    for (a, &i) in positive_eqs.iter().enumerate() {
        if !selected.contains(&i) {
            continue;
        }
        let (l, r) = match clause.literals[i].args.as_slice() {
            [l, r] => (*l, *r),
            _ => continue,
        };
        let sort = clause.literals[i].sort;

        for &j in positive_eqs.iter().skip(a + 1) {
            if clause.literals[j].sort != sort {
                continue;
            }
            let (s, t) = match clause.literals[j].args.as_slice() {
                [s, t] => (*s, *t),
                _ => continue,
            };

            let mut subst = Substitution::new();
            if unify(l, s, &mut subst, &env.terms).is_err() {
                continue;
            }

            let l_sigma = subst.apply(l, &mut env.terms);
            let r_sigma = subst.apply(r, &mut env.terms);
            let t_sigma = subst.apply(t, &mut env.terms);

            if !is_ordered_greater(l_sigma, r_sigma, &env.ordering, &env.terms)
                || !is_ordered_greater(l_sigma, t_sigma, &env.ordering, &env.terms)
                || !is_ordered_greater(r_sigma, t_sigma, &env.ordering, &env.terms)
            {
                continue;
            }

            let eq_sort = sort.unwrap_or_else(|| env.interner.individual_sort());
            let mut literals = vec![
                Literal::equality(&env.interner, r_sigma, t_sigma, false, eq_sort),
                Literal::equality(&env.interner, l_sigma, r_sigma, true, eq_sort),
            ];
            literals.extend(
                clause
                    .literals
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != i && *k != j)
                    .map(|(_, lit)| subst.apply_literal(lit, &mut env.terms)),
            );
            let literals = remove_duplicate_literals(literals);

            let mut conclusion = Clause::new(literals, &env.terms);
            env.orient_equalities(&mut conclusion);
            results.push(StateChange::Add(
                Arc::new(conclusion),
                "EqualityFactoring".into(),
                vec![idx],
            ));
        }
    }
    results
}

impl GeneratingInference for EqualityFactoringRule {
    fn name(&self) -> &str {
        "EqualityFactoring"
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
        equality_factoring(&given, given_idx, &selected, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::term::{FunctionSymbol, TermBank};
    use crate::logic::interner::Interner;
    use crate::selection::SelectAll;

    #[test]
    fn test_equality_factoring_basic() {
        let mut env = Environment::new(Interner::new(), TermBank::new(), Box::new(SelectAll));
        let f = FunctionSymbol::new(env.interner.intern_function("f", 1), 1);
        let x = env.terms.var(env.interner.intern_variable("X"));
        let a = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("a", 0), 0));
        let b = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("b", 0), 0));
        let fx = env.terms.app(f, vec![x]);
        let fa = env.terms.app(f, vec![a]);
        let sort = env.interner.individual_sort();

        // f(X) = b | f(a) = b factors with σ = {X ↦ a}
        let clause = Clause::new(
            vec![
                Literal::equality(&env.interner, fx, b, true, sort),
                Literal::equality(&env.interner, fa, b, true, sort),
            ],
            &env.terms,
        );
        let results = equality_factoring(&clause, 0, &[0, 1], &mut env);
        assert!(!results.is_empty());
        if let StateChange::Add(conclusion, rule, _) = &results[0] {
            assert_eq!(rule, "EqualityFactoring");
            // (b != b | f(a) = b)
            assert_eq!(conclusion.literals.len(), 2);
            assert!(!conclusion.literals[0].polarity);
        } else {
            panic!("expected an Add change");
        }
    }

    #[test]
    fn test_single_equality_no_factor() {
        let mut env = Environment::new(Interner::new(), TermBank::new(), Box::new(SelectAll));
        let a = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("a", 0), 0));
        let b = env
            .terms
            .constant(FunctionSymbol::new(env.interner.intern_function("b", 0), 0));
        let sort = env.interner.individual_sort();

        let clause = Clause::new(
            vec![Literal::equality(&env.interner, a, b, true, sort)],
            &env.terms,
        );
        assert!(equality_factoring(&clause, 0, &[0], &mut env).is_empty());
    }
}
