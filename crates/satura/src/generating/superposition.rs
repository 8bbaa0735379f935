//! Superposition inference rule
//!
//! Superposition: `l = r ∨ C1`, `L[l'] ∨ C2` with σ = mgu(l, l'), `l'` not
//! a variable, `lσ` not smaller than `rσ`, derives `(L[r] ∨ C1 ∨ C2)σ`.
//! When `L[l']` is an equality `s ± t`, the side containing `l'` must
//! additionally not be smaller than the other side after σ.
//!
//! Both directions run through the generating indices: the given clause's
//! equality sides query the active subterm index, and the given clause's
//! rewritable subterms query the active left-hand-side index. Every
//! occurrence of the unified subterm in the rewritten literal is replaced.

use super::common::{collect_flattened_except, is_ordered_greater, remove_duplicate_literals};
use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::core::term::{TermBank, TermData, TermId};
use crate::logic::env::Environment;
use crate::logic::ordering::TermOrdering;
use crate::index::{GeneratingIndices, RetrievalMode};
use crate::state::{GeneratingInference, SaturationState, StateChange, StoreLocation};
use crate::unification::substitution::{Bank, BankedTerm, BindingStore, Renaming, QUERY_BANK, RESULT_BANK};
use std::sync::Arc;

pub struct SuperpositionRule;

impl SuperpositionRule {
    pub fn new() -> Self {
        SuperpositionRule
    }
}

impl Default for SuperpositionRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique non-variable subterms of a literal
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

/// Sides of a positive equality eligible as rewrite sources: application
/// terms not smaller than the other side.
fn rewrite_sides(lit: &Literal, env: &Environment) -> Vec<(TermId, TermId)> {
    let mut sides = Vec::new();
    if let [l, r] = lit.args.as_slice() {
        for (side, other) in [(*l, *r), (*r, *l)] {
            if matches!(env.terms.data(side), TermData::App { .. })
                && !matches!(
                    env.ordering.compare(side, other, &env.terms),
                    TermOrdering::Less | TermOrdering::Equal
                )
            {
                sides.push((side, other));
            }
        }
    }
    sides
}

/// Build one superposition conclusion.
///
/// `from` (the equality parent) lives in `from_bank`, `into` (the
/// rewritten parent) in `into_bank`. `pattern`/`replacement` are the
/// equality sides in `from_bank`; `target` is the unified subterm of
/// `into`'s literal `into_lit` in `into_bank`.
#[allow(clippy::too_many_arguments)]
fn build_conclusion(
    from: &Clause,
    from_idx: usize,
    from_lit: usize,
    from_bank: Bank,
    into: &Clause,
    into_idx: usize,
    into_lit: usize,
    into_bank: Bank,
    pattern: TermId,
    replacement: TermId,
    target: TermId,
    subst: &BindingStore,
    env: &mut Environment,
) -> Option<StateChange> {
    let mut renaming = Renaming::new();

    // Ordering constraint on the equality after unification
    let pattern_img = subst.apply(
        BankedTerm::new(pattern, from_bank),
        &mut env.terms,
        &mut renaming,
        &mut env.interner,
    );
    let replacement_img = subst.apply(
        BankedTerm::new(replacement, from_bank),
        &mut env.terms,
        &mut renaming,
        &mut env.interner,
    );
    if !is_ordered_greater(pattern_img, replacement_img, &env.ordering, &env.terms) {
        return None;
    }

    // Image of the rewritten literal's arguments
    let lit = &into.literals[into_lit];
    let target_img = subst.apply(
        BankedTerm::new(target, into_bank),
        &mut env.terms,
        &mut renaming,
        &mut env.interner,
    );
    let arg_imgs: Vec<TermId> = lit
        .args
        .iter()
        .map(|&a| {
            subst.apply(
                BankedTerm::new(a, into_bank),
                &mut env.terms,
                &mut renaming,
                &mut env.interner,
            )
        })
        .collect();

    // Rewriting inside an equality: the rewritten side must not be smaller
    // than the other side after σ. With every occurrence replaced, a target
    // occurring in both sides constrains both of them.
    if lit.is_equality(&env.interner) && arg_imgs.len() == 2 {
        let in_left = env.terms.contains_subterm(arg_imgs[0], target_img);
        let in_right = env.terms.contains_subterm(arg_imgs[1], target_img);
        if in_left && !is_ordered_greater(arg_imgs[0], arg_imgs[1], &env.ordering, &env.terms) {
            return None;
        }
        if in_right && !is_ordered_greater(arg_imgs[1], arg_imgs[0], &env.ordering, &env.terms) {
            return None;
        }
    }

    let rewritten = Literal {
        predicate: lit.predicate,
        args: arg_imgs
            .into_iter()
            .map(|a| env.terms.replace(a, target_img, replacement_img))
            .collect(),
        polarity: lit.polarity,
        sort: lit.sort,
    };

    let mut literals =
        collect_flattened_except(from, &[from_lit], from_bank, subst, &mut renaming, env);
    literals.push(rewritten);
    literals.extend(collect_flattened_except(
        into,
        &[into_lit],
        into_bank,
        subst,
        &mut renaming,
        env,
    ));
    let literals = remove_duplicate_literals(literals);

    let mut conclusion = Clause::new(literals, &env.terms);
    env.orient_equalities(&mut conclusion);
    Some(StateChange::Add(
        Arc::new(conclusion),
        "Superposition".into(),
        vec![from_idx, into_idx],
    ))
}

impl GeneratingInference for SuperpositionRule {
    fn name(&self) -> &str {
        "Superposition"
    }

    fn generate(
        &self,
        given_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        indices: &GeneratingIndices,
    ) -> Vec<StateChange> {
        let given = Arc::clone(state.clause(given_idx));
        let selected = state.selected(given_idx).to_vec();
        let mut changes = Vec::new();

        // Direction 1: the given clause rewrites active clauses.
        // Query = equality side (query bank), indexed subterms (result bank).
        for &i in &selected {
            let lit = given.literals[i].clone();
            if !lit.polarity || !lit.is_equality(&env.interner) {
                continue;
            }
            for (side, other) in rewrite_sides(&lit, env) {
                let mut store = env.fresh_store();
                let mut retrieval = indices.subterms.retrieve(
                    side,
                    RetrievalMode::Unifiers,
                    &mut store,
                    &env.terms,
                );
                while let Some(ld) = retrieval.next_match(&env.terms) {
                    let partner_idx = ld.clause;
                    if state.slots[partner_idx].store != StoreLocation::Active {
                        continue;
                    }
                    let partner = Arc::clone(state.clause(partner_idx));
                    let target = ld.term.expect("subterm entry without its term");
                    if let Some(change) = build_conclusion(
                        &given,
                        given_idx,
                        i,
                        QUERY_BANK,
                        &partner,
                        partner_idx,
                        ld.literal,
                        RESULT_BANK,
                        side,
                        other,
                        target,
                        retrieval.substitution(),
                        env,
                    ) {
                        changes.push(change);
                    }
                }
            }
        }

        // Direction 2: active equalities rewrite the given clause.
        // Query = given subterm (query bank), indexed sides (result bank).
        for &j in &selected {
            let lit = given.literals[j].clone();
            for target in rewritable_subterms(&lit, &env.terms) {
                let mut store = env.fresh_store();
                let mut retrieval = indices.superposition_lhs.retrieve(
                    target,
                    RetrievalMode::Unifiers,
                    &mut store,
                    &env.terms,
                );
                while let Some(ld) = retrieval.next_match(&env.terms) {
                    let partner_idx = ld.clause;
                    if state.slots[partner_idx].store != StoreLocation::Active {
                        continue;
                    }
                    // Self-inferences are covered by direction 1
                    if partner_idx == given_idx {
                        continue;
                    }
                    let partner = Arc::clone(state.clause(partner_idx));
                    let side = ld.term.expect("lhs entry without its term");
                    let eq_lit = &partner.literals[ld.literal];
                    let other = if eq_lit.args[0] == side {
                        eq_lit.args[1]
                    } else {
                        eq_lit.args[0]
                    };
                    if let Some(change) = build_conclusion(
                        &partner,
                        partner_idx,
                        ld.literal,
                        RESULT_BANK,
                        &given,
                        given_idx,
                        j,
                        QUERY_BANK,
                        side,
                        other,
                        target,
                        retrieval.substitution(),
                        env,
                    ) {
                        changes.push(change);
                    }
                }
            }
        }

        changes
    }
}
