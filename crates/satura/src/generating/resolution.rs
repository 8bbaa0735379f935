//! Binary resolution through the literal index

use super::common::{collect_flattened_except, remove_duplicate_literals};
use crate::logic::env::Environment;
use crate::index::{GeneratingIndices, RetrievalMode};
use crate::state::{GeneratingInference, SaturationState, StateChange, StoreLocation};
use crate::unification::substitution::{Renaming, QUERY_BANK, RESULT_BANK};
use std::sync::Arc;

/// Binary resolution.
///
/// For each selected literal of the given clause, unifier retrieval on the
/// complementary root symbol yields the active partners; the resolvent is
/// the σ-image of the remaining literals of both parents, deduplicated.
pub struct ResolutionRule;

impl ResolutionRule {
    pub fn new() -> Self {
        ResolutionRule
    }
}

impl Default for ResolutionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratingInference for ResolutionRule {
    fn name(&self) -> &str {
        "Resolution"
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

        for &i in &selected {
            let lit = given.literals[i].clone();
            let mut store = env.fresh_store();
            let mut retrieval = indices.literals.retrieve(
                &lit,
                true,
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

                let mut renaming = Renaming::new();
                let subst = retrieval.substitution();
                let mut literals =
                    collect_flattened_except(&given, &[i], QUERY_BANK, subst, &mut renaming, env);
                literals.extend(collect_flattened_except(
                    &partner,
                    &[ld.literal],
                    RESULT_BANK,
                    subst,
                    &mut renaming,
                    env,
                ));
                let literals = remove_duplicate_literals(literals);

                let mut conclusion = crate::logic::Clause::new(literals, &env.terms);
                env.orient_equalities(&mut conclusion);
                changes.push(StateChange::Add(
                    Arc::new(conclusion),
                    self.name().into(),
                    vec![given_idx, partner_idx],
                ));
            }
        }
        changes
    }
}
