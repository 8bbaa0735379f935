//! Unit-resulting resolution
//!
//! Resolves all but at most one literal of a non-unit clause against
//! active unit clauses, producing unit (or empty) conclusions. The search
//! is a breadth-first layer expansion over literal positions: each layer
//! resolves one position against every unifying unit, or — once per item —
//! decides to keep that position as the surviving literal. When the given
//! clause is itself a unit, a backward pass seeds items from active
//! non-unit clauses containing a complementary literal.

use super::common::flatten_literal;
use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::env::Environment;
use crate::index::{GeneratingIndices, RetrievalMode};
use crate::state::{GeneratingInference, SaturationState, StateChange, StoreLocation};
use crate::unification::substitution::{Renaming, QUERY_BANK, RESULT_BANK};
use std::sync::Arc;

pub struct UrResolutionRule;

impl UrResolutionRule {
    pub fn new() -> Self {
        UrResolutionRule
    }
}

impl Default for UrResolutionRule {
    fn default() -> Self {
        Self::new()
    }
}

/// One partially resolved clause in the layer expansion.
///
/// Resolved positions hold `None`; the remaining literals carry the
/// substitutions of all resolutions so far.
#[derive(Clone)]
struct Item {
    literals: Vec<Option<Literal>>,
    /// Unit premise used at each resolved position
    premises: Vec<Option<usize>>,
    /// When false, the item may still keep one literal unresolved
    must_resolve_all: bool,
}

impl Item {
    fn from_clause(clause: &Clause) -> Self {
        Item {
            literals: clause.literals.iter().cloned().map(Some).collect(),
            premises: vec![None; clause.literals.len()],
            must_resolve_all: clause.literals.len() < 2,
        }
    }

    /// Conclusion literals still unresolved
    fn survivors(&self) -> Vec<Literal> {
        self.literals.iter().flatten().cloned().collect()
    }
}

/// Resolve position `idx` of each item against the active unit index,
/// producing the next layer.
fn expand_layer(
    items: Vec<Item>,
    idx: usize,
    state: &SaturationState,
    env: &mut Environment,
    indices: &GeneratingIndices,
) -> Vec<Item> {
    let mut next = Vec::new();
    for item in items {
        let lit = match &item.literals[idx] {
            Some(lit) => lit.clone(),
            None => {
                // Position already resolved (backward seeding)
                next.push(item);
                continue;
            }
        };

        // Keep this literal as the survivor, once per item
        if !item.must_resolve_all {
            let mut keep = item.clone();
            keep.must_resolve_all = true;
            next.push(keep);
        }

        let mut store = env.fresh_store();
        let mut retrieval = indices.unit_literals.retrieve(
            &lit,
            true,
            RetrievalMode::Unifiers,
            &mut store,
            &env.terms,
        );
        while let Some(ld) = retrieval.next_match(&env.terms) {
            let unit_idx = ld.clause;
            if state.slots[unit_idx].store != StoreLocation::Active {
                continue;
            }

            let mut resolved = item.clone();
            resolved.literals[idx] = None;
            resolved.premises[idx] = Some(unit_idx);

            // Apply the unifier to every remaining literal
            let mut renaming = Renaming::new();
            let subst = retrieval.substitution();
            for slot in resolved.literals.iter_mut() {
                if let Some(l) = slot.take() {
                    *slot = Some(flatten_literal(&l, QUERY_BANK, subst, &mut renaming, env));
                }
            }
            next.push(resolved);
        }
    }
    next
}

/// Run the layer expansion over all unresolved positions and emit the
/// conclusions of items with at most one survivor.
fn process_item(
    seed: Item,
    origin_idx: usize,
    state: &SaturationState,
    env: &mut Environment,
    indices: &GeneratingIndices,
    rule_name: &str,
    changes: &mut Vec<StateChange>,
) {
    let positions = seed.literals.len();
    let mut items = vec![seed];
    for idx in 0..positions {
        if items.is_empty() {
            return;
        }
        items = expand_layer(items, idx, state, env, indices);
    }

    for item in items {
        let survivors = item.survivors();
        if survivors.len() > 1 {
            continue;
        }
        let mut premises = vec![origin_idx];
        premises.extend(item.premises.iter().flatten().copied());

        let mut conclusion = Clause::new(survivors, &env.terms);
        env.orient_equalities(&mut conclusion);
        changes.push(StateChange::Add(
            Arc::new(conclusion),
            rule_name.into(),
            premises,
        ));
    }
}

impl GeneratingInference for UrResolutionRule {
    fn name(&self) -> &str {
        "UnitResultingResolution"
    }

    fn generate(
        &self,
        given_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        indices: &GeneratingIndices,
    ) -> Vec<StateChange> {
        let given = Arc::clone(state.clause(given_idx));
        if given.is_empty() {
            return vec![];
        }
        let mut changes = Vec::new();

        // Forward: expand the given clause against active units. Unit
        // given clauses have nothing to gain here; binary resolution
        // covers the unit/unit conclusions.
        if given.literals.len() >= 2 {
            process_item(
                Item::from_clause(&given),
                given_idx,
                state,
                env,
                indices,
                self.name(),
                &mut changes,
            );
        }

        // Backward: a new unit may complete resolutions of active
        // non-unit clauses.
        if given.is_unit() {
            let lit = given.literals[0].clone();
            let mut seeds: Vec<(usize, Item)> = Vec::new();
            {
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
                    if state.slots[partner_idx].store != StoreLocation::Active
                        || partner_idx == given_idx
                    {
                        continue;
                    }
                    let partner = state.clause(partner_idx);
                    if partner.literals.len() < 2 {
                        continue;
                    }

                    let mut item = Item::from_clause(partner);
                    item.literals[ld.literal] = None;
                    item.premises[ld.literal] = Some(given_idx);

                    // The partner is the result side of this unifier
                    let mut renaming = Renaming::new();
                    let subst = retrieval.substitution();
                    for slot in item.literals.iter_mut() {
                        if let Some(l) = slot.take() {
                            *slot =
                                Some(flatten_literal(&l, RESULT_BANK, subst, &mut renaming, env));
                        }
                    }
                    seeds.push((partner_idx, item));
                }
            }
            for (partner_idx, item) in seeds {
                process_item(
                    item,
                    partner_idx,
                    state,
                    env,
                    indices,
                    self.name(),
                    &mut changes,
                );
            }
        }

        changes
    }
}
