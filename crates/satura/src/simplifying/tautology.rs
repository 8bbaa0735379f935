//! Tautology deletion

use crate::logic::env::Environment;
use crate::index::SimplifyingIndices;
use crate::state::{SaturationState, SimplifyingInference, StateChange};

/// Deletes clauses containing complementary literals or a reflexive
/// positive equality.
pub struct TautologyRule;

impl TautologyRule {
    pub fn new() -> Self {
        TautologyRule
    }
}

impl Default for TautologyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SimplifyingInference for TautologyRule {
    fn name(&self) -> &str {
        "Tautology"
    }

    fn simplify_forward(
        &self,
        clause_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        _indices: &SimplifyingIndices,
    ) -> Option<StateChange> {
        let clause = state.clause(clause_idx);
        if clause.is_tautology(&env.interner) {
            Some(StateChange::Simplify(
                clause_idx,
                None,
                self.name().into(),
                vec![],
            ))
        } else {
            None
        }
    }
}
