//! Saturation state: clause slots, the three clause containers, the event
//! log, and the inference-rule traits.
//!
//! Derivations are recorded out-of-band: every `Add` and `Simplify` event
//! carries its rule name and premise clause ids, and proof extraction
//! walks that DAG backward from the empty clause. Clauses themselves only
//! carry their id; `Arc` strong counts are the clause reference counts.

use crate::logic::core::clause::Clause;
use crate::logic::env::Environment;
use crate::index::{GeneratingIndices, SimplifyingIndices};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// =============================================================================
// Store locations
// =============================================================================

/// Where a clause currently lives. The slot's store field is the single
/// source of truth for container membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreLocation {
    /// Discarded before entering any container
    None,
    /// Fresh arrival awaiting forward simplification
    Unprocessed,
    /// Selectable, not yet indexed for generation
    Passive,
    /// Indexed, participates as left premise of generating inferences
    Active,
    /// Removed by a simplification; may not be selected again
    Reduced,
}

/// One clause slot of the saturation state
pub struct ClauseSlot {
    pub clause: Arc<Clause>,
    pub store: StoreLocation,
    /// Selected-literal indices, cached at activation
    pub selected: Option<Box<[usize]>>,
    /// Bumped whenever the clause is reduced; stale index hits compare it
    pub timestamp: u32,
}

// =============================================================================
// StateChange & event log
// =============================================================================

/// Atomic operations on the proof state: the derivation record and the
/// replayable log of one run.
#[derive(Debug, Clone, Serialize)]
pub enum StateChange {
    /// New clause (from input or inference): (clause, rule name, premises)
    Add(Arc<Clause>, String, Vec<usize>),
    /// Clause removed by simplification, optionally replaced:
    /// (clause idx, replacement, rule name, premises)
    Simplify(usize, Option<Arc<Clause>>, String, Vec<usize>),
    /// Clause moved from Unprocessed to Passive
    Transfer(usize),
    /// Clause selected as given and moved from Passive to Active
    Activate(usize),
}

/// The raw event log of a saturation run
pub type EventLog = Vec<StateChange>;

/// A single step of an extracted proof
#[derive(Debug, Clone)]
pub struct ProofStep {
    pub clause_idx: usize,
    pub rule_name: String,
    pub premises: Vec<usize>,
    pub conclusion: Arc<Clause>,
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of a saturation run.
#[derive(Debug, Clone)]
pub enum ProofOutcome {
    /// The empty clause was derived
    Refutation { empty_clause_idx: usize },
    /// The passive set drained without a refutation
    Satisfiable,
    /// The wall-clock deadline was reached
    Timeout,
    /// A clause/iteration limit was reached
    ResourceLimit,
}

impl ProofOutcome {
    /// Process exit code for an external driver: 0 refutation,
    /// 1 satisfiable, 2 timeout or resource limit.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProofOutcome::Refutation { .. } => 0,
            ProofOutcome::Satisfiable => 1,
            ProofOutcome::Timeout | ProofOutcome::ResourceLimit => 2,
        }
    }
}

// =============================================================================
// SaturationState
// =============================================================================

/// Clause storage and the three containers of the given-clause loop.
pub struct SaturationState {
    /// All clause slots, indexed by clause id
    pub slots: Vec<ClauseSlot>,
    /// Fresh arrivals awaiting forward simplification (LIFO)
    pub unprocessed: Vec<usize>,
    /// Selectable clauses
    pub passive: IndexSet<usize>,
    /// Activated clauses feeding generating inferences
    pub active: IndexSet<usize>,
    /// Raw event log capturing all state changes
    pub event_log: EventLog,
    /// Current iteration, used as the age of derived clauses
    pub current_iteration: usize,
    /// Number of input clauses
    pub initial_clause_count: usize,
}

impl SaturationState {
    pub fn new() -> Self {
        SaturationState {
            slots: Vec::new(),
            unprocessed: Vec::new(),
            passive: IndexSet::new(),
            active: IndexSet::new(),
            event_log: Vec::new(),
            current_iteration: 0,
            initial_clause_count: 0,
        }
    }

    pub fn clause(&self, idx: usize) -> &Arc<Clause> {
        &self.slots[idx].clause
    }

    /// Selected literals of an activated clause
    pub fn selected(&self, idx: usize) -> &[usize] {
        self.slots[idx]
            .selected
            .as_deref()
            .expect("selection queried before activation")
    }

    /// Extract a proof by backward traversal of the derivation DAG from
    /// the given clause index.
    pub fn extract_proof(&self, clause_idx: usize) -> Vec<ProofStep> {
        let mut derivations: HashMap<usize, (String, Vec<usize>)> = HashMap::new();
        for event in &self.event_log {
            match event {
                StateChange::Add(clause, rule_name, premises) => {
                    if let Some(idx) = clause.id {
                        derivations.insert(idx, (rule_name.clone(), premises.clone()));
                    }
                }
                StateChange::Simplify(_, Some(clause), rule_name, premises) => {
                    if let Some(idx) = clause.id {
                        derivations.insert(idx, (rule_name.clone(), premises.clone()));
                    }
                }
                _ => {}
            }
        }

        let mut proof_indices = Vec::new();
        let mut visited = HashSet::new();
        let mut to_visit = vec![clause_idx];
        while let Some(idx) = to_visit.pop() {
            if !visited.insert(idx) {
                continue;
            }
            proof_indices.push(idx);
            if let Some((_, premises)) = derivations.get(&idx) {
                to_visit.extend(premises.iter().copied());
            }
        }
        proof_indices.sort_unstable();

        proof_indices
            .into_iter()
            .map(|idx| {
                let (rule_name, premises) = derivations
                    .get(&idx)
                    .cloned()
                    .unwrap_or_else(|| ("Input".into(), vec![]));
                ProofStep {
                    clause_idx: idx,
                    rule_name,
                    premises,
                    conclusion: Arc::clone(&self.slots[idx].clause),
                }
            })
            .collect()
    }

    /// Check the store-field invariant: every live clause's store matches
    /// the one container holding it. Used by tests at loop boundaries.
    pub fn check_store_invariant(&self) -> Result<(), String> {
        for (idx, slot) in self.slots.iter().enumerate() {
            let in_unprocessed = self.unprocessed.contains(&idx);
            let in_passive = self.passive.contains(&idx);
            let in_active = self.active.contains(&idx);
            let expected = match slot.store {
                StoreLocation::Unprocessed => (true, false, false),
                StoreLocation::Passive => (false, true, false),
                StoreLocation::Active => (false, false, true),
                StoreLocation::None | StoreLocation::Reduced => (false, false, false),
            };
            if (in_unprocessed, in_passive, in_active) != expected {
                return Err(format!(
                    "clause {} has store {:?} but membership (unprocessed={}, passive={}, active={})",
                    idx, slot.store, in_unprocessed, in_passive, in_active
                ));
            }
        }
        Ok(())
    }
}

impl Default for SaturationState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Inference traits
// =============================================================================

/// Trait for simplifying rules (tautology deletion, demodulation,
/// subsumption).
///
/// Rules are stateless; they read the saturation state and the
/// simplification indices at call time.
pub trait SimplifyingInference: Send + Sync {
    fn name(&self) -> &str;

    /// Forward simplification: try to delete or replace an unprocessed
    /// clause using the passive and active sets.
    fn simplify_forward(
        &self,
        clause_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        indices: &SimplifyingIndices,
    ) -> Option<StateChange>;

    /// Backward simplification: delete or replace passive/active clauses
    /// made redundant by this clause.
    fn simplify_backward(
        &self,
        _clause_idx: usize,
        _state: &SaturationState,
        _env: &mut Environment,
        _indices: &SimplifyingIndices,
    ) -> Vec<StateChange> {
        vec![]
    }
}

/// Trait for generating rules (resolution, superposition, factoring,
/// equality resolution/factoring, unit-resulting resolution).
pub trait GeneratingInference: Send + Sync {
    fn name(&self) -> &str;

    /// Generate inferences with the given clause against the active set.
    fn generate(
        &self,
        given_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        indices: &GeneratingIndices,
    ) -> Vec<StateChange>;
}
