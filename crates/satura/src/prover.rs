//! The given-clause saturation loop (Otter variant)
//!
//! Fresh clauses drain through forward simplification into the passive set
//! and the simplification indices; backward simplification retires clauses
//! they make redundant. When the fresh queue is empty, the configured
//! ratio selects a given clause, its literals are selected and indexed,
//! and the generating rules run against the active set. The empty clause
//! is detected when popped from the fresh queue and reported as an
//! ordinary outcome value.

use crate::config::{LiteralSelectionStrategy, ProverConfig};
use crate::logic::core::clause::{Clause, ClauseRole};
use crate::logic::core::term::TermBank;
use crate::logic::env::Environment;
use crate::logic::interner::Interner;
use crate::index::{GeneratingIndices, SimplifyingIndices};
use crate::selection::{
    AgeWeightSelector, ClauseSelector, SelectAll, SelectMaximal, SelectNegMaxWeightOrMaximal,
    SelectUniqueMaximalOrNegOrMaximal,
};
use crate::simplifying::{DemodulationRule, SubsumptionRule, TautologyRule};
use crate::generating::{
    EqualityFactoringRule, EqualityResolutionRule, FactoringRule, ResolutionRule,
    SuperpositionRule, UrResolutionRule,
};
use crate::state::{
    ClauseSlot, GeneratingInference, ProofOutcome, ProofStep, SaturationState,
    SimplifyingInference, StateChange, StoreLocation,
};
use log::{debug, trace};
use std::sync::Arc;
use std::time::Instant;

/// Per-problem saturation engine.
pub struct Prover {
    pub config: ProverConfig,
    /// Interner, term bank, ordering, and literal selection
    pub env: Environment,
    /// Clause slots, containers, and the event log
    pub state: SaturationState,
    simplifying: Vec<Box<dyn SimplifyingInference>>,
    generating: Vec<Box<dyn GeneratingInference>>,
    gen_indices: GeneratingIndices,
    simp_indices: SimplifyingIndices,
    clause_selector: Box<dyn ClauseSelector>,
    start_time: Option<Instant>,
    /// RSS at construction; the memory limit bounds growth over this
    baseline_rss_mb: usize,
    initial_clauses: Vec<Clause>,
}

impl Prover {
    pub fn new(
        initial_clauses: Vec<Clause>,
        config: ProverConfig,
        interner: Interner,
        terms: TermBank,
    ) -> Self {
        let literal_selector: Box<dyn crate::selection::LiteralSelector> =
            match config.literal_selection {
                LiteralSelectionStrategy::Sel0 => Box::new(SelectAll),
                LiteralSelectionStrategy::Sel20 => Box::new(SelectMaximal),
                LiteralSelectionStrategy::Sel21 => Box::new(SelectUniqueMaximalOrNegOrMaximal),
                LiteralSelectionStrategy::Sel22 => Box::new(SelectNegMaxWeightOrMaximal),
            };

        let mut env = Environment::new(interner, terms, literal_selector);
        if config.unification_with_abstraction {
            env.abstraction = Some(env.interner.theory_functions());
        }

        let simplifying: Vec<Box<dyn SimplifyingInference>> = vec![
            Box::new(TautologyRule::new()),
            Box::new(DemodulationRule::new()),
            Box::new(SubsumptionRule::new()),
        ];
        let generating: Vec<Box<dyn GeneratingInference>> = vec![
            Box::new(FactoringRule::new()),
            Box::new(EqualityResolutionRule::new()),
            Box::new(EqualityFactoringRule::new()),
            Box::new(ResolutionRule::new()),
            Box::new(SuperpositionRule::new()),
            Box::new(UrResolutionRule::new()),
        ];

        let thresholds = config.promotion_thresholds;
        let mut state = SaturationState::new();
        state.initial_clause_count = initial_clauses.len();

        Prover {
            clause_selector: Box::new(AgeWeightSelector::new(config.age_weight_ratio)),
            gen_indices: GeneratingIndices::new(thresholds.leaf, thresholds.internal),
            simp_indices: SimplifyingIndices::new(thresholds.leaf, thresholds.internal),
            config,
            env,
            state,
            simplifying,
            generating,
            start_time: None,
            baseline_rss_mb: crate::config::process_memory_mb().unwrap_or(0),
            initial_clauses,
        }
    }

    /// Run saturation to completion.
    pub fn prove(&mut self) -> ProofOutcome {
        self.start_time = Some(Instant::now());
        if let Some(outcome) = self.init() {
            return outcome;
        }
        loop {
            if let Some(outcome) = self.step() {
                debug!("saturation finished: {:?}", outcome);
                return outcome;
            }
        }
    }

    /// Feed the input clauses into the fresh queue.
    ///
    /// Called once by `prove`; public so a driver can step the loop
    /// manually. Returns early when an input already exhausts a limit.
    pub fn init(&mut self) -> Option<ProofOutcome> {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        let initial = std::mem::take(&mut self.initial_clauses);
        for mut clause in initial {
            self.env.orient_equalities(&mut clause);
            if let Some(outcome) =
                self.apply_change(StateChange::Add(Arc::new(clause), "Input".into(), vec![]))
            {
                return Some(outcome);
            }
        }
        None
    }

    /// One iteration of the loop: drain the fresh queue, then select and
    /// activate one given clause. Returns the outcome when the run ends.
    pub fn step(&mut self) -> Option<ProofOutcome> {
        // === Drain the fresh queue ===
        'drain: while let Some(&clause_idx) = self.state.unprocessed.last() {
            if self.state.clause(clause_idx).is_empty() {
                self.state.unprocessed.pop();
                self.state.slots[clause_idx].store = StoreLocation::None;
                return Some(ProofOutcome::Refutation {
                    empty_clause_idx: clause_idx,
                });
            }

            // Forward simplification: first applicable rule wins
            let simplifying = std::mem::take(&mut self.simplifying);
            let mut forward = None;
            for rule in &simplifying {
                forward = rule.simplify_forward(
                    clause_idx,
                    &self.state,
                    &mut self.env,
                    &self.simp_indices,
                );
                if forward.is_some() {
                    trace!("forward {} on clause {}", rule.name(), clause_idx);
                    break;
                }
            }
            self.simplifying = simplifying;

            if let Some(change) = forward {
                if let Some(outcome) = self.apply_change(change) {
                    return Some(outcome);
                }
                continue 'drain;
            }

            // Into the passive set and the simplification indices
            if let Some(outcome) = self.apply_change(StateChange::Transfer(clause_idx)) {
                return Some(outcome);
            }

            // Backward simplification against passive and active clauses
            let simplifying = std::mem::take(&mut self.simplifying);
            let mut backward = Vec::new();
            for rule in &simplifying {
                backward.extend(rule.simplify_backward(
                    clause_idx,
                    &self.state,
                    &mut self.env,
                    &self.simp_indices,
                ));
            }
            self.simplifying = simplifying;

            for change in backward {
                if let Some(outcome) = self.apply_change(change) {
                    return Some(outcome);
                }
            }

            if self.deadline_reached() {
                return Some(ProofOutcome::Timeout);
            }
            if self.memory_exceeded() {
                return Some(ProofOutcome::ResourceLimit);
            }
        }

        // === Saturation check ===
        if self.state.passive.is_empty() {
            return Some(ProofOutcome::Satisfiable);
        }

        if self.deadline_reached() {
            return Some(ProofOutcome::Timeout);
        }
        if self.memory_exceeded() {
            return Some(ProofOutcome::ResourceLimit);
        }

        // === Given-clause selection ===
        let given_idx = self
            .clause_selector
            .select()
            .expect("selector view out of sync with the passive set");
        debug!(
            "given clause {}: {}",
            given_idx,
            self.state
                .clause(given_idx)
                .display(&self.env.terms, &self.env.interner)
        );

        if let Some(outcome) = self.apply_change(StateChange::Activate(given_idx)) {
            return Some(outcome);
        }

        // === Generating inferences ===
        let generating = std::mem::take(&mut self.generating);
        let mut changes = Vec::new();
        for rule in &generating {
            let produced = rule.generate(given_idx, &self.state, &mut self.env, &self.gen_indices);
            if !produced.is_empty() {
                trace!("{} produced {} clauses", rule.name(), produced.len());
            }
            changes.extend(produced);
        }
        self.generating = generating;

        for change in changes {
            if let Some(outcome) = self.apply_change(change) {
                return Some(outcome);
            }
        }

        None
    }

    fn deadline_reached(&self) -> bool {
        match self.start_time {
            Some(start) => start.elapsed() > self.config.timeout,
            None => false,
        }
    }

    /// Whether RSS growth over the construction baseline exceeds the
    /// configured memory limit. Always false where RSS is unavailable.
    fn memory_exceeded(&self) -> bool {
        match (self.config.memory_limit_mb, crate::config::process_memory_mb()) {
            (Some(limit_mb), Some(rss)) => rss.saturating_sub(self.baseline_rss_mb) >= limit_mb,
            _ => false,
        }
    }

    /// Apply one state change: update containers, stores, indices, the
    /// selector view, and the event log. Returns an outcome when a
    /// resource limit is hit.
    fn apply_change(&mut self, change: StateChange) -> Option<ProofOutcome> {
        match change {
            StateChange::Add(arc_clause, rule_name, premises) => {
                self.add_clause(arc_clause, rule_name, premises)
            }
            StateChange::Simplify(clause_idx, replacement, rule_name, premises) => {
                match self.state.slots[clause_idx].store {
                    StoreLocation::Unprocessed => {
                        if self.state.unprocessed.last() == Some(&clause_idx) {
                            self.state.unprocessed.pop();
                        } else if let Some(pos) =
                            self.state.unprocessed.iter().position(|&i| i == clause_idx)
                        {
                            self.state.unprocessed.remove(pos);
                        }
                        self.state.slots[clause_idx].store = StoreLocation::None;
                    }
                    StoreLocation::Passive => {
                        self.state.passive.shift_remove(&clause_idx);
                        let clause = Arc::clone(self.state.clause(clause_idx));
                        self.simp_indices
                            .remove_clause(clause_idx, &clause, &mut self.env);
                        self.clause_selector.on_remove(clause_idx);
                        let slot = &mut self.state.slots[clause_idx];
                        slot.store = StoreLocation::Reduced;
                        slot.timestamp += 1;
                    }
                    StoreLocation::Active => {
                        self.state.active.shift_remove(&clause_idx);
                        let clause = Arc::clone(self.state.clause(clause_idx));
                        self.simp_indices
                            .remove_clause(clause_idx, &clause, &mut self.env);
                        let selected = self.state.selected(clause_idx).to_vec();
                        self.gen_indices
                            .remove_clause(clause_idx, &clause, &selected, &mut self.env);
                        let slot = &mut self.state.slots[clause_idx];
                        slot.store = StoreLocation::Reduced;
                        slot.timestamp += 1;
                    }
                    // Already gone: a stale simplification from the same
                    // backward pass. Drop it, replacement included.
                    StoreLocation::None | StoreLocation::Reduced => return None,
                }

                match replacement {
                    Some(repl) => self.add_replacement(clause_idx, repl, rule_name, premises),
                    None => {
                        self.state
                            .event_log
                            .push(StateChange::Simplify(clause_idx, None, rule_name, premises));
                        None
                    }
                }
            }
            StateChange::Transfer(clause_idx) => {
                debug_assert_eq!(self.state.unprocessed.last(), Some(&clause_idx));
                self.state.unprocessed.pop();
                self.state.passive.insert(clause_idx);
                self.state.slots[clause_idx].store = StoreLocation::Passive;

                let clause = Arc::clone(self.state.clause(clause_idx));
                self.simp_indices
                    .insert_clause(clause_idx, &clause, &mut self.env);
                self.clause_selector.on_transfer(clause_idx, &clause);
                self.state.event_log.push(StateChange::Transfer(clause_idx));
                None
            }
            StateChange::Activate(clause_idx) => {
                self.state.passive.shift_remove(&clause_idx);
                self.state.active.insert(clause_idx);

                let clause = Arc::clone(self.state.clause(clause_idx));
                let selected = self.env.select_literals(&clause);
                self.gen_indices
                    .insert_clause(clause_idx, &clause, &selected, &mut self.env);
                let slot = &mut self.state.slots[clause_idx];
                slot.store = StoreLocation::Active;
                slot.selected = Some(selected.into_boxed_slice());

                self.state.event_log.push(StateChange::Activate(clause_idx));
                self.state.current_iteration += 1;

                if self.config.max_iterations > 0
                    && self.state.current_iteration >= self.config.max_iterations
                {
                    return Some(ProofOutcome::ResourceLimit);
                }
                None
            }
        }
    }

    /// Append a derived or input clause to the fresh queue.
    fn add_clause(
        &mut self,
        mut arc_clause: Arc<Clause>,
        rule_name: String,
        premises: Vec<usize>,
    ) -> Option<ProofOutcome> {
        if arc_clause.literals.len() > self.config.max_clause_size {
            return None;
        }

        let new_idx = self.state.slots.len();
        {
            // Refcount is 1 here: the clause was just created by its rule.
            let clause = Arc::get_mut(&mut arc_clause)
                .expect("clause must be freshly allocated when added");
            clause.id = Some(new_idx);
            if rule_name != "Input" {
                clause.age = self.state.current_iteration;
                clause.role = ClauseRole::Derived;
            }
        }

        self.state.slots.push(ClauseSlot {
            clause: Arc::clone(&arc_clause),
            store: StoreLocation::Unprocessed,
            selected: None,
            timestamp: 0,
        });
        self.state.unprocessed.push(new_idx);
        self.state
            .event_log
            .push(StateChange::Add(arc_clause, rule_name, premises));

        if self.config.max_clauses > 0 && self.state.slots.len() >= self.config.max_clauses {
            return Some(ProofOutcome::ResourceLimit);
        }
        None
    }

    /// Append a simplification replacement, logging the Simplify event.
    fn add_replacement(
        &mut self,
        simplified_idx: usize,
        mut repl: Arc<Clause>,
        rule_name: String,
        premises: Vec<usize>,
    ) -> Option<ProofOutcome> {
        if repl.literals.len() > self.config.max_clause_size {
            self.state.event_log.push(StateChange::Simplify(
                simplified_idx,
                Some(repl),
                rule_name,
                premises,
            ));
            return None;
        }

        let new_idx = self.state.slots.len();
        {
            // Refcount is 1: the replacement was just built by its rule.
            let clause =
                Arc::get_mut(&mut repl).expect("replacement must be freshly allocated");
            clause.id = Some(new_idx);
            clause.age = self.state.current_iteration;
            clause.role = ClauseRole::Derived;
        }

        self.state.slots.push(ClauseSlot {
            clause: Arc::clone(&repl),
            store: StoreLocation::Unprocessed,
            selected: None,
            timestamp: 0,
        });
        self.state.unprocessed.push(new_idx);
        self.state.event_log.push(StateChange::Simplify(
            simplified_idx,
            Some(repl),
            rule_name,
            premises,
        ));

        if self.config.max_clauses > 0 && self.state.slots.len() >= self.config.max_clauses {
            return Some(ProofOutcome::ResourceLimit);
        }
        None
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn interner(&self) -> &Interner {
        &self.env.interner
    }

    pub fn terms(&self) -> &TermBank {
        &self.env.terms
    }

    pub fn event_log(&self) -> &[StateChange] {
        &self.state.event_log
    }

    /// Extract the derivation of a clause by backward traversal.
    pub fn extract_proof(&self, clause_idx: usize) -> Vec<ProofStep> {
        self.state.extract_proof(clause_idx)
    }
}

/// Run saturation on a clause set, returning the prover with all state
/// intact for proof extraction.
pub fn saturate(
    clauses: Vec<Clause>,
    config: ProverConfig,
    interner: Interner,
    terms: TermBank,
) -> (ProofOutcome, Prover) {
    let mut prover = Prover::new(clauses, config, interner, terms);
    let outcome = prover.prove();
    (outcome, prover)
}
