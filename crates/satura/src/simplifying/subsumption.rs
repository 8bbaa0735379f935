//! Subsumption and subsumption resolution
//!
//! A clause C subsumes D when some substitution σ maps C's literals
//! injectively onto literals of D. Subsumption resolution additionally
//! cuts one literal of D whose complement is covered by C.
//!
//! Matching uses a flat trail-backed substitution indexed by variable id;
//! bindings are undone by mark/backtrack during the literal-mapping search.

use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::core::term::{TermBank, TermData, TermId};
use crate::logic::env::Environment;
use crate::logic::interner::VariableId;
use crate::index::SimplifyingIndices;
use crate::state::{SaturationState, SimplifyingInference, StateChange, StoreLocation};
use std::sync::Arc;

// =============================================================================
// Flat trail-backed matching substitution
// =============================================================================

/// Bindings indexed by `VariableId`; O(1) bind/get and O(trail) backtrack.
struct MatchSubst {
    bindings: Vec<Option<TermId>>,
    trail: Vec<u32>,
}

impl MatchSubst {
    fn new(max_var_id: u32) -> Self {
        MatchSubst {
            bindings: vec![None; max_var_id as usize + 1],
            trail: Vec::new(),
        }
    }

    #[inline]
    fn get(&self, var: VariableId) -> Option<TermId> {
        self.bindings.get(var.as_u32() as usize).copied().flatten()
    }

    #[inline]
    fn bind(&mut self, var: VariableId, term: TermId) {
        let idx = var.as_u32();
        self.bindings[idx as usize] = Some(term);
        self.trail.push(idx);
    }

    #[inline]
    fn mark(&self) -> usize {
        self.trail.len()
    }

    #[inline]
    fn backtrack(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let idx = self.trail.pop().unwrap();
            self.bindings[idx as usize] = None;
        }
    }
}

fn max_var_id(clause: &Clause, terms: &TermBank) -> u32 {
    let mut max_id = 0;
    for lit in &clause.literals {
        for &arg in &lit.args {
            for v in terms.vars(arg) {
                max_id = max_id.max(v.as_u32());
            }
        }
    }
    max_id
}

/// Match a subsumer term against a target term; only subsumer variables
/// bind.
fn match_terms(pattern: TermId, target: TermId, subst: &mut MatchSubst, terms: &TermBank) -> bool {
    match terms.data(pattern) {
        TermData::Var(v) => match subst.get(*v) {
            Some(bound) => bound == target,
            None => {
                subst.bind(*v, target);
                true
            }
        },
        TermData::Special(_) => false,
        TermData::App { functor: pf, args: pargs } => match terms.data(target) {
            TermData::App { functor: tf, args: targs } if pf == tf => {
                let pargs: Vec<TermId> = pargs.to_vec();
                let targs: Vec<TermId> = targs.to_vec();
                pargs
                    .into_iter()
                    .zip(targs)
                    .all(|(p, t)| match_terms(p, t, subst, terms))
            }
            _ => false,
        },
    }
}

fn match_literals(
    pattern: &Literal,
    target: &Literal,
    same_polarity: bool,
    subst: &mut MatchSubst,
    terms: &TermBank,
) -> bool {
    if pattern.predicate != target.predicate
        || (pattern.polarity == target.polarity) != same_polarity
        || pattern.sort != target.sort
    {
        return false;
    }
    pattern
        .args
        .iter()
        .zip(target.args.iter())
        .all(|(&p, &t)| match_terms(p, t, subst, terms))
}

/// Backtracking search for an injective literal mapping of the subsumer
/// into the subsumee.
fn find_mapping(
    subsumer: &Clause,
    subsumee: &Clause,
    lit_idx: usize,
    subst: &mut MatchSubst,
    used: &mut [bool],
    terms: &TermBank,
) -> bool {
    if lit_idx >= subsumer.literals.len() {
        return true;
    }
    let pattern = &subsumer.literals[lit_idx];
    for (i, target) in subsumee.literals.iter().enumerate() {
        if used[i] {
            continue;
        }
        let mark = subst.mark();
        if match_literals(pattern, target, true, subst, terms) {
            used[i] = true;
            if find_mapping(subsumer, subsumee, lit_idx + 1, subst, used, terms) {
                return true;
            }
            used[i] = false;
        }
        subst.backtrack(mark);
    }
    false
}

/// Full subsumption check: does `subsumer` subsume `subsumee`?
pub fn subsumes(subsumer: &Clause, subsumee: &Clause, terms: &TermBank) -> bool {
    if subsumer.literals.is_empty()
        || subsumer.literals.len() > subsumee.literals.len()
        || subsumer.weight > subsumee.weight
    {
        return false;
    }
    let mut subst = MatchSubst::new(max_var_id(subsumer, terms));
    let mut used = vec![false; subsumee.literals.len()];
    find_mapping(subsumer, subsumee, 0, &mut subst, &mut used, terms)
}

/// Subsumption resolution: find a literal of `target` whose complement is
/// matched by one literal of `subsumer` while the remaining subsumer
/// literals map injectively into the rest of `target`. Returns the index
/// of the cut literal.
pub fn subsumption_resolution(
    subsumer: &Clause,
    target: &Clause,
    terms: &TermBank,
) -> Option<usize> {
    if subsumer.literals.is_empty() || subsumer.literals.len() > target.literals.len() {
        return None;
    }
    for cut in 0..target.literals.len() {
        for pivot in 0..subsumer.literals.len() {
            let mut subst = MatchSubst::new(max_var_id(subsumer, terms));
            let mark = subst.mark();
            if !match_literals(
                &subsumer.literals[pivot],
                &target.literals[cut],
                false,
                &mut subst,
                terms,
            ) {
                subst.backtrack(mark);
                continue;
            }

            // Remaining subsumer literals must map into the rest
            let rest = Clause {
                literals: subsumer
                    .literals
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != pivot)
                    .map(|(_, l)| l.clone())
                    .collect(),
                id: None,
                role: subsumer.role,
                age: subsumer.age,
                weight: subsumer.weight,
            };
            let mut used = vec![false; target.literals.len()];
            used[cut] = true;
            if find_mapping(&rest, target, 0, &mut subst, &mut used, terms) {
                return Some(cut);
            }
        }
    }
    None
}

// =============================================================================
// Rule adapter
// =============================================================================

/// Forward/backward subsumption plus forward subsumption resolution over
/// the passive and active sets.
pub struct SubsumptionRule;

impl SubsumptionRule {
    pub fn new() -> Self {
        SubsumptionRule
    }
}

impl Default for SubsumptionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SimplifyingInference for SubsumptionRule {
    fn name(&self) -> &str {
        "Subsumption"
    }

    fn simplify_forward(
        &self,
        clause_idx: usize,
        state: &SaturationState,
        env: &mut Environment,
        _indices: &SimplifyingIndices,
    ) -> Option<StateChange> {
        let clause = state.clause(clause_idx);
        for &other_idx in state.passive.iter().chain(state.active.iter()) {
            if other_idx == clause_idx {
                continue;
            }
            let other = state.clause(other_idx);
            if subsumes(other, clause, &env.terms) {
                return Some(StateChange::Simplify(
                    clause_idx,
                    None,
                    self.name().into(),
                    vec![other_idx],
                ));
            }
            if let Some(cut) = subsumption_resolution(other, clause, &env.terms) {
                let literals = clause
                    .literals
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != cut)
                    .map(|(_, l)| l.clone())
                    .collect();
                let replacement = Clause::new(literals, &env.terms);
                return Some(StateChange::Simplify(
                    clause_idx,
                    Some(Arc::new(replacement)),
                    "SubsumptionResolution".into(),
                    vec![clause_idx, other_idx],
                ));
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
        let clause = state.clause(clause_idx);
        let mut changes = Vec::new();
        for &other_idx in state.passive.iter().chain(state.active.iter()) {
            if other_idx == clause_idx {
                continue;
            }
            let slot = &state.slots[other_idx];
            if !matches!(slot.store, StoreLocation::Passive | StoreLocation::Active) {
                continue;
            }
            if subsumes(clause, state.clause(other_idx), &env.terms) {
                changes.push(StateChange::Simplify(
                    other_idx,
                    None,
                    self.name().into(),
                    vec![clause_idx],
                ));
            }
        }
        changes
    }
}
