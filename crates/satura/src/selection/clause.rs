//! Given-clause selection
//!
//! The selector keeps its own view of the passive set, updated by loop
//! signals, and hands out the next given clause. The age-weight ratio
//! alternates deterministically between picking the oldest clause and the
//! lightest clause; ties break by weight, then age, then clause id, so a
//! run is reproducible.

use crate::logic::core::clause::Clause;
use indexmap::IndexMap;

/// Trait for given-clause selection strategies
pub trait ClauseSelector: Send + Sync {
    /// A clause entered the passive set
    fn on_transfer(&mut self, idx: usize, clause: &Clause);

    /// A clause left the passive set without being selected
    fn on_remove(&mut self, idx: usize);

    /// Pick and remove the next given clause
    fn select(&mut self) -> Option<usize>;

    fn name(&self) -> &str;
}

/// Deterministic age-weight ratio selection.
///
/// With ratio `(a, w)`, out of every `a + w` picks `a` take the oldest
/// passive clause and `w` take the lightest.
pub struct AgeWeightSelector {
    ratio: (u32, u32),
    counter: u32,
    /// Passive view: clause idx → (weight, age)
    passive: IndexMap<usize, (u32, usize)>,
}

impl AgeWeightSelector {
    pub fn new(ratio: (u32, u32)) -> Self {
        assert!(
            ratio.0 > 0 || ratio.1 > 0,
            "age-weight ratio must have a positive component"
        );
        AgeWeightSelector {
            ratio,
            counter: 0,
            passive: IndexMap::new(),
        }
    }

    fn pick_by_age(&self) -> Option<usize> {
        self.passive
            .iter()
            .min_by_key(|(&idx, &(_, age))| (age, idx))
            .map(|(&idx, _)| idx)
    }

    fn pick_by_weight(&self) -> Option<usize> {
        self.passive
            .iter()
            .min_by_key(|(&idx, &(weight, age))| (weight, age, idx))
            .map(|(&idx, _)| idx)
    }
}

impl ClauseSelector for AgeWeightSelector {
    fn on_transfer(&mut self, idx: usize, clause: &Clause) {
        self.passive.insert(idx, (clause.weight, clause.age));
    }

    fn on_remove(&mut self, idx: usize) {
        self.passive.shift_remove(&idx);
    }

    fn select(&mut self) -> Option<usize> {
        if self.passive.is_empty() {
            return None;
        }
        let (a, w) = self.ratio;
        let by_age = if a == 0 {
            false
        } else if w == 0 {
            true
        } else {
            self.counter < a
        };
        self.counter = (self.counter + 1) % (a + w);

        let idx = if by_age {
            self.pick_by_age()
        } else {
            self.pick_by_weight()
        }?;
        self.passive.shift_remove(&idx);
        Some(idx)
    }

    fn name(&self) -> &str {
        "AgeWeight"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::literal::{Literal, PredicateSymbol};
    use crate::logic::core::term::{FunctionSymbol, TermBank};
    use crate::logic::interner::Interner;

    fn clause_with(weight_boost: usize, age: usize) -> (Clause, TermBank, Interner) {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let p = PredicateSymbol::new(interner.intern_predicate("p", 1), 1);
        let f = FunctionSymbol::new(interner.intern_function("f", 1), 1);
        let mut t = terms.constant(FunctionSymbol::new(interner.intern_function("a", 0), 0));
        for _ in 0..weight_boost {
            t = terms.app(f, vec![t]);
        }
        let mut clause = Clause::new(vec![Literal::positive(p, vec![t])], &terms);
        clause.age = age;
        (clause, terms, interner)
    }

    #[test]
    fn test_ratio_alternation() {
        // Ratio 1:1 alternates age pick, weight pick, age pick, ...
        let mut sel = AgeWeightSelector::new((1, 1));

        // Clause 0: old and heavy; clause 1: young and light; clause 2 medium
        let (c0, _, _) = clause_with(5, 0);
        let (c1, _, _) = clause_with(0, 2);
        let (c2, _, _) = clause_with(2, 1);
        sel.on_transfer(0, &c0);
        sel.on_transfer(1, &c1);
        sel.on_transfer(2, &c2);

        // Age turn: oldest is clause 0
        assert_eq!(sel.select(), Some(0));
        // Weight turn: lightest is clause 1
        assert_eq!(sel.select(), Some(1));
        // Age turn again
        assert_eq!(sel.select(), Some(2));
        assert_eq!(sel.select(), None);
    }

    #[test]
    fn test_weight_only_ratio() {
        let mut sel = AgeWeightSelector::new((0, 1));
        let (heavy, _, _) = clause_with(5, 0);
        let (light, _, _) = clause_with(0, 9);
        sel.on_transfer(0, &heavy);
        sel.on_transfer(1, &light);
        assert_eq!(sel.select(), Some(1));
        assert_eq!(sel.select(), Some(0));
    }

    #[test]
    fn test_removal_hides_clause() {
        let mut sel = AgeWeightSelector::new((1, 0));
        let (c0, _, _) = clause_with(0, 0);
        let (c1, _, _) = clause_with(0, 1);
        sel.on_transfer(0, &c0);
        sel.on_transfer(1, &c1);
        sel.on_remove(0);
        assert_eq!(sel.select(), Some(1));
        assert_eq!(sel.select(), None);
    }

    #[test]
    fn test_tie_breaking_is_stable() {
        let mut sel = AgeWeightSelector::new((0, 1));
        let (c0, _, _) = clause_with(1, 0);
        let (c1, _, _) = clause_with(1, 0);
        sel.on_transfer(7, &c0);
        sel.on_transfer(3, &c1);
        // Equal weight and age: the smaller clause id wins
        assert_eq!(sel.select(), Some(3));
        assert_eq!(sel.select(), Some(7));
    }
}
