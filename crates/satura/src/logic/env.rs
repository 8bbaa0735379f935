//! The environment handle threaded through the loop and components
//!
//! Bundles the symbol interner, the shared-term bank, the term ordering,
//! and the literal selection strategy. Passed explicitly everywhere;
//! nothing here is module-level state.

use crate::logic::core::clause::Clause;
use crate::logic::core::term::TermBank;
use crate::logic::interner::{FunctionId, Interner};
use crate::logic::ordering::{orient_clause_equalities, Kbo, KboConfig};
use crate::selection::LiteralSelector;
use crate::unification::substitution::BindingStore;
use std::collections::HashSet;

pub struct Environment {
    /// Symbol interner and signature table
    pub interner: Interner,
    /// Shared-term arena
    pub terms: TermBank,
    /// Term ordering for equality orientation and inference constraints
    pub ordering: Kbo,
    /// Literal selection strategy
    pub literal_selector: Box<dyn LiteralSelector>,
    /// Theory symbols for unification with abstraction; None when the
    /// option is off
    pub abstraction: Option<HashSet<FunctionId>>,
}

impl Environment {
    pub fn new(
        interner: Interner,
        terms: TermBank,
        literal_selector: Box<dyn LiteralSelector>,
    ) -> Self {
        Environment {
            interner,
            terms,
            ordering: Kbo::new(KboConfig::default()),
            literal_selector,
            abstraction: None,
        }
    }

    /// A fresh working substitution honoring the abstraction option
    pub fn fresh_store(&self) -> BindingStore {
        match &self.abstraction {
            Some(symbols) => BindingStore::with_abstraction(symbols.clone()),
            None => BindingStore::new(),
        }
    }

    /// Orient equality literals so the larger side (by KBO) is on the left
    pub fn orient_equalities(&self, clause: &mut Clause) {
        orient_clause_equalities(clause, &self.ordering, &self.terms, &self.interner);
    }

    /// Run the configured literal selection on a clause.
    ///
    /// Returns the sorted indices of the selected literals.
    pub fn select_literals(&self, clause: &Clause) -> Vec<usize> {
        self.literal_selector
            .select(clause, &self.terms, &self.ordering)
    }
}
