//! First-order logic representation: symbols, shared terms, literals,
//! clauses, and the term ordering.

pub mod core;
pub mod env;
pub mod interner;
pub mod ordering;

// Re-export commonly used types
pub use core::clause::{Clause, ClauseDisplay, ClauseRole};
pub use core::literal::{Literal, LiteralDisplay, PredicateSymbol};
pub use core::term::{FunctionSymbol, TermBank, TermData, TermDisplay, TermId, Top};
pub use env::Environment;
pub use interner::{FunctionId, Interner, PredicateId, SortId, VariableId};
pub use ordering::{orient_clause_equalities, Kbo, KboConfig, TermOrdering};
