//! satura: a saturation-based first-order proving core
//!
//! The crate implements the hard core of a refutation prover: perfectly
//! shared terms, a substitution-tree index with unifier, generalization,
//! and instance retrieval, the standard generating and simplifying rules
//! of the superposition calculus, and a given-clause saturation loop.
//!
//! Parsing, clausification, and proof printing are external collaborators;
//! clauses are built programmatically against the [`Interner`] and
//! [`TermBank`], and the outcome is a plain value carrying the derivation
//! log.

pub mod config;
pub mod generating;
pub mod index;
pub mod logic;
pub mod prover;
pub mod selection;
pub mod simplifying;
pub mod state;
pub mod unification;

// Re-export commonly used types
pub use config::{LiteralSelectionStrategy, PromotionThresholds, ProverConfig};
pub use logic::{
    Clause, ClauseRole, Environment, FunctionId, FunctionSymbol, Interner, Kbo, KboConfig,
    Literal, PredicateId, PredicateSymbol, SortId, TermBank, TermData, TermId, TermOrdering, Top,
    VariableId,
};
pub use index::{
    GeneratingIndices, LeafData, LiteralIndex, Retrieval, RetrievalMode, SimplifyingIndices,
    SubstitutionTree, TermIndex,
};
pub use prover::{saturate, Prover};
pub use selection::{
    AgeWeightSelector, ClauseSelector, LiteralSelector, SelectAll, SelectMaximal,
    SelectNegMaxWeightOrMaximal, SelectUniqueMaximalOrNegOrMaximal,
};
pub use state::{
    EventLog, ProofOutcome, ProofStep, SaturationState, StateChange, StoreLocation,
};
pub use unification::{
    match_onto, unify, unify_literals, Bank, BankedTerm, BindingStore, Renaming, Substitution,
    UnifyError, QUERY_BANK, RESULT_BANK,
};
