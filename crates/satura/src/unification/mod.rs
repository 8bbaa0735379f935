//! Unification and matching: the banked backtrackable working substitution
//! used by index retrieval, and plain single-namespace MGU computation for
//! intra-clause rules.

pub mod mgu;
pub mod substitution;

#[cfg(test)]
mod proptest_tests;

pub use mgu::{match_onto, unify, unify_literals, Substitution};
pub use substitution::{
    Bank, BankedTerm, BindingStore, Deref, Renaming, UnifyError, VarKey, QUERY_BANK, RESULT_BANK,
};
