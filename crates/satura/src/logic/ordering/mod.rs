pub mod kbo;
pub mod orient;

#[cfg(test)]
mod proptest_tests;

pub use kbo::{Kbo, KboConfig, TermOrdering};
pub use orient::orient_clause_equalities;
