//! Clause and literal selection strategies

pub mod clause;
pub mod literal;

pub use clause::{AgeWeightSelector, ClauseSelector};
pub use literal::{
    LiteralSelector, SelectAll, SelectMaximal, SelectNegMaxWeightOrMaximal,
    SelectUniqueMaximalOrNegOrMaximal,
};
