//! Equality orientation
//!
//! Equality literals are kept with the KBO-larger side on the left so
//! rewriting rules read their preferred direction off the argument order.

use crate::logic::core::clause::Clause;
use crate::logic::core::term::TermBank;
use crate::logic::interner::Interner;
use super::kbo::{Kbo, TermOrdering};

/// Swap equality arguments so the larger term (by KBO) comes first.
pub fn orient_clause_equalities(
    clause: &mut Clause,
    kbo: &Kbo,
    terms: &TermBank,
    interner: &Interner,
) {
    for literal in &mut clause.literals {
        if literal.is_equality(interner) && literal.args.len() == 2 {
            if let TermOrdering::Less = kbo.compare(literal.args[0], literal.args[1], terms) {
                literal.args.swap(0, 1);
            }
        }
    }
}
