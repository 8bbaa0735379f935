//! Literals over shared terms

use crate::logic::interner::{Interner, PredicateId, SortId};
use crate::logic::core::term::{TermBank, TermId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A predicate symbol with arity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredicateSymbol {
    pub id: PredicateId,
    pub arity: u8,
}

impl PredicateSymbol {
    pub fn new(id: PredicateId, arity: u8) -> Self {
        PredicateSymbol { id, arity }
    }

    pub fn name<'a>(&self, interner: &'a Interner) -> &'a str {
        interner.resolve_predicate(self.id)
    }
}

/// A literal: predicate application or its negation.
///
/// Equality literals additionally carry the sort of their sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub predicate: PredicateSymbol,
    pub args: Vec<TermId>,
    pub polarity: bool, // true = positive, false = negative
    /// Sort of the equality's sides; None for non-equality literals
    pub sort: Option<SortId>,
}

impl Literal {
    /// Create a new positive literal
    pub fn positive(predicate: PredicateSymbol, args: Vec<TermId>) -> Self {
        Literal {
            predicate,
            args,
            polarity: true,
            sort: None,
        }
    }

    /// Create a new negative literal
    pub fn negative(predicate: PredicateSymbol, args: Vec<TermId>) -> Self {
        Literal {
            predicate,
            args,
            polarity: false,
            sort: None,
        }
    }

    /// Create an equality literal of the given polarity and sort
    pub fn equality(
        interner: &Interner,
        lhs: TermId,
        rhs: TermId,
        polarity: bool,
        sort: SortId,
    ) -> Self {
        Literal {
            predicate: PredicateSymbol::new(interner.equality(), 2),
            args: vec![lhs, rhs],
            polarity,
            sort: Some(sort),
        }
    }

    /// Check if this is an equality literal
    pub fn is_equality(&self, interner: &Interner) -> bool {
        self.predicate.id == interner.equality() && self.predicate.arity == 2
    }

    /// Get the complement of this literal
    pub fn complement(&self) -> Literal {
        Literal {
            predicate: self.predicate,
            args: self.args.clone(),
            polarity: !self.polarity,
            sort: self.sort,
        }
    }

    /// Symbol count: predicate symbol plus argument weights
    pub fn weight(&self, terms: &TermBank) -> u32 {
        1 + self.args.iter().map(|&a| terms.weight(a)).sum::<u32>()
    }

    /// Whether the literal contains no variables
    pub fn is_ground(&self, terms: &TermBank) -> bool {
        self.args.iter().all(|&a| terms.is_ground(a))
    }

    /// Format this literal with an interner and term bank for resolution
    pub fn display<'a>(&'a self, terms: &'a TermBank, interner: &'a Interner) -> LiteralDisplay<'a> {
        LiteralDisplay {
            literal: self,
            terms,
            interner,
        }
    }
}

/// Display wrapper for Literal
pub struct LiteralDisplay<'a> {
    literal: &'a Literal,
    terms: &'a TermBank,
    interner: &'a Interner,
}

impl<'a> fmt::Display for LiteralDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pred_name = self.interner.resolve_predicate(self.literal.predicate.id);
        if pred_name == "=" && self.literal.args.len() == 2 {
            write!(
                f,
                "{} {} {}",
                self.terms.display(self.literal.args[0], self.interner),
                if self.literal.polarity { "=" } else { "!=" },
                self.terms.display(self.literal.args[1], self.interner)
            )
        } else {
            if !self.literal.polarity {
                write!(f, "~")?;
            }
            write!(f, "{}", pred_name)?;
            if !self.literal.args.is_empty() {
                write!(f, "(")?;
                for (i, &arg) in self.literal.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", self.terms.display(arg, self.interner))?;
                }
                write!(f, ")")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::term::FunctionSymbol;

    #[test]
    fn test_equality_literal() {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let a = terms.constant(FunctionSymbol::new(interner.intern_function("a", 0), 0));
        let b = terms.constant(FunctionSymbol::new(interner.intern_function("b", 0), 0));

        let sort = interner.individual_sort();
        let eq = Literal::equality(&interner, a, b, true, sort);
        assert!(eq.is_equality(&interner));
        assert_eq!(eq.sort, Some(sort));
        assert_eq!(eq.weight(&terms), 3);

        let neq = eq.complement();
        assert!(!neq.polarity);
        assert_eq!(neq.sort, Some(sort));
    }

    #[test]
    fn test_literal_display() {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let p = PredicateSymbol::new(interner.intern_predicate("p", 1), 1);
        let x = terms.var(interner.intern_variable("X"));

        let lit = Literal::negative(p, vec![x]);
        assert_eq!(format!("{}", lit.display(&terms, &interner)), "~p(X)");
    }
}
