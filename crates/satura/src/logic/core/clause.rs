//! Clauses: unordered multisets of literals

use crate::logic::interner::Interner;
use crate::logic::core::literal::Literal;
use crate::logic::core::term::TermBank;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a clause in the input problem (or derived)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClauseRole {
    /// Axiom from the problem
    #[default]
    Axiom,
    /// Hypothesis
    Hypothesis,
    /// Negated conjecture (goal)
    NegatedConjecture,
    /// Derived clause (from inference)
    Derived,
}

impl ClauseRole {
    /// Check if this is a goal clause (negated conjecture)
    pub fn is_goal(&self) -> bool {
        matches!(self, ClauseRole::NegatedConjecture)
    }
}

/// A clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub literals: Vec<Literal>,
    pub id: Option<usize>,
    /// Role of the clause (axiom, hypothesis, negated conjecture, derived)
    pub role: ClauseRole,
    /// Age: iteration at which the clause was created, 0 for input clauses
    pub age: usize,
    /// Cached symbol count (sum of literal weights)
    pub weight: u32,
}

impl Clause {
    /// Create a new clause from literals, caching its weight
    pub fn new(literals: Vec<Literal>, terms: &TermBank) -> Self {
        let weight = literals.iter().map(|lit| lit.weight(terms)).sum();
        Clause {
            literals,
            id: None,
            role: ClauseRole::default(),
            age: 0,
            weight,
        }
    }

    /// Create a new clause with a specific role
    pub fn with_role(literals: Vec<Literal>, role: ClauseRole, terms: &TermBank) -> Self {
        let mut clause = Clause::new(literals, terms);
        clause.role = role;
        clause
    }

    /// Check if this clause is empty (contradiction)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Whether the clause is a single-literal clause
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    /// Whether the clause is a unit positive equality
    pub fn is_unit_equality(&self, interner: &Interner) -> bool {
        self.is_unit() && self.literals[0].polarity && self.literals[0].is_equality(interner)
    }

    /// Whether the clause contains no variables
    pub fn is_ground(&self, terms: &TermBank) -> bool {
        self.literals.iter().all(|lit| lit.is_ground(terms))
    }

    /// Check if this clause is a tautology: complementary literals, or a
    /// reflexive positive equality.
    pub fn is_tautology(&self, interner: &Interner) -> bool {
        for i in 0..self.literals.len() {
            for j in (i + 1)..self.literals.len() {
                let a = &self.literals[i];
                let b = &self.literals[j];
                if a.polarity != b.polarity && a.predicate == b.predicate && a.args == b.args {
                    return true;
                }
            }
        }

        for lit in &self.literals {
            if lit.polarity && lit.is_equality(interner) {
                if let [t1, t2] = lit.args.as_slice() {
                    if t1 == t2 {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Format this clause with an interner and term bank
    pub fn display<'a>(&'a self, terms: &'a TermBank, interner: &'a Interner) -> ClauseDisplay<'a> {
        ClauseDisplay {
            clause: self,
            terms,
            interner,
        }
    }
}

/// Display wrapper for Clause
pub struct ClauseDisplay<'a> {
    clause: &'a Clause,
    terms: &'a TermBank,
    interner: &'a Interner,
}

impl<'a> fmt::Display for ClauseDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clause.is_empty() {
            write!(f, "⊥")
        } else {
            for (i, lit) in self.clause.literals.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{}", lit.display(self.terms, self.interner))?;
            }
            Ok(())
        }
    }
}
