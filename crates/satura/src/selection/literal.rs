//! Literal selection strategies
//!
//! A selection function picks the literals of a clause that are eligible
//! for generating inferences. The strategies follow the standard numbered
//! family: select everything, select the maximal literals under the term
//! ordering, or prefer a heavy negative literal.

use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::core::term::TermBank;
use crate::logic::interner::VariableId;
use crate::logic::ordering::{Kbo, TermOrdering};
use std::collections::HashMap;

/// Trait for literal selection strategies.
///
/// `select` returns the sorted indices of the selected literals; the
/// result is cached on the clause slot at activation.
pub trait LiteralSelector: Send + Sync {
    fn select(&self, clause: &Clause, terms: &TermBank, kbo: &Kbo) -> Vec<usize>;

    fn name(&self) -> &str;
}

fn literal_weight(lit: &Literal, terms: &TermBank) -> u32 {
    lit.weight(terms)
}

/// Count occurrences of each variable in a literal
fn count_literal_variables(lit: &Literal, terms: &TermBank) -> HashMap<VariableId, usize> {
    let mut counts = HashMap::new();
    for &arg in &lit.args {
        terms.count_vars(arg, &mut counts);
    }
    counts
}

/// KBO extended to atoms: lit1 > lit2 when the variable condition holds
/// and either the weight is strictly larger, or weights tie and the
/// predicate/argument comparison decides lexicographically.
fn literal_greater(lit1: &Literal, lit2: &Literal, terms: &TermBank, kbo: &Kbo) -> bool {
    let vars1 = count_literal_variables(lit1, terms);
    let vars2 = count_literal_variables(lit2, terms);

    let var_cond = vars2
        .iter()
        .all(|(v, c2)| vars1.get(v).copied().unwrap_or(0) >= *c2);
    if !var_cond {
        return false;
    }

    let w1 = literal_weight(lit1, terms);
    let w2 = literal_weight(lit2, terms);
    if w1 != w2 {
        return w1 > w2;
    }

    if lit1.predicate.id != lit2.predicate.id {
        return lit1.predicate.id > lit2.predicate.id;
    }

    for (&a1, &a2) in lit1.args.iter().zip(lit2.args.iter()) {
        match kbo.compare(a1, a2, terms) {
            TermOrdering::Greater => return true,
            TermOrdering::Less => return false,
            TermOrdering::Equal | TermOrdering::Incomparable => continue,
        }
    }

    false
}

/// Indices of the literals not beaten by any other literal
fn find_maximal_literals(clause: &Clause, terms: &TermBank, kbo: &Kbo) -> Vec<usize> {
    let mut maximal = Vec::new();
    for i in 0..clause.literals.len() {
        let beaten = (0..clause.literals.len()).any(|j| {
            i != j && literal_greater(&clause.literals[j], &clause.literals[i], terms, kbo)
        });
        if !beaten {
            maximal.push(i);
        }
    }
    maximal
}

/// A negative literal of maximum weight, if any
fn find_max_weight_negative(clause: &Clause, terms: &TermBank) -> Option<usize> {
    clause
        .literals
        .iter()
        .enumerate()
        .filter(|(_, lit)| !lit.polarity)
        .max_by(|(i, a), (j, b)| {
            literal_weight(a, terms)
                .cmp(&literal_weight(b, terms))
                .then(j.cmp(i))
        })
        .map(|(i, _)| i)
}

/// Select every literal (no selection)
pub struct SelectAll;

impl LiteralSelector for SelectAll {
    fn select(&self, clause: &Clause, _terms: &TermBank, _kbo: &Kbo) -> Vec<usize> {
        (0..clause.literals.len()).collect()
    }

    fn name(&self) -> &str {
        "SelectAll"
    }
}

/// Select all maximal literals under the ordering
pub struct SelectMaximal;

impl LiteralSelector for SelectMaximal {
    fn select(&self, clause: &Clause, terms: &TermBank, kbo: &Kbo) -> Vec<usize> {
        find_maximal_literals(clause, terms, kbo)
    }

    fn name(&self) -> &str {
        "SelectMaximal"
    }
}

/// Select a max-weight negative literal when one exists, otherwise all
/// maximal literals
pub struct SelectNegMaxWeightOrMaximal;

impl LiteralSelector for SelectNegMaxWeightOrMaximal {
    fn select(&self, clause: &Clause, terms: &TermBank, kbo: &Kbo) -> Vec<usize> {
        match find_max_weight_negative(clause, terms) {
            Some(i) => vec![i],
            None => find_maximal_literals(clause, terms, kbo),
        }
    }

    fn name(&self) -> &str {
        "SelectNegMaxWeightOrMaximal"
    }
}

/// Select a unique maximal literal when there is one, else a max-weight
/// negative literal, else all maximal literals
pub struct SelectUniqueMaximalOrNegOrMaximal;

impl LiteralSelector for SelectUniqueMaximalOrNegOrMaximal {
    fn select(&self, clause: &Clause, terms: &TermBank, kbo: &Kbo) -> Vec<usize> {
        let maximal = find_maximal_literals(clause, terms, kbo);
        if maximal.len() == 1 {
            return maximal;
        }
        match find_max_weight_negative(clause, terms) {
            Some(i) => vec![i],
            None => maximal,
        }
    }

    fn name(&self) -> &str {
        "SelectUniqueMaximalOrNegOrMaximal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::literal::PredicateSymbol;
    use crate::logic::core::term::{FunctionSymbol, TermId};
    use crate::logic::interner::Interner;
    use crate::logic::ordering::KboConfig;

    struct Ctx {
        interner: Interner,
        terms: TermBank,
    }

    impl Ctx {
        fn new() -> Self {
            Ctx {
                interner: Interner::new(),
                terms: TermBank::new(),
            }
        }

        fn var(&mut self, name: &str) -> TermId {
            let id = self.interner.intern_variable(name);
            self.terms.var(id)
        }

        fn const_(&mut self, name: &str) -> TermId {
            let id = self.interner.intern_function(name, 0);
            self.terms.constant(FunctionSymbol::new(id, 0))
        }

        fn func(&mut self, name: &str, args: Vec<TermId>) -> TermId {
            let id = self.interner.intern_function(name, args.len() as u8);
            let arity = args.len() as u8;
            self.terms.app(FunctionSymbol::new(id, arity), args)
        }

        fn pred(&mut self, name: &str, arity: u8) -> PredicateSymbol {
            PredicateSymbol::new(self.interner.intern_predicate(name, arity), arity)
        }
    }

    #[test]
    fn test_select_all() {
        let mut ctx = Ctx::new();
        let p = ctx.pred("p", 1);
        let a = ctx.const_("a");
        let clause = Clause::new(
            vec![
                Literal::positive(p, vec![a]),
                Literal::negative(p, vec![a]),
            ],
            &ctx.terms,
        );
        let kbo = Kbo::new(KboConfig::default());
        assert_eq!(SelectAll.select(&clause, &ctx.terms, &kbo), vec![0, 1]);
    }

    #[test]
    fn test_maximal_prefers_heavier_literal() {
        let mut ctx = Ctx::new();
        let p = ctx.pred("p", 1);
        let a = ctx.const_("a");
        let fa = ctx.func("f", vec![a]);
        let ffa = ctx.func("f", vec![fa]);

        // p(f(f(a))) outweighs p(a)
        let clause = Clause::new(
            vec![
                Literal::positive(p, vec![a]),
                Literal::positive(p, vec![ffa]),
            ],
            &ctx.terms,
        );
        let kbo = Kbo::new(KboConfig::default());
        assert_eq!(SelectMaximal.select(&clause, &ctx.terms, &kbo), vec![1]);
    }

    #[test]
    fn test_neg_max_weight_preferred() {
        let mut ctx = Ctx::new();
        let p = ctx.pred("p", 1);
        let q = ctx.pred("q", 1);
        let a = ctx.const_("a");
        let fa = ctx.func("f", vec![a]);

        // ~q(f(a)) is the heavy negative literal
        let clause = Clause::new(
            vec![
                Literal::positive(p, vec![fa]),
                Literal::negative(q, vec![fa]),
                Literal::negative(p, vec![a]),
            ],
            &ctx.terms,
        );
        let kbo = Kbo::new(KboConfig::default());
        let selected = SelectNegMaxWeightOrMaximal.select(&clause, &ctx.terms, &kbo);
        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn test_unique_maximal_wins() {
        let mut ctx = Ctx::new();
        let p = ctx.pred("p", 1);
        let a = ctx.const_("a");
        let fa = ctx.func("f", vec![a]);
        let ffa = ctx.func("f", vec![fa]);

        let clause = Clause::new(
            vec![
                Literal::negative(p, vec![a]),
                Literal::positive(p, vec![ffa]),
            ],
            &ctx.terms,
        );
        let kbo = Kbo::new(KboConfig::default());
        // The positive literal is the unique maximal one and beats the
        // negative fallback
        let selected = SelectUniqueMaximalOrNegOrMaximal.select(&clause, &ctx.terms, &kbo);
        assert_eq!(selected, vec![1]);
    }
}
