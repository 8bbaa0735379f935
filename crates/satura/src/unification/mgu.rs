//! Most general unifiers within a single variable namespace
//!
//! Intra-clause rules (factoring, equality resolution, equality factoring)
//! and subsumption unify literals of one clause, so no banking is needed.
//! Bindings are chased lazily; the image is only built when the rule fires.

use crate::logic::interner::{Interner, VariableId};
use crate::logic::core::literal::Literal;
use crate::logic::core::term::{TermBank, TermData, TermId};
use super::substitution::UnifyError;
use std::collections::HashMap;

/// A substitution mapping variable ids to terms of the same namespace
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    map: HashMap<VariableId, TermId>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution::default()
    }

    pub fn get(&self, v: VariableId) -> Option<TermId> {
        self.map.get(&v).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Chase bindings until an unbound variable or an application
    fn deref(&self, mut t: TermId, terms: &TermBank) -> TermId {
        while let TermData::Var(v) = terms.data(t) {
            match self.map.get(v) {
                Some(&next) => t = next,
                None => break,
            }
        }
        t
    }

    /// Build the image of `t` under this substitution
    pub fn apply(&self, t: TermId, terms: &mut TermBank) -> TermId {
        let t = self.deref(t, terms);
        match terms.data(t) {
            TermData::Var(_) | TermData::Special(_) => t,
            TermData::App { functor, args } => {
                let functor = *functor;
                let args: Vec<TermId> = args.to_vec();
                let new_args: Vec<TermId> = args.into_iter().map(|a| self.apply(a, terms)).collect();
                terms.app_raw(functor, new_args)
            }
        }
    }

    /// Apply to every argument of a literal
    pub fn apply_literal(&self, lit: &Literal, terms: &mut TermBank) -> Literal {
        Literal {
            predicate: lit.predicate,
            args: lit.args.iter().map(|&a| self.apply(a, terms)).collect(),
            polarity: lit.polarity,
            sort: lit.sort,
        }
    }

    fn occurs(&self, v: VariableId, t: TermId, terms: &TermBank) -> bool {
        let t = self.deref(t, terms);
        match terms.data(t) {
            TermData::Var(w) => *w == v,
            TermData::Special(_) => false,
            TermData::App { args, .. } => {
                let args: Vec<TermId> = args.to_vec();
                args.into_iter().any(|a| self.occurs(v, a, terms))
            }
        }
    }
}

/// Unify two terms, extending `subst`; bindings made before a failure are
/// left in place, so callers clone or discard on error.
pub fn unify(
    t1: TermId,
    t2: TermId,
    subst: &mut Substitution,
    terms: &TermBank,
) -> Result<(), UnifyError> {
    let t1 = subst.deref(t1, terms);
    let t2 = subst.deref(t2, terms);
    if t1 == t2 {
        return Ok(());
    }
    match (terms.data(t1), terms.data(t2)) {
        (TermData::Var(v), _) => {
            let v = *v;
            if subst.occurs(v, t2, terms) {
                Err(UnifyError::OccursCheck)
            } else {
                subst.map.insert(v, t2);
                Ok(())
            }
        }
        (_, TermData::Var(v)) => {
            let v = *v;
            if subst.occurs(v, t1, terms) {
                Err(UnifyError::OccursCheck)
            } else {
                subst.map.insert(v, t1);
                Ok(())
            }
        }
        (
            TermData::App { functor: f1, args: a1 },
            TermData::App { functor: f2, args: a2 },
        ) => {
            if f1 != f2 {
                return Err(UnifyError::FunctorMismatch);
            }
            let a1: Vec<TermId> = a1.to_vec();
            let a2: Vec<TermId> = a2.to_vec();
            for (x, y) in a1.into_iter().zip(a2) {
                unify(x, y, subst, terms)?;
            }
            Ok(())
        }
        _ => Err(UnifyError::FunctorMismatch),
    }
}

/// Unify two literals' argument lists.
///
/// Predicates must agree; equality literals of different sorts fail with a
/// sort mismatch.
pub fn unify_literals(
    l1: &Literal,
    l2: &Literal,
    subst: &mut Substitution,
    terms: &TermBank,
    interner: &Interner,
) -> Result<(), UnifyError> {
    if l1.predicate != l2.predicate {
        return Err(UnifyError::FunctorMismatch);
    }
    if l1.is_equality(interner) && l1.sort != l2.sort {
        return Err(UnifyError::SortMismatch);
    }
    for (&a, &b) in l1.args.iter().zip(l2.args.iter()) {
        unify(a, b, subst, terms)?;
    }
    Ok(())
}

/// One-way matching: only variables of `pattern` may be bound.
pub fn match_onto(
    pattern: TermId,
    target: TermId,
    subst: &mut Substitution,
    terms: &TermBank,
) -> Result<(), UnifyError> {
    match terms.data(pattern) {
        TermData::Var(v) => {
            let v = *v;
            match subst.map.get(&v) {
                Some(&bound) => {
                    if bound == target {
                        Ok(())
                    } else {
                        Err(UnifyError::FunctorMismatch)
                    }
                }
                None => {
                    subst.map.insert(v, target);
                    Ok(())
                }
            }
        }
        TermData::Special(_) => Err(UnifyError::FunctorMismatch),
        TermData::App { functor: pf, args: pargs } => match terms.data(target) {
            TermData::App { functor: tf, args: targs } if pf == tf => {
                let pargs: Vec<TermId> = pargs.to_vec();
                let targs: Vec<TermId> = targs.to_vec();
                for (p, t) in pargs.into_iter().zip(targs) {
                    match_onto(p, t, subst, terms)?;
                }
                Ok(())
            }
            _ => Err(UnifyError::FunctorMismatch),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::term::FunctionSymbol;

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
    }

    #[test]
    fn test_unify_binds_variable() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let a = ctx.const_("a");

        let mut subst = Substitution::new();
        unify(x, a, &mut subst, &ctx.terms).unwrap();
        assert_eq!(subst.apply(x, &mut ctx.terms), a);
    }

    #[test]
    fn test_unify_nested() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let y = ctx.var("Y");
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let gy = ctx.func("g", vec![y]);
        let gb = ctx.func("g", vec![b]);
        let t1 = ctx.func("f", vec![x, gy]);
        let t2 = ctx.func("f", vec![a, gb]);

        let mut subst = Substitution::new();
        unify(t1, t2, &mut subst, &ctx.terms).unwrap();
        assert_eq!(subst.apply(t1, &mut ctx.terms), t2);
        assert_eq!(subst.apply(t2, &mut ctx.terms), t2);
    }

    #[test]
    fn test_occurs_check() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let fx = ctx.func("f", vec![x]);

        let mut subst = Substitution::new();
        assert_eq!(
            unify(x, fx, &mut subst, &ctx.terms),
            Err(UnifyError::OccursCheck)
        );
    }

    #[test]
    fn test_transitive_binding() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let y = ctx.var("Y");
        let a = ctx.const_("a");

        let mut subst = Substitution::new();
        unify(x, y, &mut subst, &ctx.terms).unwrap();
        unify(y, a, &mut subst, &ctx.terms).unwrap();
        assert_eq!(subst.apply(x, &mut ctx.terms), a);
    }

    #[test]
    fn test_match_is_one_way() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let a = ctx.const_("a");
        let fx = ctx.func("f", vec![x]);
        let fa = ctx.func("f", vec![a]);

        let mut subst = Substitution::new();
        match_onto(fx, fa, &mut subst, &ctx.terms).unwrap();
        assert_eq!(subst.apply(fx, &mut ctx.terms), fa);

        // Target variables never bind
        let mut subst = Substitution::new();
        assert!(match_onto(fa, fx, &mut subst, &ctx.terms).is_err());
    }

    #[test]
    fn test_match_consistency() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let fxx = ctx.func("f", vec![x, x]);
        let fab = ctx.func("f", vec![a, b]);
        let faa = ctx.func("f", vec![a, a]);

        let mut subst = Substitution::new();
        assert!(match_onto(fxx, fab, &mut subst, &ctx.terms).is_err());

        let mut subst = Substitution::new();
        assert!(match_onto(fxx, faa, &mut subst, &ctx.terms).is_ok());
    }
}
