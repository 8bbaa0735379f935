//! Property-based tests for unification.

use super::mgu::{unify, Substitution};
use super::substitution::{BankedTerm, BindingStore, QUERY_BANK, RESULT_BANK};
use crate::logic::core::term::{FunctionSymbol, TermBank, TermId};
use crate::logic::interner::Interner;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum TermDesc {
    Var(u8),
    Const(u8),
    Func(u8, Vec<TermDesc>),
}

fn arb_term_desc(max_depth: u32) -> BoxedStrategy<TermDesc> {
    if max_depth == 0 {
        prop_oneof![
            (0..3u8).prop_map(TermDesc::Var),
            (0..3u8).prop_map(TermDesc::Const),
        ]
        .boxed()
    } else {
        prop_oneof![
            2 => (0..3u8).prop_map(TermDesc::Var),
            2 => (0..3u8).prop_map(TermDesc::Const),
            3 => (0..2u8, proptest::collection::vec(arb_term_desc(max_depth - 1), 1..=2))
                .prop_map(|(f, args)| TermDesc::Func(f, args)),
        ]
        .boxed()
    }
}

fn build(desc: &TermDesc, interner: &mut Interner, terms: &mut TermBank) -> TermId {
    match desc {
        TermDesc::Var(i) => {
            let id = interner.intern_variable(&format!("X{}", i));
            terms.var(id)
        }
        TermDesc::Const(i) => {
            let id = interner.intern_function(&format!("c{}", i), 0);
            terms.constant(FunctionSymbol::new(id, 0))
        }
        TermDesc::Func(f, args) => {
            let id = interner.intern_function(&format!("f{}", f), args.len() as u8);
            let built: Vec<TermId> = args.iter().map(|a| build(a, interner, terms)).collect();
            let arity = built.len() as u8;
            terms.app(FunctionSymbol::new(id, arity), built)
        }
    }
}

proptest! {
    /// A successful unifier really unifies: the images coincide.
    #[test]
    fn mgu_is_a_unifier((d1, d2) in (arb_term_desc(3), arb_term_desc(3))) {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let t1 = build(&d1, &mut interner, &mut terms);
        let t2 = build(&d2, &mut interner, &mut terms);

        let mut subst = Substitution::new();
        if unify(t1, t2, &mut subst, &terms).is_ok() {
            let i1 = subst.apply(t1, &mut terms);
            let i2 = subst.apply(t2, &mut terms);
            prop_assert_eq!(i1, i2, "images under the mgu must be identical");
        }
    }

    /// Unification is symmetric in success.
    #[test]
    fn unify_symmetric((d1, d2) in (arb_term_desc(3), arb_term_desc(3))) {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let t1 = build(&d1, &mut interner, &mut terms);
        let t2 = build(&d2, &mut interner, &mut terms);

        let forward = unify(t1, t2, &mut Substitution::new(), &terms).is_ok();
        let backward = unify(t2, t1, &mut Substitution::new(), &terms).is_ok();
        prop_assert_eq!(forward, backward);
    }

    /// Banked unification agrees with plain unification when terms share no
    /// variables across banks, and rolling back the frame leaves the store
    /// pristine.
    #[test]
    fn banked_unify_rolls_back((d1, d2) in (arb_term_desc(3), arb_term_desc(3))) {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let t1 = build(&d1, &mut interner, &mut terms);
        let t2 = build(&d2, &mut interner, &mut terms);

        let mut store = BindingStore::new();
        store.frame();
        let _ = store.unify(
            BankedTerm::new(t1, QUERY_BANK),
            BankedTerm::new(t2, RESULT_BANK),
            &terms,
        );
        store.rollback();
        prop_assert!(store.is_pristine(), "rollback must restore the store exactly");
    }
}
