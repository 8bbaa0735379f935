//! Property-based tests for the KBO term ordering.

use super::{Kbo, KboConfig, TermOrdering};
use crate::logic::core::term::{FunctionSymbol, TermBank, TermId};
use crate::logic::interner::Interner;
use proptest::prelude::*;

/// Term description before interning
#[derive(Debug, Clone)]
enum TermDesc {
    Const(u8),
    Func(u8, Vec<TermDesc>),
}

fn arb_ground_term_desc(max_depth: u32) -> BoxedStrategy<TermDesc> {
    if max_depth == 0 {
        (0..4u8).prop_map(TermDesc::Const).boxed()
    } else {
        prop_oneof![
            3 => (0..4u8).prop_map(TermDesc::Const),
            2 => (0..2u8, proptest::collection::vec(arb_ground_term_desc(max_depth - 1), 1..=2))
                .prop_map(|(f, args)| TermDesc::Func(f, args)),
        ]
        .boxed()
    }
}

fn build_term(desc: &TermDesc, interner: &mut Interner, terms: &mut TermBank) -> TermId {
    match desc {
        TermDesc::Const(i) => {
            let name = format!("c{}", i);
            let id = interner.intern_function(&name, 0);
            terms.constant(FunctionSymbol::new(id, 0))
        }
        TermDesc::Func(f, args) => {
            let name = format!("f{}", f);
            let id = interner.intern_function(&name, args.len() as u8);
            let built: Vec<TermId> = args.iter().map(|a| build_term(a, interner, terms)).collect();
            let arity = built.len() as u8;
            terms.app(FunctionSymbol::new(id, arity), built)
        }
    }
}

fn arb_ground_triple(
    max_depth: u32,
) -> impl Strategy<Value = (TermId, TermId, TermId, TermBank)> {
    (
        arb_ground_term_desc(max_depth),
        arb_ground_term_desc(max_depth),
        arb_ground_term_desc(max_depth),
    )
        .prop_map(|(d1, d2, d3)| {
            let mut interner = Interner::new();
            let mut terms = TermBank::new();
            let t1 = build_term(&d1, &mut interner, &mut terms);
            let t2 = build_term(&d2, &mut interner, &mut terms);
            let t3 = build_term(&d3, &mut interner, &mut terms);
            (t1, t2, t3, terms)
        })
}

proptest! {
    /// Transitivity: if a > b and b > c, then a > c
    #[test]
    fn kbo_transitivity((t1, t2, t3, terms) in arb_ground_triple(3)) {
        let kbo = Kbo::new(KboConfig::default());
        let cmp12 = kbo.compare(t1, t2, &terms);
        let cmp23 = kbo.compare(t2, t3, &terms);
        let cmp13 = kbo.compare(t1, t3, &terms);

        if cmp12 == TermOrdering::Greater && cmp23 == TermOrdering::Greater {
            prop_assert_eq!(cmp13, TermOrdering::Greater,
                "transitivity: t1 > t2 and t2 > t3 implies t1 > t3");
        }
        if cmp12 == TermOrdering::Less && cmp23 == TermOrdering::Less {
            prop_assert_eq!(cmp13, TermOrdering::Less,
                "transitivity: t1 < t2 and t2 < t3 implies t1 < t3");
        }
    }

    /// Ground terms are totally ordered: never Incomparable, and Equal
    /// exactly on identical ids.
    #[test]
    fn kbo_ground_totality((t1, t2, _t3, terms) in arb_ground_triple(3)) {
        let kbo = Kbo::new(KboConfig::default());
        let cmp = kbo.compare(t1, t2, &terms);
        if t1 == t2 {
            prop_assert_eq!(cmp, TermOrdering::Equal);
        } else {
            prop_assert_ne!(cmp, TermOrdering::Equal);
            prop_assert_ne!(cmp, TermOrdering::Incomparable,
                "ground KBO must totally order distinct terms");
        }
    }

    /// Antisymmetry: compare(s, t) is the mirror of compare(t, s)
    #[test]
    fn kbo_antisymmetry((t1, t2, _t3, terms) in arb_ground_triple(3)) {
        let kbo = Kbo::new(KboConfig::default());
        let forward = kbo.compare(t1, t2, &terms);
        let backward = kbo.compare(t2, t1, &terms);
        let expected = match forward {
            TermOrdering::Greater => TermOrdering::Less,
            TermOrdering::Less => TermOrdering::Greater,
            other => other,
        };
        prop_assert_eq!(backward, expected);
    }
}
