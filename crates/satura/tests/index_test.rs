//! Substitution-tree index properties: insert/retrieve round-trips,
//! delete-inverse, per-mode soundness and completeness, and backtrack
//! neutrality of dropped iterators.

use satura::{
    BankedTerm, BindingStore, Interner, LiteralIndex, Literal, PredicateSymbol, Renaming,
    RetrievalMode, TermBank, TermId, FunctionSymbol, QUERY_BANK, RESULT_BANK,
};

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

    fn lit(&mut self, pred: &str, args: Vec<TermId>) -> Literal {
        let p = PredicateSymbol::new(
            self.interner.intern_predicate(pred, args.len() as u8),
            args.len() as u8,
        );
        Literal::positive(p, args)
    }
}

/// Brute-force reference for unifier retrieval: banked unification of the
/// query against one indexed literal.
fn unifiable(query: &Literal, entry: &Literal, terms: &TermBank) -> bool {
    if query.predicate != entry.predicate {
        return false;
    }
    let mut store = BindingStore::new();
    store.frame();
    query
        .args
        .iter()
        .zip(entry.args.iter())
        .all(|(&q, &e)| {
            store
                .unify(
                    BankedTerm::new(q, QUERY_BANK),
                    BankedTerm::new(e, RESULT_BANK),
                    terms,
                )
                .is_ok()
        })
}

fn collect(
    index: &LiteralIndex,
    query: &Literal,
    mode: RetrievalMode,
    terms: &TermBank,
) -> Vec<(usize, usize)> {
    let mut store = BindingStore::new();
    let mut retrieval = index.retrieve(query, false, mode, &mut store, terms);
    let mut out = Vec::new();
    while let Some(ld) = retrieval.next_match(terms) {
        out.push((ld.clause, ld.literal));
    }
    out.sort_unstable();
    out
}

#[test]
fn test_insert_retrieve_round_trip() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let y = ctx.var("Y");
    let a = ctx.const_("a");
    let b = ctx.const_("b");
    let fa = ctx.func("f", vec![a]);
    let fy = ctx.func("f", vec![y]);
    let gxy = ctx.func("g", vec![x, y]);

    let entries = vec![
        ctx.lit("p", vec![x, fa]),
        ctx.lit("p", vec![a, fy]),
        ctx.lit("p", vec![b, gxy]),
        ctx.lit("p", vec![fa, fy]),
        ctx.lit("q", vec![a]),
        ctx.lit("q", vec![x]),
    ];

    let mut index = LiteralIndex::default();
    for (i, lit) in entries.iter().enumerate() {
        index.insert(i, 0, lit, &mut ctx.terms);
    }

    // Every inserted literal is found by a unifier query with itself
    for (i, lit) in entries.iter().enumerate() {
        let found = collect(&index, lit, RetrievalMode::Unifiers, &ctx.terms);
        assert!(
            found.contains(&(i, 0)),
            "entry {} missing from its own unifier query",
            i
        );
    }
}

#[test]
fn test_unifier_retrieval_matches_brute_force() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let y = ctx.var("Y");
    let z = ctx.var("Z");
    let a = ctx.const_("a");
    let b = ctx.const_("b");
    let fa = ctx.func("f", vec![a]);
    let fb = ctx.func("f", vec![b]);
    let fx = ctx.func("f", vec![x]);
    let gab = ctx.func("g", vec![a, b]);
    let gxy = ctx.func("g", vec![x, y]);

    let entries = vec![
        ctx.lit("p", vec![fa, z]),
        ctx.lit("p", vec![fx, gxy]),
        ctx.lit("p", vec![fb, gab]),
        ctx.lit("p", vec![y, y]),
        ctx.lit("p", vec![a, b]),
    ];

    let mut index = LiteralIndex::default();
    for (i, lit) in entries.iter().enumerate() {
        index.insert(i, 0, lit, &mut ctx.terms);
    }

    let queries = vec![
        ctx.lit("p", vec![fa, gab]),
        ctx.lit("p", vec![x, gxy]),
        ctx.lit("p", vec![fb, z]),
        ctx.lit("p", vec![a, a]),
    ];

    for query in &queries {
        let found = collect(&index, query, RetrievalMode::Unifiers, &ctx.terms);
        let expected: Vec<(usize, usize)> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| unifiable(query, e, &ctx.terms))
            .map(|(i, _)| (i, 0))
            .collect();
        assert_eq!(
            found, expected,
            "unifier retrieval disagrees with brute force for {:?}",
            query
        );
    }
}

#[test]
fn test_retrieval_has_no_duplicates() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let y = ctx.var("Y");
    let a = ctx.const_("a");
    let fa = ctx.func("f", vec![a]);
    let fy = ctx.func("f", vec![y]);

    let entries = vec![
        ctx.lit("p", vec![x, x]),
        ctx.lit("p", vec![fa, fy]),
        ctx.lit("p", vec![fy, fa]),
    ];
    let mut index = LiteralIndex::default();
    for (i, lit) in entries.iter().enumerate() {
        index.insert(i, 0, lit, &mut ctx.terms);
    }

    let query = ctx.lit("p", vec![fa, fa]);
    let found = collect(&index, &query, RetrievalMode::Unifiers, &ctx.terms);
    let mut dedup = found.clone();
    dedup.dedup();
    assert_eq!(found, dedup, "each leaf entry must be yielded exactly once");
    assert_eq!(found.len(), 3);
}

#[test]
fn test_delete_inverse() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let y = ctx.var("Y");
    let a = ctx.const_("a");
    let b = ctx.const_("b");
    let fa = ctx.func("f", vec![a]);
    let fy = ctx.func("f", vec![y]);
    let gx = ctx.func("g", vec![x]);

    let base = vec![
        ctx.lit("p", vec![x, fa]),
        ctx.lit("p", vec![a, fy]),
        ctx.lit("p", vec![gx, b]),
    ];
    let extra = ctx.lit("p", vec![fa, gx]);

    let mut index = LiteralIndex::default();
    for (i, lit) in base.iter().enumerate() {
        index.insert(i, 0, lit, &mut ctx.terms);
    }

    let before = index.tree().dump(&ctx.terms, &ctx.interner);
    index.insert(99, 0, &extra, &mut ctx.terms);
    assert_ne!(before, index.tree().dump(&ctx.terms, &ctx.interner));
    index.remove(99, 0, &extra, &mut ctx.terms);
    let after = index.tree().dump(&ctx.terms, &ctx.interner);

    assert_eq!(before, after, "insert followed by delete must restore the tree");
    assert_eq!(index.len(), base.len());

    // An entry that forces a node split: p(X, f(b)) disagrees with the
    // indexed p(X, f(a)) below f, so the position is abstracted with a
    // fresh special variable. Deleting it must undo the split.
    let fb = ctx.func("f", vec![b]);
    let splitting = ctx.lit("p", vec![x, fb]);
    index.insert(100, 0, &splitting, &mut ctx.terms);
    assert_ne!(before, index.tree().dump(&ctx.terms, &ctx.interner));
    index.remove(100, 0, &splitting, &mut ctx.terms);
    assert_eq!(
        before,
        index.tree().dump(&ctx.terms, &ctx.interner),
        "deleting a split-inducing entry must coalesce the split away"
    );
}

#[test]
fn test_delete_to_empty() {
    let mut ctx = Ctx::new();
    let a = ctx.const_("a");
    let fa = ctx.func("f", vec![a]);
    let lit = ctx.lit("p", vec![fa]);

    let mut index = LiteralIndex::default();
    index.insert(0, 0, &lit, &mut ctx.terms);
    index.remove(0, 0, &lit, &mut ctx.terms);

    assert!(index.is_empty());
    // A fresh query on the emptied index yields nothing
    let found = collect(&index, &lit, RetrievalMode::Unifiers, &ctx.terms);
    assert!(found.is_empty());
}

#[test]
fn test_unifier_soundness() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let y = ctx.var("Y");
    let a = ctx.const_("a");
    let fy = ctx.func("f", vec![y]);
    let fa = ctx.func("f", vec![a]);

    let entries = vec![ctx.lit("p", vec![x, fy]), ctx.lit("p", vec![fa, y])];
    let mut index = LiteralIndex::default();
    for (i, lit) in entries.iter().enumerate() {
        index.insert(i, 0, lit, &mut ctx.terms);
    }

    let query = ctx.lit("p", vec![fy, fa]);
    let mut store = BindingStore::new();
    let mut retrieval = index.retrieve(&query, false, RetrievalMode::Unifiers, &mut store, &ctx.terms);
    let mut count = 0;
    while let Some(ld) = retrieval.next_match(&ctx.terms) {
        count += 1;
        let entry = &entries[ld.clause];
        // Lσ = L'σ: images of both literals' arguments coincide
        let mut renaming = Renaming::new();
        for (&q, &e) in query.args.iter().zip(entry.args.iter()) {
            let qi = retrieval.substitution().apply(
                BankedTerm::new(q, QUERY_BANK),
                &mut ctx.terms,
                &mut renaming,
                &mut ctx.interner,
            );
            let ei = retrieval.substitution().apply(
                BankedTerm::new(e, RESULT_BANK),
                &mut ctx.terms,
                &mut renaming,
                &mut ctx.interner,
            );
            assert_eq!(qi, ei, "unifier image mismatch for entry {}", ld.clause);
        }
    }
    assert!(count > 0);
}

#[test]
fn test_generalization_retrieval() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let y = ctx.var("Y");
    let a = ctx.const_("a");
    let b = ctx.const_("b");
    let fy = ctx.func("f", vec![y]);
    let fb = ctx.func("f", vec![b]);
    let gb = ctx.func("g", vec![b]);

    // Index contains p(X, f(Y))
    let entry = ctx.lit("p", vec![x, fy]);
    let mut index = LiteralIndex::default();
    index.insert(0, 0, &entry, &mut ctx.terms);

    // Query p(a, f(b)) finds it with σ = {X↦a, Y↦b}
    let query = ctx.lit("p", vec![a, fb]);
    let mut store = BindingStore::new();
    {
        let mut retrieval = index.retrieve(
            &query,
            false,
            RetrievalMode::Generalizations,
            &mut store,
            &ctx.terms,
        );
        let ld = retrieval.next_match(&ctx.terms).expect("generalization found");
        assert_eq!((ld.clause, ld.literal), (0, 0));

        // The query side is untouched; the entry's image equals the query
        let mut renaming = Renaming::new();
        for (&q, &e) in query.args.iter().zip(entry.args.iter()) {
            let ei = retrieval.substitution().apply(
                BankedTerm::new(e, RESULT_BANK),
                &mut ctx.terms,
                &mut renaming,
                &mut ctx.interner,
            );
            assert_eq!(ei, q, "L'σ must equal the query literal");
        }
        assert!(retrieval.next_match(&ctx.terms).is_none());
    }

    // Query p(a, g(b)) finds nothing
    let miss = ctx.lit("p", vec![a, gb]);
    let found = collect(&index, &miss, RetrievalMode::Generalizations, &ctx.terms);
    assert!(found.is_empty());
}

#[test]
fn test_instance_retrieval() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let y = ctx.var("Y");
    let a = ctx.const_("a");
    let fb = {
        let b = ctx.const_("b");
        ctx.func("f", vec![b])
    };

    // Index contains p(a, f(b)) and p(X, Y)
    let ground = ctx.lit("p", vec![a, fb]);
    let general = ctx.lit("p", vec![x, y]);
    let mut index = LiteralIndex::default();
    index.insert(0, 0, &ground, &mut ctx.terms);
    index.insert(1, 0, &general, &mut ctx.terms);

    // Query p(X, Y) in instance mode returns both
    let found = collect(&index, &general, RetrievalMode::Instances, &ctx.terms);
    assert_eq!(found, vec![(0, 0), (1, 0)]);

    // Query p(a, f(b)) returns only the ground entry
    let found = collect(&index, &ground, RetrievalMode::Instances, &ctx.terms);
    assert_eq!(found, vec![(0, 0)]);
}

#[test]
fn test_generalization_completeness_with_promotions() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let a = ctx.const_("a");

    // Many entries under one predicate force child-collection promotion
    let mut entries = Vec::new();
    for i in 0..10 {
        let c = ctx.const_(&format!("c{}", i));
        let fc = ctx.func("h", vec![c]);
        entries.push(ctx.lit("p", vec![fc]));
    }
    let hx = ctx.func("h", vec![x]);
    entries.push(ctx.lit("p", vec![hx]));

    let mut index = LiteralIndex::default();
    for (i, lit) in entries.iter().enumerate() {
        index.insert(i, 0, lit, &mut ctx.terms);
    }

    // h(a) is not indexed; only the variable entry generalizes h(a)
    let ha = ctx.func("h", vec![a]);
    let query = ctx.lit("p", vec![ha]);
    let found = collect(&index, &query, RetrievalMode::Generalizations, &ctx.terms);
    assert_eq!(found, vec![(10, 0)]);

    // h(c3) is generalized by itself and by h(X)
    let c3 = ctx.const_("c3");
    let hc3 = ctx.func("h", vec![c3]);
    let query = ctx.lit("p", vec![hc3]);
    let found = collect(&index, &query, RetrievalMode::Generalizations, &ctx.terms);
    assert_eq!(found, vec![(3, 0), (10, 0)]);
}

#[test]
fn test_backtrack_neutrality() {
    let mut ctx = Ctx::new();
    let x = ctx.var("X");
    let y = ctx.var("Y");
    let a = ctx.const_("a");
    let fa = ctx.func("f", vec![a]);
    let fy = ctx.func("f", vec![y]);

    let entries = vec![
        ctx.lit("p", vec![x, fa]),
        ctx.lit("p", vec![a, fy]),
        ctx.lit("p", vec![fa, fy]),
    ];
    let mut index = LiteralIndex::default();
    for (i, lit) in entries.iter().enumerate() {
        index.insert(i, 0, lit, &mut ctx.terms);
    }
    let tree_before = index.tree().dump(&ctx.terms, &ctx.interner);

    let query = ctx.lit("p", vec![fa, fa]);
    let mut store = BindingStore::new();
    {
        let mut retrieval =
            index.retrieve(&query, false, RetrievalMode::Unifiers, &mut store, &ctx.terms);
        // Take one result, then abandon the iterator mid-run
        let _ = retrieval.next_match(&ctx.terms);
    }

    assert!(
        store.is_pristine(),
        "dropping the iterator must roll the working substitution back"
    );
    assert_eq!(
        tree_before,
        index.tree().dump(&ctx.terms, &ctx.interner),
        "retrieval must not mutate the tree"
    );

    // The store is reusable for a fresh query afterwards
    let found = collect(&index, &query, RetrievalMode::Unifiers, &ctx.terms);
    assert!(!found.is_empty());
}

#[test]
fn test_propositional_literals() {
    let mut ctx = Ctx::new();
    // 0-ary predicates exercise the leaf-root path
    let lit = ctx.lit("r", vec![]);
    let mut index = LiteralIndex::default();
    index.insert(0, 0, &lit, &mut ctx.terms);
    index.insert(1, 0, &lit, &mut ctx.terms);

    let found = collect(&index, &lit, RetrievalMode::Unifiers, &ctx.terms);
    assert_eq!(found, vec![(0, 0), (1, 0)]);

    index.remove(1, 0, &lit, &mut ctx.terms);
    let found = collect(&index, &lit, RetrievalMode::Unifiers, &ctx.terms);
    assert_eq!(found, vec![(0, 0)]);
}
