//! Term indexing for saturation
//!
//! A forest of substitution trees supports insert, delete, and three
//! retrieval modes (unifiers, generalizations, instances) with
//! backtracking iterators. Literal indices key their trees by
//! `(predicate, polarity, sort)`, term indices by top function symbol.
//!
//! The prover owns two bundles: the generating indices fed at activation
//! (resolution partners, unit clauses for unit-resulting resolution,
//! superposition left-hand sides and rewritable subterms) and the
//! simplification indices fed at transfer (demodulators).

pub mod binding;
pub mod node;
pub mod retrieval;
pub mod tree;

use crate::logic::core::clause::Clause;
use crate::logic::core::literal::Literal;
use crate::logic::core::term::{TermBank, TermData, TermId};
use crate::logic::env::Environment;
use crate::logic::interner::{FunctionId, PredicateId, SortId};
use crate::logic::ordering::TermOrdering;
use crate::unification::substitution::BindingStore;
use indexmap::IndexSet;

pub use node::{LeafData, NodeId};
pub use retrieval::{Retrieval, RetrievalMode};
pub use tree::{SubstitutionTree, DEFAULT_INTERNAL_THRESHOLD, DEFAULT_LEAF_THRESHOLD};

// =============================================================================
// Literal index
// =============================================================================

/// Root symbol of a literal tree
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiteralKey {
    pub predicate: PredicateId,
    pub polarity: bool,
    pub sort: Option<SortId>,
}

impl LiteralKey {
    fn of(literal: &Literal) -> Self {
        LiteralKey {
            predicate: literal.predicate.id,
            polarity: literal.polarity,
            sort: literal.sort,
        }
    }
}

/// Index of literals keyed by predicate symbol and polarity.
pub struct LiteralIndex {
    tree: SubstitutionTree<LiteralKey>,
}

impl Default for LiteralIndex {
    fn default() -> Self {
        LiteralIndex {
            tree: SubstitutionTree::default(),
        }
    }
}

impl LiteralIndex {
    pub fn new(leaf_threshold: usize, internal_threshold: usize) -> Self {
        LiteralIndex {
            tree: SubstitutionTree::new(leaf_threshold, internal_threshold),
        }
    }

    pub fn insert(&mut self, clause: usize, literal: usize, lit: &Literal, terms: &mut TermBank) {
        self.tree.insert(
            LiteralKey::of(lit),
            &lit.args,
            LeafData {
                clause,
                literal,
                term: None,
            },
            terms,
        );
    }

    pub fn remove(&mut self, clause: usize, literal: usize, lit: &Literal, terms: &mut TermBank) {
        self.tree.remove(
            LiteralKey::of(lit),
            &lit.args,
            &LeafData {
                clause,
                literal,
                term: None,
            },
            terms,
        );
    }

    /// Query for indexed literals of the given predicate; `complement`
    /// flips the polarity (the resolution query).
    pub fn retrieve<'t, 's>(
        &'t self,
        query: &Literal,
        complement: bool,
        mode: RetrievalMode,
        subst: &'s mut BindingStore,
        terms: &TermBank,
    ) -> Retrieval<'t, 's, LiteralKey> {
        let key = LiteralKey {
            predicate: query.predicate.id,
            polarity: query.polarity ^ complement,
            sort: query.sort,
        };
        Retrieval::new(&self.tree, key, &query.args, mode, subst, terms)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &SubstitutionTree<LiteralKey> {
        &self.tree
    }
}

// =============================================================================
// Term index
// =============================================================================

/// Index of terms keyed by top function symbol.
///
/// Only application terms are indexable; variables have no root symbol to
/// key a tree on.
pub struct TermIndex {
    tree: SubstitutionTree<FunctionId>,
}

impl Default for TermIndex {
    fn default() -> Self {
        TermIndex {
            tree: SubstitutionTree::default(),
        }
    }
}

impl TermIndex {
    pub fn new(leaf_threshold: usize, internal_threshold: usize) -> Self {
        TermIndex {
            tree: SubstitutionTree::new(leaf_threshold, internal_threshold),
        }
    }

    fn functor(term: TermId, terms: &TermBank) -> FunctionId {
        match terms.data(term) {
            TermData::App { functor, .. } => *functor,
            _ => panic!("only application terms are indexable"),
        }
    }

    pub fn insert(&mut self, term: TermId, ld: LeafData, terms: &mut TermBank) {
        let functor = Self::functor(term, terms);
        let args = terms.args(term).to_vec();
        self.tree.insert(functor, &args, ld, terms);
    }

    pub fn remove(&mut self, term: TermId, ld: &LeafData, terms: &mut TermBank) {
        let functor = Self::functor(term, terms);
        let args = terms.args(term).to_vec();
        self.tree.remove(functor, &args, ld, terms);
    }

    pub fn retrieve<'t, 's>(
        &'t self,
        query: TermId,
        mode: RetrievalMode,
        subst: &'s mut BindingStore,
        terms: &TermBank,
    ) -> Retrieval<'t, 's, FunctionId> {
        let functor = Self::functor(query, terms);
        let args = terms.args(query).to_vec();
        Retrieval::new(&self.tree, functor, &args, mode, subst, terms)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &SubstitutionTree<FunctionId> {
        &self.tree
    }
}

// =============================================================================
// Index bundles
// =============================================================================

/// Indices the generating rules read; fed when a clause is activated.
pub struct GeneratingIndices {
    /// Selected literals of active clauses
    pub literals: LiteralIndex,
    /// Literals of active unit clauses (unit-resulting resolution)
    pub unit_literals: LiteralIndex,
    /// Left-hand sides of selected positive equalities of active clauses
    pub superposition_lhs: TermIndex,
    /// Rewritable (non-variable) subterms of selected literals of active
    /// clauses
    pub subterms: TermIndex,
}

impl GeneratingIndices {
    pub fn new(leaf_threshold: usize, internal_threshold: usize) -> Self {
        GeneratingIndices {
            literals: LiteralIndex::new(leaf_threshold, internal_threshold),
            unit_literals: LiteralIndex::new(leaf_threshold, internal_threshold),
            superposition_lhs: TermIndex::new(leaf_threshold, internal_threshold),
            subterms: TermIndex::new(leaf_threshold, internal_threshold),
        }
    }

    /// Index an activated clause under its selected literals.
    pub fn insert_clause(
        &mut self,
        idx: usize,
        clause: &Clause,
        selected: &[usize],
        env: &mut Environment,
    ) {
        for entry in Self::entries(idx, clause, selected, env) {
            match entry {
                GenEntry::Literal(c, l) => {
                    self.literals
                        .insert(c, l, &clause.literals[l], &mut env.terms)
                }
                GenEntry::Unit(c, l) => {
                    self.unit_literals
                        .insert(c, l, &clause.literals[l], &mut env.terms)
                }
                GenEntry::Lhs(term, ld) => self.superposition_lhs.insert(term, ld, &mut env.terms),
                GenEntry::Subterm(term, ld) => self.subterms.insert(term, ld, &mut env.terms),
            }
        }
    }

    /// Remove an activated clause; mirrors `insert_clause` exactly.
    pub fn remove_clause(
        &mut self,
        idx: usize,
        clause: &Clause,
        selected: &[usize],
        env: &mut Environment,
    ) {
        for entry in Self::entries(idx, clause, selected, env) {
            match entry {
                GenEntry::Literal(c, l) => {
                    self.literals
                        .remove(c, l, &clause.literals[l], &mut env.terms)
                }
                GenEntry::Unit(c, l) => {
                    self.unit_literals
                        .remove(c, l, &clause.literals[l], &mut env.terms)
                }
                GenEntry::Lhs(term, ld) => {
                    self.superposition_lhs.remove(term, &ld, &mut env.terms)
                }
                GenEntry::Subterm(term, ld) => self.subterms.remove(term, &ld, &mut env.terms),
            }
        }
    }

    /// The deterministic entry set a clause contributes. Insertion and
    /// removal both derive it from scratch, so the two always agree.
    fn entries(
        idx: usize,
        clause: &Clause,
        selected: &[usize],
        env: &Environment,
    ) -> Vec<GenEntry> {
        let mut entries = Vec::new();
        for &i in selected {
            let lit = &clause.literals[i];
            entries.push(GenEntry::Literal(idx, i));
            if clause.is_unit() {
                entries.push(GenEntry::Unit(idx, i));
            }

            // Oriented sides of positive equalities become rewrite sources
            if lit.polarity && lit.is_equality(&env.interner) {
                if let [l, r] = lit.args.as_slice() {
                    for (side, other) in [(*l, *r), (*r, *l)] {
                        if matches!(env.terms.data(side), TermData::App { .. })
                            && !matches!(
                                env.ordering.compare(side, other, &env.terms),
                                TermOrdering::Less | TermOrdering::Equal
                            )
                        {
                            entries.push(GenEntry::Lhs(
                                side,
                                LeafData {
                                    clause: idx,
                                    literal: i,
                                    term: Some(side),
                                },
                            ));
                        }
                    }
                }
            }

            // Rewritable subterms, deduplicated per literal
            let mut seen: Vec<TermId> = Vec::new();
            for &arg in &lit.args {
                let mut subs = Vec::new();
                env.terms.subterms(arg, &mut subs);
                for sub in subs {
                    if matches!(env.terms.data(sub), TermData::App { .. })
                        && !seen.contains(&sub)
                    {
                        seen.push(sub);
                        entries.push(GenEntry::Subterm(
                            sub,
                            LeafData {
                                clause: idx,
                                literal: i,
                                term: Some(sub),
                            },
                        ));
                    }
                }
            }
        }
        entries
    }
}

enum GenEntry {
    Literal(usize, usize),
    Unit(usize, usize),
    Lhs(TermId, LeafData),
    Subterm(TermId, LeafData),
}

/// Indices the forward-simplification rules read; fed when a clause
/// survives forward simplification and moves to the passive set.
pub struct SimplifyingIndices {
    /// Both sides of unit positive equalities; orientation is re-checked
    /// after matching.
    pub demodulators: TermIndex,
    /// Clause slots currently contributing demodulators
    pub unit_equalities: IndexSet<usize>,
}

impl SimplifyingIndices {
    pub fn new(leaf_threshold: usize, internal_threshold: usize) -> Self {
        SimplifyingIndices {
            demodulators: TermIndex::new(leaf_threshold, internal_threshold),
            unit_equalities: IndexSet::new(),
        }
    }

    pub fn insert_clause(&mut self, idx: usize, clause: &Clause, env: &mut Environment) {
        if !clause.is_unit_equality(&env.interner) {
            return;
        }
        let lit = &clause.literals[0];
        if let [l, r] = lit.args.as_slice() {
            let (l, r) = (*l, *r);
            for side in Self::indexable_sides(l, r, &env.terms) {
                self.demodulators.insert(
                    side,
                    LeafData {
                        clause: idx,
                        literal: 0,
                        term: Some(side),
                    },
                    &mut env.terms,
                );
            }
            self.unit_equalities.insert(idx);
        }
    }

    pub fn remove_clause(&mut self, idx: usize, clause: &Clause, env: &mut Environment) {
        if !self.unit_equalities.shift_remove(&idx) {
            return;
        }
        let lit = &clause.literals[0];
        if let [l, r] = lit.args.as_slice() {
            let sides = Self::indexable_sides(*l, *r, &env.terms);
            for side in sides {
                self.demodulators.remove(
                    side,
                    &LeafData {
                        clause: idx,
                        literal: 0,
                        term: Some(side),
                    },
                    &mut env.terms,
                );
            }
        }
    }

    fn indexable_sides(l: TermId, r: TermId, terms: &TermBank) -> Vec<TermId> {
        let mut sides = Vec::new();
        for side in [l, r] {
            if matches!(terms.data(side), TermData::App { .. }) && !sides.contains(&side) {
                sides.push(side);
            }
        }
        sides
    }
}
