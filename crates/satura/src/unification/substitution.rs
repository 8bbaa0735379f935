//! Banked backtrackable substitution
//!
//! The working substitution of the substitution-tree retrieval iterators.
//! Variables are keyed by `(bank, id)` — query terms and indexed terms live
//! in disjoint banks so their variable names never collide — plus the
//! bank-independent special variables of the tree itself.
//!
//! The store is a union-find forest with union-by-rank and path compression.
//! Every link, rank change, and binding is recorded on a trail inside the
//! currently active frame, so `rollback()` restores the exact prior
//! structure. Retrieval backtracking and iterator cancellation are frame
//! rollbacks.

use crate::logic::interner::{FunctionId, Interner, VariableId};
use crate::logic::core::term::{TermBank, TermData, TermId, Top};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Variable bank tag
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bank(pub u8);

/// Bank of the query term during retrieval
pub const QUERY_BANK: Bank = Bank(0);
/// Bank of indexed (result) terms during retrieval
pub const RESULT_BANK: Bank = Bank(1);

/// A variable occurrence key: ordinary variables are bank-relative,
/// special variables are global to the tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VarKey {
    Ordinary { bank: Bank, var: VariableId },
    Special(u32),
}

impl VarKey {
    fn is_special(self) -> bool {
        matches!(self, VarKey::Special(_))
    }
}

/// A term interpreted in a bank: its ordinary variables belong to `bank`,
/// its special variables are global.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BankedTerm {
    pub term: TermId,
    pub bank: Bank,
}

impl BankedTerm {
    pub fn new(term: TermId, bank: Bank) -> Self {
        BankedTerm { term, bank }
    }
}

/// Failures local to one association step; they trigger sibling
/// backtracking in retrieval, never iterator termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnifyError {
    #[error("occurs check failed")]
    OccursCheck,
    #[error("sort mismatch")]
    SortMismatch,
    #[error("functor mismatch")]
    FunctorMismatch,
}

/// Fully dereferenced view of a banked term
#[derive(Debug, Copy, Clone)]
pub enum Deref {
    /// An unbound variable (root of its union-find class)
    Var(VarKey),
    /// An application term
    App(BankedTerm),
}

enum Occurs {
    Clear,
    TheoryOnly,
    Violation,
}

enum Trail {
    Parent { var: VarKey, old: Option<VarKey> },
    Rank { var: VarKey, old: u32 },
    Bound { var: VarKey },
}

/// The working substitution.
#[derive(Default)]
pub struct BindingStore {
    parent: HashMap<VarKey, VarKey>,
    rank: HashMap<VarKey, u32>,
    bound: HashMap<VarKey, BankedTerm>,
    trail: Vec<Trail>,
    frames: Vec<usize>,
    /// Theory symbols under which the occurs check is relaxed; empty when
    /// unification with abstraction is off.
    abstraction: HashSet<FunctionId>,
}

impl BindingStore {
    pub fn new() -> Self {
        BindingStore::default()
    }

    /// Enable unification with abstraction for the given theory symbols.
    pub fn with_abstraction(symbols: HashSet<FunctionId>) -> Self {
        BindingStore {
            abstraction: symbols,
            ..BindingStore::default()
        }
    }

    // === Frames ===

    /// Open a new backtrack frame. All subsequent mutations are recorded in
    /// it until it is rolled back.
    pub fn frame(&mut self) {
        self.frames.push(self.trail.len());
    }

    /// Undo every mutation of the top frame.
    pub fn rollback(&mut self) {
        let mark = self
            .frames
            .pop()
            .expect("rollback without an open backtrack frame");
        while self.trail.len() > mark {
            match self.trail.pop().unwrap() {
                Trail::Parent { var, old } => match old {
                    Some(p) => {
                        self.parent.insert(var, p);
                    }
                    None => {
                        self.parent.remove(&var);
                    }
                },
                Trail::Rank { var, old } => {
                    self.rank.insert(var, old);
                }
                Trail::Bound { var } => {
                    self.bound.remove(&var);
                }
            }
        }
    }

    /// Number of open frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Roll back every open frame
    pub fn rollback_all(&mut self) {
        while !self.frames.is_empty() {
            self.rollback();
        }
    }

    /// True when no binding or link is present
    pub fn is_pristine(&self) -> bool {
        self.parent.is_empty() && self.bound.is_empty() && self.trail.is_empty()
    }

    // === Union-find ===

    /// Read-only root lookup (no compression)
    fn find(&self, mut v: VarKey) -> VarKey {
        while let Some(&p) = self.parent.get(&v) {
            v = p;
        }
        v
    }

    /// Root lookup with path compression; compressions are trailed so
    /// rollback restores the prior forest exactly.
    fn find_compress(&mut self, v: VarKey) -> VarKey {
        let root = self.find(v);
        let mut cur = v;
        while cur != root {
            let next = self.parent[&cur];
            if next != root {
                self.trail.push(Trail::Parent {
                    var: cur,
                    old: Some(next),
                });
                self.parent.insert(cur, root);
            }
            cur = next;
        }
        root
    }

    fn rank_of(&self, v: VarKey) -> u32 {
        self.rank.get(&v).copied().unwrap_or(0)
    }

    /// Union two unbound roots by rank
    fn union(&mut self, a: VarKey, b: VarKey) {
        debug_assert!(!self.bound.contains_key(&a) && !self.bound.contains_key(&b));
        let (mut winner, mut loser) = (a, b);
        if self.rank_of(winner) < self.rank_of(loser) {
            std::mem::swap(&mut winner, &mut loser);
        }
        self.trail.push(Trail::Parent {
            var: loser,
            old: self.parent.get(&loser).copied(),
        });
        self.parent.insert(loser, winner);
        if self.rank_of(winner) == self.rank_of(loser) {
            let old = self.rank_of(winner);
            self.trail.push(Trail::Rank { var: winner, old });
            self.rank.insert(winner, old + 1);
        }
    }

    /// Link `loser` under `winner` unconditionally. Used by matching when
    /// one side of a variable-variable equation is rigid: the rigid
    /// variable must stay the class representative.
    fn union_directed(&mut self, winner: VarKey, loser: VarKey) {
        debug_assert!(!self.bound.contains_key(&winner) && !self.bound.contains_key(&loser));
        self.trail.push(Trail::Parent {
            var: loser,
            old: self.parent.get(&loser).copied(),
        });
        self.parent.insert(loser, winner);
    }

    fn bind(&mut self, v: VarKey, t: BankedTerm) {
        debug_assert!(!self.bound.contains_key(&v));
        self.trail.push(Trail::Bound { var: v });
        self.bound.insert(v, t);
    }

    // === Dereferencing ===

    fn var_key(&self, t: BankedTerm, terms: &TermBank) -> Option<VarKey> {
        match terms.data(t.term) {
            TermData::Var(v) => Some(VarKey::Ordinary {
                bank: t.bank,
                var: *v,
            }),
            TermData::Special(n) => Some(VarKey::Special(*n)),
            TermData::App { .. } => None,
        }
    }

    /// Chase variable bindings until an unbound root or an application.
    pub fn deref(&self, mut t: BankedTerm, terms: &TermBank) -> Deref {
        loop {
            match self.var_key(t, terms) {
                None => return Deref::App(t),
                Some(key) => {
                    let root = self.find(key);
                    match self.bound.get(&root) {
                        Some(&b) => t = b,
                        None => return Deref::Var(root),
                    }
                }
            }
        }
    }

    /// Top symbol of a special variable's current value.
    ///
    /// Unbound (or variable-valued) specials report a variable top.
    pub fn special_top(&self, n: u32, terms: &TermBank) -> Top {
        match self.bound.get(&self.find(VarKey::Special(n))) {
            None => Top::Special(n),
            Some(&t) => match self.deref(t, terms) {
                Deref::Var(VarKey::Special(m)) => Top::Special(m),
                Deref::Var(VarKey::Ordinary { var, .. }) => Top::Var(var),
                Deref::App(bt) => terms.top(bt.term),
            },
        }
    }

    /// Bind a special variable directly (used for a query's initial
    /// argument bindings). Trailed like any other mutation.
    pub fn bind_special(&mut self, n: u32, t: BankedTerm) {
        let root = self.find_compress(VarKey::Special(n));
        self.bind(root, t);
    }

    // === Occurs check ===

    fn occurs(&self, v: VarKey, t: BankedTerm, terms: &TermBank, under_theory: bool) -> Occurs {
        match self.deref(t, terms) {
            Deref::Var(root) => {
                if root != v {
                    Occurs::Clear
                } else if under_theory {
                    Occurs::TheoryOnly
                } else {
                    Occurs::Violation
                }
            }
            Deref::App(bt) => {
                let theory = match terms.data(bt.term) {
                    TermData::App { functor, .. } => self.abstraction.contains(functor),
                    _ => false,
                };
                let args: Vec<TermId> = terms.args(bt.term).to_vec();
                let mut result = Occurs::Clear;
                for arg in args {
                    match self.occurs(
                        v,
                        BankedTerm::new(arg, bt.bank),
                        terms,
                        under_theory || theory,
                    ) {
                        Occurs::Violation => return Occurs::Violation,
                        Occurs::TheoryOnly => result = Occurs::TheoryOnly,
                        Occurs::Clear => {}
                    }
                }
                result
            }
        }
    }

    /// Occurs-check a variable/term pair before binding.
    ///
    /// `Ok(true)` means bind; `Ok(false)` means every occurrence sits under
    /// a theory symbol and the pair is abstracted away unbound (unification
    /// with abstraction).
    fn bindable_after_occurs(
        &self,
        v: VarKey,
        t: BankedTerm,
        terms: &TermBank,
    ) -> Result<bool, UnifyError> {
        match self.occurs(v, t, terms, false) {
            Occurs::Clear => Ok(true),
            Occurs::TheoryOnly => Ok(false),
            Occurs::Violation => Err(UnifyError::OccursCheck),
        }
    }

    // === Unification ===

    /// Full unification with occurs check, recording all bindings.
    pub fn unify(
        &mut self,
        a: BankedTerm,
        b: BankedTerm,
        terms: &TermBank,
    ) -> Result<(), UnifyError> {
        if a == b {
            return Ok(());
        }
        match (self.deref(a, terms), self.deref(b, terms)) {
            (Deref::Var(v1), Deref::Var(v2)) => {
                if v1 != v2 {
                    self.union(v1, v2);
                }
                Ok(())
            }
            (Deref::Var(v), Deref::App(t)) | (Deref::App(t), Deref::Var(v)) => {
                if self.bindable_after_occurs(v, t, terms)? {
                    self.bind(v, t);
                }
                Ok(())
            }
            (Deref::App(t1), Deref::App(t2)) => {
                if t1.bank == t2.bank && t1.term == t2.term {
                    return Ok(());
                }
                let (f1, f2) = (terms.top(t1.term), terms.top(t2.term));
                if f1 != f2 {
                    return Err(UnifyError::FunctorMismatch);
                }
                let args1: Vec<TermId> = terms.args(t1.term).to_vec();
                let args2: Vec<TermId> = terms.args(t2.term).to_vec();
                debug_assert_eq!(args1.len(), args2.len());
                for (x, y) in args1.into_iter().zip(args2) {
                    self.unify(
                        BankedTerm::new(x, t1.bank),
                        BankedTerm::new(y, t2.bank),
                        terms,
                    )?;
                }
                Ok(())
            }
        }
    }

    /// One-way matching: only ordinary variables of `bindable` and special
    /// variables may be bound; all other variables are rigid.
    pub fn match_bind(
        &mut self,
        general: BankedTerm,
        instance: BankedTerm,
        bindable: Bank,
        terms: &TermBank,
    ) -> Result<(), UnifyError> {
        let may_bind = |v: VarKey| match v {
            VarKey::Special(_) => true,
            VarKey::Ordinary { bank, .. } => bank == bindable,
        };
        match (self.deref(general, terms), self.deref(instance, terms)) {
            (Deref::Var(v1), Deref::Var(v2)) => {
                if v1 == v2 {
                    return Ok(());
                }
                match (may_bind(v1), may_bind(v2)) {
                    (true, true) => {
                        self.union(v1, v2);
                        Ok(())
                    }
                    // A rigid variable stays the class representative so a
                    // later structural constraint on the class fails.
                    (true, false) => {
                        self.union_directed(v2, v1);
                        Ok(())
                    }
                    (false, true) => {
                        self.union_directed(v1, v2);
                        Ok(())
                    }
                    (false, false) => Err(UnifyError::FunctorMismatch),
                }
            }
            (Deref::Var(v), Deref::App(t)) | (Deref::App(t), Deref::Var(v)) => {
                if !may_bind(v) {
                    return Err(UnifyError::FunctorMismatch);
                }
                debug_assert!(
                    v.is_special()
                        || !matches!(self.occurs(v, t, terms, false), Occurs::Violation),
                    "matching created a cyclic binding"
                );
                self.bind(v, t);
                Ok(())
            }
            (Deref::App(t1), Deref::App(t2)) => {
                if t1.bank == t2.bank && t1.term == t2.term {
                    return Ok(());
                }
                if terms.top(t1.term) != terms.top(t2.term) {
                    return Err(UnifyError::FunctorMismatch);
                }
                let args1: Vec<TermId> = terms.args(t1.term).to_vec();
                let args2: Vec<TermId> = terms.args(t2.term).to_vec();
                for (x, y) in args1.into_iter().zip(args2) {
                    self.match_bind(
                        BankedTerm::new(x, t1.bank),
                        BankedTerm::new(y, t2.bank),
                        bindable,
                        terms,
                    )?;
                }
                Ok(())
            }
        }
    }

    // === Retrieval associations ===

    /// Unify the current value of a special variable with a term.
    ///
    /// The tree's `enter` step for unifier retrieval: the special variable
    /// is either bound (its value unifies with `t`) or joins `t` directly.
    pub fn unify_special(
        &mut self,
        n: u32,
        t: BankedTerm,
        terms: &TermBank,
    ) -> Result<(), UnifyError> {
        let root = self.find_compress(VarKey::Special(n));
        match self.bound.get(&root).copied() {
            Some(value) => self.unify(value, t, terms),
            None => match self.deref(t, terms) {
                Deref::Var(v2) => {
                    if root != v2 {
                        self.union(root, v2);
                    }
                    Ok(())
                }
                Deref::App(bt) => {
                    if self.bindable_after_occurs(root, bt, terms)? {
                        self.bind(root, bt);
                    }
                    Ok(())
                }
            },
        }
    }

    /// Match the current value of a special variable against a term,
    /// binding only variables of `bindable` (and specials).
    ///
    /// The tree's `enter` step for generalization retrieval (indexed side
    /// binds) and instance retrieval (query side binds).
    pub fn match_special(
        &mut self,
        n: u32,
        t: BankedTerm,
        bindable: Bank,
        terms: &TermBank,
    ) -> Result<(), UnifyError> {
        let root = self.find_compress(VarKey::Special(n));
        match self.bound.get(&root).copied() {
            Some(value) => self.match_bind(value, t, bindable, terms),
            None => match self.deref(t, terms) {
                Deref::Var(v2) => {
                    if root != v2 {
                        // The special is always bindable; keep any rigid
                        // partner as representative.
                        let rigid = match v2 {
                            VarKey::Special(_) => false,
                            VarKey::Ordinary { bank, .. } => bank != bindable,
                        };
                        if rigid {
                            self.union_directed(v2, root);
                        } else {
                            self.union(root, v2);
                        }
                    }
                    Ok(())
                }
                Deref::App(bt) => {
                    self.bind(root, bt);
                    Ok(())
                }
            },
        }
    }

    // === Applying the substitution ===

    /// Build the image of `t` under the current substitution.
    ///
    /// Unbound query-bank variables keep their identity; unbound variables
    /// of other banks are renamed apart through `renaming`.
    pub fn apply(
        &self,
        t: BankedTerm,
        terms: &mut TermBank,
        renaming: &mut Renaming,
        interner: &mut Interner,
    ) -> TermId {
        match self.deref(t, terms) {
            Deref::Var(key) => {
                let var = renaming.resolve(key, interner);
                terms.var(var)
            }
            Deref::App(bt) => {
                let (functor, args) = match terms.data(bt.term) {
                    TermData::App { functor, args } => (*functor, args.to_vec()),
                    _ => unreachable!("deref returned a non-application"),
                };
                let new_args: Vec<TermId> = args
                    .into_iter()
                    .map(|a| self.apply(BankedTerm::new(a, bt.bank), terms, renaming, interner))
                    .collect();
                terms.app_raw(functor, new_args)
            }
        }
    }
}

/// Renaming of residual (unbound) variables when applying a banked
/// substitution. Query-bank variables keep their ids; other variables get
/// fresh interned names so the conclusion's variables never collide.
#[derive(Default)]
pub struct Renaming {
    map: HashMap<VarKey, VariableId>,
}

impl Renaming {
    pub fn new() -> Self {
        Renaming::default()
    }

    fn resolve(&mut self, key: VarKey, interner: &mut Interner) -> VariableId {
        if let Some(&v) = self.map.get(&key) {
            return v;
        }
        let fresh = match key {
            VarKey::Ordinary { bank: QUERY_BANK, var } => var,
            VarKey::Ordinary { bank, var } => {
                let name = format!("{}_{}", interner.resolve_variable(var), bank.0);
                interner.intern_variable(&name)
            }
            VarKey::Special(n) => {
                // Residual specials only appear when applying a partial
                // substitution (e.g. mid-descent diagnostics).
                let name = format!("_S{}", n);
                interner.intern_variable(&name)
            }
        };
        self.map.insert(key, fresh);
        fresh
    }
}
