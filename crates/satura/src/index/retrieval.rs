//! Substitution-tree retrieval
//!
//! Depth-first descent with backtracking over one tree of the forest.
//! The three modes share the state machine and differ only in which
//! children a node admits and in the associate operation binding the
//! current special variable to a discriminator:
//!
//! | mode            | query top `f(…)`            | query top variable | associate            |
//! |-----------------|-----------------------------|--------------------|----------------------|
//! | Unifiers        | same top ∪ variable-headed  | all children       | full unification     |
//! | Generalizations | same top ∪ variable-headed  | variable-headed    | match, indexed binds |
//! | Instances       | same top only               | all children       | match, query binds   |
//!
//! Every successful `enter` pushes one backtrack frame on the working
//! substitution; sibling exhaustion and leaf departure roll exactly one
//! frame back. Dropping the iterator rolls back everything it did, leaving
//! the substitution as it was before the query started.

use crate::logic::core::term::{TermBank, TermData, TermId, Top};
use crate::unification::substitution::{BankedTerm, BindingStore, QUERY_BANK, RESULT_BANK};
use super::node::{LeafData, NodeBody, NodeId};
use super::tree::SubstitutionTree;
use std::collections::BTreeSet;
use std::hash::Hash;

/// Retrieval predicate over indexed entries
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Entries unifiable with the query
    Unifiers,
    /// Entries of which the query is an instance
    Generalizations,
    /// Entries that are instances of the query
    Instances,
}

struct Level {
    /// The special variable this level's candidates bind
    child_var: u32,
    candidates: Vec<NodeId>,
    pos: usize,
    /// Special-variable queue bookkeeping of the enter that opened this level
    consumed: Option<u32>,
    introduced: Vec<u32>,
}

struct LeafState {
    node: NodeId,
    pos: usize,
    consumed: Option<u32>,
    introduced: Vec<u32>,
}

/// A backtracking iterator over one retrieval query.
///
/// Holds the working substitution exclusively for its lifetime; at most
/// one iterator per substitution can be live.
pub struct Retrieval<'t, 's, K> {
    tree: &'t SubstitutionTree<K>,
    subst: &'s mut BindingStore,
    mode: RetrievalMode,
    levels: Vec<Level>,
    leaf: Option<LeafState>,
    /// Query positions still awaiting a match
    pending: BTreeSet<u32>,
    base_frames: usize,
}

impl<'t, 's, K: Copy + Eq + Hash> Retrieval<'t, 's, K> {
    /// Start a query against the tree under `key`.
    ///
    /// The query's argument list is bound to the initial special variables
    /// in the query bank; everything is undone when the iterator drops.
    pub fn new(
        tree: &'t SubstitutionTree<K>,
        key: K,
        query_args: &[TermId],
        mode: RetrievalMode,
        subst: &'s mut BindingStore,
        terms: &TermBank,
    ) -> Self {
        let base_frames = subst.frame_count();
        let mut retrieval = Retrieval {
            tree,
            subst,
            mode,
            levels: Vec::new(),
            leaf: None,
            pending: BTreeSet::new(),
            base_frames,
        };

        let root = match tree.root(key) {
            Some(root) => root,
            None => return retrieval,
        };

        retrieval.subst.frame();
        let mut introduced = Vec::new();
        for (i, &arg) in query_args.iter().enumerate() {
            let var = i as u32;
            retrieval
                .subst
                .bind_special(var, BankedTerm::new(arg, QUERY_BANK));
            retrieval.pending.insert(var);
            introduced.push(var);
        }

        match &tree.node(root).body {
            NodeBody::Leaf { .. } => {
                // 0-ary root: the root itself is the leaf
                retrieval.leaf = Some(LeafState {
                    node: root,
                    pos: 0,
                    consumed: None,
                    introduced,
                });
            }
            NodeBody::Internal { child_var, .. } => {
                let candidates = retrieval.admissible_children(root, *child_var, terms);
                retrieval.levels.push(Level {
                    child_var: *child_var,
                    candidates,
                    pos: 0,
                    consumed: None,
                    introduced,
                });
            }
        }
        retrieval
    }

    /// Advance to the next matching entry.
    pub fn next_match(&mut self, terms: &TermBank) -> Option<LeafData> {
        loop {
            if let Some(state) = &mut self.leaf {
                let entries = match &self.tree.node(state.node).body {
                    NodeBody::Leaf { entries } => entries.slice(),
                    NodeBody::Internal { .. } => unreachable!("leaf cursor on internal node"),
                };
                if state.pos < entries.len() {
                    let ld = entries[state.pos].clone();
                    state.pos += 1;
                    return Some(ld);
                }
                // Leave the leaf
                let state = self.leaf.take().unwrap();
                self.restore_pending(state.consumed, &state.introduced);
                self.subst.rollback();
            }

            let level = self.levels.last_mut()?;
            if level.pos >= level.candidates.len() {
                let level = self.levels.pop().unwrap();
                self.restore_pending(level.consumed, &level.introduced);
                self.subst.rollback();
                continue;
            }

            let child = level.candidates[level.pos];
            level.pos += 1;
            let child_var = level.child_var;
            self.enter(child, child_var, terms);
        }
    }

    /// Associate the discriminator of `child` with the current special
    /// variable; on success descend, on failure roll the frame back so the
    /// caller tries the next sibling.
    fn enter(&mut self, child: NodeId, child_var: u32, terms: &TermBank) {
        self.subst.frame();
        let node = self.tree.node(child);
        let disc = node
            .term
            .expect("corrupt index: non-root node without discriminator");
        let disc = BankedTerm::new(disc, RESULT_BANK);

        let associated = match self.mode {
            RetrievalMode::Unifiers => self.subst.unify_special(child_var, disc, terms),
            RetrievalMode::Generalizations => {
                self.subst.match_special(child_var, disc, RESULT_BANK, terms)
            }
            RetrievalMode::Instances => {
                self.subst.match_special(child_var, disc, QUERY_BANK, terms)
            }
        };
        if associated.is_err() {
            self.subst.rollback();
            return;
        }

        debug_assert!(self.pending.contains(&child_var));
        self.pending.remove(&child_var);
        let mut introduced = Vec::new();
        for sv in collect_specials(node.term.unwrap(), terms) {
            if self.pending.insert(sv) {
                introduced.push(sv);
            }
        }

        match &node.body {
            NodeBody::Leaf { .. } => {
                debug_assert!(self.pending.is_empty(), "unbound query positions at a leaf");
                self.leaf = Some(LeafState {
                    node: child,
                    pos: 0,
                    consumed: Some(child_var),
                    introduced,
                });
            }
            NodeBody::Internal { child_var: next_var, .. } => {
                let candidates = self.admissible_children(child, *next_var, terms);
                self.levels.push(Level {
                    child_var: *next_var,
                    candidates,
                    pos: 0,
                    consumed: Some(child_var),
                    introduced,
                });
            }
        }
    }

    /// Children of `node` admissible for the current value of `child_var`,
    /// in storage order.
    fn admissible_children(&self, node: NodeId, child_var: u32, terms: &TermBank) -> Vec<NodeId> {
        let children = match &self.tree.node(node).body {
            NodeBody::Internal { children, .. } => children,
            NodeBody::Leaf { .. } => unreachable!(),
        };
        let query_top = self.subst.special_top(child_var, terms);
        children
            .slice()
            .iter()
            .filter(|(child_top, _)| match query_top {
                Top::App(f) => match self.mode {
                    RetrievalMode::Unifiers | RetrievalMode::Generalizations => {
                        child_top.is_var() || *child_top == Top::App(f)
                    }
                    RetrievalMode::Instances => *child_top == Top::App(f),
                },
                _ => match self.mode {
                    RetrievalMode::Unifiers | RetrievalMode::Instances => true,
                    RetrievalMode::Generalizations => child_top.is_var(),
                },
            })
            .map(|&(_, n)| n)
            .collect()
    }

    fn restore_pending(&mut self, consumed: Option<u32>, introduced: &[u32]) {
        for sv in introduced {
            self.pending.remove(sv);
        }
        if let Some(sv) = consumed {
            self.pending.insert(sv);
        }
    }

    /// The working substitution at the current match
    pub fn substitution(&self) -> &BindingStore {
        self.subst
    }
}

impl<'t, 's, K> Drop for Retrieval<'t, 's, K> {
    fn drop(&mut self) {
        // Cancellation safety: every outstanding frame this iterator
        // pushed is rolled back before the substitution is released.
        while self.subst.frame_count() > self.base_frames {
            self.subst.rollback();
        }
    }
}

/// Special variables occurring in a discriminator
fn collect_specials(t: TermId, terms: &TermBank) -> Vec<u32> {
    let mut out = Vec::new();
    collect_specials_into(t, terms, &mut out);
    out
}

fn collect_specials_into(t: TermId, terms: &TermBank, out: &mut Vec<u32>) {
    match terms.data(t) {
        TermData::Special(n) => {
            if !out.contains(n) {
                out.push(*n);
            }
        }
        TermData::Var(_) => {}
        TermData::App { args, .. } => {
            for &a in args.iter() {
                collect_specials_into(a, terms, out);
            }
        }
    }
}
