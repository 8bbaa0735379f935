//! Substitution-tree forest: insertion and deletion
//!
//! One top-level tree per root symbol. The sequence of discriminators from
//! a root to a leaf, composed with the bindings taken during descent,
//! reconstructs the indexed argument list up to variable renaming. Nodes
//! live in a slot arena; deletion frees slots back to a free list.
//!
//! Insertion follows the classic scheme: the entry's argument list seeds a
//! binding queue keyed by special-variable id; descent consumes the binding
//! for the current node's child variable; a disagreement between the
//! binding's term and a child's discriminator is resolved by abstracting
//! the disagreement positions with fresh special variables (a split) and
//! queueing the entry-side subterms under them.

use crate::logic::core::term::{TermBank, TermId, Top};
use crate::logic::interner::Interner;
use super::binding::BindingQueue;
use super::node::{ChildSet, LeafData, LeafEntries, Node, NodeBody, NodeId};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::hash::Hash;

/// Default promotion threshold for leaf entry collections
pub const DEFAULT_LEAF_THRESHOLD: usize = 5;
/// Default promotion threshold for internal child collections
pub const DEFAULT_INTERNAL_THRESHOLD: usize = 3;

/// A forest of substitution trees keyed by root symbol `K`.
pub struct SubstitutionTree<K> {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    roots: HashMap<K, NodeId>,
    next_special: u32,
    leaf_threshold: usize,
    internal_threshold: usize,
    entry_count: usize,
}

impl<K: Copy + Eq + Hash> Default for SubstitutionTree<K> {
    fn default() -> Self {
        Self::new(DEFAULT_LEAF_THRESHOLD, DEFAULT_INTERNAL_THRESHOLD)
    }
}

impl<K: Copy + Eq + Hash> SubstitutionTree<K> {
    pub fn new(leaf_threshold: usize, internal_threshold: usize) -> Self {
        SubstitutionTree {
            nodes: Vec::new(),
            free: Vec::new(),
            roots: HashMap::new(),
            next_special: 0,
            leaf_threshold,
            internal_threshold,
            entry_count: 0,
        }
    }

    pub fn root(&self, key: K) -> Option<NodeId> {
        self.roots.get(&key).copied()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0 as usize]
            .as_ref()
            .expect("corrupt index: dangling node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0 as usize]
            .as_mut()
            .expect("corrupt index: dangling node id")
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0 as usize] = Some(node);
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(Some(node));
                id
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.0 as usize] = None;
        self.free.push(id);
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert an entry under the given root symbol.
    pub fn insert(&mut self, key: K, args: &[TermId], ld: LeafData, terms: &mut TermBank) {
        let mut bq = BindingQueue::new();
        for (i, &arg) in args.iter().enumerate() {
            let var = i as u32;
            if self.next_special <= var {
                self.next_special = var + 1;
            }
            bq.insert(var, arg);
        }

        self.entry_count += 1;
        match self.roots.get(&key).copied() {
            None => {
                let root = if bq.is_empty() {
                    self.alloc(Node {
                        term: None,
                        body: NodeBody::Leaf {
                            entries: LeafEntries::singleton(ld),
                        },
                    })
                } else {
                    let (var, term) = bq.pop_min().unwrap();
                    let branch = self.build_branch(term, &mut bq, ld, terms);
                    let top = terms.top(term);
                    self.alloc(Node {
                        term: None,
                        body: NodeBody::Internal {
                            child_var: var,
                            children: ChildSet::singleton(top, branch),
                        },
                    })
                };
                self.roots.insert(key, root);
            }
            Some(root) => self.insert_at(root, &mut bq, ld, terms),
        }
    }

    /// Build a fresh path: a chain of nodes consuming the queue in
    /// ascending variable order, ending in a leaf holding `ld`.
    fn build_branch(
        &mut self,
        first: TermId,
        bq: &mut BindingQueue,
        ld: LeafData,
        terms: &TermBank,
    ) -> NodeId {
        let mut chain: Vec<(u32, TermId)> = Vec::new();
        while let Some(binding) = bq.pop_min() {
            chain.push(binding);
        }

        let last_term = chain.last().map(|&(_, t)| t).unwrap_or(first);
        let mut node = self.alloc(Node {
            term: Some(last_term),
            body: NodeBody::Leaf {
                entries: LeafEntries::singleton(ld),
            },
        });
        let mut node_top = terms.top(last_term);

        // Wrap the leaf in intermediate nodes from the bottom up
        for i in (0..chain.len()).rev() {
            let (var, _) = chain[i];
            let term = if i == 0 { first } else { chain[i - 1].1 };
            node = self.alloc(Node {
                term: Some(term),
                body: NodeBody::Internal {
                    child_var: var,
                    children: ChildSet::singleton(node_top, node),
                },
            });
            node_top = terms.top(term);
        }
        node
    }

    fn insert_at(&mut self, mut node_id: NodeId, bq: &mut BindingQueue, ld: LeafData, terms: &mut TermBank) {
        loop {
            let child_var = match &self.node(node_id).body {
                NodeBody::Leaf { .. } => {
                    debug_assert!(bq.is_empty(), "bindings left at a leaf");
                    self.leaf_insert(node_id, ld);
                    return;
                }
                NodeBody::Internal { child_var, .. } => *child_var,
            };

            let term = bq
                .remove(child_var)
                .expect("corrupt index: no binding for the node's child variable");
            let top = terms.top(term);

            match self.child_by_top(node_id, top) {
                None => {
                    let branch = self.build_branch(term, bq, ld, terms);
                    self.add_child(node_id, top, branch);
                    return;
                }
                Some(child_id) => {
                    let ss = self
                        .node(child_id)
                        .term
                        .expect("corrupt index: non-root node without discriminator");
                    if ss != term {
                        // Same top, different terms: abstract the
                        // disagreement positions.
                        let mut splits: Vec<(u32, TermId)> = Vec::new();
                        let gen = self.common(ss, term, bq, &mut splits, terms);
                        if !splits.is_empty() {
                            self.split_node(child_id, gen, &splits, terms);
                        }
                    }
                    node_id = child_id;
                }
            }
        }
    }

    /// Most specific common generalization of a node discriminator `s` and
    /// an entry term `t` with the same top.
    ///
    /// At each disagreement: an existing special variable on the node side
    /// just takes a new queue binding; any other position is abstracted
    /// with a fresh special variable recorded in `splits` (special ↦ old
    /// node subterm) and queued for the entry side.
    fn common(
        &mut self,
        s: TermId,
        t: TermId,
        bq: &mut BindingQueue,
        splits: &mut Vec<(u32, TermId)>,
        terms: &mut TermBank,
    ) -> TermId {
        if s == t {
            return s;
        }
        let (s_top, t_top) = (terms.top(s), terms.top(t));
        if s_top == t_top {
            // Both applications of the same functor (equal variables would
            // have been caught by identity above)
            let s_args = terms.args(s).to_vec();
            let t_args = terms.args(t).to_vec();
            debug_assert_eq!(s_args.len(), t_args.len());
            let functor = match s_top {
                Top::App(f) => f,
                _ => unreachable!("same non-application tops must be identical terms"),
            };
            let mut changed = false;
            let mut new_args = Vec::with_capacity(s_args.len());
            for (&sa, &ta) in s_args.iter().zip(t_args.iter()) {
                let na = self.common(sa, ta, bq, splits, terms);
                changed |= na != sa;
                new_args.push(na);
            }
            if changed {
                terms.app_raw(functor, new_args)
            } else {
                s
            }
        } else if let Top::Special(x) = s_top {
            bq.insert(x, t);
            s
        } else {
            let x = self.next_special;
            self.next_special += 1;
            splits.push((x, s));
            bq.insert(x, t);
            terms.special(x)
        }
    }

    /// Re-root a node whose discriminator was generalized: the node keeps
    /// its place under its parent (the top is unchanged) with the
    /// generalized discriminator, and a chain of intermediate nodes binding
    /// the fresh special variables to the split-out subterms leads to the
    /// node's original body.
    fn split_node(&mut self, node_id: NodeId, gen: TermId, splits: &[(u32, TermId)], terms: &TermBank) {
        debug_assert!(!splits.is_empty());
        let old_body = std::mem::replace(
            &mut self.node_mut(node_id).body,
            NodeBody::Leaf {
                entries: LeafEntries::List(Vec::new()),
            },
        );

        // Bottom of the chain carries the original body
        let (_, last_term) = *splits.last().unwrap();
        let mut below = self.alloc(Node {
            term: Some(last_term),
            body: old_body,
        });

        for i in (0..splits.len() - 1).rev() {
            let (var_below, _) = splits[i + 1];
            let (_, term_i) = splits[i];
            let top = terms.top(self.node(below).term.unwrap());
            below = self.alloc(Node {
                term: Some(term_i),
                body: NodeBody::Internal {
                    child_var: var_below,
                    children: ChildSet::singleton(top, below),
                },
            });
        }

        let below_top = terms.top(self.node(below).term.unwrap());
        let node = self.node_mut(node_id);
        node.term = Some(gen);
        node.body = NodeBody::Internal {
            child_var: splits[0].0,
            children: ChildSet::singleton(below_top, below),
        };
    }

    fn child_by_top(&self, node: NodeId, top: Top) -> Option<NodeId> {
        match &self.node(node).body {
            NodeBody::Internal { children, .. } => children.by_top(top),
            NodeBody::Leaf { .. } => None,
        }
    }

    fn add_child(&mut self, node: NodeId, top: Top, child: NodeId) {
        let threshold = self.internal_threshold;
        match &mut self.node_mut(node).body {
            NodeBody::Internal { children, .. } => {
                children.add(top, child);
                children.ensure_efficiency(threshold);
            }
            NodeBody::Leaf { .. } => panic!("corrupt index: adding a child to a leaf"),
        }
    }

    fn leaf_insert(&mut self, node: NodeId, ld: LeafData) {
        let threshold = self.leaf_threshold;
        match &mut self.node_mut(node).body {
            NodeBody::Leaf { entries } => {
                entries.add(ld);
                entries.ensure_efficiency(threshold);
            }
            NodeBody::Internal { .. } => panic!("corrupt index: leaf insert on an internal node"),
        }
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Remove an entry. Panics (`corrupt index`) when the entry is absent;
    /// that is a precondition violation.
    ///
    /// Emptied nodes are pruned upward and split nodes left with a single
    /// child are coalesced, so inserting an entry and removing it restores
    /// the tree's prior structure.
    pub fn remove(&mut self, key: K, args: &[TermId], ld: &LeafData, terms: &mut TermBank) {
        let root = *self
            .roots
            .get(&key)
            .expect("corrupt index: removing from an absent root tree");

        let mut bq = BindingQueue::new();
        for (i, &arg) in args.iter().enumerate() {
            bq.insert(i as u32, arg);
        }

        let mut path: Vec<NodeId> = vec![root];
        let mut node_id = root;
        while !bq.is_empty() {
            let child_var = match &self.node(node_id).body {
                NodeBody::Internal { child_var, .. } => *child_var,
                NodeBody::Leaf { .. } => panic!("corrupt index: bindings left at a leaf"),
            };
            let term = bq
                .remove(child_var)
                .expect("corrupt index: no binding for the node's child variable");
            let child = self
                .child_by_top(node_id, terms.top(term))
                .expect("corrupt index: entry absent from the tree");
            let ss = self.node(child).term.unwrap();
            if ss != term {
                Self::disagreement_bindings(ss, term, &mut bq, terms);
            }
            path.push(child);
            node_id = child;
        }

        match &mut self.node_mut(node_id).body {
            NodeBody::Leaf { entries } => entries.remove(ld),
            NodeBody::Internal { .. } => panic!("corrupt index: entry path ends at an internal node"),
        }
        self.entry_count -= 1;

        // Remove emptied nodes bottom-up
        while let Some(&id) = path.last() {
            if !self.node(id).is_empty() {
                break;
            }
            path.pop();
            match path.last() {
                Some(&parent) => {
                    let top = terms.top(self.node(id).term.unwrap());
                    match &mut self.node_mut(parent).body {
                        NodeBody::Internal { children, .. } => children.remove(top),
                        NodeBody::Leaf { .. } => unreachable!(),
                    }
                    self.release(id);
                }
                None => {
                    // The root itself emptied out
                    self.roots.retain(|_, &mut r| r != id);
                    self.release(id);
                    break;
                }
            }
        }

        // Coalesce split nodes along the surviving path
        while let Some(id) = path.pop() {
            self.try_merge(id, terms);
        }
    }

    /// Undo a split: a node whose discriminator contains the special
    /// variable its single remaining child binds absorbs that child,
    /// substituting the child's discriminator back into its own.
    fn try_merge(&mut self, id: NodeId, terms: &mut TermBank) {
        loop {
            let node = self.node(id);
            let gen = match node.term {
                Some(t) => t,
                None => return,
            };
            let (child_var, child) = match &node.body {
                NodeBody::Internal { child_var, children } if children.len() == 1 => {
                    (*child_var, children.slice()[0].1)
                }
                _ => return,
            };
            let sv = terms.special(child_var);
            if !terms.contains_subterm(gen, sv) {
                return;
            }

            let child_node = self.nodes[child.0 as usize]
                .take()
                .expect("corrupt index: dangling node id");
            self.free.push(child);
            let merged = terms.replace(
                gen,
                sv,
                child_node
                    .term
                    .expect("corrupt index: non-root node without discriminator"),
            );
            let node = self.node_mut(id);
            node.term = Some(merged);
            node.body = child_node.body;
        }
    }

    /// Walk a node discriminator against the entry term, queueing bindings
    /// at the special-variable positions. Any other disagreement means the
    /// entry was never inserted.
    fn disagreement_bindings(s: TermId, t: TermId, bq: &mut BindingQueue, terms: &TermBank) {
        if s == t {
            return;
        }
        match terms.top(s) {
            Top::Special(x) => bq.insert(x, t),
            top if top == terms.top(t) => {
                let s_args = terms.args(s).to_vec();
                let t_args = terms.args(t).to_vec();
                for (sa, ta) in s_args.into_iter().zip(t_args) {
                    Self::disagreement_bindings(sa, ta, bq, terms);
                }
            }
            _ => panic!("corrupt index: entry absent from the tree"),
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Canonical structural dump, independent of child storage
    /// representation: children print sorted by top symbol. Two trees with
    /// the same dump are structurally identical.
    pub fn dump(&self, terms: &TermBank, interner: &Interner) -> String
    where
        K: Ord + std::fmt::Debug,
    {
        let mut out = String::new();
        let mut keys: Vec<&K> = self.roots.keys().collect();
        keys.sort();
        for key in keys {
            let _ = writeln!(out, "{:?}:", key);
            self.dump_node(self.roots[key], 1, &mut out, terms, interner);
        }
        out
    }

    fn dump_node(
        &self,
        id: NodeId,
        indent: usize,
        out: &mut String,
        terms: &TermBank,
        interner: &Interner,
    ) {
        let node = self.node(id);
        let pad = "  ".repeat(indent);
        if let Some(t) = node.term {
            let _ = writeln!(out, "{}{}", pad, terms.display(t, interner));
        }
        match &node.body {
            NodeBody::Leaf { entries } => {
                let mut entries: Vec<&LeafData> = entries.slice().iter().collect();
                entries.sort();
                for ld in entries {
                    let _ = writeln!(out, "{}  [{}#{}]", pad, ld.clause, ld.literal);
                }
            }
            NodeBody::Internal { child_var, children } => {
                let _ = writeln!(out, "{}  <*{}>", pad, child_var);
                let mut kids: Vec<(Top, NodeId)> = children.slice().to_vec();
                kids.sort_by(|(a, _), (b, _)| a.cmp(b));
                for (_, child) in kids {
                    self.dump_node(child, indent + 1, out, terms, interner);
                }
            }
        }
    }
}
