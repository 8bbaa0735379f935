//! Substitution-tree node records
//!
//! Nodes live in an arena owned by the tree; children are id arrays keyed
//! by the top symbol of the child's discriminator. Child collections and
//! leaf entry sets each have an unsorted and an ordered representation
//! with promotion at configurable size thresholds; promotion is a
//! constructive rebuild of the collection.

use crate::logic::core::term::{TermId, Top};

/// Index of a node in the tree arena
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// What a leaf stores: a clause/literal reference, plus the indexed
/// subterm for term indices.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LeafData {
    pub clause: usize,
    pub literal: usize,
    pub term: Option<TermId>,
}

/// Small unsorted array bound; beyond it collections become lists and
/// eventually ordered sets.
pub const SMALL_ARRAY_MAX: usize = 4;

/// Child collection of an internal node.
///
/// `Array` is a small unsorted array (at most [`SMALL_ARRAY_MAX`]),
/// `List` an unsorted list, `Ordered` sorted ascending by top symbol.
#[derive(Debug, Clone)]
pub enum ChildSet {
    Array(Vec<(Top, NodeId)>),
    List(Vec<(Top, NodeId)>),
    Ordered(Vec<(Top, NodeId)>),
}

impl ChildSet {
    pub fn singleton(top: Top, child: NodeId) -> Self {
        ChildSet::Array(vec![(top, child)])
    }

    pub fn len(&self) -> usize {
        self.slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slice().is_empty()
    }

    /// Children in storage order (ordered representations ascend by top)
    pub fn slice(&self) -> &[(Top, NodeId)] {
        match self {
            ChildSet::Array(v) | ChildSet::List(v) | ChildSet::Ordered(v) => v,
        }
    }

    /// The child whose discriminator has the given top, if any.
    ///
    /// No two siblings share a top, so the result is unique.
    pub fn by_top(&self, top: Top) -> Option<NodeId> {
        match self {
            ChildSet::Array(v) | ChildSet::List(v) => {
                v.iter().find(|(t, _)| *t == top).map(|&(_, n)| n)
            }
            ChildSet::Ordered(v) => v
                .binary_search_by(|(t, _)| t.cmp(&top))
                .ok()
                .map(|i| v[i].1),
        }
    }

    /// Add a child under a top symbol not yet present
    pub fn add(&mut self, top: Top, child: NodeId) {
        debug_assert!(self.by_top(top).is_none(), "sibling tops must be unique");
        match self {
            ChildSet::Array(v) | ChildSet::List(v) => v.push((top, child)),
            ChildSet::Ordered(v) => {
                let pos = v
                    .binary_search_by(|(t, _)| t.cmp(&top))
                    .unwrap_err();
                v.insert(pos, (top, child));
            }
        }
    }

    /// Remove the child under a top symbol; panics when absent.
    pub fn remove(&mut self, top: Top) {
        match self {
            ChildSet::Array(v) | ChildSet::List(v) => {
                let pos = v
                    .iter()
                    .position(|(t, _)| *t == top)
                    .expect("corrupt index: removing an absent child");
                v.swap_remove(pos);
            }
            ChildSet::Ordered(v) => {
                let pos = v
                    .binary_search_by(|(t, _)| t.cmp(&top))
                    .expect("corrupt index: removing an absent child");
                v.remove(pos);
            }
        }
    }

    /// Apply the node-efficiency policy after an insertion.
    ///
    /// Past the small-array bound, a collection becomes an ordered set once
    /// it exceeds `threshold` entries and an unsorted list otherwise.
    pub fn ensure_efficiency(&mut self, threshold: usize) {
        let len = self.len();
        let promote_ordered = len > threshold;
        match self {
            ChildSet::Array(v) if len > SMALL_ARRAY_MAX => {
                let mut v = std::mem::take(v);
                if promote_ordered {
                    v.sort_by(|(a, _), (b, _)| a.cmp(b));
                    *self = ChildSet::Ordered(v);
                } else {
                    *self = ChildSet::List(v);
                }
            }
            ChildSet::List(v) if promote_ordered => {
                let mut v = std::mem::take(v);
                v.sort_by(|(a, _), (b, _)| a.cmp(b));
                *self = ChildSet::Ordered(v);
            }
            _ => {}
        }
    }
}

/// Leaf entry collection: unsorted list promoted to an ordered set.
#[derive(Debug, Clone)]
pub enum LeafEntries {
    List(Vec<LeafData>),
    Ordered(Vec<LeafData>),
}

impl LeafEntries {
    pub fn singleton(ld: LeafData) -> Self {
        LeafEntries::List(vec![ld])
    }

    pub fn len(&self) -> usize {
        self.slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slice().is_empty()
    }

    pub fn slice(&self) -> &[LeafData] {
        match self {
            LeafEntries::List(v) | LeafEntries::Ordered(v) => v,
        }
    }

    pub fn add(&mut self, ld: LeafData) {
        match self {
            LeafEntries::List(v) => v.push(ld),
            LeafEntries::Ordered(v) => {
                let pos = v.binary_search(&ld).unwrap_or_else(|p| p);
                v.insert(pos, ld);
            }
        }
    }

    /// Remove an entry; panics when absent.
    pub fn remove(&mut self, ld: &LeafData) {
        match self {
            LeafEntries::List(v) => {
                let pos = v
                    .iter()
                    .position(|e| e == ld)
                    .expect("corrupt index: removing an absent leaf entry");
                v.swap_remove(pos);
            }
            LeafEntries::Ordered(v) => {
                let pos = v
                    .binary_search(ld)
                    .expect("corrupt index: removing an absent leaf entry");
                v.remove(pos);
            }
        }
    }

    pub fn ensure_efficiency(&mut self, threshold: usize) {
        if let LeafEntries::List(v) = self {
            if v.len() > threshold {
                let mut v = std::mem::take(v);
                v.sort();
                *self = LeafEntries::Ordered(v);
            }
        }
    }
}

/// One node of a substitution tree
#[derive(Debug, Clone)]
pub struct Node {
    /// The discriminator: this argument position's partial value.
    /// Root nodes have no discriminator.
    pub term: Option<TermId>,
    pub body: NodeBody,
}

#[derive(Debug, Clone)]
pub enum NodeBody {
    Internal {
        /// The special variable every child's discriminator binds
        child_var: u32,
        children: ChildSet,
    },
    Leaf {
        entries: LeafEntries,
    },
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf { .. })
    }

    pub fn is_empty(&self) -> bool {
        match &self.body {
            NodeBody::Internal { children, .. } => children.is_empty(),
            NodeBody::Leaf { entries } => entries.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::interner::Interner;

    fn tops(interner: &mut Interner, n: usize) -> Vec<Top> {
        (0..n)
            .map(|i| Top::App(interner.intern_function(&format!("f{}", i), 1)))
            .collect()
    }

    #[test]
    fn test_promotion_to_ordered() {
        let mut interner = Interner::new();
        let tops = tops(&mut interner, 6);

        let mut set = ChildSet::singleton(tops[0], NodeId(0));
        for (i, &t) in tops.iter().enumerate().skip(1) {
            set.add(t, NodeId(i as u32));
            set.ensure_efficiency(3);
        }

        // 6 children with threshold 3: must be ordered by now
        assert!(matches!(set, ChildSet::Ordered(_)));
        let slice = set.slice();
        for w in slice.windows(2) {
            assert!(w[0].0 < w[1].0, "ordered children ascend by top");
        }
        // Lookup still finds each child
        for (i, &t) in tops.iter().enumerate() {
            assert_eq!(set.by_top(t), Some(NodeId(i as u32)));
        }
    }

    #[test]
    fn test_small_array_stays_small() {
        let mut interner = Interner::new();
        let tops = tops(&mut interner, 4);

        let mut set = ChildSet::singleton(tops[0], NodeId(0));
        for (i, &t) in tops.iter().enumerate().skip(1) {
            set.add(t, NodeId(i as u32));
            set.ensure_efficiency(5);
        }
        assert!(matches!(set, ChildSet::Array(_)));
    }

    #[test]
    fn test_leaf_entry_promotion() {
        let mut entries = LeafEntries::singleton(LeafData {
            clause: 0,
            literal: 0,
            term: None,
        });
        for i in 1..8 {
            entries.add(LeafData {
                clause: i,
                literal: 0,
                term: None,
            });
            entries.ensure_efficiency(5);
        }
        assert!(matches!(entries, LeafEntries::Ordered(_)));
        assert_eq!(entries.len(), 8);

        entries.remove(&LeafData {
            clause: 3,
            literal: 0,
            term: None,
        });
        assert_eq!(entries.len(), 7);
    }

    #[test]
    #[should_panic(expected = "corrupt index")]
    fn test_removing_absent_entry_panics() {
        let mut entries = LeafEntries::singleton(LeafData {
            clause: 0,
            literal: 0,
            term: None,
        });
        entries.remove(&LeafData {
            clause: 9,
            literal: 9,
            term: None,
        });
    }
}
