//! Perfectly shared first-order terms
//!
//! Terms are hash-consed into a `TermBank` arena: two structurally equal
//! terms always get the same `TermId`, so equality is an id comparison.
//! Each shared term caches its weight (total symbol count), groundness, and
//! sorted free-variable set. Shared terms are immutable and live for the
//! whole run.
//!
//! A term is an ordinary variable, a *special* variable (introduced by
//! substitution-tree node splitting, never part of input clauses), or a
//! function application with fixed arity. Constants are 0-ary applications.

use crate::logic::interner::{FunctionId, Interner, VariableId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Identity of a shared term. Equal ids mean structurally equal terms.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

// Terms serialize as their arena id; resolution needs the bank.
impl Serialize for TermId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TermId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(TermId)
    }
}

/// A function symbol paired with its arity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionSymbol {
    pub id: FunctionId,
    pub arity: u8,
}

impl FunctionSymbol {
    pub fn new(id: FunctionId, arity: u8) -> Self {
        FunctionSymbol { id, arity }
    }

    pub fn name<'a>(&self, interner: &'a Interner) -> &'a str {
        interner.resolve_function(self.id)
    }
}

/// Structure of a shared term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermData {
    /// An ordinary variable (bank-relative during retrieval)
    Var(VariableId),
    /// A special variable internal to the substitution tree
    Special(u32),
    /// A function application; constants have an empty argument list
    App { functor: FunctionId, args: Box<[TermId]> },
}

/// Top symbol of a term, the discrimination key of the substitution tree.
///
/// The derived ordering (specials, then variables, then applications, each
/// ascending by id) is the storage order of ordered child collections.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Top {
    Special(u32),
    Var(VariableId),
    App(FunctionId),
}

impl Top {
    /// Variable-headed terms admit retrieval candidates in every mode
    pub fn is_var(self) -> bool {
        !matches!(self, Top::App(_))
    }
}

struct TermRecord {
    data: TermData,
    weight: u32,
    ground: bool,
    /// Sorted, deduplicated free ordinary variables
    vars: Box<[VariableId]>,
}

/// Hash-consing arena for shared terms.
///
/// `share`-by-construction: the smart constructors return the canonical
/// representative of the structural equivalence class. The table only ever
/// grows; existing terms are never mutated.
pub struct TermBank {
    records: Vec<TermRecord>,
    table: HashMap<TermData, TermId>,
}

impl Default for TermBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TermBank {
    pub fn new() -> Self {
        TermBank {
            records: Vec::new(),
            table: HashMap::new(),
        }
    }

    fn share(&mut self, data: TermData) -> TermId {
        if let Some(&id) = self.table.get(&data) {
            return id;
        }
        let (weight, ground, vars) = match &data {
            TermData::Var(v) => (1, false, vec![*v]),
            TermData::Special(_) => (1, false, Vec::new()),
            TermData::App { args, .. } => {
                let mut weight = 1u32;
                let mut ground = true;
                let mut vars: Vec<VariableId> = Vec::new();
                for &arg in args.iter() {
                    let rec = &self.records[arg.0 as usize];
                    weight += rec.weight;
                    ground &= rec.ground;
                    vars.extend_from_slice(&rec.vars);
                }
                vars.sort_unstable();
                vars.dedup();
                (weight, ground, vars)
            }
        };
        let id = TermId(self.records.len() as u32);
        self.records.push(TermRecord {
            data: data.clone(),
            weight,
            ground,
            vars: vars.into_boxed_slice(),
        });
        self.table.insert(data, id);
        id
    }

    /// Shared term for an ordinary variable
    pub fn var(&mut self, v: VariableId) -> TermId {
        self.share(TermData::Var(v))
    }

    /// Shared term for a special variable
    pub fn special(&mut self, n: u32) -> TermId {
        self.share(TermData::Special(n))
    }

    /// Shared term for a function application.
    ///
    /// Panics on a functor/arity mismatch; that is a programmer error.
    pub fn app(&mut self, functor: FunctionSymbol, args: Vec<TermId>) -> TermId {
        assert_eq!(
            functor.arity as usize,
            args.len(),
            "arity mismatch constructing application of {:?}",
            functor.id
        );
        self.share(TermData::App {
            functor: functor.id,
            args: args.into_boxed_slice(),
        })
    }

    /// Shared term for a constant (0-ary application)
    pub fn constant(&mut self, functor: FunctionSymbol) -> TermId {
        assert_eq!(functor.arity, 0, "constant with nonzero arity");
        self.share(TermData::App {
            functor: functor.id,
            args: Box::new([]),
        })
    }

    /// Build an application from a functor id and argument ids.
    ///
    /// The arity is taken from the argument count; used where the symbol
    /// table is not at hand (tree splits, substitution application).
    pub fn app_raw(&mut self, functor: FunctionId, args: Vec<TermId>) -> TermId {
        self.share(TermData::App {
            functor,
            args: args.into_boxed_slice(),
        })
    }

    /// Structure of a term
    pub fn data(&self, t: TermId) -> &TermData {
        &self.records[t.0 as usize].data
    }

    /// Top symbol of a term
    pub fn top(&self, t: TermId) -> Top {
        match self.data(t) {
            TermData::Var(v) => Top::Var(*v),
            TermData::Special(n) => Top::Special(*n),
            TermData::App { functor, .. } => Top::App(*functor),
        }
    }

    /// Argument list; empty for variables and constants
    pub fn args(&self, t: TermId) -> &[TermId] {
        match self.data(t) {
            TermData::App { args, .. } => args,
            _ => &[],
        }
    }

    /// Cached total symbol count
    pub fn weight(&self, t: TermId) -> u32 {
        self.records[t.0 as usize].weight
    }

    /// Cached groundness (no variables of either kind)
    pub fn is_ground(&self, t: TermId) -> bool {
        self.records[t.0 as usize].ground
    }

    /// Cached sorted free ordinary variables
    pub fn vars(&self, t: TermId) -> &[VariableId] {
        &self.records[t.0 as usize].vars
    }

    /// Whether `v` occurs in `t`
    pub fn contains_var(&self, t: TermId, v: VariableId) -> bool {
        self.records[t.0 as usize].vars.binary_search(&v).is_ok()
    }

    /// Whether `sub` occurs in `t` (reflexive)
    pub fn contains_subterm(&self, t: TermId, sub: TermId) -> bool {
        if t == sub {
            return true;
        }
        self.args(t).iter().any(|&a| self.contains_subterm(a, sub))
    }

    /// Count occurrences of each ordinary variable in `t`
    pub fn count_vars(&self, t: TermId, counts: &mut HashMap<VariableId, usize>) {
        match self.data(t) {
            TermData::Var(v) => {
                *counts.entry(*v).or_insert(0) += 1;
            }
            TermData::Special(_) => {}
            TermData::App { args, .. } => {
                let args: Vec<TermId> = args.to_vec();
                for a in args {
                    self.count_vars(a, counts);
                }
            }
        }
    }

    /// Replace every occurrence of `from` in `t` by `to`
    pub fn replace(&mut self, t: TermId, from: TermId, to: TermId) -> TermId {
        if t == from {
            return to;
        }
        match self.data(t) {
            TermData::Var(_) | TermData::Special(_) => t,
            TermData::App { functor, args } => {
                let functor = *functor;
                let args: Vec<TermId> = args.to_vec();
                let mut changed = false;
                let new_args: Vec<TermId> = args
                    .iter()
                    .map(|&a| {
                        let r = self.replace(a, from, to);
                        changed |= r != a;
                        r
                    })
                    .collect();
                if !changed {
                    t
                } else {
                    self.app_raw(functor, new_args)
                }
            }
        }
    }

    /// Collect every subterm of `t` in preorder (reflexive, with duplicates)
    pub fn subterms(&self, t: TermId, out: &mut Vec<TermId>) {
        out.push(t);
        for &a in self.args(t) {
            self.subterms(a, out);
        }
    }

    /// Number of distinct shared terms
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Format a term with an interner for name resolution
    pub fn display<'a>(&'a self, t: TermId, interner: &'a Interner) -> TermDisplay<'a> {
        TermDisplay {
            bank: self,
            term: t,
            interner,
        }
    }
}

impl fmt::Debug for TermBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermBank")
            .field("terms", &self.records.len())
            .finish()
    }
}

/// Display wrapper resolving symbol names through the interner
pub struct TermDisplay<'a> {
    bank: &'a TermBank,
    term: TermId,
    interner: &'a Interner,
}

impl<'a> fmt::Display for TermDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bank.data(self.term) {
            TermData::Var(v) => write!(f, "{}", self.interner.resolve_variable(*v)),
            TermData::Special(n) => write!(f, "*{}", n),
            TermData::App { functor, args } => {
                write!(f, "{}", self.interner.resolve_function(*functor))?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, &arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", self.bank.display(arg, self.interner))?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}
