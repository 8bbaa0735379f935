//! Symbol interning and the signature table
//!
//! Every symbol the prover touches is interned up front so the hot paths
//! compare `u32` ids instead of strings. The signature assigns a dense id
//! per `(name, arity)` pair for functions and predicates; variables and
//! sorts are interned by name alone. Constants are 0-ary functions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// ID for an interned variable name
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub(crate) u32);

/// ID for an interned `(function name, arity)` pair
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub(crate) u32);

/// ID for an interned `(predicate name, arity)` pair
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateId(pub(crate) u32);

/// ID for an interned sort name
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortId(pub(crate) u32);

impl VariableId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl FunctionId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl PredicateId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl SortId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct FunctionEntry {
    name: String,
    arity: u8,
    sort: SortId,
    /// Theory symbols (numerals) get relaxed occurs-check treatment when
    /// unification with abstraction is enabled.
    theory: bool,
}

#[derive(Debug, Clone)]
struct PredicateEntry {
    name: String,
    arity: u8,
}

/// Symbol interner and signature table.
///
/// Owned by the `Environment` and threaded through the loop and components;
/// there is no global state.
#[derive(Debug, Clone)]
pub struct Interner {
    variables: Vec<String>,
    variable_lookup: HashMap<String, u32>,
    functions: Vec<FunctionEntry>,
    function_lookup: HashMap<(String, u8), u32>,
    predicates: Vec<PredicateEntry>,
    predicate_lookup: HashMap<(String, u8), u32>,
    sorts: Vec<String>,
    sort_lookup: HashMap<String, u32>,
    equality: PredicateId,
    individual_sort: SortId,
    integer_sort: SortId,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Create a new interner with the built-in symbols (`=`, `$i`, `$int`)
    /// already present.
    pub fn new() -> Self {
        let mut interner = Interner {
            variables: Vec::new(),
            variable_lookup: HashMap::new(),
            functions: Vec::new(),
            function_lookup: HashMap::new(),
            predicates: Vec::new(),
            predicate_lookup: HashMap::new(),
            sorts: Vec::new(),
            sort_lookup: HashMap::new(),
            equality: PredicateId(0),
            individual_sort: SortId(0),
            integer_sort: SortId(0),
        };
        interner.individual_sort = interner.intern_sort("$i");
        interner.integer_sort = interner.intern_sort("$int");
        interner.equality = interner.intern_predicate("=", 2);
        interner
    }

    // === Variables ===

    /// Intern a variable name, returning its ID (get-or-create)
    pub fn intern_variable(&mut self, name: &str) -> VariableId {
        if let Some(&id) = self.variable_lookup.get(name) {
            return VariableId(id);
        }
        let id = self.variables.len() as u32;
        self.variables.push(name.to_string());
        self.variable_lookup.insert(name.to_string(), id);
        VariableId(id)
    }

    /// Resolve a variable ID to its name
    pub fn resolve_variable(&self, id: VariableId) -> &str {
        &self.variables[id.0 as usize]
    }

    /// Number of interned variables
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    // === Functions ===

    /// Intern a `(function name, arity)` pair with the default sort
    pub fn intern_function(&mut self, name: &str, arity: u8) -> FunctionId {
        let sort = self.individual_sort;
        self.intern_function_sorted(name, arity, sort)
    }

    /// Intern a `(function name, arity)` pair with an explicit result sort
    pub fn intern_function_sorted(&mut self, name: &str, arity: u8, sort: SortId) -> FunctionId {
        if let Some(&id) = self.function_lookup.get(&(name.to_string(), arity)) {
            return FunctionId(id);
        }
        let id = self.functions.len() as u32;
        self.functions.push(FunctionEntry {
            name: name.to_string(),
            arity,
            sort,
            theory: false,
        });
        self.function_lookup.insert((name.to_string(), arity), id);
        FunctionId(id)
    }

    /// Intern an integer constant from its lexeme.
    ///
    /// Lexemes that fit in `i64` become theory numerals; on overflow the
    /// lexeme is kept as an uninterpreted constant of the integer sort.
    pub fn intern_numeral(&mut self, lexeme: &str) -> FunctionId {
        let sort = self.integer_sort;
        match lexeme.parse::<i64>() {
            Ok(value) => {
                let id = self.intern_function_sorted(&value.to_string(), 0, sort);
                self.functions[id.0 as usize].theory = true;
                id
            }
            Err(_) => self.intern_function_sorted(lexeme, 0, sort),
        }
    }

    /// Resolve a function ID to its name
    pub fn resolve_function(&self, id: FunctionId) -> &str {
        &self.functions[id.0 as usize].name
    }

    /// Arity of a function symbol
    pub fn function_arity(&self, id: FunctionId) -> u8 {
        self.functions[id.0 as usize].arity
    }

    /// Result sort of a function symbol
    pub fn function_sort(&self, id: FunctionId) -> SortId {
        self.functions[id.0 as usize].sort
    }

    /// Whether a function symbol is a theory symbol (numeral)
    pub fn is_theory(&self, id: FunctionId) -> bool {
        self.functions[id.0 as usize].theory
    }

    /// Get an already-interned function (returns None if not present)
    pub fn get_function(&self, name: &str, arity: u8) -> Option<FunctionId> {
        self.function_lookup
            .get(&(name.to_string(), arity))
            .copied()
            .map(FunctionId)
    }

    /// Number of interned functions
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// All theory symbols currently in the signature
    pub fn theory_functions(&self) -> std::collections::HashSet<FunctionId> {
        self.functions
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.theory)
            .map(|(i, _)| FunctionId(i as u32))
            .collect()
    }

    // === Predicates ===

    /// Intern a `(predicate name, arity)` pair
    pub fn intern_predicate(&mut self, name: &str, arity: u8) -> PredicateId {
        if let Some(&id) = self.predicate_lookup.get(&(name.to_string(), arity)) {
            return PredicateId(id);
        }
        let id = self.predicates.len() as u32;
        self.predicates.push(PredicateEntry {
            name: name.to_string(),
            arity,
        });
        self.predicate_lookup.insert((name.to_string(), arity), id);
        PredicateId(id)
    }

    /// Resolve a predicate ID to its name
    pub fn resolve_predicate(&self, id: PredicateId) -> &str {
        &self.predicates[id.0 as usize].name
    }

    /// Arity of a predicate symbol
    pub fn predicate_arity(&self, id: PredicateId) -> u8 {
        self.predicates[id.0 as usize].arity
    }

    /// The built-in equality predicate
    pub fn equality(&self) -> PredicateId {
        self.equality
    }

    /// Number of interned predicates
    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    // === Sorts ===

    /// Intern a sort name, returning its ID (get-or-create)
    pub fn intern_sort(&mut self, name: &str) -> SortId {
        if let Some(&id) = self.sort_lookup.get(name) {
            return SortId(id);
        }
        let id = self.sorts.len() as u32;
        self.sorts.push(name.to_string());
        self.sort_lookup.insert(name.to_string(), id);
        SortId(id)
    }

    /// Resolve a sort ID to its name
    pub fn resolve_sort(&self, id: SortId) -> &str {
        &self.sorts[id.0 as usize]
    }

    /// The default sort of individuals (`$i`)
    pub fn individual_sort(&self) -> SortId {
        self.individual_sort
    }

    /// The integer sort (`$int`)
    pub fn integer_sort(&self) -> SortId {
        self.integer_sort
    }
}

// === Display implementations for debugging ===

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// === Serde implementations ===
// IDs serialize as bare u32 for compact event logs.

impl Serialize for VariableId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VariableId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(VariableId)
    }
}

impl Serialize for FunctionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FunctionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(FunctionId)
    }
}

impl Serialize for PredicateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PredicateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(PredicateId)
    }
}

impl Serialize for SortId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SortId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(SortId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_interning() {
        let mut interner = Interner::new();

        let x1 = interner.intern_variable("X");
        let x2 = interner.intern_variable("X");
        let y = interner.intern_variable("Y");

        assert_eq!(x1, x2);
        assert_ne!(x1, y);
        assert_eq!(interner.resolve_variable(x1), "X");
        assert_eq!(interner.resolve_variable(y), "Y");
        assert_eq!(interner.variable_count(), 2);
    }

    #[test]
    fn test_function_arity_in_key() {
        let mut interner = Interner::new();

        // Same name with different arities gets different ids
        let f1 = interner.intern_function("f", 1);
        let f2 = interner.intern_function("f", 2);
        let f1_again = interner.intern_function("f", 1);

        assert_eq!(f1, f1_again);
        assert_ne!(f1, f2);
        assert_eq!(interner.function_arity(f1), 1);
        assert_eq!(interner.function_arity(f2), 2);
        assert_eq!(interner.resolve_function(f1), "f");
    }

    #[test]
    fn test_equality_is_builtin() {
        let mut interner = Interner::new();
        let eq = interner.intern_predicate("=", 2);
        assert_eq!(eq, interner.equality());
        assert_eq!(interner.predicate_arity(eq), 2);
    }

    #[test]
    fn test_numeral_interning() {
        let mut interner = Interner::new();

        let three = interner.intern_numeral("3");
        assert!(interner.is_theory(three));
        assert_eq!(interner.function_sort(three), interner.integer_sort());
        assert_eq!(interner.resolve_function(three), "3");

        // Canonicalized lexeme maps to the same symbol
        let three_again = interner.intern_numeral("3");
        assert_eq!(three, three_again);
    }

    #[test]
    fn test_numeral_overflow_falls_back_to_constant() {
        let mut interner = Interner::new();

        let big = interner.intern_numeral("99999999999999999999999999");
        assert!(!interner.is_theory(big));
        assert_eq!(interner.function_sort(big), interner.integer_sort());
        assert_eq!(interner.function_arity(big), 0);
    }

    #[test]
    fn test_sort_interning() {
        let mut interner = Interner::new();
        let s = interner.intern_sort("list");
        let s2 = interner.intern_sort("list");
        assert_eq!(s, s2);
        assert_ne!(s, interner.individual_sort());
        assert_eq!(interner.resolve_sort(s), "list");
    }
}
