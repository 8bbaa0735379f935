//! Knuth-Bendix term ordering over shared terms

use crate::logic::interner::{FunctionId, VariableId};
use crate::logic::core::term::{TermBank, TermData, TermId};
use std::collections::HashMap;

/// Configuration for the Knuth-Bendix ordering
#[derive(Debug, Clone)]
pub struct KboConfig {
    /// Weight of each function symbol (default weight is 1)
    pub function_weights: HashMap<FunctionId, u32>,
    /// Precedence of symbols (higher value = higher precedence; default 0,
    /// ties broken by symbol id)
    pub function_precedence: HashMap<FunctionId, u32>,
    /// Weight of variables (must be positive)
    pub variable_weight: u32,
}

impl Default for KboConfig {
    fn default() -> Self {
        KboConfig {
            function_weights: HashMap::new(),
            function_precedence: HashMap::new(),
            variable_weight: 1,
        }
    }
}

/// Result of comparing two terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOrdering {
    Greater,
    Less,
    Equal,
    Incomparable,
}

/// Knuth-Bendix ordering
pub struct Kbo {
    config: KboConfig,
}

impl Kbo {
    pub fn new(config: KboConfig) -> Self {
        Kbo { config }
    }

    fn function_weight(&self, id: FunctionId) -> u32 {
        self.config.function_weights.get(&id).copied().unwrap_or(1)
    }

    fn function_precedence(&self, id: FunctionId) -> u32 {
        self.config
            .function_precedence
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    /// Weight of a term under the configured symbol weights.
    ///
    /// With the default configuration this is the bank-cached symbol count.
    pub fn term_weight(&self, t: TermId, terms: &TermBank) -> u32 {
        if self.config.function_weights.is_empty() && self.config.variable_weight == 1 {
            return terms.weight(t);
        }
        match terms.data(t) {
            TermData::Var(_) | TermData::Special(_) => self.config.variable_weight,
            TermData::App { functor, args } => {
                let mut w = self.function_weight(*functor);
                for &a in args.iter() {
                    w += self.term_weight(a, terms);
                }
                w
            }
        }
    }

    /// Compare two terms
    pub fn compare(&self, s: TermId, t: TermId, terms: &TermBank) -> TermOrdering {
        if s == t {
            return TermOrdering::Equal;
        }

        let mut vars_s: HashMap<VariableId, usize> = HashMap::new();
        let mut vars_t: HashMap<VariableId, usize> = HashMap::new();
        terms.count_vars(s, &mut vars_s);
        terms.count_vars(t, &mut vars_t);

        // s > t requires #(x, s) ≥ #(x, t) for all variables x, and dually
        let s_covers_t = vars_t.iter().all(|(v, ct)| {
            vars_s.get(v).copied().unwrap_or(0) >= *ct
        });
        let t_covers_s = vars_s.iter().all(|(v, cs)| {
            vars_t.get(v).copied().unwrap_or(0) >= *cs
        });

        let ws = self.term_weight(s, terms);
        let wt = self.term_weight(t, terms);

        if ws > wt && s_covers_t {
            TermOrdering::Greater
        } else if wt > ws && t_covers_s {
            TermOrdering::Less
        } else if ws == wt {
            if s_covers_t && t_covers_s {
                self.compare_lex(s, t, terms)
            } else if s_covers_t {
                match self.compare_lex(s, t, terms) {
                    o @ (TermOrdering::Greater | TermOrdering::Equal) => o,
                    _ => TermOrdering::Incomparable,
                }
            } else if t_covers_s {
                match self.compare_lex(s, t, terms) {
                    o @ (TermOrdering::Less | TermOrdering::Equal) => o,
                    _ => TermOrdering::Incomparable,
                }
            } else {
                TermOrdering::Incomparable
            }
        } else {
            TermOrdering::Incomparable
        }
    }

    /// Lexicographic comparison for terms of equal weight
    fn compare_lex(&self, s: TermId, t: TermId, terms: &TermBank) -> TermOrdering {
        match (terms.data(s), terms.data(t)) {
            (TermData::Var(v1), TermData::Var(v2)) => {
                if v1 == v2 {
                    TermOrdering::Equal
                } else {
                    TermOrdering::Incomparable
                }
            }
            (TermData::Var(_), _) | (TermData::Special(_), _) => TermOrdering::Less,
            (_, TermData::Var(_)) | (_, TermData::Special(_)) => TermOrdering::Greater,
            (
                TermData::App { functor: f1, args: args1 },
                TermData::App { functor: f2, args: args2 },
            ) => {
                if f1 != f2 {
                    let p1 = self.function_precedence(*f1);
                    let p2 = self.function_precedence(*f2);
                    if p1 > p2 || (p1 == p2 && f1 > f2) {
                        TermOrdering::Greater
                    } else {
                        TermOrdering::Less
                    }
                } else {
                    let args1: Vec<TermId> = args1.to_vec();
                    let args2: Vec<TermId> = args2.to_vec();
                    for (a1, a2) in args1.iter().zip(args2.iter()) {
                        match self.compare(*a1, *a2, terms) {
                            TermOrdering::Equal => continue,
                            other => return other,
                        }
                    }
                    TermOrdering::Equal
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::core::term::FunctionSymbol;
    use crate::logic::interner::Interner;

    #[test]
    fn test_subterm_property() {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let x = terms.var(interner.intern_variable("X"));
        let f = FunctionSymbol::new(interner.intern_function("f", 1), 1);
        let fx = terms.app(f, vec![x]);

        let kbo = Kbo::new(KboConfig::default());
        assert_eq!(kbo.compare(fx, x, &terms), TermOrdering::Greater);
        assert_eq!(kbo.compare(x, fx, &terms), TermOrdering::Less);
    }

    #[test]
    fn test_variable_condition() {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let x = terms.var(interner.intern_variable("X"));
        let y = terms.var(interner.intern_variable("Y"));
        let a = terms.constant(FunctionSymbol::new(interner.intern_function("a", 0), 0));

        let kbo = Kbo::new(KboConfig::default());
        // Distinct variables are incomparable
        assert_eq!(kbo.compare(x, y, &terms), TermOrdering::Incomparable);
        // a > X would not be stable under substitution
        assert_eq!(kbo.compare(a, x, &terms), TermOrdering::Incomparable);
    }

    #[test]
    fn test_precedence_breaks_ties() {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let a = terms.constant(FunctionSymbol::new(interner.intern_function("a", 0), 0));
        let f = FunctionSymbol::new(interner.intern_function("f", 1), 1);
        let g = FunctionSymbol::new(interner.intern_function("g", 1), 1);

        let mut config = KboConfig::default();
        config.function_precedence.insert(f.id, 2);
        config.function_precedence.insert(g.id, 1);
        let kbo = Kbo::new(config);

        let fa = terms.app(f, vec![a]);
        let ga = terms.app(g, vec![a]);
        assert_eq!(kbo.compare(fa, ga, &terms), TermOrdering::Greater);
    }

    #[test]
    fn test_custom_weights() {
        let mut interner = Interner::new();
        let mut terms = TermBank::new();
        let a = terms.constant(FunctionSymbol::new(interner.intern_function("a", 0), 0));
        let b = terms.constant(FunctionSymbol::new(interner.intern_function("b", 0), 0));

        let mut config = KboConfig::default();
        let a_id = interner.get_function("a", 0).unwrap();
        config.function_weights.insert(a_id, 5);
        let kbo = Kbo::new(config);

        assert_eq!(kbo.compare(a, b, &terms), TermOrdering::Greater);
    }
}
