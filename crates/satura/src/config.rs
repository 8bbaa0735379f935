//! Prover configuration types.

use std::time::Duration;

/// Literal selection strategies (numbers follow the standard family)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralSelectionStrategy {
    /// Select all literals (no selection)
    Sel0,
    /// Select all maximal literals
    Sel20,
    /// Unique maximal, else max-weight negative, else all maximal
    Sel21,
    /// Max-weight negative literal, else all maximal
    Sel22,
}

/// Node-promotion thresholds of the substitution-tree child collections.
///
/// Tuning knobs, not part of the index contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionThresholds {
    /// Leaf entry collections switch to the ordered representation past
    /// this size
    pub leaf: usize,
    /// Internal child collections switch to the ordered representation
    /// past this size
    pub internal: usize,
}

impl Default for PromotionThresholds {
    fn default() -> Self {
        PromotionThresholds { leaf: 5, internal: 3 }
    }
}

/// Configuration for the saturation loop
#[derive(Debug, Clone)]
pub struct ProverConfig {
    /// Selection alternates `age` picks by age and `weight` picks by
    /// weight out of every `age + weight`
    pub age_weight_ratio: (u32, u32),
    pub literal_selection: LiteralSelectionStrategy,
    pub promotion_thresholds: PromotionThresholds,
    /// Relax the occurs check under theory symbols
    pub unification_with_abstraction: bool,
    /// Wall-clock deadline for the whole run
    pub timeout: Duration,
    /// 0 means no limit
    pub max_clauses: usize,
    /// 0 means no limit
    pub max_iterations: usize,
    /// Derived clauses above this literal count are discarded
    pub max_clause_size: usize,
    /// Memory limit in MB, measured as RSS growth over the baseline taken
    /// at prover construction; None means no limit
    pub memory_limit_mb: Option<usize>,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            age_weight_ratio: (1, 4),
            literal_selection: LiteralSelectionStrategy::Sel21,
            promotion_thresholds: PromotionThresholds::default(),
            unification_with_abstraction: false,
            timeout: Duration::from_secs(60),
            max_clauses: 0,
            max_iterations: 0,
            max_clause_size: 100,
            memory_limit_mb: None,
        }
    }
}

/// Get current process RSS in MB. Returns None if unavailable.
pub fn process_memory_mb() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let rss_pages: usize = statm.split_whitespace().nth(1)?.parse().ok()?;
        let page_size = 4096usize; // standard on Linux
        Some(rss_pages * page_size / (1024 * 1024))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
