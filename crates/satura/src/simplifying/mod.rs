//! Simplifying inference rules

pub mod demodulation;
pub mod subsumption;
pub mod tautology;

pub use demodulation::DemodulationRule;
pub use subsumption::{subsumes, subsumption_resolution, SubsumptionRule};
pub use tautology::TautologyRule;
