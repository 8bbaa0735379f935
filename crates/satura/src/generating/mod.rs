//! Generating inference rules

pub mod common;
pub mod equality_factoring;
pub mod equality_resolution;
pub mod factoring;
pub mod resolution;
pub mod superposition;
pub mod ur_resolution;

pub use equality_factoring::EqualityFactoringRule;
pub use equality_resolution::EqualityResolutionRule;
pub use factoring::FactoringRule;
pub use resolution::ResolutionRule;
pub use superposition::SuperpositionRule;
pub use ur_resolution::UrResolutionRule;
