//! # Amp Attribution
//!
//! Splits a layer's performance by amp and measures how the amps' daily returns
//! move together.
//!
//! - `AttributionAnalyzer::attribute` produces one `AmpAttribution` per amp with a
//!   0-100 contribution score.
//! - `AttributionAnalyzer::correlate` produces the pairwise `CorrelationMatrix`
//!   and the layer's diversification score.
//!
//! Both scores are computed by pluggable policies (see [`policy`]).

pub mod analyzer;
pub mod attribution;
pub mod correlation;
pub mod error;
pub mod policy;

pub use analyzer::AttributionAnalyzer;
pub use attribution::AmpAttribution;
pub use correlation::{CorrelationFlag, CorrelationMatrix};
pub use error::AttributionError;
pub use policy::{ContributionInput, ContributionPolicy, DiversificationPolicy, InverseCorrelation, LinearBlend};
