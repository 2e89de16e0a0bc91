use crate::attribution::{self, AmpAttribution};
use crate::correlation::{self, CorrelationMatrix};
use crate::error::AttributionError;
use crate::policy::{ContributionPolicy, DiversificationPolicy, InverseCorrelation, LinearBlend};
use analytics::ReturnSeries;
use configuration::AttributionSettings;
use core_types::{AmpId, AmpMeta, Trade};
use std::collections::BTreeMap;

/// Splits layer performance by amp and measures how the amps move together.
#[derive(Debug)]
pub struct AttributionAnalyzer {
    min_overlap: usize,
    contribution: Box<dyn ContributionPolicy>,
    diversification: Box<dyn DiversificationPolicy>,
}

impl AttributionAnalyzer {
    /// Builds an analyzer with the default `LinearBlend` and `InverseCorrelation` policies.
    pub fn new(settings: &AttributionSettings) -> Result<Self, AttributionError> {
        Self::with_policies(
            settings.min_overlap,
            Box::new(LinearBlend::from(&settings.contribution)),
            Box::new(InverseCorrelation),
        )
    }

    pub fn with_policies(
        min_overlap: usize,
        contribution: Box<dyn ContributionPolicy>,
        diversification: Box<dyn DiversificationPolicy>,
    ) -> Result<Self, AttributionError> {
        if min_overlap < 2 {
            return Err(AttributionError::InvalidSettings(
                "min_overlap must be at least 2 for a correlation to exist".to_string(),
            ));
        }
        Ok(Self {
            min_overlap,
            contribution,
            diversification,
        })
    }

    /// Per-amp attribution, ordered by contribution score (highest first).
    pub fn attribute(&self, trades: &[Trade], roster: &[AmpMeta]) -> Vec<AmpAttribution> {
        attribution::attribute(trades, roster, self.contribution.as_ref())
    }

    /// Pairwise correlation matrix over the amps' dated daily returns.
    pub fn correlate(&self, series: &BTreeMap<AmpId, ReturnSeries>) -> CorrelationMatrix {
        correlation::correlate(series, self.min_overlap, self.diversification.as_ref())
    }
}

impl Default for AttributionAnalyzer {
    fn default() -> Self {
        Self {
            min_overlap: AttributionSettings::default().min_overlap,
            contribution: Box::new(LinearBlend::default()),
            diversification: Box::new(InverseCorrelation),
        }
    }
}
