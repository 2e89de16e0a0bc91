//! Scoring policies.
//!
//! How much an amp "contributes" and how correlation maps to a diversification
//! score are policy choices rather than statistics. Both sit behind traits so
//! an alternative curve can be swapped in and tested on its own.

use configuration::ContributionWeights;
use std::fmt::Debug;

/// Per-amp values a contribution policy may draw on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionInput {
    pub total_pnl: f64,
    pub risk_adjusted_pnl: f64,
}

/// Maps every amp of a layer to a contribution score.
///
/// Implementations receive the whole layer at once because scores are relative.
/// The returned vector must have one entry per input, in the same order.
pub trait ContributionPolicy: Debug + Send + Sync {
    fn scores(&self, inputs: &[ContributionInput]) -> Vec<f64>;
}

/// Maps the layer's average pairwise correlation to a 0-100 score.
pub trait DiversificationPolicy: Debug + Send + Sync {
    fn score(&self, average_correlation: f64) -> f64;
}

/// `pnl_weight * pnlShare + risk_adjusted_weight * riskShare`, clipped to [0, 100].
///
/// A share is the amp's positive value over the sum of positive values across the
/// layer. Losing amps therefore score 0 on that component rather than dragging
/// the shares of the others above 1.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearBlend {
    pub pnl_weight: f64,
    pub risk_adjusted_weight: f64,
}

impl From<&ContributionWeights> for LinearBlend {
    fn from(weights: &ContributionWeights) -> Self {
        Self {
            pnl_weight: weights.pnl_weight,
            risk_adjusted_weight: weights.risk_adjusted_weight,
        }
    }
}

impl Default for LinearBlend {
    fn default() -> Self {
        Self::from(&ContributionWeights::default())
    }
}

impl ContributionPolicy for LinearBlend {
    fn scores(&self, inputs: &[ContributionInput]) -> Vec<f64> {
        let pnl_shares = positive_shares(inputs.iter().map(|i| i.total_pnl));
        let risk_shares = positive_shares(inputs.iter().map(|i| i.risk_adjusted_pnl));

        pnl_shares
            .into_iter()
            .zip(risk_shares)
            .map(|(pnl, risk)| {
                let score = self.pnl_weight * pnl + self.risk_adjusted_weight * risk;
                if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 }
            })
            .collect()
    }
}

fn positive_shares(values: impl Iterator<Item = f64> + Clone) -> Vec<f64> {
    let positive = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
    let total: f64 = values.clone().map(positive).sum();
    values
        .map(|v| if total > 0.0 { positive(v) / total } else { 0.0 })
        .collect()
}

/// `clip(100 * (1 - average_correlation), 0, 100)`.
///
/// Fully correlated amps score 0, uncorrelated amps 100. Negative average
/// correlation is capped at 100 rather than rewarded further.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InverseCorrelation;

impl DiversificationPolicy for InverseCorrelation {
    fn score(&self, average_correlation: f64) -> f64 {
        let score = 100.0 * (1.0 - average_correlation);
        if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 }
    }
}
