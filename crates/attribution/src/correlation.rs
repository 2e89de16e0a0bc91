use crate::policy::DiversificationPolicy;
use analytics::stats;
use analytics::ReturnSeries;
use chrono::NaiveDate;
use core_types::AmpId;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationFlag {
    /// Fewer than two amps: there are no pairs to correlate.
    InsufficientAmps,
    /// At least one pair had too few common dates to be correlated.
    InsufficientOverlap,
    /// At least one pair overlapped enough but one side never moved.
    ZeroVariance,
}

/// Pairwise Pearson correlations of the amps' daily returns.
///
/// `values[i][j]` is the correlation of `amp_ids[i]` with `amp_ids[j]`. The
/// matrix is symmetric, the diagonal is exactly 1, and pairs that could not be
/// measured are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub amp_ids: Vec<AmpId>,
    pub values: Vec<Vec<Option<f64>>>,
    /// Mean of the defined upper-triangle entries.
    pub average_correlation: Option<f64>,
    pub diversification_score: f64,
    pub flags: BTreeSet<CorrelationFlag>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &AmpId, b: &AmpId) -> Option<f64> {
        let i = self.amp_ids.iter().position(|id| id == a)?;
        let j = self.amp_ids.iter().position(|id| id == b)?;
        self.values[i][j]
    }

    /// Defined upper-triangle entries as `(a, b, correlation)`.
    pub fn pairs(&self) -> impl Iterator<Item = (&AmpId, &AmpId, f64)> + '_ {
        (0..self.amp_ids.len())
            .tuple_combinations()
            .filter_map(move |(i, j)| self.values[i][j].map(|rho| (&self.amp_ids[i], &self.amp_ids[j], rho)))
    }

    pub fn has_flag(&self, flag: CorrelationFlag) -> bool {
        self.flags.contains(&flag)
    }
}

pub(crate) fn correlate(
    series: &BTreeMap<AmpId, ReturnSeries>,
    min_overlap: usize,
    policy: &dyn DiversificationPolicy,
) -> CorrelationMatrix {
    let amp_ids: Vec<AmpId> = series.keys().cloned().collect();
    let n = amp_ids.len();

    // Keyed by date so pairs align on common days, whatever each amp's sampling.
    let by_date: Vec<BTreeMap<NaiveDate, f64>> = series
        .values()
        .map(|s| s.iter().map(|r| (r.date, r.value)).collect())
        .collect();

    let mut values = vec![vec![None; n]; n];
    for (i, row) in values.iter_mut().enumerate() {
        row[i] = Some(1.0);
    }

    let mut flags = BTreeSet::new();
    let mut defined = Vec::new();
    for (i, j) in (0..n).tuple_combinations() {
        let (xs, ys): (Vec<f64>, Vec<f64>) = by_date[i]
            .iter()
            .filter_map(|(date, x)| by_date[j].get(date).map(|y| (*x, *y)))
            .unzip();

        let rho = if xs.len() < min_overlap.max(2) {
            Err(CorrelationFlag::InsufficientOverlap)
        } else {
            stats::pearson(&xs, &ys).ok_or(CorrelationFlag::ZeroVariance)
        };

        match rho {
            Ok(rho) => {
                values[i][j] = Some(rho);
                values[j][i] = Some(rho);
                defined.push(rho);
            }
            Err(flag) => {
                tracing::debug!(
                    a = %amp_ids[i],
                    b = %amp_ids[j],
                    overlap = xs.len(),
                    reason = ?flag,
                    "Pair left out of correlation analysis."
                );
                flags.insert(flag);
            }
        }
    }

    let average_correlation = stats::mean(&defined);
    let diversification_score = if n < 2 {
        flags.insert(CorrelationFlag::InsufficientAmps);
        100.0
    } else {
        match average_correlation {
            Some(avg) => policy.score(avg).clamp(0.0, 100.0),
            // No measurable pair: no evidence of correlation risk either.
            None => 100.0,
        }
    };

    CorrelationMatrix {
        amp_ids,
        values,
        average_correlation,
        diversification_score,
        flags,
    }
}
