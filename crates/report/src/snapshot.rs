use analytics::MetricsOutcome;
use attribution::{AmpAttribution, CorrelationMatrix};
use core_types::{AmpId, LayerId};
use recommender::OptimizationRecommendation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What was left out while building a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDiagnostics {
    /// Trade records that failed validation at the ledger boundary.
    pub skipped_records: usize,
    /// Layer equity marks dropped during daily resampling.
    pub skipped_equity_points: usize,
    /// Amps with trades or a roster entry but no equity series to correlate.
    pub amps_without_equity: Vec<AmpId>,
}

/// The full analytics snapshot of one layer, ready for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerReport {
    pub layer_id: LayerId,
    pub last_trade_id: Option<Uuid>,
    pub metrics: MetricsOutcome,
    pub attribution: Vec<AmpAttribution>,
    pub correlation: CorrelationMatrix,
    pub recommendations: Vec<OptimizationRecommendation>,
    pub diagnostics: ReportDiagnostics,
}

impl LayerReport {
    /// True when the metrics could not be computed or anything was skipped.
    pub fn is_incomplete(&self) -> bool {
        self.metrics.is_insufficient()
            || self.diagnostics.skipped_records > 0
            || self.diagnostics.skipped_equity_points > 0
    }
}
