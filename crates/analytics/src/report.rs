use crate::trade_stats::TradeStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Degenerate-input conditions met while computing a snapshot.
///
/// Each flag names a metric that was reported with its documented fallback
/// value instead of a computed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFlag {
    /// Daily returns have no variance; Sharpe is reported as 0.
    ZeroVolatility,
    /// No negative daily returns; Sortino is reported as 0.
    ZeroDownsideDeviation,
    /// Equity never fell below a prior peak; Calmar is reported as 0.
    ZeroDrawdown,
    /// The worst drawdown has not recovered; its duration is a lower bound.
    DrawdownUnrecovered,
    /// Winning trades but no losing ones; profit factor is the infinite sentinel.
    NoLosingTrades,
    /// A computed value overflowed and was replaced with 0.
    NonFiniteGuarded,
    /// Equity closed at or below zero; the following day has no daily return.
    UnanchoredReturns,
}

/// A complete risk and return snapshot for one layer.
///
/// This struct is the final output of the `MetricsEngine`. It is a derived view,
/// recomputed from the ledger on every request and never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetrics {
    // I. Risk-adjusted return
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    /// Annualised standard deviation of daily returns.
    pub volatility: f64,
    pub total_return: f64,
    pub annualized_return: f64,

    // II. Drawdown
    pub max_drawdown: f64,
    pub current_drawdown: f64,
    /// In calendar days.
    pub max_drawdown_duration: i64,
    pub max_drawdown_recovered: bool,

    // III. Tail risk, as signed daily returns
    pub value_at_risk_95: f64,
    pub value_at_risk_99: f64,
    pub conditional_var_95: f64,
    pub conditional_var_99: f64,

    // IV. Trade-level statistics
    #[serde(flatten)]
    pub trades: TradeStats,

    /// Number of daily closes the return series was built from.
    pub daily_points: usize,
    /// Equity marks dropped during resampling.
    pub skipped_equity_points: usize,
    pub flags: BTreeSet<MetricFlag>,
}

impl LayerMetrics {
    pub fn has_flag(&self, flag: MetricFlag) -> bool {
        self.flags.contains(&flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficiencyReason {
    TooFewTrades,
    TooFewDailyPoints,
}

/// Why a snapshot could not be computed, together with what *could* be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsufficientData {
    pub reason: InsufficiencyReason,
    pub required: usize,
    pub daily_points: usize,
    pub skipped_equity_points: usize,
    /// Trade counts are still meaningful and let the caller say *how* little data there is.
    pub trades: TradeStats,
}

/// Either a full snapshot or an explicit "not enough data" marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricsOutcome {
    Computed(LayerMetrics),
    InsufficientData(InsufficientData),
}

impl MetricsOutcome {
    pub fn metrics(&self) -> Option<&LayerMetrics> {
        match self {
            MetricsOutcome::Computed(m) => Some(m),
            MetricsOutcome::InsufficientData(_) => None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, MetricsOutcome::InsufficientData(_))
    }

    pub fn skipped_equity_points(&self) -> usize {
        match self {
            MetricsOutcome::Computed(m) => m.skipped_equity_points,
            MetricsOutcome::InsufficientData(d) => d.skipped_equity_points,
        }
    }

    pub fn trade_stats(&self) -> &TradeStats {
        match self {
            MetricsOutcome::Computed(m) => &m.trades,
            MetricsOutcome::InsufficientData(d) => &d.trades,
        }
    }
}
