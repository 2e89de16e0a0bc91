use crate::drawdown::drawdown_stats;
use crate::error::AnalyticsError;
use crate::report::{InsufficiencyReason, InsufficientData, LayerMetrics, MetricFlag, MetricsOutcome};
use crate::returns::{daily_returns, resample_daily, unanchored_returns, ReturnSeries};
use crate::stats::{self, MIN_DEVIATION};
use crate::trade_stats::{ProfitFactor, TradeStats};
use configuration::MetricsSettings;
use core_types::{EquityPoint, Trade};
use std::collections::BTreeSet;

/// Tail probabilities for the two reported VaR levels.
const VAR_95: f64 = 0.05;
const VAR_99: f64 = 0.01;

/// A stateless calculator for deriving layer metrics from trading activity.
///
/// `compute` is a pure function of its inputs: the same trades and equity curve
/// always yield bit-identical output.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    settings: MetricsSettings,
}

impl MetricsEngine {
    pub fn new(settings: MetricsSettings) -> Result<Self, AnalyticsError> {
        if settings.trading_days_per_year == 0 {
            return Err(AnalyticsError::InvalidSettings(
                "trading_days_per_year must be greater than 0".to_string(),
            ));
        }
        if !settings.risk_free_rate_daily.is_finite() {
            return Err(AnalyticsError::InvalidSettings(
                "risk_free_rate_daily must be finite".to_string(),
            ));
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &MetricsSettings {
        &self.settings
    }

    /// The main entry point for calculating layer metrics.
    ///
    /// # Arguments
    ///
    /// * `trades` - All closed trades of the layer, in any order.
    /// * `equity_curve` - Mark-to-market equity, possibly irregularly sampled.
    ///
    /// # Returns
    ///
    /// `MetricsOutcome::InsufficientData` when there are too few trades or daily
    /// closes to produce meaningful risk figures, otherwise the full snapshot.
    #[tracing::instrument(level = "debug", skip_all, fields(trades = trades.len(), points = equity_curve.len()))]
    pub fn compute(&self, trades: &[Trade], equity_curve: &[EquityPoint]) -> MetricsOutcome {
        let ordered = chronological(trades);
        let trade_stats = TradeStats::from_trades(&ordered);
        let resampled = resample_daily(equity_curve);
        let daily_points = resampled.closes.len();
        let skipped_equity_points = resampled.skipped_points;

        let min_trades = self.settings.min_trades.max(1);
        if trade_stats.total_trades < min_trades {
            return MetricsOutcome::InsufficientData(InsufficientData {
                reason: InsufficiencyReason::TooFewTrades,
                required: min_trades,
                daily_points,
                skipped_equity_points,
                trades: trade_stats,
            });
        }
        let min_points = self.settings.min_daily_points.max(2);
        if daily_points < min_points {
            return MetricsOutcome::InsufficientData(InsufficientData {
                reason: InsufficiencyReason::TooFewDailyPoints,
                required: min_points,
                daily_points,
                skipped_equity_points,
                trades: trade_stats,
            });
        }

        let returns: Vec<f64> = daily_returns(&resampled.closes).iter().map(|r| r.value).collect();
        let mut flags = BTreeSet::new();
        if unanchored_returns(&resampled.closes) > 0 {
            flags.insert(MetricFlag::UnanchoredReturns);
        }
        let periods = f64::from(self.settings.trading_days_per_year);
        let annualizer = periods.sqrt();

        // --- Volatility, Sharpe, Sortino ---
        let mean_return = stats::mean(&returns).unwrap_or(0.0);
        let std_dev = stats::std_dev(&returns).unwrap_or(0.0);
        let excess = mean_return - self.settings.risk_free_rate_daily;
        let volatility = std_dev * annualizer;

        let sharpe_ratio = if std_dev > MIN_DEVIATION {
            excess / std_dev * annualizer
        } else {
            flags.insert(MetricFlag::ZeroVolatility);
            0.0
        };

        let downside = stats::downside_deviation(&returns).unwrap_or(0.0);
        let sortino_ratio = if downside > MIN_DEVIATION {
            excess / downside * annualizer
        } else {
            flags.insert(MetricFlag::ZeroDownsideDeviation);
            0.0
        };

        // --- Drawdown and Calmar ---
        let drawdown = drawdown_stats(&resampled.closes);
        if !drawdown.recovered {
            flags.insert(MetricFlag::DrawdownUnrecovered);
        }

        let last = resampled.closes[daily_points - 1].equity;
        let growth = match resampled.closes.iter().find(|c| c.equity > 0.0) {
            Some(base) => last / base.equity,
            None => 1.0,
        };
        let total_return = growth - 1.0;
        let annualized_return = if returns.is_empty() {
            0.0
        } else {
            growth.powf(periods / returns.len() as f64) - 1.0
        };

        let calmar_ratio = if drawdown.max_drawdown < 0.0 {
            annualized_return / drawdown.max_drawdown.abs()
        } else {
            flags.insert(MetricFlag::ZeroDrawdown);
            0.0
        };

        // --- Tail risk (historical simulation) ---
        let mut sorted = returns.clone();
        sorted.sort_by(f64::total_cmp);
        let value_at_risk_95 = stats::percentile(&sorted, VAR_95).unwrap_or(0.0);
        let value_at_risk_99 = stats::percentile(&sorted, VAR_99).unwrap_or(0.0);
        let conditional_var_95 = tail_mean(&sorted, value_at_risk_95);
        let conditional_var_99 = tail_mean(&sorted, value_at_risk_99);

        if trade_stats.profit_factor == ProfitFactor::Infinite {
            flags.insert(MetricFlag::NoLosingTrades);
        }

        let metrics = LayerMetrics {
            sharpe_ratio: guarded(sharpe_ratio, &mut flags),
            sortino_ratio: guarded(sortino_ratio, &mut flags),
            calmar_ratio: guarded(calmar_ratio, &mut flags),
            volatility: guarded(volatility, &mut flags),
            total_return: guarded(total_return, &mut flags),
            annualized_return: guarded(annualized_return, &mut flags),
            max_drawdown: guarded(drawdown.max_drawdown, &mut flags),
            current_drawdown: guarded(drawdown.current_drawdown, &mut flags),
            max_drawdown_duration: drawdown.max_drawdown_duration_days,
            max_drawdown_recovered: drawdown.recovered,
            value_at_risk_95: guarded(value_at_risk_95, &mut flags),
            value_at_risk_99: guarded(value_at_risk_99, &mut flags),
            conditional_var_95: guarded(conditional_var_95, &mut flags),
            conditional_var_99: guarded(conditional_var_99, &mut flags),
            trades: trade_stats,
            daily_points,
            skipped_equity_points,
            flags,
        };

        tracing::debug!(
            sharpe = metrics.sharpe_ratio,
            max_drawdown = metrics.max_drawdown,
            flags = ?metrics.flags,
            "Layer metrics computed."
        );

        MetricsOutcome::Computed(metrics)
    }

    /// Dated daily returns of an equity curve, as used for correlation analysis.
    pub fn daily_returns(&self, equity_curve: &[EquityPoint]) -> ReturnSeries {
        daily_returns(&resample_daily(equity_curve).closes)
    }
}

/// Replaces a non-finite value with 0 and records that it happened.
fn guarded(value: f64, flags: &mut BTreeSet<MetricFlag>) -> f64 {
    if value.is_finite() {
        value
    } else {
        flags.insert(MetricFlag::NonFiniteGuarded);
        0.0
    }
}

/// Sorts trades by exit time, then entry time, then id, without cloning them.
fn chronological(trades: &[Trade]) -> Vec<&Trade> {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by(|a, b| {
        a.exit_time
            .cmp(&b.exit_time)
            .then(a.entry_time.cmp(&b.entry_time))
            .then(a.trade_id.cmp(&b.trade_id))
    });
    ordered
}

/// Mean of all returns at or below `threshold`. Never empty for a threshold
/// taken from the same sample, since the minimum always qualifies.
fn tail_mean(sorted: &[f64], threshold: f64) -> f64 {
    let tail: Vec<f64> = sorted.iter().copied().take_while(|r| *r <= threshold).collect();
    stats::mean(&tail).unwrap_or(threshold)
}
