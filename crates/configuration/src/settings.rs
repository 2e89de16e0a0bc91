use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the analytics service.
///
/// Every section is optional in `analytics.toml`; omitted sections fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub metrics: MetricsSettings,
    pub attribution: AttributionSettings,
    pub recommender: RecommenderSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

impl AnalyticsConfig {
    /// Rejects settings that would make the calculations meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.metrics.validate()?;
        self.attribution.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

/// Parameters for the layer metrics calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Periods per year used to annualise daily statistics.
    pub trading_days_per_year: u32,
    /// Daily risk-free rate subtracted from returns in the Sharpe/Sortino numerator.
    pub risk_free_rate_daily: f64,
    /// Minimum number of closed trades before risk metrics are reported.
    pub min_trades: usize,
    /// Minimum number of distinct daily equity closes before risk metrics are reported.
    pub min_daily_points: usize,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            trading_days_per_year: 252,
            risk_free_rate_daily: 0.0,
            min_trades: 2,
            min_daily_points: 2,
        }
    }
}

impl MetricsSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.trading_days_per_year == 0 {
            return Err(ConfigError::ValidationError(
                "metrics.trading_days_per_year must be greater than 0".to_string(),
            ));
        }
        if !self.risk_free_rate_daily.is_finite() {
            return Err(ConfigError::ValidationError(
                "metrics.risk_free_rate_daily must be a finite number".to_string(),
            ));
        }
        if self.min_daily_points < 2 {
            return Err(ConfigError::ValidationError(
                "metrics.min_daily_points must be at least 2 to form a return".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for per-amp attribution and correlation analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionSettings {
    /// Minimum number of overlapping daily returns for a pair to be correlated.
    pub min_overlap: usize,
    pub contribution: ContributionWeights,
}

impl Default for AttributionSettings {
    fn default() -> Self {
        Self {
            min_overlap: 10,
            contribution: ContributionWeights::default(),
        }
    }
}

impl AttributionSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_overlap < 2 {
            return Err(ConfigError::ValidationError(
                "attribution.min_overlap must be at least 2".to_string(),
            ));
        }
        let w = &self.contribution;
        if !(w.pnl_weight.is_finite() && w.risk_adjusted_weight.is_finite())
            || w.pnl_weight < 0.0
            || w.risk_adjusted_weight < 0.0
        {
            return Err(ConfigError::ValidationError(
                "attribution.contribution weights must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weights of the linear contribution-score blend. A share of 1.0 in both
/// components yields `pnl_weight + risk_adjusted_weight` before clipping to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContributionWeights {
    pub pnl_weight: f64,
    pub risk_adjusted_weight: f64,
}

impl Default for ContributionWeights {
    fn default() -> Self {
        Self {
            pnl_weight: 50.0,
            risk_adjusted_weight: 50.0,
        }
    }
}

/// Thresholds for the recommendation rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderSettings {
    /// Drawdown (negative fraction) beyond which a warning is raised.
    pub max_drawdown_warning: f64,
    pub min_win_rate: f64,
    /// The win-rate rule only fires once the sample is at least this large.
    pub min_trades_for_win_rate: usize,
    pub min_diversification_score: f64,
    pub strong_sharpe: f64,
    pub min_execution_rate: f64,
    pub max_loss_streak: u32,
    /// CVaR99 (negative daily return) beyond which tail risk is flagged.
    pub cvar99_warning: f64,
    /// Contribution score at which a single amp is considered dominant.
    pub concentration_score: f64,
    pub high_pair_correlation: f64,
    /// Minimum unrecovered drawdown duration, in days, worth flagging.
    pub unrecovered_drawdown_days: i64,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            max_drawdown_warning: -0.20,
            min_win_rate: 0.40,
            min_trades_for_win_rate: 20,
            min_diversification_score: 50.0,
            strong_sharpe: 2.0,
            min_execution_rate: 0.5,
            max_loss_streak: 5,
            cvar99_warning: -0.05,
            concentration_score: 60.0,
            high_pair_correlation: 0.8,
            unrecovered_drawdown_days: 30,
        }
    }
}

/// Settings for the snapshot cache that sits in front of the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: 256,
        }
    }
}

impl CacheSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache.capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub level: String,
    /// Directory for a daily rolling log file. Console only when absent.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
