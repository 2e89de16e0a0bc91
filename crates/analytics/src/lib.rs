//! # Layer Metrics Engine
//!
//! This crate turns a layer's closed trades and equity curve into a single
//! `LayerMetrics` snapshot: risk-adjusted ratios, drawdown, tail risk, win/loss
//! and streak statistics.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` and `configuration` (Layer 0).
//! - **Stateless Calculation:** The `MetricsEngine` holds only its settings. It takes
//!   raw trading data as input and produces a `MetricsOutcome` as output, so a snapshot
//!   can be safely memoised by whoever calls it.
//! - **Data, not panics:** Too little data yields `MetricsOutcome::InsufficientData`;
//!   degenerate denominators are reported through `MetricFlag`s and sentinels.
//!
//! ## Public API
//!
//! - `MetricsEngine`: The main struct that contains the calculation logic.
//! - `LayerMetrics` / `MetricsOutcome`: The snapshot and its "not enough data" alternative.
//! - `ReturnSeries`: Dated daily returns, reused by correlation analysis.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod drawdown;
pub mod engine;
pub mod error;
pub mod report;
pub mod returns;
pub mod stats;
pub mod trade_stats;

// Re-export the key components to create a clean, public-facing API.
pub use drawdown::DrawdownStats;
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use report::{InsufficiencyReason, InsufficientData, LayerMetrics, MetricFlag, MetricsOutcome};
pub use returns::{DailyClose, DailyReturn, ReturnSeries};
pub use trade_stats::{ProfitFactor, TradeStats};
