use core_types::{Trade, TradeOutcome};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ratio of gross profit to the magnitude of gross loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProfitFactor {
    Finite(f64),
    /// Winning trades but no losses: the `+inf` sentinel.
    Infinite,
    /// Neither wins nor losses to compare.
    Undefined,
}

impl ProfitFactor {
    /// The finite value, if there is one.
    pub fn value(&self) -> Option<f64> {
        match self {
            ProfitFactor::Finite(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfitFactor::Finite(v) => write!(f, "{v:.2}"),
            ProfitFactor::Infinite => f.write_str("inf"),
            ProfitFactor::Undefined => f.write_str("n/a"),
        }
    }
}

/// Win/loss and streak statistics over a chronologically ordered trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Trades with exactly zero net PnL.
    pub flat_trades: usize,
    pub win_rate: f64,
    pub net_pnl: Decimal,
    pub gross_profit: Decimal,
    /// Sum of losing trades' net PnL, signed (`<= 0`).
    pub gross_loss: Decimal,
    pub avg_win: Decimal,
    /// Mean losing trade, signed (`<= 0`).
    pub avg_loss: Decimal,
    /// Net PnL per trade.
    pub expectancy: Decimal,
    pub profit_factor: ProfitFactor,
    /// Positive for a run of wins ending at the latest trade, negative for losses.
    pub current_streak: i64,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    #[serde(with = "humantime_serde")]
    pub average_holding_period: Duration,
}

impl TradeStats {
    /// Computes the statistics. `trades` must already be in chronological order.
    pub fn from_trades(trades: &[&Trade]) -> Self {
        let mut stats = Self {
            total_trades: trades.len(),
            winning_trades: 0,
            losing_trades: 0,
            flat_trades: 0,
            win_rate: 0.0,
            net_pnl: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            expectancy: Decimal::ZERO,
            profit_factor: ProfitFactor::Undefined,
            current_streak: 0,
            longest_win_streak: 0,
            longest_loss_streak: 0,
            average_holding_period: Duration::ZERO,
        };

        let mut holding_secs: i64 = 0;
        for trade in trades {
            let pnl = trade.net_pnl();
            stats.net_pnl += pnl;
            holding_secs = holding_secs.saturating_add(trade.holding_period().num_seconds());

            match trade.outcome() {
                TradeOutcome::Win => {
                    stats.winning_trades += 1;
                    stats.gross_profit += pnl;
                    stats.current_streak = stats.current_streak.max(0) + 1;
                }
                TradeOutcome::Loss => {
                    stats.losing_trades += 1;
                    stats.gross_loss += pnl;
                    stats.current_streak = stats.current_streak.min(0) - 1;
                }
                // A flat trade ends whatever run was in progress.
                TradeOutcome::Flat => {
                    stats.flat_trades += 1;
                    stats.current_streak = 0;
                }
            }

            let run = stats.current_streak.unsigned_abs().min(u32::MAX as u64) as u32;
            if stats.current_streak > 0 {
                stats.longest_win_streak = stats.longest_win_streak.max(run);
            } else if stats.current_streak < 0 {
                stats.longest_loss_streak = stats.longest_loss_streak.max(run);
            }
        }

        if stats.total_trades > 0 {
            stats.win_rate = stats.winning_trades as f64 / stats.total_trades as f64;
            stats.expectancy = stats.net_pnl / Decimal::from(stats.total_trades);
            let avg_secs = holding_secs / stats.total_trades as i64;
            stats.average_holding_period = Duration::from_secs(avg_secs.max(0) as u64);
        }
        if stats.winning_trades > 0 {
            stats.avg_win = stats.gross_profit / Decimal::from(stats.winning_trades);
        }
        if stats.losing_trades > 0 {
            stats.avg_loss = stats.gross_loss / Decimal::from(stats.losing_trades);
        }

        stats.profit_factor = match (stats.winning_trades, stats.losing_trades) {
            (0, 0) => ProfitFactor::Undefined,
            (_, 0) => ProfitFactor::Infinite,
            _ => stats
                .gross_profit
                .checked_div(stats.gross_loss.abs())
                .and_then(|pf| pf.to_f64())
                .map(ProfitFactor::Finite)
                .unwrap_or(ProfitFactor::Infinite),
        };

        stats
    }
}
