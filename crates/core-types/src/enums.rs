use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl FromStr for OrderSide {
    type Err = CoreError;

    /// Accepts the spellings ledgers commonly emit ("buy", "LONG", "sell", "short").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(OrderSide::Buy),
            "sell" | "short" => Ok(OrderSide::Sell),
            other => Err(CoreError::InvalidInput("side".to_string(), other.to_string())),
        }
    }
}

/// How a closed trade is bucketed for win/loss statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
    /// Exactly zero net PnL. Counts toward the trade total but neither bucket.
    Flat,
}
