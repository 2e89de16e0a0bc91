use crate::enums::{OrderSide, TradeOutcome};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a single automated strategy ("amp").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmpId(pub String);

/// Identifier of a layer, the portfolio grouping one or more amps.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

impl_id!(AmpId);
impl_id!(LayerId);

/// A closed trade as settled by the external ledger.
///
/// Trades are immutable once closed. All monetary values are `Decimal` so that
/// per-bucket sums reconcile exactly with the layer total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: Uuid,
    pub amp_id: AmpId,
    pub layer_id: LayerId,
    pub symbol: String,
    pub side: OrderSide,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub realized_pnl: Decimal,
    pub fees: Decimal,
}

impl Trade {
    /// Realized PnL after fees. This is the figure every statistic is built on.
    pub fn net_pnl(&self) -> Decimal {
        self.realized_pnl - self.fees
    }

    pub fn outcome(&self) -> TradeOutcome {
        let pnl = self.net_pnl();
        if pnl > Decimal::ZERO {
            TradeOutcome::Win
        } else if pnl < Decimal::ZERO {
            TradeOutcome::Loss
        } else {
            TradeOutcome::Flat
        }
    }

    /// Time the position was open. Negative spans (bad clocks upstream) clamp to zero.
    pub fn holding_period(&self) -> chrono::Duration {
        (self.exit_time - self.entry_time).max(chrono::Duration::zero())
    }
}

/// One mark-to-market observation of cumulative capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity_value: Decimal,
}

impl EquityPoint {
    pub fn new(timestamp: DateTime<Utc>, equity_value: Decimal) -> Self {
        Self {
            timestamp,
            equity_value,
        }
    }
}

/// Roster entry describing an amp in a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmpMeta {
    pub amp_id: AmpId,
    pub amp_name: String,
    /// Number of signals the amp generated over the analysed window.
    #[serde(default)]
    pub signals_generated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn trade(realized: Decimal, fees: Decimal) -> Trade {
        Trade {
            trade_id: Uuid::nil(),
            amp_id: "amp-1".into(),
            layer_id: "layer-1".into(),
            symbol: "BTCUSDT".to_string(),
            side: OrderSide::Buy,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            exit_time: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            entry_price: dec!(100),
            exit_price: dec!(101),
            quantity: dec!(1),
            realized_pnl: realized,
            fees,
        }
    }

    #[test]
    fn net_pnl_subtracts_fees() {
        assert_eq!(trade(dec!(10), dec!(1.5)).net_pnl(), dec!(8.5));
    }

    #[test]
    fn fees_can_turn_a_gross_win_into_a_loss() {
        assert_eq!(trade(dec!(1), dec!(2)).outcome(), TradeOutcome::Loss);
        assert_eq!(trade(dec!(2), dec!(2)).outcome(), TradeOutcome::Flat);
        assert_eq!(trade(dec!(3), dec!(2)).outcome(), TradeOutcome::Win);
    }

    #[test]
    fn holding_period_is_exit_minus_entry() {
        assert_eq!(trade(dec!(1), dec!(0)).holding_period(), chrono::Duration::hours(2));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&AmpId::from("alpha")).unwrap();
        assert_eq!(json, "\"alpha\"");
    }

    #[test]
    fn default_layer_id_is_empty() {
        assert_eq!(LayerId::default().as_str(), "");
    }
}
