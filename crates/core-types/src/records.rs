//! Ledger-boundary parsing.
//!
//! The ledger exports loosely-typed trade records. They are parsed exactly once
//! here into strict [`Trade`] values; downstream crates never re-interpret raw data.

use crate::enums::OrderSide;
use crate::error::CoreError;
use crate::structs::{AmpId, LayerId, Trade};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// A trade record as it arrives from the ledger, before validation.
///
/// Every field is optional so that one bad record cannot fail deserialization
/// of the whole export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrade {
    pub trade_id: Option<Uuid>,
    pub amp_id: Option<String>,
    pub layer_id: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub entry_price: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub fees: Option<Decimal>,
}

/// The result of parsing a batch of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedTrades {
    pub trades: Vec<Trade>,
    /// Records dropped because a required field was missing or invalid.
    pub skipped_records: usize,
}

impl TryFrom<RawTrade> for Trade {
    type Error = CoreError;

    fn try_from(raw: RawTrade) -> Result<Self, Self::Error> {
        let record = raw
            .trade_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<unidentified>".to_string());
        let missing = |field: &'static str| CoreError::MalformedRecord {
            record: record.clone(),
            field,
        };

        let trade_id = raw.trade_id.ok_or_else(|| missing("trade_id"))?;
        let amp_id = raw.amp_id.filter(|s| !s.is_empty()).ok_or_else(|| missing("amp_id"))?;
        let layer_id = raw
            .layer_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("layer_id"))?;
        let side = raw
            .side
            .as_deref()
            .map(OrderSide::from_str)
            .transpose()
            .map_err(|_| missing("side"))?
            .ok_or_else(|| missing("side"))?;
        let entry_time = raw.entry_time.ok_or_else(|| missing("entry_time"))?;
        let exit_time = raw.exit_time.ok_or_else(|| missing("exit_time"))?;
        let entry_price = raw.entry_price.ok_or_else(|| missing("entry_price"))?;
        let exit_price = raw.exit_price.ok_or_else(|| missing("exit_price"))?;
        let quantity = raw.quantity.ok_or_else(|| missing("quantity"))?;

        // Older ledger rows carry prices but no settled PnL figure.
        let realized_pnl = raw.realized_pnl.unwrap_or_else(|| match side {
            OrderSide::Buy => (exit_price - entry_price) * quantity,
            OrderSide::Sell => (entry_price - exit_price) * quantity,
        });

        Ok(Trade {
            trade_id,
            amp_id: AmpId(amp_id),
            layer_id: LayerId(layer_id),
            symbol: raw.symbol.unwrap_or_default(),
            side,
            entry_time,
            exit_time,
            entry_price,
            exit_price,
            quantity,
            realized_pnl,
            fees: raw.fees.unwrap_or(Decimal::ZERO),
        })
    }
}

/// Parses a batch of raw records, skipping and counting the malformed ones.
pub fn parse_trades(raw: impl IntoIterator<Item = RawTrade>) -> ValidatedTrades {
    let mut validated = ValidatedTrades::default();
    for record in raw {
        match Trade::try_from(record) {
            Ok(trade) => validated.trades.push(trade),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed trade record.");
                validated.skipped_records += 1;
            }
        }
    }
    validated
}
