pub mod enums;
pub mod error;
pub mod records;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderSide, TradeOutcome};
pub use error::CoreError;
pub use records::{parse_trades, RawTrade, ValidatedTrades};
pub use structs::{AmpId, AmpMeta, EquityPoint, LayerId, Trade};
