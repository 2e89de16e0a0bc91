//! # Layer Reports
//!
//! The orchestration layer: pulls a layer from a [`TradeLedger`], runs the
//! metrics engine and attribution analyzer concurrently, ranks recommendations,
//! and packages everything as a serializable [`LayerReport`].
//!
//! The engines stay pure. Memoisation lives here, in [`SnapshotCache`], keyed on
//! the layer and its last settled trade.

pub mod assembler;
pub mod cache;
pub mod error;
pub mod ledger;
pub mod snapshot;

pub use assembler::ReportAssembler;
pub use cache::{CacheKey, SnapshotCache};
pub use error::ReportError;
pub use ledger::{InMemoryLedger, LayerExport, LedgerExport, LedgerSnapshot, TradeLedger};
pub use snapshot::{LayerReport, ReportDiagnostics};
