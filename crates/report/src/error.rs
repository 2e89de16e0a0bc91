use analytics::AnalyticsError;
use attribution::AttributionError;
use core_types::LayerId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Layer '{0}' is not present in the ledger")]
    UnknownLayer(LayerId),

    #[error("Failed to read ledger export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger export is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("A report computation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Attribution(#[from] AttributionError),
}
