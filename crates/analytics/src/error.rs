use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Metrics settings are invalid: {0}")]
    InvalidSettings(String),
}
