use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributionError {
    #[error("Attribution settings are invalid: {0}")]
    InvalidSettings(String),
}
