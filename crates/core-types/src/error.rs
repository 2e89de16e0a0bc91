use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Malformed trade record {record}: missing or invalid field '{field}'")]
    MalformedRecord { record: String, field: &'static str },
}
