//! Store-specific error types and conversions.

use tokengate_core::error::GateError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record already exists: {entity} with {field} {value}")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Invalid record: {0}")]
    Invalid(String),

    #[error("Seed file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Seed parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<StoreError> for GateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { entity, .. } => GateError::AlreadyExists { entity },
            StoreError::Invalid(message) => GateError::Validation { message },
            other => GateError::Storage(other.to_string()),
        }
    }
}
