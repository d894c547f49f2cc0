use modeleval_core::Error as CoreError;
use thiserror::Error;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Store '{0}' is unavailable")]
    Unavailable(String),

    #[error("Write rejected for key '{key}': {reason}")]
    WriteRejected { key: String, reason: String },

    #[error("Value under key '{key}' has an unexpected shape: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        CoreError::storage(err.to_string())
    }
}

impl StorageError {
    pub(crate) fn invalid_value(key: &str, err: serde_json::Error) -> Self {
        StorageError::InvalidValue {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}
