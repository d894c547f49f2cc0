use thiserror::Error;

/// Result type for model evaluation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for model evaluation operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Dataset collaborator errors (listing, info lookup, results loading)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Evaluation key that the dataset does not know about
    #[error("Evaluation not found: {0}")]
    EvaluationNotFound(String),

    /// Results view whose sequences disagree in length
    #[error("Malformed results for {eval_key}: {message}")]
    MalformedResults { eval_key: String, message: String },
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a dataset error
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Creates a not-found error for an evaluation key
    pub fn evaluation_not_found(eval_key: impl Into<String>) -> Self {
        Self::EvaluationNotFound(eval_key.into())
    }

    /// Creates a malformed results error
    pub fn malformed_results(eval_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResults {
            eval_key: eval_key.into(),
            message: message.into(),
        }
    }
}
