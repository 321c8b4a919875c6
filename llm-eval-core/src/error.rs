use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Expected assistant message for sample {index} but got: role={role}, content={content}")]
    LabelRole {
        index: usize,
        role: String,
        content: String,
    },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Gathered {actual} samples but the dataset has {expected}")]
    GatherMismatch { expected: usize, actual: usize },

    #[error("Index integrity violated: {0}")]
    IndexIntegrity(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Errors caused by bad input data. Retrying them cannot succeed.
    pub fn is_input_error(&self) -> bool {
        matches!(self, CoreError::Validation(_) | CoreError::LabelRole { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

// Implement From for common error types
impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Persistence(err.to_string())
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        CoreError::Validation(err.to_string())
    }
}
