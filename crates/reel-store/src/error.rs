use thiserror::Error;

/// Job store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("job already queued or processing: {0}")]
    Conflict(String),

    #[error("job not found: {0}")]
    NotFound(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Conflict(id.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
