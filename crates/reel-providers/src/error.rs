use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors from visual provider calls.
///
/// A provider error never aborts a job by itself; the resolver treats any
/// of these as "try the next adapter".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("provider task failed: {0}")]
    TaskFailed(String),

    #[error("provider task still pending after {attempts} polls")]
    PollExhausted { attempts: u32 },

    #[error("provider returned no usable result")]
    Empty,

    #[error("invalid provider payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Media(#[from] reel_media::MediaError),

    #[error("JSON parse error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }
}
