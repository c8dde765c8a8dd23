//! Error types shared across the search subsystem

use thiserror::Error;

/// Errors raised by the catalog, the vector store and the reindex pipeline
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("catalog item not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("vector engine unavailable: {0}")]
    VectorUnavailable(String),

    #[error("storage lock poisoned")]
    LockPoisoned,
}

/// Failures on the remote embedding path.
///
/// These never reach callers of `EmbeddingProvider::generate`; each one selects
/// the offline fallback instead.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("no remote embedding endpoint configured")]
    NotConfigured,

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed embedding payload: {0}")]
    Payload(String),

    #[error("expected {expected} dimensions, got {actual}")]
    Dimension { expected: usize, actual: usize },
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmbeddingError::Timeout
        } else if err.is_decode() {
            EmbeddingError::Payload(err.to_string())
        } else {
            EmbeddingError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
