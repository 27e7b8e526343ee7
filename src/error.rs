use thiserror::Error;

/// Failures surfaced by the sync layer to its callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("session expired, please log in again")]
    Unauthorized,

    #[error("server responded with {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("request cancelled")]
    Cancelled,

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("local storage error: {0}")]
    Storage(String),

    #[error("sync worker is not running")]
    Channel,
}

impl SyncError {
    /// Whether retrying the same user action may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Http { .. } | SyncError::Network(_) | SyncError::Timeout(_)
        )
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        SyncError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
