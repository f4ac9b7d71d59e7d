//! Error types for audit export operations
/// Custom error type for the audit export engine
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// A query exceeded its deadline
    #[error("query timed out after {0} seconds")]
    Timeout(u64),

    /// The transport returned something that is not well-formed JSON
    #[error("malformed response: {0}")]
    Protocol(String),

    /// A payload is missing the expected shape (usually the `data` field)
    #[error("unexpected payload shape: {0}")]
    Schema(String),

    /// The query transport reported a failure (non-zero exit, error payload)
    #[error("upstream query failed: {0}")]
    Upstream(String),

    /// File I/O error
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid date
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Invalid date range
    #[error("invalid date range: {0}")]
    DateRangeInvalid(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for audit export operations
pub type Result<T> = std::result::Result<T, ExportError>;
