use thiserror::Error;

/// Result type for report pipeline operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur in the report pipeline.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Input file is not an accepted image type
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: String, reason: String },

    /// Upstream service signalled throttling (transient, retryable)
    #[error("Rate limited by upstream: {0}")]
    RateLimited(String),

    /// Any other non-success response from the upstream service
    #[error("API error: {0}")]
    Api(String),

    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to produce or persist the output artifact (fatal to the run)
    #[error("Render error: {0}")]
    Render(String),

    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials did not match
    #[error("Invalid username or password")]
    Unauthorized,
}
