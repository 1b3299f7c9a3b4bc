//! Common error types for the attendance dashboard

use thiserror::Error;

/// Common result type for dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds shared by the engine, both source strategies and the HTTP service
#[derive(Error, Debug)]
pub enum Error {
    /// No remote endpoint configured
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Remote request failed or timed out, or the bulk resource could not be fetched
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single input row could not be turned into a record.
    /// Loads drop the row and carry on; it never fails a load or a query.
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    /// Both the remote and the local strategy failed
    #[error("Initialization failed (remote: {remote}; local: {local})")]
    InitializationFailed { remote: String, local: String },

    /// A query was issued before a successful initialization
    #[error("Data source not initialized")]
    Uninitialized,

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::SourceUnavailable(format!("request timed out: {}", err))
        } else {
            Error::SourceUnavailable(err.to_string())
        }
    }
}
