//! Fleet client error types.

use thiserror::Error;

/// Result type for Fleet API operations.
pub type FleetResult<T> = Result<T, FleetError>;

/// Errors that can occur while talking to the Fleet API.
#[derive(Debug, Error)]
pub enum FleetError {
    /// HTTP request failed before a response arrived. Carries no request URL.
    #[error("fleet request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// The requested record does not exist.
    #[error("fleet record not found: {0}")]
    NotFound(String),

    /// The scheduler returned a structured error.
    #[error("{name}: {message}")]
    Api { name: String, message: String },

    /// The scheduler returned an unexpected status without a readable body.
    #[error("fleet returned status {status}")]
    Status { status: u16 },

    /// Failed to parse a response.
    #[error("failed to parse fleet response: {0}")]
    ParseError(String),
}

impl FleetError {
    /// Wrap a transport error, dropping the scheduler URL it refers to.
    pub fn transport(err: reqwest::Error) -> Self {
        FleetError::RequestFailed(err.without_url())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FleetError::NotFound(_))
    }
}
