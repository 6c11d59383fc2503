//! Teapot API client error types.

use thiserror::Error;

/// Result type for API client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`super::TeapotClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid teapot url: {0}")]
    InvalidUrl(String),

    /// HTTP request failed before a response arrived.
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The server answered with a `{name, message}` error body.
    #[error("{name}: {message}")]
    Api {
        status: u16,
        name: String,
        message: String,
    },

    /// The server answered with an error status and no readable body.
    #[error("teapot returned status {status}")]
    Status { status: u16 },

    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("websocket handshake failed: {0}")]
    Handshake(String),
}

impl ClientError {
    /// HTTP status of a server-side rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } | ClientError::Status { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
