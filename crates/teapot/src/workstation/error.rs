//! Workstation error types.

use thiserror::Error;

use crate::fleet::FleetError;

/// Result type for workstation operations.
pub type WorkstationResult<T> = Result<T, WorkstationError>;

/// Errors raised by the lifecycle manager and the attach bridge.
#[derive(Debug, Error)]
pub enum WorkstationError {
    /// One or more fields failed validation.
    #[error("Invalid field: {}", .0.join(", "))]
    Validation(Vec<&'static str>),

    /// A workstation with the same key already exists.
    #[error("Unique constraint failed for: {field}")]
    Duplicate { field: &'static str },

    /// No such workstation or no scheduled instance.
    #[error("Workstation with name '{0}' not found")]
    NotFound(String),

    /// The instance exists but is not running.
    #[error("Workstation {process_guid} is not RUNNING (state: {state})")]
    NotReady { process_guid: String, state: String },

    /// A Fleet API call failed.
    #[error(transparent)]
    Upstream(#[from] FleetError),

    /// The in-container agent rejected or failed a request.
    #[error("agent request failed: {0}")]
    Agent(String),

    /// Dialing the instance failed. The address is kept for server-side logs.
    #[error("failed to connect to workstation instance: {message}")]
    Connect { address: String, message: String },

    /// A protocol upgrade failed on either side of an attach session.
    #[error("websocket upgrade failed: {0}")]
    Upgrade(String),
}

impl WorkstationError {
    /// Machine-readable kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Duplicate { .. } => "duplicate",
            Self::NotFound(_) => "not_found",
            Self::NotReady { .. } => "not_ready",
            Self::Upstream(_) => "upstream",
            Self::Agent(_) => "agent",
            Self::Connect { .. } => "connect_error",
            Self::Upgrade(_) => "upgrade_error",
        }
    }
}
