//! Attach session bookkeeping.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::workstation::WorkstationError;

/// Hands out session ids. Clones share one sequence.
#[derive(Debug, Clone, Default)]
pub struct SessionIds(Arc<AtomicU64>);

impl SessionIds {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Why a session failed before it was bridged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    NotReady,
    ConnectError,
    UpgradeError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::NotReady => "not_ready",
            FailureKind::ConnectError => "connect_error",
            FailureKind::UpgradeError => "upgrade_error",
        }
    }
}

impl From<&WorkstationError> for FailureKind {
    fn from(err: &WorkstationError) -> Self {
        match err {
            WorkstationError::NotFound(_) => FailureKind::NotFound,
            WorkstationError::NotReady { .. } => FailureKind::NotReady,
            WorkstationError::Upgrade(_) => FailureKind::UpgradeError,
            _ => FailureKind::ConnectError,
        }
    }
}

/// Lifecycle of one attach session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Resolving,
    Connecting,
    Upgrading,
    Bridged,
    Closing,
    Closed,
    Failed(FailureKind),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Resolving => f.write_str("RESOLVING"),
            SessionState::Connecting => f.write_str("CONNECTING"),
            SessionState::Upgrading => f.write_str("UPGRADING"),
            SessionState::Bridged => f.write_str("BRIDGED"),
            SessionState::Closing => f.write_str("CLOSING"),
            SessionState::Closed => f.write_str("CLOSED"),
            SessionState::Failed(kind) => write!(f, "FAILED({})", kind.as_str()),
        }
    }
}

/// One attach call. Not persisted.
#[derive(Debug)]
pub struct AttachSession {
    id: u64,
    workstation: String,
    state: SessionState,
}

impl AttachSession {
    pub fn new(id: u64, workstation: impl Into<String>) -> Self {
        Self {
            id,
            workstation: workstation.into(),
            state: SessionState::Resolving,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn workstation(&self) -> &str {
        &self.workstation
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to `next`. Terminal states are never left.
    pub fn transition(&mut self, next: SessionState) {
        if self.state.is_terminal() {
            warn!(
                session = self.id,
                workstation = %self.workstation,
                "ignoring transition {} -> {}",
                self.state,
                next
            );
            return;
        }
        debug!(
            session = self.id,
            workstation = %self.workstation,
            "attach session {} -> {}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Mark the session failed and hand the error back for propagation.
    pub fn fail(&mut self, err: WorkstationError) -> WorkstationError {
        self.transition(SessionState::Failed(FailureKind::from(&err)));
        err
    }
}
