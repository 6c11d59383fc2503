//! Application state shared across handlers.

use crate::attach::AttachBridge;
use crate::auth::AuthState;
use crate::workstation::WorkstationManager;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Workstation lifecycle operations.
    pub workstations: WorkstationManager,
    /// Attach session bridge.
    pub attach: AttachBridge,
    /// Basic auth state.
    pub auth: AuthState,
}

impl AppState {
    pub fn new(workstations: WorkstationManager, auth: AuthState) -> Self {
        Self {
            attach: AttachBridge::new(workstations.clone()),
            workstations,
            auth,
        }
    }
}
