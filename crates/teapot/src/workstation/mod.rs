//! Workstation domain: entity, validation, routing and lifecycle management.

mod config;
mod error;
mod manager;
mod models;
mod routes;
mod spec;

pub use config::WorkstationConfig;
pub use error::{WorkstationError, WorkstationResult};
pub use manager::WorkstationManager;
pub use models::{
    CreateWorkstationRequest, DEFAULT_IMAGE, Workstation, WorkstationResponse, WorkstationState,
};
pub use routes::RouteProvider;
pub use spec::{AGENT_PORT, APP_PORT, desired_lrp_request, run_action, setup_action};
