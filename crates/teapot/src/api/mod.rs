//! HTTP API module.
//!
//! Workstation lifecycle endpoints and the attach websocket.

mod error;
pub mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
