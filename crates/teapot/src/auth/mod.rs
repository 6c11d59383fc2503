//! HTTP basic authentication.
//!
//! Disabled unless both a username and a password are configured.

mod config;
mod error;
mod middleware;

pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{AuthState, basic_auth_middleware};
