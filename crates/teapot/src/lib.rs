//! Teapot library.
//!
//! Manages named, ephemeral workstation containers on top of a fleet scheduler
//! and bridges interactive shell sessions into running workstations.

pub mod api;
pub mod attach;
pub mod auth;
pub mod client;
pub mod fleet;
pub mod workstation;
