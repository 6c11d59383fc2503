//! Fleet API client module.
//!
//! The Fleet API is the scheduler that owns desired and actual container-group
//! records. Everything above this module talks to it through [`FleetApi`].

mod client;
mod error;
mod types;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::FleetClient;
pub use error::{FleetError, FleetResult};
pub use types::*;

/// Fleet API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Base URL of the scheduler API.
    pub url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Fleet API abstraction for testability.
#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn get_desired(&self, process_guid: &str) -> FleetResult<DesiredLrp>;
    async fn create_desired(&self, request: &DesiredLrpCreateRequest) -> FleetResult<()>;
    async fn delete_desired(&self, process_guid: &str) -> FleetResult<()>;
    async fn list_desired(&self, domain: &str) -> FleetResult<Vec<DesiredLrp>>;
    async fn list_actual(&self, domain: &str) -> FleetResult<Vec<ActualLrp>>;
    async fn list_actual_by_name(&self, process_guid: &str) -> FleetResult<Vec<ActualLrp>>;
}

#[async_trait]
impl FleetApi for FleetClient {
    async fn get_desired(&self, process_guid: &str) -> FleetResult<DesiredLrp> {
        self.get_desired(process_guid).await
    }

    async fn create_desired(&self, request: &DesiredLrpCreateRequest) -> FleetResult<()> {
        self.create_desired(request).await
    }

    async fn delete_desired(&self, process_guid: &str) -> FleetResult<()> {
        self.delete_desired(process_guid).await
    }

    async fn list_desired(&self, domain: &str) -> FleetResult<Vec<DesiredLrp>> {
        self.list_desired(domain).await
    }

    async fn list_actual(&self, domain: &str) -> FleetResult<Vec<ActualLrp>> {
        self.list_actual(domain).await
    }

    async fn list_actual_by_name(&self, process_guid: &str) -> FleetResult<Vec<ActualLrp>> {
        self.list_actual_by_name(process_guid).await
    }
}
