//! Workstation lifecycle manager.
//!
//! Reconciles user-level workstations into the scheduler's desired/actual model.
//! The manager holds no state between calls; every operation is a short sequence
//! of Fleet API calls.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use urlencoding::encode;

use crate::fleet::{ActualLrp, FleetApi};

use super::config::WorkstationConfig;
use super::error::{WorkstationError, WorkstationResult};
use super::models::{CreateWorkstationRequest, Workstation, WorkstationState};
use super::routes::RouteProvider;
use super::spec::desired_lrp_request;

/// Timeout for requests to the in-container agent.
const AGENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle operations over workstations.
#[derive(Clone)]
pub struct WorkstationManager {
    fleet: Arc<dyn FleetApi>,
    config: Arc<WorkstationConfig>,
    routes: RouteProvider,
    http: Client,
}

impl WorkstationManager {
    pub fn new(fleet: Arc<dyn FleetApi>, config: WorkstationConfig) -> WorkstationResult<Self> {
        let http = Client::builder()
            .timeout(AGENT_TIMEOUT)
            .build()
            .map_err(|e| WorkstationError::Agent(e.to_string()))?;

        Ok(Self {
            routes: RouteProvider::from_config(&config),
            config: Arc::new(config),
            fleet,
            http,
        })
    }

    /// Build a workstation from a create request, applying the default image.
    pub fn workstation_from_request(&self, request: CreateWorkstationRequest) -> Workstation {
        Workstation::from_request(request, &self.config.default_image)
    }

    /// Create a workstation.
    ///
    /// Validates, checks for an existing desired record with the same name and
    /// submits a new one. The check and the submission are not atomic.
    pub async fn create(&self, workstation: &Workstation) -> WorkstationResult<()> {
        workstation.validate()?;

        match self.fleet.get_desired(&workstation.name).await {
            Ok(existing) if existing.process_guid == workstation.name => {
                debug!("Workstation {} already has a desired record", workstation.name);
                return Err(WorkstationError::Duplicate { field: "name" });
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let request = desired_lrp_request(workstation, &self.config, &self.routes);
        self.fleet.create_desired(&request).await?;

        info!(
            "Created workstation {} with image {}",
            workstation.name, workstation.docker_image
        );
        Ok(())
    }

    /// Delete a workstation's desired record. Instances are reaped by the scheduler.
    pub async fn delete(&self, name: &str) -> WorkstationResult<()> {
        self.fleet.delete_desired(name).await?;
        info!("Deleted workstation {}", name);
        Ok(())
    }

    /// Actual instances currently scheduled for a workstation.
    ///
    /// An empty list means nothing is scheduled; it is not an error.
    pub async fn fetch(&self, name: &str) -> WorkstationResult<Vec<ActualLrp>> {
        Ok(self.fleet.list_actual_by_name(name).await?)
    }

    /// All workstations in the managed domain, in scheduler order.
    pub async fn list(&self) -> WorkstationResult<Vec<Workstation>> {
        let domain = &self.config.fleet_domain;
        let (desired, actual) = tokio::try_join!(
            self.fleet.list_desired(domain),
            self.fleet.list_actual(domain)
        )?;

        let workstations = desired
            .into_iter()
            .map(|lrp| {
                let state = actual
                    .iter()
                    .find(|instance| instance.process_guid == lrp.process_guid)
                    .map(|instance| WorkstationState::from(instance.state.clone()))
                    .unwrap_or_default();

                Workstation {
                    name: lrp.process_guid,
                    docker_image: lrp.root_fs,
                    cpu_weight: lrp.cpu_weight,
                    disk_mb: lrp.disk_mb,
                    memory_mb: lrp.memory_mb,
                    state,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "Listed {} workstations from {} instances",
            workstations.len(),
            actual.len()
        );
        Ok(workstations)
    }

    /// Install a public key through the workstation's agent.
    pub async fn add_key(&self, name: &str, public_key: String) -> WorkstationResult<()> {
        let url = self.add_key_url(name);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(public_key)
            .send()
            .await
            .map_err(|e| {
                warn!("Add-key request for workstation {} failed: {}", name, e);
                WorkstationError::Agent(e.without_url().to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Agent for workstation {} rejected key: {} {}",
                name, status, body
            );
            return Err(WorkstationError::Agent(format!(
                "agent returned status {}",
                status.as_u16()
            )));
        }

        info!("Added key to workstation {}", name);
        Ok(())
    }

    /// Agent endpoint for key installation, reached through the ssh route.
    pub fn add_key_url(&self, name: &str) -> String {
        format!(
            "http://{}/add-key/{}",
            self.routes.ssh_route(name),
            encode(&self.config.agent_secret)
        )
    }
}
