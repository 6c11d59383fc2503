//! Test utilities and common setup.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::sync::{Arc, Mutex};
use teapot::api::{self, AppState};
use teapot::auth::{AuthConfig, AuthState};
use teapot::fleet::{
    ActualLrp, DesiredLrp, DesiredLrpCreateRequest, FleetApi, FleetError, FleetResult,
    PortMapping,
};
use teapot::workstation::{WorkstationConfig, WorkstationManager};

pub const TEST_SECRET: &str = "s3cret";
pub const TEST_APPS_DOMAIN: &str = "apps.example.com";

/// A call observed by [`FakeFleet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetCall {
    GetDesired(String),
    CreateDesired(String),
    DeleteDesired(String),
    ListDesired(String),
    ListActual(String),
    ListActualByName(String),
}

#[derive(Default)]
struct FleetState {
    desired: Vec<DesiredLrp>,
    actual: Vec<ActualLrp>,
    created: Vec<DesiredLrpCreateRequest>,
    calls: Vec<FleetCall>,
    fail_with: Option<(String, String)>,
}

/// In-memory scheduler that records every call.
#[derive(Default)]
pub struct FakeFleet {
    state: Mutex<FleetState>,
}

impl FakeFleet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_desired(&self, name: &str, image: &str) {
        self.state.lock().unwrap().desired.push(DesiredLrp {
            process_guid: name.to_string(),
            domain: "tiego".to_string(),
            root_fs: image.to_string(),
            ..DesiredLrp::default()
        });
    }

    pub fn add_actual(&self, name: &str, state: &str, address: &str, host_port: u16) {
        self.state.lock().unwrap().actual.push(ActualLrp {
            process_guid: name.to_string(),
            instance_guid: format!("{name}-0"),
            domain: "tiego".to_string(),
            address: address.to_string(),
            ports: vec![PortMapping {
                container_port: 8080,
                host_port,
            }],
            state: state.to_string(),
            ..ActualLrp::default()
        });
    }

    /// Make every subsequent call fail with a scheduler error body.
    pub fn fail_with(&self, name: &str, message: &str) {
        self.state.lock().unwrap().fail_with = Some((name.to_string(), message.to_string()));
    }

    pub fn calls(&self) -> Vec<FleetCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&FleetCall) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn created(&self) -> Vec<DesiredLrpCreateRequest> {
        self.state.lock().unwrap().created.clone()
    }

    fn record(&self, call: FleetCall) -> FleetResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match &state.fail_with {
            Some((name, message)) => Err(FleetError::Api {
                name: name.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FleetApi for FakeFleet {
    async fn get_desired(&self, process_guid: &str) -> FleetResult<DesiredLrp> {
        self.record(FleetCall::GetDesired(process_guid.to_string()))?;
        self.state
            .lock()
            .unwrap()
            .desired
            .iter()
            .find(|lrp| lrp.process_guid == process_guid)
            .cloned()
            .ok_or_else(|| FleetError::NotFound(process_guid.to_string()))
    }

    async fn create_desired(&self, request: &DesiredLrpCreateRequest) -> FleetResult<()> {
        self.record(FleetCall::CreateDesired(request.process_guid.clone()))?;
        let mut state = self.state.lock().unwrap();
        state.created.push(request.clone());
        state.desired.push(DesiredLrp {
            process_guid: request.process_guid.clone(),
            domain: request.domain.clone(),
            root_fs: request.root_fs.clone(),
            instances: request.instances,
            stack: request.stack.clone(),
            disk_mb: request.disk_mb,
            memory_mb: request.memory_mb,
            cpu_weight: request.cpu_weight,
            ports: request.ports.clone(),
            routes: request.routes.clone(),
        });
        Ok(())
    }

    async fn delete_desired(&self, process_guid: &str) -> FleetResult<()> {
        self.record(FleetCall::DeleteDesired(process_guid.to_string()))?;
        let mut state = self.state.lock().unwrap();
        let before = state.desired.len();
        state.desired.retain(|lrp| lrp.process_guid != process_guid);
        if state.desired.len() == before {
            return Err(FleetError::NotFound(process_guid.to_string()));
        }
        Ok(())
    }

    async fn list_desired(&self, domain: &str) -> FleetResult<Vec<DesiredLrp>> {
        self.record(FleetCall::ListDesired(domain.to_string()))?;
        Ok(self.state.lock().unwrap().desired.clone())
    }

    async fn list_actual(&self, domain: &str) -> FleetResult<Vec<ActualLrp>> {
        self.record(FleetCall::ListActual(domain.to_string()))?;
        Ok(self.state.lock().unwrap().actual.clone())
    }

    async fn list_actual_by_name(&self, process_guid: &str) -> FleetResult<Vec<ActualLrp>> {
        self.record(FleetCall::ListActualByName(process_guid.to_string()))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .actual
            .iter()
            .filter(|lrp| lrp.process_guid == process_guid)
            .cloned()
            .collect())
    }
}

pub fn test_workstation_config() -> WorkstationConfig {
    WorkstationConfig {
        apps_domain: TEST_APPS_DOMAIN.to_string(),
        agent_secret: TEST_SECRET.to_string(),
        ..WorkstationConfig::default()
    }
}

pub fn test_state(fleet: Arc<dyn FleetApi>, auth: AuthConfig) -> AppState {
    let manager = WorkstationManager::new(fleet, test_workstation_config())
        .expect("Failed to create workstation manager");
    AppState::new(manager, AuthState::new(auth))
}

/// Router backed by `fleet`, without authentication.
pub fn test_app(fleet: Arc<FakeFleet>) -> Router {
    test_app_with_fleet(fleet)
}

/// Router backed by any scheduler client, without authentication.
pub fn test_app_with_fleet(fleet: Arc<dyn FleetApi>) -> Router {
    api::create_router(test_state(fleet, AuthConfig::default()))
}

/// Router backed by `fleet`, requiring basic auth.
pub fn test_app_with_auth(fleet: Arc<FakeFleet>, username: &str, password: &str) -> Router {
    api::create_router(test_state(
        fleet,
        AuthConfig {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        },
    ))
}
