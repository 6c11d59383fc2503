//! Fleet API record and request types.
//!
//! These mirror the scheduler's JSON wire format. Actions use serde's externally
//! tagged representation, which matches the scheduler's `{"<type>": {...}}` encoding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Routing key understood by the platform router.
pub const ROUTER_KEY: &str = "cf-router";

/// Actual instance states reported by the scheduler.
pub const STATE_CLAIMED: &str = "CLAIMED";
pub const STATE_RUNNING: &str = "RUNNING";

/// Protocol value for an egress rule matching all traffic.
pub const ALL_PROTOCOL: &str = "all";

/// Opaque routing annotations keyed by router name.
pub type RoutingInfo = BTreeMap<String, serde_json::Value>;

/// A unit of work executed inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Download(DownloadAction),
    Run(RunAction),
    Serial(SerialAction),
    Parallel(ParallelAction),
}

impl Action {
    /// Iterate over this action and all nested actions, depth first.
    pub fn flatten(&self) -> Vec<&Action> {
        let mut out = vec![self];
        match self {
            Action::Serial(SerialAction { actions, .. })
            | Action::Parallel(ParallelAction { actions, .. }) => {
                for action in actions {
                    out.extend(action.flatten());
                }
            }
            Action::Download(_) | Action::Run(_) => {}
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAction {
    pub from: String,
    pub to: String,
    pub cache_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAction {
    pub path: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub privileged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_source: Option<String>,
}

impl RunAction {
    pub fn new(path: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            path: path.into(),
            args,
            env: Vec::new(),
            resource_limits: ResourceLimits::default(),
            privileged: false,
            log_source: None,
        }
    }

    pub fn log_source(mut self, source: impl Into<String>) -> Self {
        self.log_source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialAction {
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelAction {
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nofile: Option<u64>,
}

/// Egress firewall rule attached to a desired record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub protocol: String,
    pub destinations: Vec<String>,
}

impl SecurityGroupRule {
    /// A rule allowing all egress traffic.
    pub fn allow_all() -> Self {
        Self {
            protocol: ALL_PROTOCOL.to_string(),
            destinations: vec!["0.0.0.0/0".to_string()],
        }
    }
}

/// A hostname set routed to one container port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub hostnames: Vec<String>,
    pub port: u16,
}

/// Encode router routes into routing annotations.
pub fn routing_info(routes: &[Route]) -> RoutingInfo {
    let mut info = RoutingInfo::new();
    info.insert(ROUTER_KEY.to_string(), serde_json::json!(routes));
    info
}

/// Decode router routes from routing annotations. Missing key means no routes.
pub fn routes_from_routing_info(info: &RoutingInfo) -> Result<Vec<Route>, serde_json::Error> {
    match info.get(ROUTER_KEY) {
        Some(value) => serde_json::from_value(value.clone()),
        None => Ok(Vec::new()),
    }
}

/// Request to create a desired record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredLrpCreateRequest {
    pub process_guid: String,
    pub domain: String,
    #[serde(rename = "rootfs")]
    pub root_fs: String,
    pub instances: u32,
    pub stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<Action>,
    pub action: Action,
    pub start_timeout: u32,
    pub disk_mb: u32,
    pub memory_mb: u32,
    pub cpu_weight: u32,
    pub privileged: bool,
    pub ports: Vec<u16>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub routes: RoutingInfo,
    pub log_guid: String,
    pub log_source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub egress_rules: Vec<SecurityGroupRule>,
}

/// Desired record as reported by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredLrp {
    pub process_guid: String,
    pub domain: String,
    #[serde(rename = "rootfs")]
    pub root_fs: String,
    pub instances: u32,
    pub stack: String,
    pub disk_mb: u32,
    pub memory_mb: u32,
    pub cpu_weight: u32,
    pub ports: Vec<u16>,
    pub routes: RoutingInfo,
}

/// Container to host port mapping of an actual instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: u16,
    #[serde(default)]
    pub host_port: u16,
}

/// A live instance of a desired record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActualLrp {
    pub process_guid: String,
    pub instance_guid: String,
    pub cell_id: String,
    pub domain: String,
    pub index: u32,
    pub address: String,
    pub ports: Vec<PortMapping>,
    pub state: String,
    pub since: i64,
}

impl ActualLrp {
    pub fn is_running(&self) -> bool {
        self.state == STATE_RUNNING
    }
}

/// Error body returned by the scheduler.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FleetErrorBody {
    pub name: String,
    pub message: String,
}
