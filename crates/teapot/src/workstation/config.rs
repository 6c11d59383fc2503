//! Workstation provisioning configuration.

use serde::{Deserialize, Serialize};

use super::models::DEFAULT_IMAGE;

/// Settings that shape every workstation's desired record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkstationConfig {
    /// Scheduler domain owning all workstation records.
    pub fleet_domain: String,
    /// Base domain for generated hostnames.
    pub apps_domain: String,
    /// Hostname prefix for the interactive-app route.
    pub app_route_prefix: String,
    /// Hostname prefix for the ssh route.
    pub ssh_route_prefix: String,
    /// Shared secret handed to the in-container agent.
    pub agent_secret: String,
    /// Image used when a create request leaves `docker_image` empty.
    pub default_image: String,
    /// Scheduler stack name.
    pub stack: String,
    /// Download URL of the shell server artifact.
    pub shell_server_url: String,
    /// Download URL of the in-container agent artifact.
    pub agent_url: String,
}

impl Default for WorkstationConfig {
    fn default() -> Self {
        Self {
            fleet_domain: "tiego".to_string(),
            apps_domain: String::new(),
            app_route_prefix: "tiego".to_string(),
            ssh_route_prefix: "ssh".to_string(),
            agent_secret: String::new(),
            default_image: DEFAULT_IMAGE.to_string(),
            stack: "lucid64".to_string(),
            shell_server_url: "https://tiego-artifacts.s3.amazonaws.com/dropbear/dropbear.tar.gz"
                .to_string(),
            agent_url: "https://tiego-artifacts.s3.amazonaws.com/tea-builds/tea-latest.tgz"
                .to_string(),
        }
    }
}
