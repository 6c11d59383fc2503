//! Hostname generation for workstation routes.

use super::config::WorkstationConfig;

/// Maps workstation names to their routed hostnames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteProvider {
    apps_domain: String,
    app_prefix: String,
    ssh_prefix: String,
}

impl RouteProvider {
    pub fn new(
        apps_domain: impl Into<String>,
        app_prefix: impl Into<String>,
        ssh_prefix: impl Into<String>,
    ) -> Self {
        Self {
            apps_domain: apps_domain.into(),
            app_prefix: app_prefix.into(),
            ssh_prefix: ssh_prefix.into(),
        }
    }

    pub fn from_config(config: &WorkstationConfig) -> Self {
        Self::new(
            config.apps_domain.clone(),
            config.app_route_prefix.clone(),
            config.ssh_route_prefix.clone(),
        )
    }

    /// Hostname of the interactive-app route, `<app-prefix>-<name>.<domain>`.
    pub fn app_route(&self, name: &str) -> String {
        format!("{}-{}.{}", self.app_prefix, name, self.apps_domain)
    }

    /// Hostname of the ssh route, `<ssh-prefix>-<name>.<domain>`.
    pub fn ssh_route(&self, name: &str) -> String {
        format!("{}-{}.{}", self.ssh_prefix, name, self.apps_domain)
    }
}
