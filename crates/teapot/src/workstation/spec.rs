//! Translation of a workstation into a desired record.

use crate::fleet::{
    Action, DesiredLrpCreateRequest, DownloadAction, ParallelAction, Route, RunAction,
    SecurityGroupRule, SerialAction, routing_info,
};

use super::config::WorkstationConfig;
use super::models::Workstation;
use super::routes::RouteProvider;

/// Port the in-container agent serves the shell websocket and key API on.
pub const AGENT_PORT: u16 = 8080;
/// Port of the interactive app.
pub const APP_PORT: u16 = 3000;
/// Loopback address the shell server binds to inside the container.
pub const SHELL_SERVER_BIND: &str = "127.0.0.1:22000";

const LOG_SOURCE: &str = "TEAPOT-WORKSTATION";
const HOST_KEY_TYPES: [&str; 3] = ["rsa", "dss", "ecdsa"];

fn host_key_path(key_type: &str) -> String {
    format!("/tmp/dropbear_{key_type}_host_key")
}

/// Setup phase: fetch the shell server and agent, then generate host keys.
pub fn setup_action(config: &WorkstationConfig) -> Action {
    let mut actions = vec![
        Action::Download(DownloadAction {
            from: config.shell_server_url.clone(),
            to: "/tmp".to_string(),
            cache_key: "dropbear".to_string(),
            log_source: None,
        }),
        Action::Download(DownloadAction {
            from: config.agent_url.clone(),
            to: "/tmp".to_string(),
            cache_key: "tea".to_string(),
            log_source: None,
        }),
    ];

    actions.extend(HOST_KEY_TYPES.iter().map(|key_type| {
        Action::Run(
            RunAction::new(
                "/tmp/dropbearkey",
                vec![
                    "-t".to_string(),
                    key_type.to_string(),
                    "-f".to_string(),
                    host_key_path(key_type),
                ],
            )
            .log_source("KEYGEN"),
        )
    }));

    Action::Serial(SerialAction {
        actions,
        log_source: None,
    })
}

/// Run phase: the shell server and the agent side by side.
pub fn run_action(config: &WorkstationConfig) -> Action {
    let host_keys = HOST_KEY_TYPES
        .iter()
        .map(|key_type| format!("-r {}", host_key_path(key_type)))
        .collect::<Vec<_>>()
        .join(" ");

    let shell_server = RunAction::new(
        "/bin/bash",
        vec![
            "-c".to_string(),
            format!("set -e && /tmp/dropbear -p {SHELL_SERVER_BIND} {host_keys}"),
        ],
    )
    .log_source("SSHD");

    let agent = RunAction::new(
        "/tmp/tea",
        vec!["-secret".to_string(), config.agent_secret.clone()],
    )
    .log_source("TEA");

    Action::Parallel(ParallelAction {
        actions: vec![Action::Run(shell_server), Action::Run(agent)],
        log_source: None,
    })
}

/// Build the desired record submitted for a workstation.
pub fn desired_lrp_request(
    workstation: &Workstation,
    config: &WorkstationConfig,
    routes: &RouteProvider,
) -> DesiredLrpCreateRequest {
    let routes = routing_info(&[
        Route {
            hostnames: vec![routes.app_route(&workstation.name)],
            port: APP_PORT,
        },
        Route {
            hostnames: vec![routes.ssh_route(&workstation.name)],
            port: AGENT_PORT,
        },
    ]);

    DesiredLrpCreateRequest {
        process_guid: workstation.name.clone(),
        domain: config.fleet_domain.clone(),
        root_fs: workstation.docker_image.clone(),
        instances: 1,
        stack: config.stack.clone(),
        setup: Some(setup_action(config)),
        action: run_action(config),
        start_timeout: 0,
        disk_mb: workstation.disk_mb,
        memory_mb: workstation.memory_mb,
        cpu_weight: workstation.cpu_weight,
        privileged: true,
        ports: vec![AGENT_PORT, APP_PORT],
        routes,
        log_guid: workstation.name.clone(),
        log_source: LOG_SOURCE.to_string(),
        egress_rules: vec![SecurityGroupRule::allow_all()],
    }
}
