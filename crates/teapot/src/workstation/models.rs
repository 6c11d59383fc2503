//! Workstation entity and validation rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::fleet::{STATE_CLAIMED, STATE_RUNNING};

use super::error::{WorkstationError, WorkstationResult};

/// Image used when a workstation is created without one.
pub const DEFAULT_IMAGE: &str = "docker:///ubuntu#trusty";

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid name pattern"));

static IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^docker:///[A-Za-z0-9_.\-]+(/[A-Za-z0-9_.\-]+)*(#[A-Za-z0-9_.\-]*)?$")
        .expect("valid image pattern")
});

/// Lifecycle state of a workstation, derived from its actual instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkstationState {
    /// No actual instance exists.
    #[default]
    Stopped,
    Claimed,
    Running,
    /// Any other token reported by the scheduler, kept verbatim.
    Other(String),
}

impl WorkstationState {
    pub fn as_str(&self) -> &str {
        match self {
            WorkstationState::Stopped => "STOPPED",
            WorkstationState::Claimed => STATE_CLAIMED,
            WorkstationState::Running => STATE_RUNNING,
            WorkstationState::Other(token) => token,
        }
    }
}

impl From<String> for WorkstationState {
    fn from(token: String) -> Self {
        match token.as_str() {
            "STOPPED" => WorkstationState::Stopped,
            STATE_CLAIMED => WorkstationState::Claimed,
            STATE_RUNNING => WorkstationState::Running,
            _ => WorkstationState::Other(token),
        }
    }
}

impl From<WorkstationState> for String {
    fn from(state: WorkstationState) -> Self {
        match state {
            WorkstationState::Other(token) => token,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for WorkstationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateWorkstationRequest {
    pub name: String,
    pub docker_image: String,
    pub cpu_weight: u32,
    pub disk_mb: u32,
    pub memory_mb: u32,
}

/// A user-facing workstation backed by one desired record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workstation {
    pub name: String,
    pub docker_image: String,
    /// Resource hints; zero means the platform default.
    pub cpu_weight: u32,
    pub disk_mb: u32,
    pub memory_mb: u32,
    pub state: WorkstationState,
}

impl Workstation {
    pub fn new(name: impl Into<String>, docker_image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docker_image: docker_image.into(),
            cpu_weight: 0,
            disk_mb: 0,
            memory_mb: 0,
            state: WorkstationState::Stopped,
        }
    }

    /// Build a workstation from a create request, falling back to `default_image`.
    pub fn from_request(request: CreateWorkstationRequest, default_image: &str) -> Self {
        let docker_image = if request.docker_image.is_empty() {
            default_image.to_string()
        } else {
            request.docker_image
        };

        Self {
            name: request.name,
            docker_image,
            cpu_weight: request.cpu_weight,
            disk_mb: request.disk_mb,
            memory_mb: request.memory_mb,
            state: WorkstationState::Stopped,
        }
    }

    /// Check the name and image against their allowed grammars.
    ///
    /// Every offending field is reported, not only the first.
    pub fn validate(&self) -> WorkstationResult<()> {
        let mut invalid = Vec::new();

        if !NAME_PATTERN.is_match(&self.name) {
            invalid.push("name");
        }
        if !IMAGE_PATTERN.is_match(&self.docker_image) {
            invalid.push("docker_image");
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(WorkstationError::Validation(invalid))
        }
    }
}

/// Workstation as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkstationResponse {
    pub name: String,
    pub docker_image: String,
    pub state: WorkstationState,
}

impl From<Workstation> for WorkstationResponse {
    fn from(workstation: Workstation) -> Self {
        Self {
            name: workstation.name,
            docker_image: workstation.docker_image,
            state: workstation.state,
        }
    }
}
