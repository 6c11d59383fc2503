//! HTTP request handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, State,
        ws::{WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::Response,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, instrument, warn};

use crate::attach::{AttachSession, abandon};

use crate::workstation::{CreateWorkstationRequest, WorkstationError, WorkstationResponse};

use super::error::ApiResult;
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a workstation.
///
/// The body is decoded as JSON whatever its `Content-Type`.
#[instrument(skip(state, body))]
pub async fn create_workstation(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let request: CreateWorkstationRequest = serde_json::from_slice(&body)?;
    let workstation = state.workstations.workstation_from_request(request);

    state.workstations.create(&workstation).await?;
    info!(workstation = %workstation.name, "workstation created");

    Ok(StatusCode::CREATED)
}

/// List all workstations.
#[instrument(skip(state))]
pub async fn list_workstations(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<WorkstationResponse>>> {
    let workstations = state.workstations.list().await?;
    Ok(Json(
        workstations
            .into_iter()
            .map(WorkstationResponse::from)
            .collect(),
    ))
}

/// Delete a workstation.
#[instrument(skip(state))]
pub async fn delete_workstation(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    state.workstations.delete(&name).await?;
    info!(workstation = %name, "workstation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Install a public key in a workstation.
#[instrument(skip(state, public_key))]
pub async fn add_key(
    State(state): State<AppState>,
    Path(name): Path<String>,
    public_key: String,
) -> ApiResult<StatusCode> {
    state.workstations.add_key(&name, public_key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach an interactive shell session to a running workstation.
///
/// The backend connection is dialed and handshaken before the client
/// upgrade completes, so setup failures surface as ordinary HTTP errors.
#[instrument(skip(state, ws))]
pub async fn attach_workstation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> ApiResult<Response> {
    let bridge = state.attach.clone();
    let mut session = bridge.open_session(name);

    let target = bridge.resolve(&mut session).await?;
    let stream = bridge.dial(&mut session, &target).await?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            drop(stream);
            return Err(session
                .fail(WorkstationError::Upgrade(rejection.body_text()))
                .into());
        }
    };

    let backend = bridge.handshake(&mut session, stream, &target).await?;

    // Whichever upgrade callback runs takes ownership of the session.
    let pending = Arc::new(Mutex::new(Some((session, backend))));
    let on_failed = pending.clone();

    Ok(ws
        .on_failed_upgrade(move |e: axum::Error| {
            let Some((mut session, backend)) = take_pending(&on_failed) else {
                return;
            };
            let reason = e.to_string();
            warn!(
                workstation = %session.workstation(),
                "client upgrade failed: {}", reason
            );
            tokio::spawn(async move {
                abandon(&mut session, backend, reason).await;
            });
        })
        .on_upgrade(move |socket| async move {
            if let Some((session, backend)) = take_pending(&pending) {
                bridge.bridge(session, socket, backend).await;
            }
        }))
}

type PendingAttach = (AttachSession, WebSocketStream<TcpStream>);

fn take_pending(pending: &Mutex<Option<PendingAttach>>) -> Option<PendingAttach> {
    pending.lock().ok().and_then(|mut slot| slot.take())
}
