//! Attach session bridge.
//!
//! An attach call resolves the workstation's running instance, dials it,
//! performs the websocket handshake with its shell endpoint and then relays
//! frames between the caller and the instance until either side goes away.

mod relay;
mod session;

use std::time::Duration;

use axum::extract::ws::WebSocket;
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tracing::{info, warn};

use crate::workstation::{WorkstationError, WorkstationManager, WorkstationResult};

pub use relay::{PumpEnd, abandon, backend_to_client, client_to_backend, pump, relay};
pub use session::{AttachSession, FailureKind, SessionIds, SessionState};

/// Bound on dialing and handshaking with an instance.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Network location of a running workstation's shell endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachTarget {
    pub workstation: String,
    pub process_guid: String,
    pub address: String,
    pub port: u16,
}

impl AttachTarget {
    /// `host:port` to dial.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Websocket URL of the shell endpoint, also used as the handshake `Origin`.
    pub fn url(&self) -> String {
        format!("ws://{}/shell", self.authority())
    }
}

/// Opens attach sessions against workstation instances.
#[derive(Clone)]
pub struct AttachBridge {
    manager: WorkstationManager,
    sessions: SessionIds,
}

impl AttachBridge {
    pub fn new(manager: WorkstationManager) -> Self {
        Self {
            manager,
            sessions: SessionIds::default(),
        }
    }

    /// Start tracking a new attach call.
    pub fn open_session(&self, workstation: impl Into<String>) -> AttachSession {
        AttachSession::new(self.sessions.next(), workstation)
    }

    /// Find the instance to attach to. Only the first instance is considered.
    pub async fn resolve(&self, session: &mut AttachSession) -> WorkstationResult<AttachTarget> {
        let name = session.workstation().to_string();

        let instances = match self.manager.fetch(&name).await {
            Ok(instances) => instances,
            Err(e) => {
                warn!(workstation = %name, "instance lookup failed: {}", e);
                return Err(session.fail(WorkstationError::NotFound(name)));
            }
        };

        let Some(instance) = instances.into_iter().next() else {
            return Err(session.fail(WorkstationError::NotFound(name)));
        };

        if !instance.is_running() {
            return Err(session.fail(WorkstationError::NotReady {
                process_guid: instance.process_guid,
                state: instance.state,
            }));
        }

        let Some(port) = instance.ports.first().map(|mapping| mapping.host_port) else {
            warn!(workstation = %name, address = %instance.address, "instance exposes no ports");
            return Err(session.fail(WorkstationError::Connect {
                address: instance.address,
                message: "instance exposes no ports".to_string(),
            }));
        };

        session.transition(SessionState::Connecting);
        Ok(AttachTarget {
            workstation: name,
            process_guid: instance.process_guid,
            address: instance.address,
            port,
        })
    }

    /// Open the raw connection to the instance.
    pub async fn dial(
        &self,
        session: &mut AttachSession,
        target: &AttachTarget,
    ) -> WorkstationResult<TcpStream> {
        let authority = target.authority();
        let connected = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&authority)).await;

        let message = match connected {
            Ok(Ok(stream)) => {
                session.transition(SessionState::Upgrading);
                return Ok(stream);
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "connection timed out".to_string(),
        };

        warn!(
            workstation = %session.workstation(),
            address = %authority,
            "dial failed: {}",
            message
        );
        Err(session.fail(WorkstationError::Connect {
            address: authority,
            message,
        }))
    }

    /// Perform the websocket handshake over an already dialed connection.
    ///
    /// The stream is dropped, and so closed, if the handshake fails.
    pub async fn handshake(
        &self,
        session: &mut AttachSession,
        stream: TcpStream,
        target: &AttachTarget,
    ) -> WorkstationResult<WebSocketStream<TcpStream>> {
        let url = target.url();

        let mut request = match url.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => return Err(session.fail(WorkstationError::Upgrade(e.to_string()))),
        };
        match HeaderValue::from_str(&url) {
            Ok(origin) => {
                request.headers_mut().insert(ORIGIN, origin);
            }
            Err(e) => return Err(session.fail(WorkstationError::Upgrade(e.to_string()))),
        }

        let handshake =
            tokio::time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::client_async(request, stream))
                .await;

        match handshake {
            Ok(Ok((backend, _response))) => Ok(backend),
            Ok(Err(e)) => Err(session.fail(WorkstationError::Upgrade(e.to_string()))),
            Err(_) => Err(session.fail(WorkstationError::Upgrade(
                "backend handshake timed out".to_string(),
            ))),
        }
    }

    /// Relay frames until the session ends.
    pub async fn bridge(
        &self,
        mut session: AttachSession,
        client: WebSocket,
        backend: WebSocketStream<TcpStream>,
    ) {
        info!(
            session = session.id(),
            workstation = %session.workstation(),
            "attach session opened"
        );

        let (upstream, downstream) = relay(&mut session, client, backend).await;

        info!(
            session = session.id(),
            workstation = %session.workstation(),
            ?upstream,
            ?downstream,
            "attach session closed"
        );
    }
}
