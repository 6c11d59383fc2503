//! Bidirectional frame relay between the client socket and the backend shell socket.

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::{CloseFrame as AxumCloseFrame, Message as AxumMessage, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as TungsteniteCloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::workstation::WorkstationError;

use super::session::{AttachSession, SessionState};

/// Upper bound on sending a close frame during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// How one direction of the relay ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpEnd {
    /// The source closed cleanly.
    SourceClosed,
    /// Reading from the source failed.
    SourceError(String),
    /// Writing to the sink failed.
    SinkError(String),
    /// The other direction ended first.
    Cancelled,
}

/// Convert a client frame for the backend. Type and payload are preserved.
pub fn client_to_backend(msg: AxumMessage) -> Option<TungsteniteMessage> {
    Some(match msg {
        AxumMessage::Text(text) => TungsteniteMessage::Text(text.to_string().into()),
        AxumMessage::Binary(data) => TungsteniteMessage::Binary(data),
        AxumMessage::Ping(data) => TungsteniteMessage::Ping(data),
        AxumMessage::Pong(data) => TungsteniteMessage::Pong(data),
        AxumMessage::Close(frame) => {
            TungsteniteMessage::Close(frame.map(|frame| TungsteniteCloseFrame {
                code: CloseCode::from(frame.code),
                reason: frame.reason.to_string().into(),
            }))
        }
    })
}

/// Convert a backend frame for the client. Raw frames are dropped.
pub fn backend_to_client(msg: TungsteniteMessage) -> Option<AxumMessage> {
    Some(match msg {
        TungsteniteMessage::Text(text) => AxumMessage::Text(text.to_string().into()),
        TungsteniteMessage::Binary(data) => AxumMessage::Binary(data),
        TungsteniteMessage::Ping(data) => AxumMessage::Ping(data),
        TungsteniteMessage::Pong(data) => AxumMessage::Pong(data),
        TungsteniteMessage::Close(frame) => AxumMessage::Close(frame.map(|frame| AxumCloseFrame {
            code: u16::from(frame.code),
            reason: frame.reason.to_string().into(),
        })),
        TungsteniteMessage::Frame(_) => return None,
    })
}

/// Copy frames from `source` to `sink` until either side ends or `cancel` fires.
///
/// On exit the token is cancelled and the sink is closed, so the opposite
/// direction is never left waiting on a read.
pub async fn pump<S, K, In, Out, E, F>(
    mut source: S,
    mut sink: K,
    mut convert: F,
    cancel: CancellationToken,
    direction: &'static str,
) -> PumpEnd
where
    S: Stream<Item = Result<In, E>> + Unpin,
    K: Sink<Out> + Unpin,
    K::Error: Display,
    E: Display,
    F: FnMut(In) -> Option<Out>,
{
    let end = loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break PumpEnd::Cancelled,
            next = source.next() => next,
        };

        let msg = match next {
            None => break PumpEnd::SourceClosed,
            Some(Err(e)) => break PumpEnd::SourceError(e.to_string()),
            Some(Ok(msg)) => msg,
        };

        let Some(forward) = convert(msg) else {
            continue;
        };

        tokio::select! {
            _ = cancel.cancelled() => break PumpEnd::Cancelled,
            sent = sink.send(forward) => {
                if let Err(e) = sent {
                    break PumpEnd::SinkError(e.to_string());
                }
            }
        }
    };

    cancel.cancel();
    match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(direction, "close after relay end failed: {}", e),
        Err(_) => debug!(direction, "close after relay end timed out"),
    }

    debug!(direction, ?end, "relay direction finished");
    end
}

/// Relay frames in both directions until either side ends.
///
/// Returns once both directions have stopped and both sockets are closed.
pub async fn relay(
    session: &mut AttachSession,
    client: WebSocket,
    backend: WebSocketStream<TcpStream>,
) -> (PumpEnd, PumpEnd) {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let (client_tx, client_rx) = client.split();
    let (backend_tx, backend_rx) = backend.split();

    let upstream = tokio::spawn(pump(
        client_rx,
        backend_tx,
        client_to_backend,
        cancel.clone(),
        "client->backend",
    ));
    let downstream = tokio::spawn(pump(
        backend_rx,
        client_tx,
        backend_to_client,
        cancel.clone(),
        "backend->client",
    ));

    session.transition(SessionState::Bridged);
    cancel.cancelled().await;
    session.transition(SessionState::Closing);

    let (upstream, downstream) = tokio::join!(upstream, downstream);
    let upstream = upstream.unwrap_or_else(|e| {
        warn!(session = session.id(), "client->backend task failed: {}", e);
        PumpEnd::SourceError(e.to_string())
    });
    let downstream = downstream.unwrap_or_else(|e| {
        warn!(session = session.id(), "backend->client task failed: {}", e);
        PumpEnd::SourceError(e.to_string())
    });

    session.transition(SessionState::Closed);
    (upstream, downstream)
}

/// Close the backend of a session whose client upgrade never completed.
pub async fn abandon(
    session: &mut AttachSession,
    mut backend: WebSocketStream<TcpStream>,
    reason: String,
) {
    session.fail(WorkstationError::Upgrade(reason));
    match tokio::time::timeout(CLOSE_TIMEOUT, backend.close(None)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(session = session.id(), "backend close failed: {}", e),
        Err(_) => debug!(session = session.id(), "backend close timed out"),
    }
}
