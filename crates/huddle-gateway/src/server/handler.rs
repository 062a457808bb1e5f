//! WebSocket handler
//!
//! One connection runs three tasks: inbound frames, the outbound queue plus
//! pings, and an idle watchdog. Whichever ends first ends the connection, and
//! every exit path goes through the same teardown.

use std::borrow::Cow;
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use huddle_core::IdentityProfile;
use tokio::sync::{mpsc, watch};
use tokio::time::interval;

use super::auth::AuthenticatedIdentity;
use super::GatewayState;
use crate::handlers::{EventRouter, GatewayError};
use crate::protocol::{CloseCode, ReadyPayload, ServerEvent};
use crate::session::Session;

/// How long the send task gets to flush and close after the connection ends
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// WebSocket gateway handler
///
/// The credential is checked before the upgrade; a rejected request never
/// becomes a WebSocket.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    identity: AuthenticatedIdentity,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, identity.profile, socket))
}

/// Drive an upgraded connection until it ends
async fn handle_socket(state: GatewayState, profile: IdentityProfile, socket: WebSocket) {
    let (tx, rx) = mpsc::channel::<String>(state.config().session_buffer);
    let session = Session::new(profile, tx);
    let session_id = session.id().to_string();
    state.registry().register(session.clone());

    session.send(&ServerEvent::Ready(ReadyPayload {
        session_id: session_id.clone(),
        identity: session.profile().clone(),
    }));
    session.activate();

    tracing::info!(
        session_id = %session_id,
        identity_id = %session.identity(),
        "WebSocket session established"
    );

    let (ws_sink, mut ws_stream) = socket.split();
    let (close_tx, close_rx) = watch::channel::<Option<Option<CloseCode>>>(None);

    let mut send_task = tokio::spawn(send_loop(
        ws_sink,
        rx,
        close_rx,
        state.config().ping_interval(),
        session_id.clone(),
    ));

    let state_recv = state.clone();
    let session_recv = session.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            session_recv.touch();
            match msg {
                Ok(Message::Text(text)) => {
                    if let Some(code) =
                        EventRouter::handle_text(&state_recv, &session_recv, &text).await
                    {
                        return Some(code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(session_id = %session_recv.id(), "Binary frame rejected");
                    let err =
                        GatewayError::InvalidPayload("binary frames are not supported".into());
                    session_recv.send(&err.to_event(None, None));
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    tracing::trace!(session_id = %session_recv.id(), "Heartbeat");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_recv.id(), "Client closed connection");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_recv.id(), error = %e, "WebSocket error");
                    return None;
                }
            }
        }
        None
    });

    let idle_timeout = state.config().idle_timeout();
    let session_idle = session.clone();
    let mut idle_task = tokio::spawn(async move {
        loop {
            let idle = session_idle.idle_for();
            if idle >= idle_timeout {
                tracing::info!(
                    session_id = %session_idle.id(),
                    idle_secs = idle.as_secs(),
                    "Session idle timeout"
                );
                return CloseCode::SessionTimeout;
            }
            tokio::time::sleep(idle_timeout - idle).await;
        }
    });

    let (close_code, send_finished) = tokio::select! {
        result = &mut recv_task => (result.ok().flatten(), false),
        _ = &mut send_task => {
            tracing::debug!(session_id = %session_id, "Send task ended");
            (None, true)
        }
        result = &mut idle_task => (result.ok(), false),
    };

    recv_task.abort();
    idle_task.abort();

    state.disconnect(&session_id).await;

    if !send_finished {
        // The send loop flushes what is queued, then closes with the code.
        let _ = close_tx.send(Some(close_code));
        if tokio::time::timeout(CLOSE_GRACE, &mut send_task).await.is_err() {
            tracing::debug!(session_id = %session_id, "Send task did not close in time");
            send_task.abort();
        }
    }

    tracing::info!(
        session_id = %session_id,
        close_code = ?close_code,
        "WebSocket session closed"
    );
}

/// Forward queued frames to the socket and keep the connection pinged
async fn send_loop(
    mut ws_sink: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<String>,
    mut close_rx: watch::Receiver<Option<Option<CloseCode>>>,
    ping_interval: Duration,
    session_id: String,
) {
    let mut ping = interval(ping_interval);
    ping.tick().await;

    loop {
        tokio::select! {
            biased;

            text = rx.recv() => {
                let Some(text) = text else { break };
                if ws_sink.send(Message::Text(text)).await.is_err() {
                    tracing::debug!(session_id = %session_id, "Socket write failed");
                    return;
                }
            }
            changed = close_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let code = (*close_rx.borrow()).flatten();
                let frame = code.map(|code| CloseFrame {
                    code: code.as_u16(),
                    reason: Cow::Borrowed(code.description()),
                });
                let _ = ws_sink.send(Message::Close(frame)).await;
                return;
            }
            _ = ping.tick() => {
                if ws_sink.send(Message::Ping(Vec::new())).await.is_err() {
                    tracing::debug!(session_id = %session_id, "Ping failed");
                    return;
                }
            }
        }
    }

    let _ = ws_sink.close().await;
}
