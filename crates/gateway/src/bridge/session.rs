//! One client session: reader loop, writer task, heartbeat and the request
//! worker that talks to the backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tp_domain::trace::TraceEvent;
use tp_protocol::{ClientMessage, ServerEvent};

use super::connection::{ClientConnection, Outbound};
use super::heartbeat::{run_heartbeat, HeartbeatResult};
use super::BridgeState;
use crate::backend::AgentBackend;

pub const INVALID_FORMAT: &str = "Invalid message format";
pub const NO_AGENT: &str = "No agent is available";
pub const QUEUE_FULL: &str = "Too many pending messages, please wait for a reply";

const OUTBOUND_CAPACITY: usize = 64;
const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    ClientClose,
    StreamEnd,
    TransportError,
    HeartbeatTimeout,
    HeartbeatStopped,
}

impl CloseReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::ClientClose => "client_close",
            Self::StreamEnd => "stream_end",
            Self::TransportError => "transport_error",
            Self::HeartbeatTimeout => "heartbeat_timeout",
            Self::HeartbeatStopped => "heartbeat_stopped",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(super) async fn run(socket: WebSocket, state: BridgeState) {
    let connection_id = uuid::Uuid::new_v4().to_string();
    let persona = state.assigner.assign(&connection_id, &state.roster);
    if persona.is_none() {
        tracing::warn!(connection_id = %connection_id, "no persona available for connection");
    }

    let (out_tx, out_rx) = mpsc::channel::<Outbound>(OUTBOUND_CAPACITY);
    let conn = Arc::new(ClientConnection::new(connection_id.clone(), persona, out_tx));
    let active = state.registry.register(conn.clone());
    TraceEvent::ConnectionOpened {
        connection_id: connection_id.clone(),
        agent_id: conn.persona().map(|p| p.agent_id().to_string()),
        active_connections: active,
    }
    .emit();

    // Queued before any other task exists, so it is always the first event.
    conn.send_event(&ServerEvent::connected(state.config.greeting.clone()))
        .await;

    let (sink, mut stream) = socket.split();
    let cancel = CancellationToken::new();

    let writer = tokio::spawn(write_frames(sink, out_rx, cancel.clone()));
    let mut heartbeat = tokio::spawn(run_heartbeat(
        conn.clone(),
        state.config.ping_interval(),
        cancel.clone(),
    ));
    let (queue, requests) = RequestQueue::new(state.config.max_pending_requests);
    let worker = tokio::spawn(run_worker(
        conn.clone(),
        state.backend.clone(),
        requests,
        queue.outstanding.clone(),
    ));

    let mut heartbeat_finished = false;
    let reason = loop {
        tokio::select! {
            result = &mut heartbeat => {
                heartbeat_finished = true;
                match result {
                    Ok(HeartbeatResult::TimedOut) => {
                        TraceEvent::HeartbeatTimeout {
                            connection_id: connection_id.clone(),
                        }
                        .emit();
                        break CloseReason::HeartbeatTimeout;
                    }
                    Ok(HeartbeatResult::Cancelled) => break CloseReason::HeartbeatStopped,
                    Err(e) => {
                        tracing::error!(connection_id = %connection_id, error = %e, "heartbeat task failed");
                        break CloseReason::HeartbeatStopped;
                    }
                }
            }
            frame = stream.next() => match frame {
                None => break CloseReason::StreamEnd,
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "websocket read failed");
                    break CloseReason::TransportError;
                }
                Some(Ok(Message::Close(_))) => break CloseReason::ClientClose,
                Some(Ok(Message::Pong(_))) => conn.mark_alive(),
                // axum answers pings on our behalf.
                Some(Ok(Message::Ping(_))) => {}
                Some(Ok(Message::Text(text))) => handle_text(&conn, &queue, &text).await,
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => handle_text(&conn, &queue, &text).await,
                    Err(_) => {
                        conn.send_event(&ServerEvent::error(INVALID_FORMAT)).await;
                    }
                },
            }
        }
    };

    // ── Teardown ─────────────────────────────────────────────────────
    cancel.cancel();
    if !heartbeat_finished {
        let _ = heartbeat.await;
    }
    worker.abort();
    if reason == CloseReason::HeartbeatTimeout {
        // Drop the socket without a closing handshake.
        writer.abort();
        drop(stream);
    } else if let Ok(mut sink) = writer.await {
        let _ = tokio::time::timeout(CLOSE_GRACE, sink.close()).await;
    }
    state.registry.remove(&connection_id);

    TraceEvent::ConnectionClosed {
        connection_id,
        reason: reason.as_str().to_string(),
        lifetime_ms: conn.age().as_millis() as u64,
        probes_sent: conn.probes_sent(),
    }
    .emit();
}

// ── Inbound ─────────────────────────────────────────────────────────

async fn handle_text(conn: &ClientConnection, queue: &RequestQueue, text: &str) {
    match ClientMessage::parse(text) {
        Ok(ClientMessage::Chat { content }) => {
            if !queue.offer(content) {
                tracing::warn!(connection_id = %conn.id, "request queue full, dropping message");
                conn.send_event(&ServerEvent::error(QUEUE_FULL)).await;
            }
        }
        Ok(ClientMessage::Other { kind }) => {
            tracing::debug!(connection_id = %conn.id, kind = %kind, "ignoring frame");
        }
        Err(e) => {
            tracing::debug!(connection_id = %conn.id, error = %e, "malformed frame");
            conn.send_event(&ServerEvent::error(INVALID_FORMAT)).await;
        }
    }
}

// ── Writer ──────────────────────────────────────────────────────────

async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Outbound>,
    cancel: CancellationToken,
) -> SplitSink<WebSocket, Message> {
    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = rx.recv() => frame,
        };
        let Some(frame) = frame else { break };
        let msg = match frame {
            Outbound::Text(text) => Message::Text(text),
            Outbound::Ping => Message::Ping(Vec::new()),
        };
        if sink.send(msg).await.is_err() {
            break;
        }
    }
    sink
}

// ── Request worker ──────────────────────────────────────────────────

/// Chat messages waiting for the worker. `outstanding` counts the one
/// being answered plus those queued behind it.
struct RequestQueue {
    tx: mpsc::Sender<String>,
    outstanding: Arc<AtomicUsize>,
    limit: usize,
}

impl RequestQueue {
    fn new(max_pending: usize) -> (Self, mpsc::Receiver<String>) {
        let limit = max_pending + 1;
        let (tx, rx) = mpsc::channel(limit);
        let queue = Self {
            tx,
            outstanding: Arc::new(AtomicUsize::new(0)),
            limit,
        };
        (queue, rx)
    }

    fn offer(&self, text: String) -> bool {
        if self.outstanding.fetch_add(1, Ordering::AcqRel) >= self.limit {
            self.outstanding.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        if self.tx.try_send(text).is_err() {
            self.outstanding.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }
}

async fn run_worker(
    conn: Arc<ClientConnection>,
    backend: Arc<dyn AgentBackend>,
    mut requests: mpsc::Receiver<String>,
    outstanding: Arc<AtomicUsize>,
) {
    while let Some(text) = requests.recv().await {
        answer(&conn, backend.as_ref(), &text).await;
        outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn answer(conn: &ClientConnection, backend: &dyn AgentBackend, text: &str) {
    let Some(persona) = conn.persona() else {
        conn.send_event(&ServerEvent::error(NO_AGENT)).await;
        return;
    };

    match backend.send_message(text, persona).await {
        Ok(reply) => {
            for fragment in reply.texts() {
                if !conn.send_event(&ServerEvent::message(fragment)).await {
                    return;
                }
            }
        }
        Err(e) => {
            tracing::warn!(
                connection_id = %conn.id,
                agent_id = %persona.agent_id(),
                error = %e,
                "agent backend call failed"
            );
            conn.send_event(&ServerEvent::error(format!(
                "Error processing your message: {e}"
            )))
            .await;
        }
    }
}
