//! Per-client connection state shared by the reader, writer, heartbeat and
//! request worker of one WebSocket session.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tp_domain::config::Persona;
use tp_protocol::ServerEvent;

/// A frame queued for the connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Serialized [`ServerEvent`].
    Text(String),
    /// Transport-level liveness probe.
    Ping,
}

pub struct ClientConnection {
    pub id: String,
    /// Backend identity assigned at connect time.
    persona: Option<Persona>,
    tx: mpsc::Sender<Outbound>,
    pub connected_at: Instant,
    pub opened_at: DateTime<Utc>,
    is_alive: AtomicBool,
    last_pong: Mutex<Instant>,
    probes_sent: AtomicU64,
}

impl ClientConnection {
    pub fn new(id: String, persona: Option<Persona>, tx: mpsc::Sender<Outbound>) -> Self {
        let now = Instant::now();
        Self {
            id,
            persona,
            tx,
            connected_at: now,
            opened_at: Utc::now(),
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            probes_sent: AtomicU64::new(0),
        }
    }

    pub fn persona(&self) -> Option<&Persona> {
        self.persona.as_ref()
    }

    /// Queue an event for the client, waiting for room in the channel.
    ///
    /// Returns `false` once the writer has gone away.
    pub async fn send_event(&self, event: &ServerEvent) -> bool {
        match event.to_json() {
            Ok(json) => self.tx.send(Outbound::Text(json)).await.is_ok(),
            Err(e) => {
                tracing::error!(connection_id = %self.id, error = %e, "failed to serialize event");
                false
            }
        }
    }

    /// Queue a liveness probe without waiting.
    pub fn probe(&self) -> bool {
        let queued = self.tx.try_send(Outbound::Ping).is_ok();
        if queued {
            self.probes_sent.fetch_add(1, Ordering::Relaxed);
        }
        queued
    }

    /// Mark the connection as alive (pong received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Set the liveness flag again after a probe could not be queued.
    ///
    /// Unlike [`mark_alive`](Self::mark_alive) the pong time is left as is.
    pub fn restore_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
    }

    /// Read and clear the liveness flag.
    ///
    /// Returns `true` if a pong arrived since the previous check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive.load(Ordering::Relaxed)
    }

    pub fn probes_sent(&self) -> u64 {
        self.probes_sent.load(Ordering::Relaxed)
    }

    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection(capacity: usize) -> (ClientConnection, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        let conn = ClientConnection::new("conn_1".into(), Some(Persona::named("TrendPup")), tx);
        (conn, rx)
    }

    #[test]
    fn starts_alive() {
        let (conn, _rx) = make_connection(4);
        assert!(conn.is_alive());
        assert_eq!(conn.persona().map(|p| p.agent_id()), Some("TrendPup"));
    }

    #[test]
    fn check_alive_clears_flag() {
        let (conn, _rx) = make_connection(4);
        assert!(conn.check_alive());
        assert!(!conn.check_alive());
        conn.mark_alive();
        assert!(conn.check_alive());
    }

    #[test]
    fn restore_alive_keeps_pong_time() {
        let (conn, _rx) = make_connection(4);
        std::thread::sleep(Duration::from_millis(20));
        assert!(conn.check_alive());
        conn.restore_alive();
        assert!(conn.is_alive());
        assert!(conn.last_pong_elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn send_event_serializes() {
        let (conn, mut rx) = make_connection(4);
        assert!(conn.send_event(&ServerEvent::message("hello")).await);
        assert_eq!(
            rx.recv().await,
            Some(Outbound::Text(r#"{"type":"message","text":"hello"}"#.into()))
        );
    }

    #[tokio::test]
    async fn send_after_writer_gone_fails() {
        let (conn, rx) = make_connection(4);
        drop(rx);
        assert!(!conn.send_event(&ServerEvent::error("x")).await);
        assert!(!conn.probe());
    }

    #[test]
    fn probe_counts_only_queued_pings() {
        let (conn, _rx) = make_connection(1);
        assert!(conn.probe());
        assert!(!conn.probe());
        assert_eq!(conn.probes_sent(), 1);
    }
}
