//! Active-connection set owned by one bridge instance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use super::connection::ClientConnection;

/// Summary returned by [`ConnectionRegistry::list`].
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub connection_id: String,
    pub agent_id: Option<String>,
    pub connected_at: DateTime<Utc>,
    pub alive: bool,
    pub probes_sent: u64,
    pub last_pong_ms: u64,
}

/// Thread-safe registry of live connections.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection and return the new active count.
    pub fn register(&self, conn: Arc<ClientConnection>) -> usize {
        let mut connections = self.connections.write();
        connections.insert(conn.id.clone(), conn);
        connections.len()
    }

    /// Remove a connection. Returns `false` if it was already gone.
    pub fn remove(&self, connection_id: &str) -> bool {
        self.connections.write().remove(connection_id).is_some()
    }

    pub fn get(&self, connection_id: &str) -> Option<Arc<ClientConnection>> {
        self.connections.read().get(connection_id).cloned()
    }

    pub fn contains(&self, connection_id: &str) -> bool {
        self.connections.read().contains_key(connection_id)
    }

    pub fn list(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<ConnectionInfo> = self
            .connections
            .read()
            .values()
            .map(|c| ConnectionInfo {
                connection_id: c.id.clone(),
                agent_id: c.persona().map(|p| p.agent_id().to_string()),
                connected_at: c.opened_at,
                alive: c.is_alive(),
                probes_sent: c.probes_sent(),
                last_pong_ms: c.last_pong_elapsed().as_millis() as u64,
            })
            .collect();
        infos.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));
        infos
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
