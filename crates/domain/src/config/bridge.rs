use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Realtime bridge (WebSocket relay)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Settings for the browser-facing WebSocket relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_8080")]
    pub port: u16,
    /// Seconds between liveness probes. A connection that has not answered
    /// the previous probe when the next one is due is terminated.
    #[serde(default = "d_ping_interval")]
    pub ping_interval_secs: u64,
    /// Upper bound for a single inbound frame / message.
    #[serde(default = "d_max_payload")]
    pub max_payload_bytes: usize,
    /// Text of the `connected` event sent on every new connection.
    #[serde(default = "d_greeting")]
    pub greeting: String,
    /// Chat messages a single connection may have queued behind the one
    /// currently being answered.
    #[serde(default = "d_max_pending")]
    pub max_pending_requests: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: d_8080(),
            ping_interval_secs: d_ping_interval(),
            max_payload_bytes: d_max_payload(),
            greeting: d_greeting(),
            max_pending_requests: d_max_pending(),
        }
    }
}

impl BridgeConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_8080() -> u16 {
    8080
}
fn d_ping_interval() -> u64 {
    30
}
fn d_max_payload() -> usize {
    1024 * 1024
}
fn d_greeting() -> String {
    "Connected to TrendPup Assistant".into()
}
fn d_max_pending() -> usize {
    16
}
