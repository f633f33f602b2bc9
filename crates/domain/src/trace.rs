use serde::Serialize;

/// Structured trace events emitted across all TrendPup crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ConnectionOpened {
        connection_id: String,
        agent_id: Option<String>,
        active_connections: usize,
    },
    ConnectionClosed {
        connection_id: String,
        reason: String,
        lifetime_ms: u64,
        probes_sent: u64,
    },
    HeartbeatTimeout {
        connection_id: String,
    },
    AgentCall {
        agent_id: String,
        status: u16,
        duration_ms: u64,
        fragments: usize,
    },
    MarketDataFallback {
        source: String,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "tp_event");
    }
}
