//! Realtime bridge: a WebSocket relay between browser chat clients and the
//! agent backend.
//!
//! Each accepted socket gets its own session (see [`session`]) with a
//! writer task, a heartbeat task and a request worker. The set of live
//! connections belongs to the [`Bridge`] instance, so several bridges can
//! run side by side in one process.

pub mod connection;
pub mod heartbeat;
pub mod persona;
pub mod registry;
mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tp_domain::config::BridgeConfig;
use tp_domain::{Error, Result};

use crate::backend::AgentBackend;
use persona::{FirstPersona, IdentityAssigner, PersonaRoster};
use registry::{ConnectionInfo, ConnectionRegistry};

pub use session::{INVALID_FORMAT, NO_AGENT, QUEUE_FULL};

/// Everything a session needs, cloned into each upgrade.
#[derive(Clone)]
pub(crate) struct BridgeState {
    pub config: Arc<BridgeConfig>,
    pub backend: Arc<dyn AgentBackend>,
    pub roster: Arc<PersonaRoster>,
    pub assigner: Arc<dyn IdentityAssigner>,
    pub registry: Arc<ConnectionRegistry>,
}

/// A configured, not yet listening bridge.
pub struct Bridge {
    state: BridgeState,
}

impl Bridge {
    pub fn new(
        config: BridgeConfig,
        backend: Arc<dyn AgentBackend>,
        roster: Arc<PersonaRoster>,
    ) -> Self {
        Self {
            state: BridgeState {
                config: Arc::new(config),
                backend,
                roster,
                assigner: Arc::new(FirstPersona),
                registry: Arc::new(ConnectionRegistry::new()),
            },
        }
    }

    /// Replace the default first-persona assignment.
    pub fn with_assigner(mut self, assigner: Arc<dyn IdentityAssigner>) -> Self {
        self.state.assigner = assigner;
        self
    }

    /// The upgrade routes (`/` and `/ws`).
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(upgrade))
            .route("/ws", get(upgrade))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind `addr` and start accepting connections.
    pub async fn start(self, addr: &str) -> Result<BridgeHandle> {
        check_config(&self.state.config)?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener)
    }

    /// Start accepting connections on an already bound listener.
    pub fn serve(self, listener: TcpListener) -> Result<BridgeHandle> {
        check_config(&self.state.config)?;
        let local_addr = listener.local_addr()?;
        let app = self.router();
        let shutdown = CancellationToken::new();

        let stop = shutdown.clone();
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "bridge listener failed");
            }
        });

        tracing::info!(addr = %local_addr, "realtime bridge listening");

        Ok(BridgeHandle {
            local_addr,
            registry: self.state.registry,
            shutdown,
            server,
        })
    }
}

/// Settings a session cannot run with.
fn check_config(config: &BridgeConfig) -> Result<()> {
    if config.ping_interval_secs == 0 {
        return Err(Error::Config(
            "bridge.ping_interval_secs must be at least 1".into(),
        ));
    }
    if config.max_payload_bytes == 0 {
        return Err(Error::Config(
            "bridge.max_payload_bytes must be at least 1".into(),
        ));
    }
    Ok(())
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<BridgeState>) -> Response {
    let limit = state.config.max_payload_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| session::run(socket, state))
}

/// A running bridge.
pub struct BridgeHandle {
    local_addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    shutdown: CancellationToken,
    server: JoinHandle<()>,
}

impl BridgeHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.registry.list()
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.registry.clone()
    }

    /// Stop accepting connections and release the listening socket.
    ///
    /// Sessions that are already open keep running until their peers leave.
    pub async fn close(self) {
        self.shutdown.cancel();
        if let Err(e) = self.server.await {
            tracing::warn!(error = %e, "bridge listener task ended abnormally");
        }
        tracing::info!(addr = %self.local_addr, "realtime bridge closed");
    }
}
