//! Startup wiring shared by `serve`: config validation, the backend client,
//! the persona roster and the running bridge.

use std::sync::Arc;

use anyhow::Context;
use tp_domain::config::{Config, ConfigSeverity};

use crate::backend::{AgentBackend, HttpAgentBackend};
use crate::bridge::persona::PersonaRoster;
use crate::bridge::{Bridge, BridgeHandle};
use crate::state::AppState;

/// Log every config issue; fail if any of them is an error.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}

/// The running pieces of a `serve` process.
pub struct Runtime {
    pub state: AppState,
    pub bridge: BridgeHandle,
}

/// Validate config, start the realtime bridge and build the REST state.
pub async fn start(config: Arc<Config>) -> anyhow::Result<Runtime> {
    check_config(&config)?;

    let backend: Arc<dyn AgentBackend> = Arc::new(
        HttpAgentBackend::new(&config.backend).context("creating agent backend client")?,
    );
    tracing::info!(
        base_url = %config.backend.base_url,
        timeout_secs = config.backend.timeout_secs,
        "agent backend client ready"
    );

    let roster = Arc::new(PersonaRoster::new(config.personas.clone()));
    tracing::info!(
        personas = roster.len(),
        default = ?roster.first().map(|p| p.agent_id().to_string()),
        "persona roster loaded"
    );

    let addr = format!("{}:{}", config.bridge.host, config.bridge.port);
    let bridge = Bridge::new(config.bridge.clone(), backend, roster.clone())
        .start(&addr)
        .await
        .with_context(|| format!("binding realtime bridge to {addr}"))?;

    let state = AppState::new(config, roster, bridge.registry());
    Ok(Runtime { state, bridge })
}
