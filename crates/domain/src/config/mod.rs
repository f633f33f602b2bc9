mod backend;
mod bridge;
mod market;
mod observability;
mod server;

pub use backend::*;
pub use bridge::*;
pub use market::*;
pub use observability::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    /// Backend identities, in priority order. The first one answers
    /// browser chat unless another assignment strategy is installed.
    #[serde(default = "backend::d_personas")]
    pub personas: Vec<Persona>,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            bridge: BridgeConfig::default(),
            backend: BackendConfig::default(),
            personas: backend::d_personas(),
            market: MarketConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.bridge.port == 0 {
            errors.push(ConfigError::error("bridge.port", "port must be greater than 0"));
        }
        if self.bridge.host.is_empty() {
            errors.push(ConfigError::error("bridge.host", "host must not be empty"));
        }
        if self.bridge.port == self.server.port && self.bridge.host == self.server.host {
            errors.push(ConfigError::error(
                "bridge.port",
                format!(
                    "bridge and REST API cannot both listen on {}:{}",
                    self.bridge.host, self.bridge.port
                ),
            ));
        }
        if self.bridge.ping_interval_secs == 0 {
            errors.push(ConfigError::error(
                "bridge.ping_interval_secs",
                "ping interval must be at least 1 second",
            ));
        }
        if self.bridge.max_payload_bytes == 0 {
            errors.push(ConfigError::error(
                "bridge.max_payload_bytes",
                "payload limit must be greater than 0",
            ));
        }
        if self.bridge.max_pending_requests == 0 {
            errors.push(ConfigError::warning(
                "bridge.max_pending_requests",
                "0 rejects every chat message sent while a reply is outstanding",
            ));
        }

        if !(self.backend.base_url.starts_with("http://")
            || self.backend.base_url.starts_with("https://"))
        {
            errors.push(ConfigError::error(
                "backend.base_url",
                "base_url must be an http:// or https:// URL",
            ));
        }

        if self.personas.is_empty() {
            errors.push(ConfigError::error(
                "personas",
                "at least one persona must be configured",
            ));
        }
        for (i, persona) in self.personas.iter().enumerate() {
            if persona.name.trim().is_empty() {
                errors.push(ConfigError::error(
                    format!("personas[{i}].name"),
                    "persona name must not be empty",
                ));
            }
        }

        self.observability.check(&mut errors);

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }
}
