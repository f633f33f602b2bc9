use serde::{Deserialize, Serialize};

use super::ConfigError;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Observability: JSON logs, optional OTLP span export
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `[observability]` section, read by `trendpup serve` when it installs
/// the tracing subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Collector address, e.g. `http://localhost:4317`. Blank means unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Reported as the `service.name` resource attribute.
    #[serde(default = "d_service_name")]
    pub service_name: String,

    /// Fraction of traces exported, decided once per trace id.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
        }
    }
}

fn d_service_name() -> String {
    "trendpup".into()
}

fn d_sample_rate() -> f64 {
    1.0
}

impl ObservabilityConfig {
    /// The trimmed endpoint when span export is switched on.
    pub fn exporter_endpoint(&self) -> Option<&str> {
        self.otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    pub(super) fn check(&self, errors: &mut Vec<ConfigError>) {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                "sample rate must be between 0.0 and 1.0",
            ));
        }
        if self.service_name.trim().is_empty() {
            errors.push(ConfigError::error(
                "observability.service_name",
                "service name must not be empty",
            ));
        }
        match (&self.otlp_endpoint, self.exporter_endpoint()) {
            (Some(_), None) => errors.push(ConfigError::warning(
                "observability.otlp_endpoint",
                "blank endpoint, span export stays off",
            )),
            (_, Some(endpoint))
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) =>
            {
                errors.push(ConfigError::error(
                    "observability.otlp_endpoint",
                    "endpoint must be an http:// or https:// URL",
                ));
            }
            _ => {}
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
