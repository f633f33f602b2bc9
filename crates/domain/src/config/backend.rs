use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent backend (HTTP)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where chat messages are forwarded. Each persona is reachable at
/// `{base_url}/{agent_id}/message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// `userId` attached to every forwarded message.
    #[serde(default = "d_user_id")]
    pub user_id: String,
    /// `userName` attached to every forwarded message.
    #[serde(default = "d_user_name")]
    pub user_name: String,
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            user_id: d_user_id(),
            user_name: d_user_name(),
            timeout_secs: d_timeout_secs(),
        }
    }
}

fn d_base_url() -> String {
    "http://localhost:3000".into()
}
fn d_user_id() -> String {
    "user".into()
}
fn d_user_name() -> String {
    "User".into()
}
fn d_timeout_secs() -> u64 {
    120
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Personas
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A backend conversational identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Persona {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    /// The identifier used in backend URLs: the explicit id, else the name.
    pub fn agent_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

pub(super) fn d_personas() -> Vec<Persona> {
    vec![Persona::named("TrendPup")]
}
