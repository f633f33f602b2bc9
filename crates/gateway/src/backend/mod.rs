//! The agent backend the bridge forwards chat text to.

mod http;

pub use http::HttpAgentBackend;

use async_trait::async_trait;
use tp_domain::config::Persona;
use tp_domain::Result;
use tp_protocol::AgentReply;

/// Sends one user message to a backend identity and returns its reply.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn send_message(&self, text: &str, persona: &Persona) -> Result<AgentReply>;
}
