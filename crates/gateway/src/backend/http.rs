//! HTTP implementation of [`AgentBackend`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tp_domain::config::{BackendConfig, Persona};
use tp_domain::trace::TraceEvent;
use tp_domain::{Error, Result};
use tp_protocol::{AgentMessageRequest, AgentReply};

use super::AgentBackend;

/// Posts `{ text, userId, userName }` to `{base_url}/{agent_id}/message`.
#[derive(Debug, Clone)]
pub struct HttpAgentBackend {
    http: Client,
    base_url: Url,
    user_id: String,
    user_name: String,
}

impl HttpAgentBackend {
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| Error::Config(format!("backend.base_url {:?}: {e}", cfg.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "backend.base_url {:?} cannot be used as a base URL",
                cfg.base_url
            )));
        }

        Ok(Self {
            http,
            base_url,
            user_id: cfg.user_id.clone(),
            user_name: cfg.user_name.clone(),
        })
    }

    /// URL of an agent's message endpoint. The agent id is a single,
    /// percent-encoded path segment.
    pub fn message_url(&self, agent_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("backend.base_url cannot be a base".into()))?
            .pop_if_empty()
            .push(agent_id)
            .push("message");
        Ok(url)
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn send_message(&self, text: &str, persona: &Persona) -> Result<AgentReply> {
        let agent_id = persona.agent_id();
        let url = self.message_url(agent_id)?;
        let body = AgentMessageRequest {
            text: text.to_string(),
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
        };

        let start = Instant::now();
        let resp = self.http.post(url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(format!("agent {agent_id} did not answer in time"))
            } else {
                Error::Http(e.to_string())
            }
        })?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            TraceEvent::AgentCall {
                agent_id: agent_id.to_string(),
                status: status.as_u16(),
                duration_ms: start.elapsed().as_millis() as u64,
                fragments: 0,
            }
            .emit();
            return Err(Error::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::Protocol(format!("agent {agent_id} reply is not JSON: {e}")))?;
        let reply = AgentReply::from_value(value);

        TraceEvent::AgentCall {
            agent_id: agent_id.to_string(),
            status: status.as_u16(),
            duration_ms: start.elapsed().as_millis() as u64,
            fragments: match &reply {
                AgentReply::Fragments(f) => f.len(),
                AgentReply::Unrecognized(_) => 0,
            },
        }
        .emit();

        Ok(reply)
    }
}
