//! Persona listing and registration.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tp_domain::config::Persona;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub status: &'static str,
}

impl From<&Persona> for AgentSummary {
    fn from(p: &Persona) -> Self {
        Self {
            id: p.agent_id().to_string(),
            name: p.name.clone(),
            status: "active",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub character: Option<CharacterSpec>,
}

#[derive(Debug, Deserialize)]
pub struct CharacterSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// GET /api/agents
pub async fn list_agents(State(state): State<AppState>) -> Response {
    let agents: Vec<AgentSummary> = state.roster.list().iter().map(AgentSummary::from).collect();
    super::ok(agents)
}

/// GET /api/agents/:id
pub async fn get_agent(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.roster.get(&id) {
        Some(p) => super::ok(AgentSummary::from(&p)),
        None => super::fail(StatusCode::NOT_FOUND, "Agent not found"),
    }
}

/// POST /api/agents — register a persona with the roster.
pub async fn create_agent(
    State(state): State<AppState>,
    body: Result<Json<CreateAgentRequest>, JsonRejection>,
) -> Response {
    let character = match body {
        Ok(Json(CreateAgentRequest {
            character: Some(c),
        })) if !c.name.trim().is_empty() => c,
        _ => return super::fail(StatusCode::BAD_REQUEST, "Invalid character configuration"),
    };

    let persona = Persona {
        name: character.name.trim().to_string(),
        id: character
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()),
    };
    let replaced = state.roster.register(persona.clone());
    tracing::info!(
        agent_id = %persona.agent_id(),
        name = %persona.name,
        replaced,
        "persona registered"
    );

    super::respond(
        StatusCode::CREATED,
        serde_json::json!({ "id": persona.agent_id(), "name": persona.name }),
    )
}
