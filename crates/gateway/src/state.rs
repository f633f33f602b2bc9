use std::sync::Arc;
use std::time::Instant;

use tp_domain::config::Config;

use crate::bridge::persona::PersonaRoster;
use crate::bridge::registry::ConnectionRegistry;

/// Shared state handed to every REST handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Same roster the bridge assigns identities from.
    pub roster: Arc<PersonaRoster>,
    /// Live bridge connections, for health reporting.
    pub connections: Arc<ConnectionRegistry>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, roster: Arc<PersonaRoster>, connections: Arc<ConnectionRegistry>) -> Self {
        Self {
            config,
            roster,
            connections,
            started_at: Instant::now(),
        }
    }
}
