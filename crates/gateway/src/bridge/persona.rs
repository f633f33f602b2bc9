//! Backend identities and how connections are mapped onto them.

use parking_lot::RwLock;
use tp_domain::config::Persona;

/// Ordered, shared list of backend personas.
pub struct PersonaRoster {
    personas: RwLock<Vec<Persona>>,
}

impl PersonaRoster {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self {
            personas: RwLock::new(personas),
        }
    }

    pub fn list(&self) -> Vec<Persona> {
        self.personas.read().clone()
    }

    pub fn first(&self) -> Option<Persona> {
        self.personas.read().first().cloned()
    }

    /// Look up by agent id, falling back to a case-insensitive name match.
    pub fn get(&self, id_or_name: &str) -> Option<Persona> {
        let personas = self.personas.read();
        personas
            .iter()
            .find(|p| p.agent_id() == id_or_name)
            .or_else(|| {
                personas
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(id_or_name))
            })
            .cloned()
    }

    /// Add a persona, replacing any entry with the same agent id in place.
    /// Returns `true` when an existing entry was replaced.
    pub fn register(&self, persona: Persona) -> bool {
        let mut personas = self.personas.write();
        match personas
            .iter_mut()
            .find(|p| p.agent_id() == persona.agent_id())
        {
            Some(existing) => {
                *existing = persona;
                true
            }
            None => {
                personas.push(persona);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.personas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.read().is_empty()
    }
}

/// Chooses the backend identity for a new connection.
pub trait IdentityAssigner: Send + Sync {
    fn assign(&self, connection_id: &str, roster: &PersonaRoster) -> Option<Persona>;
}

/// Every connection talks to the first configured persona.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstPersona;

impl IdentityAssigner for FirstPersona {
    fn assign(&self, _connection_id: &str, roster: &PersonaRoster) -> Option<Persona> {
        roster.first()
    }
}
