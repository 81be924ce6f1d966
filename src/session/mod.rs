//! Per-session chat state and the agent lifecycle bound to it.

mod lifecycle;
mod store;
mod turn;

pub use store::SessionStore;
pub use turn::TurnOutcome;

use crate::agent::{Agent, Message};
use tracing::warn;

pub const DEFAULT_SUCCESS_CRITERIA: &str = "The answer should be clear and accurate";

/// Values a fresh session starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
    pub success_criteria: String,
    pub disable_tracing: bool,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            success_criteria: DEFAULT_SUCCESS_CRITERIA.to_string(),
            disable_tracing: false,
        }
    }
}

pub struct SessionState {
    pub id: String,
    /// Exclusively owned; `None` until booted and after reset.
    agent: Option<Box<dyn Agent>>,
    pub history: Vec<Message>,
    initialized: bool,
    pub success_criteria: String,
    /// Read when the next agent is constructed.
    pub disable_tracing: bool,
    /// Inline error from the last failed turn.
    pub last_error: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn new(id: impl Into<String>, defaults: &SessionDefaults) -> Self {
        Self {
            id: id.into(),
            agent: None,
            history: Vec::new(),
            initialized: false,
            success_criteria: defaults.success_criteria.clone(),
            disable_tracing: defaults.disable_tracing,
            last_error: None,
        }
    }

    #[must_use]
    pub fn has_agent(&self) -> bool {
        self.agent.is_some()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn agent_mut(&mut self) -> Option<&mut (dyn Agent + 'static)> {
        self.agent.as_deref_mut()
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        if self.agent.is_some() {
            warn!("Session {} dropped with a live agent, cleaning up", self.id);
            self.shutdown();
        }
    }
}
