//! In-memory, session-scoped state keyed by session id.

use super::{SessionDefaults, SessionState};
use std::collections::HashMap;

#[derive(Default)]
pub struct SessionStore {
    defaults: SessionDefaults,
    sessions: HashMap<String, SessionState>,
}

impl SessionStore {
    #[must_use]
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            defaults,
            sessions: HashMap::new(),
        }
    }

    /// Return the session, creating it with defaults on first access.
    ///
    /// Never overwrites fields of an existing session.
    pub fn get_or_init(&mut self, id: &str) -> &mut SessionState {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionState::new(id, &self.defaults))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SessionState> {
        self.sessions.get(id)
    }

    /// End a session. Dropping the returned state cleans up its agent.
    pub fn remove(&mut self, id: &str) -> Option<SessionState> {
        self.sessions.remove(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_keeps_customized_values() {
        let mut store = SessionStore::default();
        {
            let state = store.get_or_init("a");
            state.success_criteria = "Must include a table".to_string();
            state.disable_tracing = true;
        }

        let state = store.get_or_init("a");
        assert_eq!(state.success_criteria, "Must include a table");
        assert!(state.disable_tracing);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut store = SessionStore::default();
        store.get_or_init("a").disable_tracing = true;
        assert!(!store.get_or_init("b").disable_tracing);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_ends_session() {
        let mut store = SessionStore::default();
        store.get_or_init("a");
        assert!(store.remove("a").is_some());
        assert!(store.get("a").is_none());
        assert!(store.is_empty());
    }
}
