//! Processing of one user turn against the session's agent.

use super::SessionState;
use crate::agent::AgentError;
use crate::bridge::AsyncBridge;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// History was replaced with the agent's result.
    Completed { messages: usize },
    /// The turn failed; history is unchanged and the message is shown inline.
    Failed(String),
}

impl SessionState {
    /// Send `prompt` to the agent and replace history with what it returns.
    pub fn submit(&mut self, bridge: &mut AsyncBridge, prompt: &str) -> TurnOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return TurnOutcome::Ignored;
        }

        let result = match self.agent.as_deref_mut() {
            Some(agent) => bridge.run(agent.run_superstep(
                prompt,
                &self.success_criteria,
                &self.history,
            )),
            None => Err(AgentError::NotReady),
        };

        match result {
            Ok(history) => {
                info!(
                    "Turn completed for session {}: {} messages",
                    self.id,
                    history.len()
                );
                self.history = history;
                self.last_error = None;
                TurnOutcome::Completed {
                    messages: self.history.len(),
                }
            }
            Err(e) => {
                warn!("Turn failed for session {}: {}", self.id, e);
                let message = format!("Something went wrong: {e}");
                self.last_error = Some(message.clone());
                TurnOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Message;
    use crate::agent::fake::FakeFactory;
    use crate::session::SessionDefaults;

    fn ready_session(factory: &FakeFactory, bridge: &mut AsyncBridge) -> SessionState {
        let mut state = SessionState::new("turns", &SessionDefaults::default());
        state.ensure_ready(bridge, factory, true).unwrap();
        state
    }

    #[test]
    fn test_success_replaces_history_exactly() {
        let mut bridge = AsyncBridge::new().unwrap();
        let factory = FakeFactory::new();
        let mut state = ready_session(&factory, &mut bridge);
        state.history = vec![Message::user("old"), Message::assistant("old")];

        // Agent returns a shorter, duplicated history: stored verbatim.
        let returned = vec![Message::assistant("dup"), Message::assistant("dup")];
        factory.script().outcomes.push_back(Ok(returned.clone()));

        let outcome = state.submit(&mut bridge, "go");
        assert_eq!(outcome, TurnOutcome::Completed { messages: 2 });
        assert_eq!(state.history, returned);
    }

    #[test]
    fn test_agent_receives_prompt_criteria_and_history() {
        let mut bridge = AsyncBridge::new().unwrap();
        let factory = FakeFactory::new();
        let mut state = ready_session(&factory, &mut bridge);
        state.success_criteria = "Under 50 words".to_string();
        state.history = vec![Message::user("hi"), Message::assistant("hello")];

        state.submit(&mut bridge, "  summarize  ");

        let script = factory.script();
        let (prompt, criteria, history) = &script.calls[0];
        assert_eq!(prompt, "summarize");
        assert_eq!(criteria, "Under 50 words");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_failure_keeps_history_and_reports_inline() {
        let mut bridge = AsyncBridge::new().unwrap();
        let factory = FakeFactory::new();
        let mut state = ready_session(&factory, &mut bridge);
        let before = vec![Message::user("hi"), Message::assistant("hello")];
        state.history = before.clone();
        factory
            .script()
            .outcomes
            .push_back(Err("rate limited".to_string()));

        let outcome = state.submit(&mut bridge, "again");

        assert_eq!(state.history, before);
        match outcome {
            TurnOutcome::Failed(msg) => assert!(msg.contains("rate limited")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(state.last_error.as_deref().unwrap().contains("rate limited"));

        // Session stays usable.
        assert!(matches!(
            state.submit(&mut bridge, "retry"),
            TurnOutcome::Completed { .. }
        ));
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_blank_input_ignored() {
        let mut bridge = AsyncBridge::new().unwrap();
        let factory = FakeFactory::new();
        let mut state = ready_session(&factory, &mut bridge);

        assert_eq!(state.submit(&mut bridge, "   \n"), TurnOutcome::Ignored);
        assert!(factory.script().calls.is_empty());
    }

    #[test]
    fn test_without_agent_fails_inline() {
        let mut bridge = AsyncBridge::new().unwrap();
        let mut state = SessionState::new("bare", &SessionDefaults::default());
        let outcome = state.submit(&mut bridge, "hello");
        assert!(matches!(outcome, TurnOutcome::Failed(ref msg) if msg.contains("not set up")));
        assert!(state.history.is_empty());
    }
}
