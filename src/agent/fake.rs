//! Scripted in-memory agent for lifecycle and UI tests.

use super::{Agent, AgentError, AgentFactory, AgentOptions, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Observations and scripted behavior shared by every fake built from one factory.
#[derive(Debug, Default)]
pub(crate) struct FakeScript {
    pub created: usize,
    pub setups: usize,
    pub cleanups: usize,
    pub options: Vec<AgentOptions>,
    /// (prompt, success criteria, history) per superstep call.
    pub calls: Vec<(String, String, Vec<Message>)>,
    /// Queued superstep outcomes; when empty the fake echoes the prompt.
    pub outcomes: VecDeque<Result<Vec<Message>, String>>,
    pub fail_setup: Option<String>,
    pub fail_cleanup: bool,
}

pub(crate) type SharedScript = Arc<Mutex<FakeScript>>;

pub(crate) struct FakeAgent {
    script: SharedScript,
}

#[async_trait]
impl Agent for FakeAgent {
    async fn setup(&mut self) -> Result<(), AgentError> {
        let mut script = self.script.lock().unwrap();
        script.setups += 1;
        match &script.fail_setup {
            Some(msg) => Err(AgentError::Remote(msg.clone())),
            None => Ok(()),
        }
    }

    async fn run_superstep(
        &mut self,
        prompt: &str,
        success_criteria: &str,
        history: &[Message],
    ) -> Result<Vec<Message>, AgentError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push((
            prompt.to_string(),
            success_criteria.to_string(),
            history.to_vec(),
        ));
        match script.outcomes.pop_front() {
            Some(Ok(history)) => Ok(history),
            Some(Err(msg)) => Err(AgentError::Remote(msg)),
            None => {
                let mut next = history.to_vec();
                next.push(Message::user(prompt));
                next.push(Message::assistant(format!("echo: {prompt}")));
                Ok(next)
            }
        }
    }

    fn cleanup(&mut self) -> Result<(), AgentError> {
        let mut script = self.script.lock().unwrap();
        script.cleanups += 1;
        if script.fail_cleanup {
            Err(AgentError::Remote("cleanup exploded".to_string()))
        } else {
            Ok(())
        }
    }
}

pub(crate) struct FakeFactory {
    pub script: SharedScript,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(FakeScript::default())),
        }
    }

    pub fn script(&self) -> std::sync::MutexGuard<'_, FakeScript> {
        self.script.lock().unwrap()
    }
}

impl AgentFactory for FakeFactory {
    fn create(&self, options: &AgentOptions) -> Result<Box<dyn Agent>, AgentError> {
        let mut script = self.script.lock().unwrap();
        script.created += 1;
        script.options.push(*options);
        Ok(Box::new(FakeAgent {
            script: self.script.clone(),
        }))
    }
}
