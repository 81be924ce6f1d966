//! The agent contract consumed by the chat front-end.
//!
//! The reasoning loop, tool use and evaluator all live on the other side of
//! this trait. Pilot only owns the lifecycle: construct, `setup` once, run
//! zero or more supersteps, `cleanup`.

#[cfg(test)]
pub(crate) mod fake;
mod message;
pub mod process;
mod protocol;

pub use message::{Message, Role};
pub use process::{ProcessAgent, ProcessAgentFactory};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to start agent process `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error reported by the agent itself.
    #[error("{0}")]
    Remote(String),

    #[error("Agent process closed its output")]
    Closed,

    #[error("Agent is not set up")]
    NotReady,
}

/// Launch options handed to the agent constructor.
///
/// These replace process-wide environment flags: each agent applies them to
/// its own execution environment only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOptions {
    /// Turn off the tracing backend for this agent.
    pub disable_tracing: bool,
    /// Run browser automation without a visible window.
    pub headless: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            disable_tracing: false,
            headless: true,
        }
    }
}

#[async_trait]
pub trait Agent: Send {
    /// One-time asynchronous initialization. Called exactly once per handle.
    async fn setup(&mut self) -> Result<(), AgentError>;

    /// Process one user turn and return the full updated history.
    ///
    /// The agent decides how prior turns are represented and extended; the
    /// caller replaces its history with the returned value as-is.
    async fn run_superstep(
        &mut self,
        prompt: &str,
        success_criteria: &str,
        history: &[Message],
    ) -> Result<Vec<Message>, AgentError>;

    /// Release resources. Callers log failures and never propagate them.
    fn cleanup(&mut self) -> Result<(), AgentError>;
}

/// Constructs agent handles for the lifecycle manager.
pub trait AgentFactory {
    fn create(&self, options: &AgentOptions) -> Result<Box<dyn Agent>, AgentError>;
}

impl<F> AgentFactory for F
where
    F: Fn(&AgentOptions) -> Result<Box<dyn Agent>, AgentError>,
{
    fn create(&self, options: &AgentOptions) -> Result<Box<dyn Agent>, AgentError> {
        self(options)
    }
}
