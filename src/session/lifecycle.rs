//! Agent construction, one-time setup, reset and shutdown.

use super::SessionState;
use crate::agent::{AgentFactory, AgentOptions};
use crate::bridge::AsyncBridge;
use crate::error::{Error, Result};
use tracing::{debug, error, warn};

impl SessionState {
    /// Construct and set up the agent if the session has none.
    ///
    /// Idempotent: with a live handle this neither constructs nor re-runs setup.
    /// On failure the session is left without a handle.
    pub fn ensure_ready(
        &mut self,
        bridge: &mut AsyncBridge,
        factory: &dyn AgentFactory,
        headless: bool,
    ) -> Result<()> {
        if self.agent.is_some() {
            return Ok(());
        }

        let options = AgentOptions {
            disable_tracing: self.disable_tracing,
            headless,
        };
        debug!("Booting agent for session {} with {:?}", self.id, options);

        let mut agent = factory.create(&options).map_err(Error::Setup)?;
        if let Err(e) = bridge.run(agent.setup()) {
            error!("Agent setup failed for session {}: {}", self.id, e);
            if let Err(cleanup_err) = agent.cleanup() {
                warn!("Cleanup after failed setup failed: {}", cleanup_err);
            }
            return Err(Error::Setup(e));
        }

        self.agent = Some(agent);
        self.initialized = true;
        Ok(())
    }

    /// Drop the agent and conversation. Cleanup failures are logged, never returned.
    pub fn reset(&mut self) {
        self.cleanup_agent();
        self.history.clear();
        self.initialized = false;
        self.last_error = None;
    }

    /// Best-effort cleanup at exit. Keeps history and settings.
    pub fn shutdown(&mut self) {
        self.cleanup_agent();
    }

    fn cleanup_agent(&mut self) {
        if let Some(mut agent) = self.agent.take() {
            debug!("Cleaning up agent for session {}", self.id);
            if let Err(e) = agent.cleanup() {
                warn!("Agent cleanup failed for session {}: {}", self.id, e);
            }
        }
    }
}
