use crate::error::{Error, Result};
use crate::session::DEFAULT_SUCCESS_CRITERIA;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial success criteria for new sessions.
    pub success_criteria: String,
    /// Start sessions with the tracing backend disabled.
    pub disable_tracing: bool,
    /// Run the agent's browser automation headless. Default: true.
    pub headless: bool,
    /// How to launch the Sidekick worker.
    pub agent: AgentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            success_criteria: DEFAULT_SUCCESS_CRITERIA.to_string(),
            disable_tracing: false,
            headless: true,
            agent: AgentConfig::default(),
        }
    }
}

/// Worker process launch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Extra environment for the worker only.
    pub env: BTreeMap<String, String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: vec!["-m".to_string(), "sidekick_worker".to_string()],
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

impl AgentConfig {
    /// Command line for log and error messages.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Default config file location (`~/.config/pilot/config.toml` on Linux).
#[must_use]
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("pilot").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(".pilot/config.toml"))
}

impl Config {
    /// Load from the default location, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load an explicit config file. A missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Config = toml::from_str(&content)?;
        if config.agent.command.trim().is_empty() {
            return Err(Error::Config("agent.command must not be empty".to_string()));
        }
        Ok(config)
    }
}
