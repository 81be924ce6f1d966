//! Command line parsing, settings resolution and one-shot mode.

use crate::agent::{AgentFactory, Message, ProcessAgentFactory};
use crate::bridge::AsyncBridge;
use crate::config::{AgentConfig, Config};
use crate::session::{SessionDefaults, SessionStore, TurnOutcome};
use crate::tui::chat::BubbleStyle;
use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

/// Effective settings after merging CLI flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub success_criteria: String,
    pub disable_tracing: bool,
    pub headless: bool,
    pub agent: AgentConfig,
}

/// Chat front-end for a self-evaluating, tool-using agent
#[derive(Parser, Debug)]
#[command(name = "pilot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: ~/.config/pilot/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Initial success criteria
    #[arg(long, global = true, value_name = "TEXT")]
    pub criteria: Option<String>,

    /// Start with the tracing backend disabled
    #[arg(long, global = true)]
    pub disable_tracing: bool,

    /// Show the agent's browser instead of running it headless
    #[arg(long, global = true)]
    pub headed: bool,

    /// Worker command, replacing `agent.command` and `agent.args`
    #[arg(long, global = true, value_name = "CMD")]
    pub agent_cmd: Option<String>,

    /// Argument for --agent-cmd (repeatable)
    #[arg(long, global = true, value_name = "ARG", allow_hyphen_values = true)]
    pub agent_arg: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one prompt (non-interactive) and print the transcript
    Run(RunArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// The prompt to execute (use "-" to read from stdin)
    #[arg(required = true)]
    pub prompt: String,

    /// Print the resulting history as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Load `--config` if given, else the default location.
    pub fn load_config(&self) -> crate::error::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    /// Resolve effective settings from CLI flags and config.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Config file settings
    /// 3. Built-in defaults
    #[must_use]
    pub fn resolve_settings(&self, config: &Config) -> Settings {
        let mut settings = Settings {
            success_criteria: config.success_criteria.clone(),
            disable_tracing: config.disable_tracing,
            headless: config.headless,
            agent: config.agent.clone(),
        };

        if let Some(criteria) = &self.criteria {
            settings.success_criteria.clone_from(criteria);
        }
        if self.disable_tracing {
            settings.disable_tracing = true;
        }
        if self.headed {
            settings.headless = false;
        }
        if let Some(cmd) = &self.agent_cmd {
            settings.agent.command.clone_from(cmd);
            settings.agent.args.clone_from(&self.agent_arg);
        }

        settings
    }
}

/// JSON output for `run --json`.
#[derive(Serialize)]
struct JsonOutput<'a> {
    history: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Run the CLI one-shot mode
pub fn run(args: RunArgs, settings: &Settings) -> ExitCode {
    match run_inner(&args, settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_inner(args: &RunArgs, settings: &Settings) -> Result<ExitCode> {
    let prompt = if args.prompt == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        args.prompt.clone()
    };
    if prompt.trim().is_empty() {
        anyhow::bail!("Empty prompt");
    }

    let factory = ProcessAgentFactory::new(settings.agent.clone(), false);
    let mut stdout = io::stdout().lock();
    run_turn(&factory, settings, &prompt, args.json, &mut stdout)
}

/// Boot an agent, run one turn, print the result and clean up.
fn run_turn(
    factory: &dyn AgentFactory,
    settings: &Settings,
    prompt: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let mut bridge = AsyncBridge::new()?;
    let mut store = SessionStore::new(SessionDefaults {
        success_criteria: settings.success_criteria.clone(),
        disable_tracing: settings.disable_tracing,
    });
    let session_id = uuid::Uuid::new_v4().to_string();
    let session = store.get_or_init(&session_id);
    debug!("One-shot session {session_id}");

    if let Err(e) = session.ensure_ready(&mut bridge, factory, settings.headless) {
        write_result(out, &[], Some(&e.to_string()), json)?;
        return Ok(ExitCode::FAILURE);
    }

    let outcome = session.submit(&mut bridge, prompt);
    session.shutdown();

    match outcome {
        TurnOutcome::Completed { .. } => {
            write_result(out, &session.history, None, json)?;
            Ok(ExitCode::SUCCESS)
        }
        TurnOutcome::Failed(message) => {
            write_result(out, &session.history, Some(&message), json)?;
            Ok(ExitCode::FAILURE)
        }
        TurnOutcome::Ignored => anyhow::bail!("Empty prompt"),
    }
}

fn write_result(
    out: &mut impl Write,
    history: &[Message],
    error: Option<&str>,
    json: bool,
) -> Result<()> {
    if json {
        let output = JsonOutput { history, error };
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    for message in history {
        let label = match BubbleStyle::classify(message) {
            BubbleStyle::User => "user",
            BubbleStyle::Assistant => "assistant",
            BubbleStyle::Feedback => "feedback",
        };
        writeln!(out, "[{label}]\n{}\n", message.content)?;
    }
    if let Some(error) = error {
        eprintln!("Error: {error}");
    }
    Ok(())
}
