//! Agent backed by a Sidekick worker process speaking JSON lines over stdio.

use super::protocol::{Request, Response, is_reply_line};
use super::{Agent, AgentError, AgentFactory, AgentOptions, Message};
use crate::config::AgentConfig;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

/// Tracing backend switch read by the worker.
pub const TRACING_ENV: &str = "LANGCHAIN_TRACING_V2";
/// Browser automation headless switch read by the worker.
pub const HEADLESS_ENV: &str = "PLAYWRIGHT_HEADLESS";

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

pub struct ProcessAgent {
    config: AgentConfig,
    options: AgentOptions,
    quiet_stderr: bool,
    worker: Option<Worker>,
}

impl ProcessAgent {
    /// Construction never spawns; the process starts in `setup`.
    #[must_use]
    pub fn new(config: AgentConfig, options: AgentOptions) -> Self {
        Self {
            config,
            options,
            quiet_stderr: false,
            worker: None,
        }
    }

    /// Discard the worker's stderr instead of inheriting it.
    #[must_use]
    pub fn with_quiet_stderr(mut self, quiet: bool) -> Self {
        self.quiet_stderr = quiet;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        let headless_inherited = std::env::var_os(HEADLESS_ENV).is_some();
        cmd.envs(worker_env(&self.config, &self.options, headless_inherited));
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(if self.quiet_stderr {
            Stdio::null()
        } else {
            Stdio::inherit()
        });
        cmd.kill_on_drop(true);
        cmd
    }

    fn spawn(&self) -> Result<Worker, AgentError> {
        let mut child = self.command().spawn().map_err(|source| AgentError::Spawn {
            command: self.config.display_command(),
            source,
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Protocol("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Protocol("worker stdout unavailable".to_string()))?;
        debug!("Spawned agent worker: {}", self.config.display_command());
        Ok(Worker {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }
}

impl Worker {
    async fn call(&mut self, request: &Request<'_>) -> Result<Response, AgentError> {
        self.stdin.write_all(request.to_line()?.as_bytes()).await?;
        self.stdin.flush().await?;
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                return Err(AgentError::Closed);
            };
            if !is_reply_line(&line) {
                if !line.trim().is_empty() {
                    debug!("Worker output: {}", line.trim_end());
                }
                continue;
            }
            return Response::parse(&line);
        }
    }
}

/// Environment entries applied to the worker on top of the inherited one.
///
/// Configured extras come first so the launch options always win.
pub(crate) fn worker_env(
    config: &AgentConfig,
    options: &AgentOptions,
    headless_inherited: bool,
) -> Vec<(String, String)> {
    let mut env: Vec<(String, String)> = config
        .env
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if options.disable_tracing {
        env.push((TRACING_ENV.to_string(), "false".to_string()));
    }
    if !headless_inherited && !config.env.contains_key(HEADLESS_ENV) {
        env.push((HEADLESS_ENV.to_string(), options.headless.to_string()));
    }
    env
}

#[async_trait]
impl Agent for ProcessAgent {
    async fn setup(&mut self) -> Result<(), AgentError> {
        let mut worker = self.spawn()?;
        worker.call(&Request::Setup).await?.into_ready()?;
        self.worker = Some(worker);
        Ok(())
    }

    async fn run_superstep(
        &mut self,
        prompt: &str,
        success_criteria: &str,
        history: &[Message],
    ) -> Result<Vec<Message>, AgentError> {
        let worker = self.worker.as_mut().ok_or(AgentError::NotReady)?;
        let result = worker
            .call(&Request::Superstep {
                prompt,
                success_criteria,
                history,
            })
            .await
            .and_then(Response::into_history);
        if let Err(e) = &result
            && !matches!(e, AgentError::Remote(_))
        {
            // Replies can no longer be matched to requests.
            warn!("Dropping agent worker after protocol failure: {e}");
            if let Some(mut worker) = self.worker.take() {
                let _ = worker.child.start_kill();
            }
        }
        result
    }

    fn cleanup(&mut self) -> Result<(), AgentError> {
        match self.worker.take() {
            Some(mut worker) => {
                debug!("Stopping agent worker");
                worker.child.start_kill()?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Builds a [`ProcessAgent`] per session from the configured worker command.
#[derive(Debug, Clone)]
pub struct ProcessAgentFactory {
    config: AgentConfig,
    quiet_stderr: bool,
}

impl ProcessAgentFactory {
    #[must_use]
    pub fn new(config: AgentConfig, quiet_stderr: bool) -> Self {
        Self {
            config,
            quiet_stderr,
        }
    }
}

impl AgentFactory for ProcessAgentFactory {
    fn create(&self, options: &AgentOptions) -> Result<Box<dyn Agent>, AgentError> {
        Ok(Box::new(
            ProcessAgent::new(self.config.clone(), *options).with_quiet_stderr(self.quiet_stderr),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_value<'a>(env: &'a [(String, String)], key: &str) -> Option<&'a str> {
        env.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_disable_tracing_sets_flag_on_worker_only() {
        let options = AgentOptions {
            disable_tracing: true,
            headless: true,
        };
        let env = worker_env(&AgentConfig::default(), &options, false);
        assert_eq!(env_value(&env, TRACING_ENV), Some("false"));
    }

    #[test]
    fn test_tracing_untouched_when_enabled() {
        let env = worker_env(&AgentConfig::default(), &AgentOptions::default(), false);
        assert_eq!(env_value(&env, TRACING_ENV), None);
    }

    #[test]
    fn test_headless_defaults_only_when_absent() {
        let options = AgentOptions {
            disable_tracing: false,
            headless: false,
        };
        let env = worker_env(&AgentConfig::default(), &options, false);
        assert_eq!(env_value(&env, HEADLESS_ENV), Some("false"));

        let env = worker_env(&AgentConfig::default(), &options, true);
        assert_eq!(env_value(&env, HEADLESS_ENV), None);

        let mut config = AgentConfig::default();
        config
            .env
            .insert(HEADLESS_ENV.to_string(), "true".to_string());
        let env = worker_env(&config, &options, false);
        assert_eq!(env_value(&env, HEADLESS_ENV), Some("true"));
    }

    #[tokio::test]
    async fn test_superstep_before_setup_is_not_ready() {
        let mut agent = ProcessAgent::new(AgentConfig::default(), AgentOptions::default());
        let err = agent.run_superstep("hi", "", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::NotReady));
        assert!(agent.cleanup().is_ok());
    }

    #[tokio::test]
    async fn test_spawn_failure_names_command() {
        let config = AgentConfig {
            command: "pilot-test-no-such-worker".to_string(),
            args: Vec::new(),
            ..AgentConfig::default()
        };
        let mut agent = ProcessAgent::new(config, AgentOptions::default());
        let err = agent.setup().await.unwrap_err();
        assert!(matches!(err, AgentError::Spawn { .. }));
        assert!(err.to_string().contains("pilot-test-no-such-worker"));
    }

    #[cfg(unix)]
    fn sh_worker(script: &str) -> AgentConfig {
        AgentConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            ..AgentConfig::default()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_worker_round_trip() {
        let script = r#"while read line; do echo '{"ok":true,"history":[{"role":"user","content":"hi"},{"role":"assistant","content":"done"}]}'; done"#;
        let mut agent = ProcessAgent::new(sh_worker(script), AgentOptions::default())
            .with_quiet_stderr(true);
        agent.setup().await.unwrap();

        let history = agent.run_superstep("hi", "clear", &[]).await.unwrap();
        assert_eq!(
            history,
            vec![Message::user("hi"), Message::assistant("done")]
        );
        agent.cleanup().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_worker_error_surfaces_as_remote() {
        let script = r#"while read line; do echo '{"error":"no browser"}'; done"#;
        let mut agent = ProcessAgent::new(sh_worker(script), AgentOptions::default())
            .with_quiet_stderr(true);
        let err = agent.setup().await.unwrap_err();
        assert_eq!(err.to_string(), "no browser");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_worker_exit_is_closed() {
        let mut agent = ProcessAgent::new(sh_worker("exit 0"), AgentOptions::default())
            .with_quiet_stderr(true);
        let err = agent.setup().await.unwrap_err();
        assert!(matches!(err, AgentError::Closed | AgentError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stray_output_lines_are_skipped() {
        let script = r#"n=0; while read line; do echo 'loading tools...'; echo '{"ok":true,"history":[{"content":"turn '$n'"}]}'; n=$((n+1)); done"#;
        let mut agent = ProcessAgent::new(sh_worker(script), AgentOptions::default())
            .with_quiet_stderr(true);
        agent.setup().await.unwrap();

        let first = agent.run_superstep("a", "", &[]).await.unwrap();
        assert_eq!(first, vec![Message::assistant("turn 1")]);
        let second = agent.run_superstep("b", "", &[]).await.unwrap();
        assert_eq!(second, vec![Message::assistant("turn 2")]);
        agent.cleanup().unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_malformed_reply_retires_worker() {
        let script = r#"read line; echo '{"ok":true}'; while read line; do echo '{"history":'; echo '{"history":[]}'; done"#;
        let mut agent = ProcessAgent::new(sh_worker(script), AgentOptions::default())
            .with_quiet_stderr(true);
        agent.setup().await.unwrap();

        let err = agent.run_superstep("a", "", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Protocol(_)));
        let err = agent.run_superstep("b", "", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::NotReady));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_setup_not_ok_is_rejected() {
        let script = r#"while read line; do echo '{"ok":false}'; done"#;
        let mut agent = ProcessAgent::new(sh_worker(script), AgentOptions::default())
            .with_quiet_stderr(true);
        let err = agent.setup().await.unwrap_err();
        assert!(matches!(err, AgentError::Protocol(_)));
        let err = agent.run_superstep("a", "", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::NotReady));
    }
}
