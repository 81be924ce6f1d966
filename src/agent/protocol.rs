//! JSON-lines wire format spoken with the agent worker process.

use super::{AgentError, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(super) enum Request<'a> {
    Setup,
    Superstep {
        prompt: &'a str,
        success_criteria: &'a str,
        history: &'a [Message],
    },
}

impl Request<'_> {
    /// Encode as a single newline-terminated line.
    pub(super) fn to_line(&self) -> Result<String, AgentError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Response {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub history: Option<Vec<Message>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Whether a worker stdout line can be a reply. Anything else is stray output.
pub(super) fn is_reply_line(line: &str) -> bool {
    line.trim_start().starts_with('{')
}

impl Response {
    pub(super) fn parse(line: &str) -> Result<Self, AgentError> {
        let response: Self = serde_json::from_str(line.trim())
            .map_err(|e| AgentError::Protocol(format!("invalid response line: {e}")))?;
        match response.error {
            Some(error) => Err(AgentError::Remote(error)),
            None => Ok(response),
        }
    }

    /// Accept a setup reply. Only `{"ok":true}` means the worker is ready.
    pub(super) fn into_ready(self) -> Result<(), AgentError> {
        if self.ok {
            Ok(())
        } else {
            Err(AgentError::Protocol(
                "worker did not report ready".to_string(),
            ))
        }
    }

    pub(super) fn into_history(self) -> Result<Vec<Message>, AgentError> {
        self.history
            .ok_or_else(|| AgentError::Protocol("response has no history".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_request_line() {
        assert_eq!(Request::Setup.to_line().unwrap(), "{\"op\":\"setup\"}\n");
    }

    #[test]
    fn test_superstep_request_carries_history() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let line = Request::Superstep {
            prompt: "next",
            success_criteria: "be brief",
            history: &history,
        }
        .to_line()
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["op"], "superstep");
        assert_eq!(value["prompt"], "next");
        assert_eq!(value["success_criteria"], "be brief");
        assert_eq!(value["history"][1]["role"], "assistant");
    }

    #[test]
    fn test_error_response_is_remote_error() {
        let err = Response::parse(r#"{"error":"browser crashed"}"#).unwrap_err();
        assert!(matches!(err, AgentError::Remote(ref msg) if msg == "browser crashed"));
    }

    #[test]
    fn test_garbage_is_protocol_error() {
        let err = Response::parse("not json").unwrap_err();
        assert!(matches!(err, AgentError::Protocol(_)));
    }

    #[test]
    fn test_missing_history_is_protocol_error() {
        let response = Response::parse(r#"{"ok":true}"#).unwrap();
        assert!(response.ok);
        assert!(matches!(
            response.into_history(),
            Err(AgentError::Protocol(_))
        ));
    }

    #[test]
    fn test_setup_reply_must_be_ok() {
        assert!(Response::parse(r#"{"ok":true}"#).unwrap().into_ready().is_ok());
        for line in [r#"{"ok":false}"#, "{}"] {
            let err = Response::parse(line).unwrap().into_ready().unwrap_err();
            assert!(matches!(err, AgentError::Protocol(_)));
        }
    }

    #[test]
    fn test_reply_lines_are_objects() {
        assert!(is_reply_line(r#"  {"ok":true}"#));
        assert!(!is_reply_line("loading tools..."));
        assert!(!is_reply_line("[info] {\"ok\":true}"));
    }
}
