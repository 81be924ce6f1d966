//! Terminal chat screen: sidebar controls, transcript, and chat input.

pub mod chat;
mod events;
mod input;
mod markdown;
mod render;
mod run;
pub mod terminal;

pub use run::run;

use crate::agent::AgentFactory;
use crate::bridge::AsyncBridge;
use crate::cli::Settings;
use crate::session::{SessionDefaults, SessionState, SessionStore, TurnOutcome};
use crate::tui::input::TextInput;

pub(crate) const TITLE: &str = "Visexa Pilot";

/// Which control receives key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Chat,
    Criteria,
    Tracing,
    Reset,
}

impl Focus {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Chat => Self::Criteria,
            Self::Criteria => Self::Tracing,
            Self::Tracing => Self::Reset,
            Self::Reset => Self::Chat,
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            Self::Chat => Self::Reset,
            Self::Criteria => Self::Chat,
            Self::Tracing => Self::Criteria,
            Self::Reset => Self::Tracing,
        }
    }
}

/// What the screen is blocked on, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Booting,
    Thinking,
}

/// Main TUI application state.
pub struct App {
    store: SessionStore,
    session_id: String,
    bridge: AsyncBridge,
    factory: Box<dyn AgentFactory>,
    headless: bool,
    pub focus: Focus,
    pub(crate) chat_input: TextInput,
    pub(crate) criteria_input: TextInput,
    /// Submitted prompt echoed on screen until the agent answers.
    pending_prompt: Option<String>,
    /// Boot the agent before the next frame.
    needs_boot: bool,
    setup_error: Option<String>,
    /// One-off message for the status line, cleared by the next key press.
    pub(crate) notice: Option<String>,
    /// Transcript lines scrolled up from the bottom.
    pub(crate) scroll_offset: usize,
    pub should_quit: bool,
    /// Request to open the success criteria in an external editor (Ctrl+G).
    pub editor_requested: bool,
}

impl App {
    pub fn new(settings: &Settings, factory: Box<dyn AgentFactory>) -> std::io::Result<Self> {
        let mut store = SessionStore::new(SessionDefaults {
            success_criteria: settings.success_criteria.clone(),
            disable_tracing: settings.disable_tracing,
        });
        let session_id = uuid::Uuid::new_v4().to_string();
        let criteria = store.get_or_init(&session_id).success_criteria.clone();

        Ok(Self {
            store,
            session_id,
            bridge: AsyncBridge::new()?,
            factory,
            headless: settings.headless,
            focus: Focus::Chat,
            chat_input: TextInput::new(),
            criteria_input: TextInput::with_content(&criteria),
            pending_prompt: None,
            needs_boot: true,
            setup_error: None,
            notice: None,
            scroll_offset: 0,
            should_quit: false,
            editor_requested: false,
        })
    }

    /// The session for this screen, initialized with defaults on first access.
    pub fn session(&mut self) -> &mut SessionState {
        self.store.get_or_init(&self.session_id)
    }

    pub(crate) fn session_ref(&self) -> Option<&SessionState> {
        self.store.get(&self.session_id)
    }

    #[must_use]
    pub fn status(&self) -> Status {
        if self.needs_boot {
            Status::Booting
        } else if self.pending_prompt.is_some() {
            Status::Thinking
        } else {
            Status::Idle
        }
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    pub(crate) fn setup_error(&self) -> Option<&str> {
        self.setup_error.as_deref()
    }

    pub(crate) fn pending_prompt(&self) -> Option<&str> {
        self.pending_prompt.as_deref()
    }

    /// Boot the agent if a boot is due. Setup errors stay on screen until reset.
    pub fn boot(&mut self) {
        if !self.needs_boot {
            return;
        }
        self.needs_boot = false;
        let session = self.store.get_or_init(&self.session_id);
        if let Err(e) = session.ensure_ready(&mut self.bridge, self.factory.as_ref(), self.headless)
        {
            self.setup_error = Some(e.to_string());
        }
    }

    /// Take the chat input as the next prompt. Blank input is ignored.
    pub fn submit_input(&mut self) {
        if self.pending_prompt.is_some() || self.chat_input.content().trim().is_empty() {
            return;
        }
        let prompt = self.chat_input.take();
        self.pending_prompt = Some(prompt.trim().to_string());
    }

    /// Run the echoed prompt through the agent. Blocks until it answers.
    pub fn run_pending_turn(&mut self) -> Option<TurnOutcome> {
        let prompt = self.pending_prompt.take()?;
        let session = self.store.get_or_init(&self.session_id);
        let outcome = session.submit(&mut self.bridge, &prompt);
        self.scroll_offset = 0;
        Some(outcome)
    }

    /// Clear agent and conversation, then boot a fresh agent on the next frame.
    pub fn reset(&mut self) {
        self.session().reset();
        self.pending_prompt = None;
        self.setup_error = None;
        self.scroll_offset = 0;
        self.needs_boot = true;
    }

    pub fn toggle_tracing(&mut self) {
        let session = self.session();
        session.disable_tracing = !session.disable_tracing;
    }

    /// Replace the success criteria from an external edit.
    pub fn set_criteria(&mut self, text: &str) {
        self.criteria_input.set(text);
        self.sync_criteria();
    }

    pub(crate) fn sync_criteria(&mut self) {
        let text = self.criteria_input.content();
        self.session().success_criteria = text;
    }

    /// End the session on exit. Agent cleanup is best effort.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.store.remove(&self.session_id) {
            session.shutdown();
        }
    }
}
