//! Transcript rendering: history in, styled chat bubbles out.

use crate::agent::{Message, Role};
use crate::tui::markdown::render_markdown;
use crate::tui::terminal::{StyledLine, StyledSpan, fg, with_attr};
use crossterm::style::{Attribute, Color, ContentStyle};

/// Assistant content containing this marker is evaluator feedback.
pub const FEEDBACK_MARKER: &str = "Evaluator Feedback";

const BUBBLE_PREFIX: &str = "│ ";
const BUBBLE_PREFIX_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleStyle {
    User,
    Assistant,
    Feedback,
}

impl BubbleStyle {
    #[must_use]
    pub fn classify(message: &Message) -> Self {
        match message.role {
            Role::User => Self::User,
            Role::Assistant if message.content.contains(FEEDBACK_MARKER) => Self::Feedback,
            Role::Assistant => Self::Assistant,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Pilot",
            Self::Feedback => "Evaluator",
        }
    }

    fn accent(self) -> Color {
        match self {
            Self::User => Color::Green,
            Self::Assistant => Color::Blue,
            Self::Feedback => Color::Magenta,
        }
    }

    fn body_style(self) -> ContentStyle {
        match self {
            Self::Feedback => with_attr(ContentStyle::new(), Attribute::Italic),
            Self::User | Self::Assistant => ContentStyle::new(),
        }
    }
}

pub struct ChatRenderer;

impl ChatRenderer {
    /// Build the whole transcript. Pure read of `history`.
    ///
    /// `pending` is a prompt echoed before the agent has answered; `error`
    /// is the inline message of the last failed turn.
    #[must_use]
    pub fn build_lines(
        history: &[Message],
        pending: Option<&str>,
        error: Option<&str>,
        width: usize,
    ) -> Vec<StyledLine> {
        let mut lines = Vec::new();
        for message in history {
            let style = BubbleStyle::classify(message);
            lines.extend(Self::bubble(style, &message.content, width));
        }
        if let Some(prompt) = pending {
            lines.extend(Self::bubble(BubbleStyle::User, prompt, width));
        }
        if let Some(error) = error {
            for line in error.lines() {
                lines.extend(StyledLine::new(vec![StyledSpan::colored(line, Color::Red)]).wrap(width));
            }
            lines.push(StyledLine::empty());
        }
        lines
    }

    /// One message: a labeled header, a left border, and the wrapped body.
    #[must_use]
    pub fn bubble(style: BubbleStyle, content: &str, width: usize) -> Vec<StyledLine> {
        let accent = style.accent();
        let mut lines = vec![StyledLine::new(vec![StyledSpan::new(
            format!("● {}", style.label()),
            with_attr(fg(accent), Attribute::Bold),
        )])];

        let body: Vec<StyledLine> = match style {
            // User text is shown verbatim.
            BubbleStyle::User => content.lines().map(StyledLine::raw).collect(),
            BubbleStyle::Assistant | BubbleStyle::Feedback => render_markdown(content)
                .into_iter()
                .map(|line| line.with_base_style(style.body_style()))
                .collect(),
        };

        let inner = width.saturating_sub(BUBBLE_PREFIX_WIDTH).max(1);
        for line in body {
            for row in line.wrap(inner) {
                let mut out = StyledLine::new(vec![StyledSpan::colored(BUBBLE_PREFIX, accent)]);
                out.spans.extend(row.spans);
                lines.push(out);
            }
        }
        lines.push(StyledLine::empty());
        lines
    }
}
