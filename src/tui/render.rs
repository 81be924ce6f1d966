//! Full-screen frame composition. Every frame is rebuilt from state.

use crate::tui::chat::ChatRenderer;
use crate::tui::terminal::{LineBuilder, StyledLine, StyledSpan, fg, with_attr};
use crate::tui::{App, Focus, Status, TITLE};
use crossterm::style::{Attribute, Color, ContentStyle};

const SIDEBAR_WIDTH: usize = 32;
/// Sidebar is hidden below this terminal width.
const MIN_WIDTH_FOR_SIDEBAR: usize = 72;
const HEADER_HEIGHT: usize = 3;
/// Input box (3) + status line (1).
const FOOTER_HEIGHT: usize = 4;
const CRITERIA_ROWS: usize = 6;

const CAPTION: &str =
    "A tool-using, self-reflecting agent that iterates until it meets your success criteria.";
const PLACEHOLDER: &str = "Ask Visexa Pilot anything…";
const TIP: &str = "Tip: edit the success criteria to force the agent to iterate until your bar is met.";
const KEYS: &str = "Tab focus · Ctrl+R reset · Ctrl+G edit criteria · Ctrl+C quit";

fn reversed() -> ContentStyle {
    with_attr(ContentStyle::new(), Attribute::Reverse)
}

impl App {
    /// Compose exactly `height` rows, each exactly `width` cells wide.
    #[must_use]
    pub fn frame(&self, width: u16, height: u16) -> Vec<StyledLine> {
        let width = width as usize;
        let height = height as usize;
        let mut rows = Vec::with_capacity(height);

        rows.extend(self.header_lines(width));

        let body_height = height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT);
        let show_sidebar = width >= MIN_WIDTH_FOR_SIDEBAR;
        let transcript_width = if show_sidebar {
            width - SIDEBAR_WIDTH - 2
        } else {
            width
        };
        let transcript = self.transcript_rows(transcript_width, body_height);
        if show_sidebar {
            let sidebar = self.sidebar_lines();
            for (i, right) in transcript.into_iter().enumerate() {
                let left = sidebar.get(i).cloned().unwrap_or_default();
                let mut row = left.fit(SIDEBAR_WIDTH);
                row.push(StyledSpan::dim("│ "));
                row.spans.extend(right.fit(transcript_width).spans);
                rows.push(row);
            }
        } else {
            rows.extend(transcript);
        }

        rows.extend(self.input_lines(width));
        rows.push(self.status_line());

        rows.truncate(height);
        while rows.len() < height {
            rows.push(StyledLine::empty());
        }
        rows.into_iter().map(|row| row.fit(width)).collect()
    }

    fn header_lines(&self, width: usize) -> Vec<StyledLine> {
        vec![
            LineBuilder::new()
                .bold(TITLE)
                .raw(" ")
                .styled(StyledSpan::new(
                    " agent ",
                    ContentStyle {
                        foreground_color: Some(Color::White),
                        background_color: Some(Color::DarkBlue),
                        ..ContentStyle::default()
                    },
                ))
                .build(),
            LineBuilder::new().dim(CAPTION).build(),
            LineBuilder::new().dim("─".repeat(width)).build(),
        ]
    }

    /// Bottom-aligned transcript window of exactly `height` rows.
    fn transcript_rows(&self, width: usize, height: usize) -> Vec<StyledLine> {
        let (history, last_error) = match self.session_ref() {
            Some(s) => (s.history.as_slice(), s.last_error.as_deref()),
            None => (&[][..], None),
        };
        let pending = self.pending_prompt();

        let mut lines = ChatRenderer::build_lines(history, pending, last_error, width);
        if lines.is_empty() {
            lines.push(LineBuilder::new().dim(PLACEHOLDER).build());
        }

        let max_offset = lines.len().saturating_sub(height);
        let offset = self.scroll_offset.min(max_offset);
        let end = lines.len() - offset;
        let start = end.saturating_sub(height);

        let mut window = vec![StyledLine::empty(); height - (end - start)];
        window.extend(lines.drain(start..end));
        window
    }

    fn sidebar_lines(&self) -> Vec<StyledLine> {
        let disable_tracing = self.session_ref().is_some_and(|s| s.disable_tracing);
        let inner = SIDEBAR_WIDTH - 4;
        let mut lines = vec![
            LineBuilder::new().bold("⚙ Controls").build(),
            StyledLine::empty(),
        ];

        let focused = self.focus == Focus::Criteria;
        let label_style = if focused {
            with_attr(fg(Color::Cyan), Attribute::Bold)
        } else {
            with_attr(ContentStyle::new(), Attribute::Bold)
        };
        let border = if focused { Color::Cyan } else { Color::DarkGrey };
        lines.push(StyledLine::new(vec![StyledSpan::new(
            "Success Criteria",
            label_style,
        )]));
        lines.push(StyledLine::new(vec![StyledSpan::colored(
            format!("┌{}┐", "─".repeat(SIDEBAR_WIDTH - 2)),
            border,
        )]));

        let (rows, cursor_row) = self.criteria_input.render(inner, focused);
        let first = (cursor_row + 1).saturating_sub(CRITERIA_ROWS);
        for i in 0..CRITERIA_ROWS {
            let row = rows.get(first + i).cloned().unwrap_or_default();
            let mut line = StyledLine::new(vec![StyledSpan::colored("│ ", border)]);
            line.spans.extend(row.fit(inner).spans);
            line.push(StyledSpan::colored(" │", border));
            lines.push(line);
        }
        lines.push(StyledLine::new(vec![StyledSpan::colored(
            format!("└{}┘", "─".repeat(SIDEBAR_WIDTH - 2)),
            border,
        )]));
        lines.push(LineBuilder::new().dim("What 'done' looks like. The").build());
        lines.push(LineBuilder::new().dim("evaluator checks against it.").build());
        lines.push(StyledLine::empty());

        let mark = if disable_tracing { "[x]" } else { "[ ]" };
        let toggle = format!("{mark} Disable tracing (dev mode)");
        lines.push(if self.focus == Focus::Tracing {
            StyledLine::new(vec![StyledSpan::new(toggle, reversed())])
        } else {
            StyledLine::raw(toggle)
        });
        lines.push(LineBuilder::new().dim("    applies on next boot").build());
        lines.push(StyledLine::empty());

        let mode = if self.headless() { "headless" } else { "headed" };
        lines.push(
            LineBuilder::new()
                .dim(format!("Browser automation: {mode}"))
                .build(),
        );
        lines.push(StyledLine::empty());

        let button = "[ ↻ Reset conversation ]";
        lines.push(if self.focus == Focus::Reset {
            StyledLine::new(vec![StyledSpan::new(button, reversed())])
        } else {
            StyledLine::raw(button)
        });
        lines
    }

    fn input_lines(&self, width: usize) -> Vec<StyledLine> {
        let focused = self.focus == Focus::Chat;
        let border = if focused { Color::Cyan } else { Color::DarkGrey };
        let inner = width.saturating_sub(6);

        let content = if self.chat_input.is_empty() && !focused {
            LineBuilder::new().dim(PLACEHOLDER).build()
        } else {
            let (rows, cursor_row) = self.chat_input.render(inner, focused);
            rows.into_iter().nth(cursor_row).unwrap_or_default()
        };

        let mut middle = StyledLine::new(vec![
            StyledSpan::colored("│ ", border),
            StyledSpan::colored("> ", Color::Cyan),
        ]);
        middle.spans.extend(content.fit(inner).spans);
        middle.push(StyledSpan::colored(" │", border));

        let bar = "─".repeat(width.saturating_sub(2));
        vec![
            StyledLine::new(vec![StyledSpan::colored(format!("╭{bar}╮"), border)]),
            middle,
            StyledLine::new(vec![StyledSpan::colored(format!("╰{bar}╯"), border)]),
        ]
    }

    fn status_line(&self) -> StyledLine {
        match self.status() {
            Status::Booting => StyledLine::new(vec![StyledSpan::colored(
                format!("Booting your {TITLE}…"),
                Color::Yellow,
            )]),
            Status::Thinking => StyledLine::new(vec![StyledSpan::colored(
                format!("{TITLE} is thinking…"),
                Color::Yellow,
            )]),
            Status::Idle => match self.setup_error() {
                Some(err) => StyledLine::new(vec![StyledSpan::colored(
                    format!("{err} (Ctrl+R to retry)"),
                    Color::Red,
                )]),
                None => match &self.notice {
                    Some(notice) => {
                        StyledLine::new(vec![StyledSpan::colored(notice.as_str(), Color::Yellow)])
                    }
                    None => LineBuilder::new().dim(format!("{TIP}  {KEYS}")).build(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::agent::Message;
    use crate::tui::Focus;
    use crate::tui::tests::test_app;
    use crate::tui::terminal::StyledLine;

    fn texts(rows: &[StyledLine]) -> Vec<String> {
        rows.iter().map(StyledLine::text).collect()
    }

    #[test]
    fn test_frame_has_exact_size() {
        let (mut app, _) = test_app();
        app.boot();
        for (w, h) in [(100, 30), (40, 12), (80, 5)] {
            let rows = app.frame(w, h);
            assert_eq!(rows.len(), h as usize);
            assert!(rows.iter().all(|r| r.width() == w as usize));
        }
    }

    #[test]
    fn test_frame_shows_history_and_sidebar() {
        let (mut app, _) = test_app();
        app.boot();
        app.session().history = vec![Message::user("hi"), Message::assistant("hello")];

        let rows = texts(&app.frame(100, 30));
        assert!(rows[0].starts_with("Visexa Pilot"));
        assert!(rows.iter().any(|r| r.contains("⚙ Controls")));
        assert!(rows.iter().any(|r| r.contains("Be accurate")));
        let you = rows.iter().position(|r| r.contains("● You")).unwrap();
        let pilot = rows.iter().position(|r| r.contains("● Pilot")).unwrap();
        assert!(you < pilot);
    }

    #[test]
    fn test_pending_prompt_echoed_with_thinking_status() {
        let (mut app, _) = test_app();
        app.boot();
        app.chat_input.set("what is rust");
        app.submit_input();

        let rows = texts(&app.frame(100, 30));
        assert!(rows.iter().any(|r| r.contains("│ what is rust")));
        assert!(rows.last().unwrap().contains("thinking"));
    }

    #[test]
    fn test_setup_error_in_status_line() {
        let (mut app, script) = test_app();
        script.lock().unwrap().fail_setup = Some("worker missing".to_string());
        app.boot();
        let rows = texts(&app.frame(100, 30));
        assert!(rows.last().unwrap().contains("worker missing"));
    }

    #[test]
    fn test_notice_replaces_tip() {
        let (mut app, _) = test_app();
        app.boot();
        app.notice = Some("Editor error: nope".to_string());
        let rows = texts(&app.frame(100, 30));
        assert!(rows.last().unwrap().starts_with("Editor error: nope"));
    }

    #[test]
    fn test_tracing_toggle_rendered() {
        let (mut app, _) = test_app();
        app.boot();
        app.toggle_tracing();
        app.focus = Focus::Tracing;
        let rows = texts(&app.frame(100, 30));
        assert!(rows.iter().any(|r| r.contains("[x] Disable tracing")));
    }

    #[test]
    fn test_narrow_terminal_hides_sidebar() {
        let (mut app, _) = test_app();
        app.boot();
        let rows = texts(&app.frame(50, 20));
        assert!(!rows.iter().any(|r| r.contains("Controls")));
        assert!(rows.iter().any(|r| r.contains("Ask Visexa Pilot anything")));
    }

    #[test]
    fn test_scroll_offset_reveals_older_lines() {
        let (mut app, _) = test_app();
        app.boot();
        app.session().history = (0..30)
            .map(|i| Message::assistant(format!("line {i}")))
            .collect();

        let bottom = texts(&app.frame(100, 20));
        assert!(bottom.iter().any(|r| r.contains("line 29")));
        assert!(!bottom.iter().any(|r| r.contains("line 0")));

        app.scroll_offset = usize::MAX;
        let top = texts(&app.frame(100, 20));
        assert!(top.iter().any(|r| r.contains("line 0")));
    }
}
