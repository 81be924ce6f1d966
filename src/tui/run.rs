//! TUI main loop and terminal management.
//!
//! The loop is synchronous: agent calls block on the app's `AsyncBridge`,
//! so the screen is redrawn right before each blocking call to show the
//! booting/thinking state.

use crate::agent::ProcessAgentFactory;
use crate::cli::Settings;
use crate::tui::App;
use anyhow::Result;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event},
    execute, queue,
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    },
};
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

type PanicHook = Arc<dyn Fn(&std::panic::PanicHookInfo) + Send + Sync + 'static>;

/// Guard that restores the original panic hook on drop.
struct PanicHookGuard {
    original_hook: PanicHook,
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        let original_hook = Arc::clone(&self.original_hook);
        std::panic::set_hook(Box::new(move |info| {
            (original_hook)(info);
        }));
    }
}

fn install_panic_hook() -> PanicHookGuard {
    let original_hook: PanicHook = Arc::from(std::panic::take_hook());
    let hook_for_panic = Arc::clone(&original_hook);
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal(&mut io::stdout());
        (hook_for_panic)(info);
    }));
    PanicHookGuard { original_hook }
}

fn setup_terminal() -> io::Result<Stdout> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste, Hide)?;
    Ok(stdout)
}

fn restore_terminal(stdout: &mut Stdout) -> io::Result<()> {
    execute!(stdout, DisableBracketedPaste, Show, LeaveAlternateScreen)?;
    disable_raw_mode()
}

/// Draw one full frame inside a synchronized update.
fn draw(stdout: &mut Stdout, app: &App) -> io::Result<()> {
    let (width, height) = terminal::size()?;
    let rows = app.frame(width, height);
    queue!(stdout, BeginSynchronizedUpdate)?;
    for (i, row) in rows.iter().enumerate() {
        let y = u16::try_from(i).unwrap_or(u16::MAX);
        queue!(stdout, MoveTo(0, y))?;
        row.write_to(stdout)?;
    }
    queue!(stdout, EndSynchronizedUpdate)?;
    stdout.flush()
}

/// Open text in external editor, returns edited content or None if unchanged/cancelled
fn open_editor(initial: &str) -> Result<Option<String>> {
    use std::process::Command;

    // VISUAL for full-screen, EDITOR as fallback
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .map_err(|_| anyhow::anyhow!("No editor configured. Set VISUAL or EDITOR."))?;

    let mut temp = tempfile::NamedTempFile::with_suffix(".md")?;
    temp.write_all(initial.as_bytes())?;
    temp.flush()?;

    // Split command and args ("code --wait", "nvim -u NONE", ...)
    let parts: Vec<&str> = editor.split_whitespace().collect();
    let (cmd, args) = parts
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Empty editor command"))?;
    let status = Command::new(cmd)
        .args(args.iter())
        .arg(temp.path())
        .status()?;

    if !status.success() {
        return Ok(None);
    }

    let edited = std::fs::read_to_string(temp.path())?;
    let edited = edited.trim_end_matches('\n');
    if edited == initial {
        Ok(None)
    } else {
        Ok(Some(edited.to_string()))
    }
}

/// Suspend the screen, edit the success criteria externally, then resume.
fn edit_criteria(stdout: &mut Stdout, app: &mut App) -> Result<()> {
    restore_terminal(stdout)?;
    let current = app.session().success_criteria.clone();
    let result = open_editor(&current);
    setup_terminal()?;
    execute!(stdout, Clear(ClearType::All))?;

    match result {
        Ok(Some(text)) => app.set_criteria(&text),
        Ok(None) => {}
        Err(e) => {
            warn!("Editor failed: {e}");
            app.notice = Some(format!("Editor error: {e}"));
        }
    }
    Ok(())
}

/// Main entry point for the TUI. Runs until the user quits.
pub fn run(settings: Settings) -> Result<()> {
    let factory = ProcessAgentFactory::new(settings.agent.clone(), true);
    let mut app = App::new(&settings, Box::new(factory))?;
    info!(headless = settings.headless, "Starting TUI");

    let _panic_guard = install_panic_hook();
    let mut stdout = setup_terminal()?;

    let result = event_loop(&mut stdout, &mut app);

    app.shutdown();
    restore_terminal(&mut stdout)?;
    result
}

fn event_loop(stdout: &mut Stdout, app: &mut App) -> Result<()> {
    let mut dirty = true;
    loop {
        if app.status() == crate::tui::Status::Booting {
            draw(stdout, app)?;
            app.boot();
            dirty = true;
        }
        if app.pending_prompt().is_some() {
            draw(stdout, app)?;
            app.run_pending_turn();
            dirty = true;
        }

        if dirty {
            draw(stdout, app)?;
            dirty = false;
        }
        if app.should_quit {
            return Ok(());
        }

        if event::poll(POLL_INTERVAL)? {
            let evt = event::read()?;
            if matches!(evt, Event::Resize(_, _)) {
                execute!(stdout, Clear(ClearType::All))?;
            }
            app.handle_event(evt);
            dirty = true;
        }

        if app.editor_requested {
            app.editor_requested = false;
            edit_criteria(stdout, app)?;
            dirty = true;
        }
    }
}
