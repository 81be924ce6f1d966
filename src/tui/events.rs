//! Event handling for the TUI.

use crate::tui::input::TextInput;
use crate::tui::{App, Focus};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Lines moved per PageUp/PageDown.
const PAGE_SCROLL: usize = 10;

impl App {
    /// Main event dispatcher.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.notice = None;
                self.handle_key(key);
            }
            Event::Paste(text) => match self.focus {
                Focus::Chat => self.chat_input.insert_str(&text),
                Focus::Criteria => {
                    self.criteria_input.insert_str(&text);
                    self.sync_criteria();
                }
                Focus::Tracing | Focus::Reset => {}
            },
            // Resize needs no state change; the next frame is sized fresh.
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c' | 'd') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('r') if ctrl => {
                self.reset();
                return;
            }
            KeyCode::Char('t') if ctrl => {
                self.toggle_tracing();
                return;
            }
            KeyCode::Char('g') if ctrl => {
                self.editor_requested = true;
                return;
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return;
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(PAGE_SCROLL);
                return;
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(PAGE_SCROLL);
                return;
            }
            KeyCode::Esc => {
                self.focus = Focus::Chat;
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Chat => self.handle_chat_key(key),
            Focus::Criteria => {
                let changed = if key.code == KeyCode::Enter {
                    self.criteria_input.insert_char('\n');
                    true
                } else {
                    edit_text(&mut self.criteria_input, key)
                };
                if changed {
                    self.sync_criteria();
                }
            }
            Focus::Tracing => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.toggle_tracing();
                }
            }
            Focus::Reset => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.reset();
                }
            }
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Enter {
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT)
            {
                self.chat_input.insert_char('\n');
            } else {
                self.submit_input();
            }
            return;
        }
        edit_text(&mut self.chat_input, key);
    }
}

/// Apply a line-editing key. Returns whether the content changed.
fn edit_text(input: &mut TextInput, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('w') if ctrl => input.delete_word_before(),
        KeyCode::Char('u') if ctrl => input.clear(),
        KeyCode::Char('a') if ctrl => {
            input.move_home();
            return false;
        }
        KeyCode::Char('e') if ctrl => {
            input.move_end();
            return false;
        }
        KeyCode::Char(_) if ctrl => return false,
        KeyCode::Char(c) => input.insert_char(c),
        KeyCode::Backspace => input.delete_char_before(),
        KeyCode::Delete => input.delete_char_after(),
        KeyCode::Left => {
            input.move_left();
            return false;
        }
        KeyCode::Right => {
            input.move_right();
            return false;
        }
        KeyCode::Home => {
            input.move_home();
            return false;
        }
        KeyCode::End => {
            input.move_end();
            return false;
        }
        _ => return false,
    }
    true
}
