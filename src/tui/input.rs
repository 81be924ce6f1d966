//! Editable text buffer shared by the chat input and the criteria editor.

use crate::tui::terminal::{StyledLine, StyledSpan, with_attr};
use crossterm::style::{Attribute, ContentStyle};
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    chars: Vec<char>,
    /// Cursor position in chars, `0..=chars.len()`.
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: &str) -> Self {
        let mut input = Self::new();
        input.set(content);
        input
    }

    pub fn content(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the content and move the cursor to the end.
    pub fn set(&mut self, content: &str) {
        self.chars = content.chars().collect();
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Return the content and leave the buffer empty.
    pub fn take(&mut self) -> String {
        let content = self.content();
        self.clear();
        content
    }

    pub fn insert_char(&mut self, c: char) {
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert_char(c);
        }
    }

    pub fn delete_char_before(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    pub fn delete_char_after(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    /// Delete back to the previous whitespace boundary.
    pub fn delete_word_before(&mut self) {
        let mut start = self.cursor;
        while start > 0 && self.chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.chars[start - 1].is_whitespace() {
            start -= 1;
        }
        self.chars.drain(start..self.cursor);
        self.cursor = start;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    /// Start of the current line.
    pub fn move_home(&mut self) {
        while self.cursor > 0 && self.chars[self.cursor - 1] != '\n' {
            self.cursor -= 1;
        }
    }

    /// End of the current line.
    pub fn move_end(&mut self) {
        while self.cursor < self.chars.len() && self.chars[self.cursor] != '\n' {
            self.cursor += 1;
        }
    }

    /// Wrap to `width` cells, drawing the cursor as a reversed cell when `show_cursor`.
    ///
    /// Returns the rows and the index of the row holding the cursor.
    pub fn render(&self, width: usize, show_cursor: bool) -> (Vec<StyledLine>, usize) {
        let width = width.max(1);
        let cursor_style = with_attr(ContentStyle::new(), Attribute::Reverse);
        let mut rows = vec![StyledLine::empty()];
        let mut row_width = 0;
        let mut cursor_row = 0;

        for (i, &c) in self.chars.iter().enumerate() {
            let at_cursor = show_cursor && i == self.cursor;
            if c == '\n' {
                if at_cursor {
                    push_cell(&mut rows, &mut row_width, width, " ", cursor_style, 1);
                    cursor_row = rows.len() - 1;
                }
                rows.push(StyledLine::empty());
                row_width = 0;
                continue;
            }
            let style = if at_cursor {
                cursor_style
            } else {
                ContentStyle::new()
            };
            let text = c.to_string();
            push_cell(&mut rows, &mut row_width, width, &text, style, c.width().unwrap_or(0));
            if at_cursor {
                cursor_row = rows.len() - 1;
            }
        }
        if show_cursor && self.cursor == self.chars.len() {
            push_cell(&mut rows, &mut row_width, width, " ", cursor_style, 1);
            cursor_row = rows.len() - 1;
        }

        (rows.into_iter().map(merge_plain_spans).collect(), cursor_row)
    }
}

fn push_cell(
    rows: &mut Vec<StyledLine>,
    row_width: &mut usize,
    width: usize,
    text: &str,
    style: ContentStyle,
    cell_width: usize,
) {
    if *row_width + cell_width > width && *row_width > 0 {
        rows.push(StyledLine::empty());
        *row_width = 0;
    }
    if let Some(row) = rows.last_mut() {
        row.push(StyledSpan::new(text, style));
    }
    *row_width += cell_width;
}

/// Collapse adjacent spans with identical style produced by per-char rendering.
fn merge_plain_spans(line: StyledLine) -> StyledLine {
    let mut out: Vec<StyledSpan> = Vec::new();
    for span in line.spans {
        match out.last_mut() {
            Some(last) if last.style == span.style => last.content.push_str(&span.content),
            _ => out.push(span),
        }
    }
    StyledLine::new(out)
}
