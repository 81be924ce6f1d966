//! Styled text primitives written straight to the terminal with crossterm.

use crossterm::style::{Attribute, Color, ContentStyle, StyledContent};
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

/// A run of text sharing one style.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledSpan {
    pub content: String,
    pub style: ContentStyle,
}

impl StyledSpan {
    pub fn new(content: impl Into<String>, style: ContentStyle) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }

    pub fn raw(content: impl Into<String>) -> Self {
        Self::new(content, ContentStyle::new())
    }

    pub fn colored(content: impl Into<String>, color: Color) -> Self {
        Self::new(content, fg(color))
    }

    pub fn dim(content: impl Into<String>) -> Self {
        Self::new(content, with_attr(ContentStyle::new(), Attribute::Dim))
    }

    pub fn bold(content: impl Into<String>) -> Self {
        Self::new(content, with_attr(ContentStyle::new(), Attribute::Bold))
    }

    /// Display width in terminal cells.
    pub fn width(&self) -> usize {
        self.content.chars().map(char_width).sum()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{}", StyledContent::new(self.style, &self.content))
    }
}

/// One terminal row of styled spans.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn new(spans: Vec<StyledSpan>) -> Self {
        Self { spans }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            spans: vec![StyledSpan::raw(content)],
        }
    }

    pub fn push(&mut self, span: StyledSpan) {
        self.spans.push(span);
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.content.is_empty())
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(StyledSpan::width).sum()
    }

    /// Concatenated text without styling.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.content.as_str()).collect()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for span in &self.spans {
            span.write_to(w)?;
        }
        Ok(())
    }

    /// Split into rows of at most `width` cells, preserving styles.
    pub fn wrap(&self, width: usize) -> Vec<StyledLine> {
        let width = width.max(1);
        let mut rows = Vec::new();
        let mut row = StyledLine::empty();
        let mut row_width = 0;

        for span in &self.spans {
            let mut chunk = String::new();
            for ch in span.content.chars() {
                let w = char_width(ch);
                if row_width + w > width && row_width > 0 {
                    if !chunk.is_empty() {
                        row.push(StyledSpan::new(std::mem::take(&mut chunk), span.style));
                    }
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                }
                chunk.push(ch);
                row_width += w;
            }
            if !chunk.is_empty() {
                row.push(StyledSpan::new(chunk, span.style));
            }
        }
        rows.push(row);
        rows
    }

    /// Cut to at most `width` cells.
    pub fn truncate(&self, width: usize) -> StyledLine {
        let mut out = StyledLine::empty();
        let mut used = 0;
        for span in &self.spans {
            let mut chunk = String::new();
            for ch in span.content.chars() {
                let w = char_width(ch);
                if used + w > width {
                    if !chunk.is_empty() {
                        out.push(StyledSpan::new(chunk, span.style));
                    }
                    return out;
                }
                chunk.push(ch);
                used += w;
            }
            if !chunk.is_empty() {
                out.push(StyledSpan::new(chunk, span.style));
            }
        }
        out
    }

    /// Truncate or pad with spaces to exactly `width` cells.
    pub fn fit(&self, width: usize) -> StyledLine {
        let mut out = self.truncate(width);
        let pad = width.saturating_sub(out.width());
        if pad > 0 {
            out.push(StyledSpan::raw(" ".repeat(pad)));
        }
        out
    }

    /// Apply `base` underneath every span's own style.
    pub fn with_base_style(mut self, base: ContentStyle) -> Self {
        for span in &mut self.spans {
            span.style = merge_style(base, span.style);
        }
        self
    }
}

/// Builder for creating styled lines.
#[derive(Default)]
pub struct LineBuilder {
    line: StyledLine,
}

impl LineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, content: impl Into<String>) -> Self {
        self.line.push(StyledSpan::raw(content));
        self
    }

    pub fn colored(mut self, content: impl Into<String>, color: Color) -> Self {
        self.line.push(StyledSpan::colored(content, color));
        self
    }

    pub fn dim(mut self, content: impl Into<String>) -> Self {
        self.line.push(StyledSpan::dim(content));
        self
    }

    pub fn bold(mut self, content: impl Into<String>) -> Self {
        self.line.push(StyledSpan::bold(content));
        self
    }

    pub fn styled(mut self, span: StyledSpan) -> Self {
        self.line.push(span);
        self
    }

    /// The line built so far.
    pub fn peek(&self) -> &StyledLine {
        &self.line
    }

    pub fn build(self) -> StyledLine {
        self.line
    }
}

pub fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

pub fn with_attr(mut style: ContentStyle, attr: Attribute) -> ContentStyle {
    style.attributes.set(attr);
    style
}

/// `top` wins where it sets a color; attributes are combined.
pub fn merge_style(base: ContentStyle, top: ContentStyle) -> ContentStyle {
    let mut out = base;
    if top.foreground_color.is_some() {
        out.foreground_color = top.foreground_color;
    }
    if top.background_color.is_some() {
        out.background_color = top.background_color;
    }
    out.attributes.extend(top.attributes);
    out
}

fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}
