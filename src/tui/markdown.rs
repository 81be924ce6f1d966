//! Markdown rendering using pulldown-cmark.

use crate::tui::terminal::{LineBuilder, StyledLine, StyledSpan, fg, with_attr};
use crossterm::style::{Attribute, Color, ContentStyle};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Render markdown into unwrapped styled lines.
/// Supports: bold, italic, code spans, code blocks, headings, lists, quotes, rules.
pub fn render_markdown(content: &str) -> Vec<StyledLine> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut r = Renderer::default();

    for event in Parser::new_ext(content, options) {
        match event {
            Event::Start(tag) => r.start(tag),
            Event::End(tag) => r.end(tag),
            Event::Text(text) => r.text(&text),
            Event::Code(code) => {
                r.ensure_prefix();
                r.line = std::mem::take(&mut r.line)
                    .styled(StyledSpan::new(code.to_string(), fg(Color::Yellow)));
                r.prefix_only = false;
            }
            Event::Html(html) | Event::InlineHtml(html) => r.text(&html),
            Event::SoftBreak | Event::HardBreak => r.break_line(),
            Event::Rule => {
                r.flush();
                r.out.push(LineBuilder::new().dim("─".repeat(40)).build());
                r.out.push(StyledLine::empty());
            }
            _ => {}
        }
    }

    r.flush();
    while r.out.last().is_some_and(StyledLine::is_empty) {
        r.out.pop();
    }
    r.out
}

#[derive(Default)]
struct Renderer {
    out: Vec<StyledLine>,
    line: LineBuilder,
    bold: bool,
    italic: bool,
    strike: bool,
    quote_depth: usize,
    code_block: Option<String>,
    /// Counter per open list; `None` for bullets.
    lists: Vec<Option<u64>>,
    item_prefix: Option<String>,
    /// Current line holds only a list or quote prefix.
    prefix_only: bool,
}

impl Renderer {
    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Strong => self.bold = true,
            Tag::Emphasis => self.italic = true,
            Tag::Strikethrough => self.strike = true,
            Tag::Heading { level, .. } => {
                self.flush();
                let marks = match level {
                    HeadingLevel::H1 => "# ",
                    HeadingLevel::H2 => "## ",
                    _ => "### ",
                };
                self.line = LineBuilder::new().bold(marks);
                self.bold = true;
            }
            Tag::Paragraph => {
                if !self.prefix_only {
                    self.flush();
                }
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                if !lang.is_empty() {
                    self.out.push(LineBuilder::new().dim(format!("  {lang}")).build());
                }
                self.code_block = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                let prefix = format!("{indent}{marker}");
                self.line = LineBuilder::new().raw(prefix.clone());
                self.item_prefix = Some(prefix);
                self.prefix_only = true;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Strong => self.bold = false,
            TagEnd::Emphasis => self.italic = false,
            TagEnd::Strikethrough => self.strike = false,
            TagEnd::Heading(_) => {
                self.bold = false;
                self.flush();
                self.out.push(StyledLine::empty());
            }
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.out.push(StyledLine::empty());
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code_block.take() {
                    for line in code.lines() {
                        self.out.push(
                            LineBuilder::new()
                                .raw("  ")
                                .styled(StyledSpan::colored(line.to_string(), Color::Green))
                                .build(),
                        );
                    }
                }
                self.out.push(StyledLine::empty());
            }
            TagEnd::Item => {
                self.flush();
                self.item_prefix = None;
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.out.push(StyledLine::empty());
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = self.code_block.as_mut() {
            code.push_str(text);
            return;
        }
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.break_line();
            }
            if part.is_empty() {
                continue;
            }
            self.ensure_prefix();
            let span = StyledSpan::new(part.to_string(), self.inline_style());
            self.line = std::mem::take(&mut self.line).styled(span);
            self.prefix_only = false;
        }
    }

    fn inline_style(&self) -> ContentStyle {
        let mut style = ContentStyle::new();
        if self.bold {
            style = with_attr(style, Attribute::Bold);
        }
        if self.italic || self.quote_depth > 0 {
            style = with_attr(style, Attribute::Italic);
        }
        if self.strike {
            style = with_attr(style, Attribute::CrossedOut);
        }
        style
    }

    /// Start a quote line with its marker when the line is still empty.
    fn ensure_prefix(&mut self) {
        if self.quote_depth > 0 && self.line_is_blank() {
            self.line = LineBuilder::new().dim("> ".repeat(self.quote_depth));
            self.prefix_only = true;
        }
    }

    fn line_is_blank(&self) -> bool {
        self.line.peek().is_empty()
    }

    fn break_line(&mut self) {
        self.flush();
        if let Some(prefix) = &self.item_prefix {
            // Continuation lines of an item align under its text.
            self.line = LineBuilder::new().raw(" ".repeat(prefix.chars().count()));
            self.prefix_only = true;
        }
    }

    fn flush(&mut self) {
        let line = std::mem::take(&mut self.line).build();
        if !line.is_empty() && !self.prefix_only {
            self.out.push(line);
        }
        self.prefix_only = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[StyledLine]) -> Vec<String> {
        lines.iter().map(StyledLine::text).collect()
    }

    #[test]
    fn test_plain_paragraphs() {
        let lines = render_markdown("first\n\nsecond");
        assert_eq!(texts(&lines), vec!["first", "", "second"]);
    }

    #[test]
    fn test_bold_and_code_styles() {
        let lines = render_markdown("a **b** `c`");
        let spans = &lines[0].spans;
        let bold = spans.iter().find(|s| s.content == "b").unwrap();
        assert!(bold.style.attributes.has(Attribute::Bold));
        let code = spans.iter().find(|s| s.content == "c").unwrap();
        assert_eq!(code.style.foreground_color, Some(Color::Yellow));
    }

    #[test]
    fn test_lists() {
        let lines = render_markdown("- one\n- two\n\n1. first\n2. second");
        let texts = texts(&lines);
        assert!(texts.contains(&"- one".to_string()));
        assert!(texts.contains(&"- two".to_string()));
        assert!(texts.contains(&"1. first".to_string()));
        assert!(texts.contains(&"2. second".to_string()));
    }

    #[test]
    fn test_heading_and_code_block() {
        let lines = render_markdown("## Plan\n\n```rust\nfn main() {}\n```");
        let texts = texts(&lines);
        assert_eq!(texts[0], "## Plan");
        assert!(texts.contains(&"  rust".to_string()));
        assert!(texts.contains(&"  fn main() {}".to_string()));
    }

    #[test]
    fn test_blockquote_prefix() {
        let lines = render_markdown("> quoted");
        assert_eq!(texts(&lines), vec!["> quoted"]);
    }

    #[test]
    fn test_soft_break_splits_lines() {
        let lines = render_markdown("line one\nline two");
        assert_eq!(texts(&lines), vec!["line one", "line two"]);
    }
}
