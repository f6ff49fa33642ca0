use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("unbalanced markup: closing {0} that was never opened")]
    Unbalanced(&'static str),
}

const TEXT: Style = Style::new();
const CODE: Style = Style::new().fg(Color::Yellow).bg(Color::Rgb(40, 40, 40));
const LINK: Style = Style::new()
    .fg(Color::Blue)
    .add_modifier(Modifier::UNDERLINED);
const RULE_WIDTH: usize = 40;

fn heading_style(level: usize) -> Style {
    let color = match level {
        1 => Color::Rgb(0xFF, 0x7C, 0xCB),
        2 => Color::Magenta,
        _ => Color::Cyan,
    };
    Style::new().fg(color).add_modifier(Modifier::BOLD)
}

struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl Renderer {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            styles: vec![TEXT],
            lists: Vec::new(),
            in_code_block: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(TEXT)
    }

    fn push_style(&mut self, style: Style) {
        self.styles.push(style);
    }

    fn patch_style(&mut self, modifier: Modifier) {
        let style = self.style().add_modifier(modifier);
        self.styles.push(style);
    }

    fn pop_style(&mut self, what: &'static str) -> Result<(), RenderError> {
        // The base style is never popped.
        if self.styles.len() <= 1 {
            return Err(RenderError::Unbalanced(what));
        }
        self.styles.pop();
        Ok(())
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn text(&mut self, text: &str) {
        let style = self.style();
        if self.in_code_block {
            for line in text.lines() {
                self.spans.push(Span::styled(format!("  {line}"), style));
                self.flush();
            }
        } else {
            self.spans.push(Span::styled(text.to_string(), style));
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.blank();
                self.push_style(heading_style(level as usize));
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
                    _ => "• ".to_string(),
                };
                self.spans.push(Span::raw(indent));
                self.spans
                    .push(Span::styled(marker, Style::new().fg(Color::Green)));
            }
            Tag::CodeBlock(_) => {
                self.blank();
                self.in_code_block = true;
                self.push_style(CODE);
            }
            Tag::Emphasis => self.patch_style(Modifier::ITALIC),
            Tag::Strong => self.patch_style(Modifier::BOLD),
            Tag::Strikethrough => self.patch_style(Modifier::CROSSED_OUT),
            Tag::Link { .. } => self.push_style(LINK),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) -> Result<(), RenderError> {
        match tag {
            TagEnd::Paragraph => self.blank(),
            TagEnd::Heading(_) => {
                self.pop_style("heading")?;
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop().ok_or(RenderError::Unbalanced("list"))?;
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::CodeBlock => {
                self.flush();
                self.in_code_block = false;
                self.pop_style("code block")?;
                self.blank();
            }
            TagEnd::Emphasis => self.pop_style("emphasis")?,
            TagEnd::Strong => self.pop_style("strong")?,
            TagEnd::Strikethrough => self.pop_style("strikethrough")?,
            TagEnd::Link => self.pop_style("link")?,
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Converts markdown into styled terminal lines.
pub fn render_markdown(markdown: &str) -> Result<Vec<Line<'static>>, RenderError> {
    let mut renderer = Renderer::new();
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH);

    for event in parser {
        match event {
            Event::Start(tag) => renderer.start(tag),
            Event::End(tag) => renderer.end(tag)?,
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                renderer.text(&text)
            }
            Event::Code(code) => renderer.spans.push(Span::styled(code.into_string(), CODE)),
            Event::SoftBreak | Event::HardBreak => renderer.flush(),
            Event::Rule => {
                renderer.blank();
                renderer.lines.push(Line::styled(
                    "─".repeat(RULE_WIDTH),
                    Style::new().fg(Color::DarkGray),
                ));
            }
            _ => {}
        }
    }

    Ok(renderer.finish())
}

/// The document as unstyled lines.
pub fn plain_text(document: &str) -> Vec<Line<'static>> {
    document.lines().map(|l| Line::raw(l.to_string())).collect()
}

/// Styled rendering, or plain text when the markdown cannot be rendered.
pub fn render_document(document: &str) -> Vec<Line<'static>> {
    render_markdown(document).unwrap_or_else(|e| {
        warn!("Falling back to plain text: {}", e);
        plain_text(document)
    })
}
