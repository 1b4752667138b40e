//! Presentation of brochure markdown: HTML for the browser and colored text
//! for the terminal.

use std::io::{self, Write};

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Fence openers removed from partial streamed text, longest first.
const FENCE_ARTIFACTS: [&str; 3] = ["```markdown", "```md", "```"];

/// Converts markdown to an HTML fragment.
///
/// Raw HTML in the markdown is escaped and shown as text, never emitted as markup.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::all()).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        other => other,
    });
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Removes code fences and the markdown language tag the model wraps its
/// answer in, so partial streamed text displays as plain markdown.
pub fn strip_fence_artifacts(partial: &str) -> String {
    FENCE_ARTIFACTS
        .iter()
        .fold(partial.to_string(), |text, artifact| text.replace(*artifact, ""))
}

/// Escapes text for embedding into HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Prints markdown to stdout with terminal styling.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn print_markdown(markdown: &str) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_markdown(&mut stdout, markdown)?;
    stdout.reset()?;
    stdout.flush()
}

/// Writes markdown to any color-capable writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_markdown<W: WriteColor>(out: &mut W, markdown: &str) -> io::Result<()> {
    let mut state = FormatState::default();
    for event in Parser::new_ext(markdown, Options::all()) {
        state.handle_event(out, event)?;
    }
    Ok(())
}

#[derive(Default)]
struct FormatState {
    list_stack: Vec<Option<u64>>,
    format_stack: Vec<ColorSpec>,
}

impl FormatState {
    fn handle_event<W: WriteColor>(&mut self, out: &mut W, event: Event<'_>) -> io::Result<()> {
        match event {
            Event::Start(tag) => self.handle_start(out, tag),
            Event::End(tag_end) => self.handle_end(out, tag_end),
            Event::Text(text) => write!(out, "{text}"),
            Event::Code(code) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                write!(out, "`{code}`")?;
                self.restore(out)
            }
            Event::SoftBreak | Event::HardBreak => writeln!(out),
            Event::Rule => writeln!(out, "\n{}", "─".repeat(40)),
            _ => Ok(()),
        }
    }

    fn push(&mut self, out: &mut impl WriteColor, spec: ColorSpec) -> io::Result<()> {
        out.set_color(&spec)?;
        self.format_stack.push(spec);
        Ok(())
    }

    fn pop(&mut self, out: &mut impl WriteColor) -> io::Result<()> {
        self.format_stack.pop();
        self.restore(out)
    }

    fn restore(&self, out: &mut impl WriteColor) -> io::Result<()> {
        match self.format_stack.last() {
            Some(spec) => out.set_color(spec),
            None => out.reset(),
        }
    }

    fn handle_start<W: WriteColor>(&mut self, out: &mut W, tag: Tag<'_>) -> io::Result<()> {
        match tag {
            Tag::Heading { level, .. } => {
                let color = match level {
                    HeadingLevel::H1 => Color::Magenta,
                    HeadingLevel::H2 => Color::Blue,
                    _ => Color::Cyan,
                };
                writeln!(out)?;
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(color)).set_bold(true);
                self.push(out, spec)
            }
            Tag::Paragraph => Ok(()),
            Tag::Strong => {
                let mut spec = ColorSpec::new();
                spec.set_bold(true);
                self.push(out, spec)
            }
            Tag::Emphasis => {
                let mut spec = ColorSpec::new();
                spec.set_italic(true);
                self.push(out, spec)
            }
            Tag::BlockQuote(_) => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Yellow));
                self.push(out, spec)?;
                write!(out, "  │ ")
            }
            Tag::CodeBlock(kind) => {
                writeln!(out)?;
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    writeln!(out, "[{lang}]")?;
                }
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Green));
                self.push(out, spec)
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    writeln!(out)?;
                }
                self.list_stack.push(start);
                Ok(())
            }
            Tag::Item => {
                let depth = self.list_stack.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                match self.list_stack.last_mut() {
                    Some(Some(number)) => {
                        write!(out, "{indent}{number}. ")?;
                        *number += 1;
                        Ok(())
                    }
                    _ => write!(out, "{indent}• "),
                }
            }
            Tag::Link { .. } => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Blue)).set_underline(true);
                self.push(out, spec)
            }
            _ => Ok(()),
        }
    }

    fn handle_end<W: WriteColor>(&mut self, out: &mut W, tag_end: TagEnd) -> io::Result<()> {
        match tag_end {
            TagEnd::Heading(_) => {
                self.pop(out)?;
                writeln!(out)
            }
            TagEnd::Paragraph => {
                writeln!(out)?;
                if self.list_stack.is_empty() {
                    writeln!(out)?;
                }
                Ok(())
            }
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Link => self.pop(out),
            TagEnd::BlockQuote(_) | TagEnd::CodeBlock => {
                self.pop(out)?;
                writeln!(out)
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    writeln!(out)?;
                }
                Ok(())
            }
            TagEnd::Item => {
                // Tight list items carry no paragraph end of their own.
                writeln!(out)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn plain(markdown: &str) -> String {
        let mut buffer = Buffer::no_color();
        write_markdown(&mut buffer, markdown).expect("in-memory write");
        String::from_utf8(buffer.into_inner()).expect("utf-8 output")
    }

    #[test]
    fn html_output_renders_headings_and_lists() {
        let html = markdown_to_html("# Acme\n\n- rockets\n- jets\n");
        assert!(html.contains("<h1>Acme</h1>"));
        assert!(html.contains("<li>rockets</li>"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let html = markdown_to_html(
            "<script>alert(1)</script>\n\nHello <img src=x onerror=alert(2)> world",
        );
        assert!(!html.contains("<script"), "{html}");
        assert!(!html.contains("<img"), "{html}");
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn strips_fences_from_partial_text() {
        assert_eq!(strip_fence_artifacts("```markdown\n# Acme\nWe bu"), "\n# Acme\nWe bu");
        assert_eq!(strip_fence_artifacts("```md\n# Acme\n```"), "\n# Acme\n");
        assert_eq!(strip_fence_artifacts("# Acme\n```\n"), "# Acme\n\n");
        assert_eq!(
            strip_fence_artifacts("# Acme\nWe write markdown tooling."),
            "# Acme\nWe write markdown tooling."
        );
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn terminal_output_keeps_text_and_bullets() {
        let text = plain("# Acme\n\nWe build **rockets**.\n\n1. Fast\n2. Safe\n\n- Remote\n");
        assert!(text.contains("Acme"));
        assert!(text.contains("We build rockets."));
        assert!(text.contains("1. Fast"));
        assert!(text.contains("2. Safe"));
        assert!(text.contains("• Remote"));
    }
}
