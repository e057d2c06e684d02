//! Body format conversion and truncation

use pulldown_cmark::{Event, Parser, TagEnd, html};
use regex::Regex;
use std::sync::LazyLock;

use crate::request::BodyFormat;

static HTML_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|h[1-6]|li|tr)>").expect("static break pattern")
});

static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static tag pattern"));

static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static blank line pattern"));

/// Convert `body` from one format to another
pub fn convert(body: &str, from: BodyFormat, to: BodyFormat) -> String {
    match (from, to) {
        (BodyFormat::Text, BodyFormat::Html) => escape_html(body, true),
        (BodyFormat::Markdown, BodyFormat::Html) => markdown_to_html(body),
        (BodyFormat::Html, BodyFormat::Text | BodyFormat::Markdown) => html_to_text(body),
        (BodyFormat::Markdown, BodyFormat::Text) => markdown_to_text(body),
        _ => body.to_string(),
    }
}

/// Escape text for embedding in HTML, keeping tabs and runs of spaces visible
pub fn escape_html(text: &str, convert_new_lines: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' => escaped.push_str("&emsp;"),
            _ => escaped.push(c),
        }
    }

    let escaped = escaped.replace("  ", " &nbsp;");

    if convert_new_lines {
        escaped.replace("\r\n", "\n").replace('\n', "<br />")
    } else {
        escaped
    }
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new(markdown));
    out.trim_end().to_string()
}

pub fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock) => {
                out.push_str("\n\n")
            }
            Event::End(TagEnd::Item) => out.push('\n'),
            Event::Html(raw) | Event::InlineHtml(raw) => out.push_str(&html_to_text(&raw)),
            _ => {}
        }
    }

    BLANK_LINES_RE.replace_all(out.trim_end(), "\n\n").into_owned()
}

pub fn html_to_text(html: &str) -> String {
    let with_breaks = HTML_BREAK_RE.replace_all(html, "\n");
    let stripped = HTML_TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);
    BLANK_LINES_RE
        .replace_all(decoded.trim(), "\n\n")
        .into_owned()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&emsp;", "\t")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Truncate to at most `max` characters
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Keep the first `max` lines, dropping a leading heading marker on the first
pub fn limit_lines(text: &str, max: usize) -> String {
    text.lines()
        .take(max.max(1))
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.trim_start_matches('#').trim_start()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert and truncate a body for a backend's declared format.
///
/// HTML output is rendered from an already-truncated source so markup is never
/// cut in the middle of a tag.
pub fn prepare_body(
    body: &str,
    from: BodyFormat,
    to: BodyFormat,
    max_len: usize,
    max_lines: Option<usize>,
) -> String {
    let source = match max_lines {
        Some(lines) => limit_lines(body, lines),
        None => body.to_string(),
    };

    match to {
        BodyFormat::Html if from != BodyFormat::Html => convert(&truncate(&source, max_len), from, to),
        _ => truncate(&convert(&source, from, to), max_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("a < b & \"c\"\n\tx  y", true),
            "a &lt; b &amp; &quot;c&quot;<br />&emsp;x &nbsp;y"
        );
        assert_eq!(escape_html("line\nbreak", false), "line\nbreak");
    }

    #[test]
    fn test_markdown_to_html() {
        assert_eq!(markdown_to_html("**done**"), "<p><strong>done</strong></p>");
        assert!(markdown_to_html("# Title\n\nbody").starts_with("<h1>Title</h1>"));
    }

    #[test]
    fn test_markdown_to_text() {
        assert_eq!(
            markdown_to_text("# Job\n\nFinished **ok** with `0` errors"),
            "Job\n\nFinished ok with 0 errors"
        );
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("<p>Hello&nbsp;<b>World</b></p><p>a &amp; b<br/>c</p>"),
            "Hello World\na & b\nc"
        );
    }

    #[test]
    fn test_convert_identity() {
        assert_eq!(convert("*x*", BodyFormat::Markdown, BodyFormat::Markdown), "*x*");
        assert_eq!(convert("plain", BodyFormat::Text, BodyFormat::Markdown), "plain");
    }

    #[test]
    fn test_truncate_is_char_aware() {
        assert_eq!(truncate("héllo wörld", 7), "héllo w");
        assert_eq!(truncate("short", 100), "short");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn test_limit_lines() {
        assert_eq!(limit_lines("## Done\nline two\nline three", 2), "Done\nline two");
        assert_eq!(limit_lines("single", 0), "single");
    }

    #[test]
    fn test_prepare_body_html_not_cut_mid_tag() {
        let body = prepare_body("**bold** text here", BodyFormat::Markdown, BodyFormat::Html, 8, None);
        assert_eq!(body, "<p><strong>bold</strong></p>");

        let text = prepare_body("<b>abcdef</b>", BodyFormat::Html, BodyFormat::Text, 3, None);
        assert_eq!(text, "abc");
    }
}
