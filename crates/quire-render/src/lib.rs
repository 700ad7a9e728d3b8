//! # quire-render
//!
//! Markdown to safe HTML for note display and preview.
//!
//! Rendering runs in a fixed order:
//! 1. Markdown conversion with the configured extensions.
//! 2. Autolinking of bare URLs and email addresses (outside existing links
//!    and code).
//! 3. Sanitization against the HTML allow-list.
//!
//! Sanitization always runs last, so nothing produced by the earlier stages
//! can bypass the allow-list.

pub mod config;
mod autolink;
mod toc;

use std::collections::{HashMap, HashSet};

use ammonia::Builder;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};
use tracing::trace;

pub use config::{MarkdownExtension, RenderConfig};

/// Renders untrusted Markdown into sanitized HTML.
///
/// Construction is infallible: the allow-list is stripped of script-capable
/// entries up front, and `render` never fails on malformed input.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    config: RenderConfig,
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl MarkdownRenderer {
    pub fn new(config: RenderConfig) -> Self {
        let config = config.enforce_safety();
        let options = parser_options(&config.extensions);
        Self { config, options }
    }

    /// The effective (safety-enforced) configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render Markdown to sanitized HTML. Empty input yields an empty string.
    pub fn render(&self, markdown: &str) -> String {
        if markdown.trim().is_empty() {
            return String::new();
        }

        let events: Vec<Event<'_>> = Parser::new_ext(markdown, self.options).collect();
        let mut events = merge_text(events);

        if !self.config.has_extension(MarkdownExtension::CodeHilite) {
            events = strip_code_languages(events);
        }
        if self.config.has_extension(MarkdownExtension::Toc) {
            events = toc::apply(events);
        }
        let events = autolink::autolink(events);

        let mut converted = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut converted, events.into_iter());

        let cleaned = self.sanitize(&converted);
        trace!(
            subsystem = "render",
            input_len = markdown.len(),
            output_len = cleaned.len(),
            "Rendered markdown"
        );
        cleaned
    }

    /// Render an optional body; absent content renders as an empty string.
    pub fn render_optional(&self, markdown: Option<&str>) -> String {
        markdown.map(|m| self.render(m)).unwrap_or_default()
    }

    fn sanitize(&self, html: &str) -> String {
        let tags: HashSet<&str> = self.config.allowed_tags.iter().map(String::as_str).collect();
        let tag_attributes: HashMap<&str, HashSet<&str>> = self
            .config
            .allowed_attributes
            .iter()
            .map(|(tag, attrs)| (tag.as_str(), attrs.iter().map(String::as_str).collect()))
            .collect();

        // rel is part of the anchor allow-list, so ammonia must not manage it.
        Builder::default()
            .tags(tags)
            .tag_attributes(tag_attributes)
            .generic_attributes(HashSet::new())
            .link_rel(None)
            .clean(html)
            .to_string()
    }
}

fn parser_options(extensions: &[MarkdownExtension]) -> Options {
    let mut options = Options::empty();
    for ext in extensions {
        match ext {
            MarkdownExtension::Extra => {
                options.insert(Options::ENABLE_TABLES);
                options.insert(Options::ENABLE_FOOTNOTES);
                options.insert(Options::ENABLE_STRIKETHROUGH);
                options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
            }
            MarkdownExtension::Tables => options.insert(Options::ENABLE_TABLES),
            // Handled on the event stream, or always on in CommonMark.
            MarkdownExtension::Toc
            | MarkdownExtension::CodeHilite
            | MarkdownExtension::FencedCode => {}
        }
    }
    options
}

/// Join adjacent text events so URLs and markers split by the parser are
/// seen whole.
fn merge_text(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut merged: Vec<Event<'_>> = Vec::with_capacity(events.len());
    for event in events {
        if let Event::Text(next) = &event {
            if let Some(Event::Text(prev)) = merged.last_mut() {
                let mut joined = prev.to_string();
                joined.push_str(next);
                *prev = CowStr::from(joined);
                continue;
            }
        }
        merged.push(event);
    }
    merged
}

fn strip_code_languages(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => Event::Start(
                Tag::CodeBlock(CodeBlockKind::Fenced(CowStr::Borrowed(""))),
            ),
            other => other,
        })
        .collect()
}

/// Escape text for use in HTML content or a double-quoted attribute.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> String {
        MarkdownRenderer::default().render(markdown)
    }

    #[test]
    fn test_empty_input_renders_empty() {
        assert_eq!(render(""), "");
        assert_eq!(render("  \n\t"), "");
        assert_eq!(MarkdownRenderer::default().render_optional(None), "");
    }

    #[test]
    fn test_heading_and_paragraph() {
        let html = render("# Test Content\n\nThis is a test.");
        assert!(html.contains("<h1>Test Content</h1>"), "{}", html);
        assert!(html.contains("<p>This is a test.</p>"), "{}", html);
    }

    #[test]
    fn test_script_removed() {
        let html = render("<script>alert('x')</script>\n\nHello");
        assert!(!html.contains("<script"));
        assert!(!html.contains("alert("));
        assert!(html.contains("Hello"));
    }

    #[test]
    fn test_inline_script_removed() {
        let html = render("Hi <script>alert(1)</script> there");
        assert!(!html.contains("<script"));
        assert!(html.contains("Hi"));
    }

    #[test]
    fn test_event_handler_attribute_removed() {
        let html = render(r#"<img src="cat.png" onerror="alert(1)">"#);
        assert!(!html.contains("onerror"));
        assert!(html.contains(r#"src="cat.png""#));
    }

    #[test]
    fn test_javascript_href_removed() {
        let html = render("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("click"));
    }

    #[test]
    fn test_disallowed_tag_keeps_text() {
        let html = render("<div class=\"x\">kept text</div>");
        assert!(!html.contains("<div"));
        assert!(html.contains("kept text"));
    }

    #[test]
    fn test_bare_url_is_linked() {
        let html = render("Visit https://example.com/docs today");
        assert!(html.contains(r#"href="https://example.com/docs""#), "{}", html);
        assert!(html.contains(r#"rel="nofollow""#));
        assert!(html.contains(">https://example.com/docs</a>"));
    }

    #[test]
    fn test_bare_email_is_linked() {
        let html = render("Mail user@example.com please");
        assert!(html.contains(r#"href="mailto:user@example.com""#), "{}", html);
    }

    #[test]
    fn test_existing_link_not_relinked() {
        let html = render("[https://example.com](https://example.com)");
        assert_eq!(html.matches("<a ").count(), 1, "{}", html);
    }

    #[test]
    fn test_url_inside_raw_html_is_linked() {
        let html = render("<p>see https://example.com/raw</p>");
        assert!(html.contains(r#"href="https://example.com/raw""#), "{}", html);
        assert_eq!(html.matches("<a ").count(), 1, "{}", html);
    }

    #[test]
    fn test_code_not_linked() {
        let html = render("`https://example.com`\n\n```\nhttps://example.org\n```");
        assert!(!html.contains("<a "), "{}", html);
        assert!(html.contains("https://example.com"));
    }

    #[test]
    fn test_tables() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"), "{}", html);
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<th>a</th>"));
    }

    #[test]
    fn test_strikethrough() {
        let html = render("~~gone~~");
        assert!(html.contains("<del>gone</del>"), "{}", html);
    }

    #[test]
    fn test_fenced_code_language_class_stripped_by_allow_list() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre><code>"), "{}", html);
        assert!(html.contains("fn main() {}"));
    }

    #[test]
    fn test_codehilite_keeps_language_class_when_allowed() {
        let mut config = RenderConfig::default();
        config
            .allowed_attributes
            .insert("code".to_string(), ["class".to_string()].into_iter().collect());
        let html = MarkdownRenderer::new(config.clone()).render("```rust\nlet x = 1;\n```");
        assert!(html.contains(r#"class="language-rust""#), "{}", html);

        let config = config.with_extensions(vec![MarkdownExtension::FencedCode]);
        let html = MarkdownRenderer::new(config).render("```rust\nlet x = 1;\n```");
        assert!(!html.contains("language-rust"), "{}", html);
    }

    #[test]
    fn test_restricted_allow_list() {
        let config = RenderConfig::from_yaml_str("allowed_tags: [p]\nallowed_attributes: {}").unwrap();
        let html = MarkdownRenderer::new(config).render("# Head\n\n**bold**");
        assert!(!html.contains("<h1>"));
        assert!(!html.contains("<strong>"));
        assert!(html.contains("Head"));
        assert!(html.contains("<p>bold</p>"));
    }

    #[test]
    fn test_forbidden_config_entries_do_not_open_holes() {
        let config = RenderConfig::from_yaml_str(
            "allowed_tags: [p, script, img]\nallowed_attributes:\n  img: [src, onload]",
        )
        .unwrap();
        let html = MarkdownRenderer::new(config)
            .render("<script>bad()</script>\n\n<img src=\"a.png\" onload=\"bad()\">");
        assert!(!html.contains("<script"));
        assert!(!html.contains("onload"));
    }

    #[test]
    fn test_malformed_markdown_does_not_fail() {
        let html = render("**unclosed [link]( <b>bold\n\n| a |\n|--");
        assert!(html.contains("unclosed"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }
}
