//! Heading anchors and `[TOC]` expansion.

use std::collections::HashSet;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Tag, TagEnd};

use crate::escape_html;

const TOC_MARKER: &str = "[TOC]";

struct TocEntry {
    level: u32,
    title: String,
    slug: String,
}

/// Give every heading a unique `id` and replace a paragraph consisting of
/// `[TOC]` alone with a nested list of links to those headings.
pub(crate) fn apply(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut entries = Vec::new();
    let mut used = HashSet::new();
    let mut out: Vec<Event<'_>> = Vec::with_capacity(events.len());

    // Index into `out` of the open heading start and the text gathered so far.
    let mut open_heading: Option<(usize, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                open_heading = Some((out.len(), String::new()));
                out.push(event);
            }
            Event::Text(ref text) | Event::Code(ref text) => {
                if let Some((_, title)) = open_heading.as_mut() {
                    title.push_str(text);
                }
                out.push(event);
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some((start, title)) = open_heading.take() {
                    if let Event::Start(Tag::Heading { id, .. }) = &mut out[start] {
                        let slug = match id {
                            Some(existing) => existing.to_string(),
                            None => unique_slug(&title, &mut used),
                        };
                        used.insert(slug.clone());
                        *id = Some(CowStr::from(slug.clone()));
                        entries.push(TocEntry {
                            level: heading_depth(level),
                            title,
                            slug,
                        });
                    }
                }
                out.push(event);
            }
            other => out.push(other),
        }
    }

    if entries.is_empty() {
        return out;
    }
    replace_markers(out, &toc_html(&entries))
}

fn replace_markers<'a>(events: Vec<Event<'a>>, toc: &str) -> Vec<Event<'a>> {
    let mut out: Vec<Event<'a>> = Vec::with_capacity(events.len());
    for event in events {
        if matches!(event, Event::End(TagEnd::Paragraph)) && out.len() >= 2 {
            let n = out.len();
            let is_marker = matches!(&out[n - 2], Event::Start(Tag::Paragraph))
                && matches!(&out[n - 1], Event::Text(t) if t.trim() == TOC_MARKER);
            if is_marker {
                out.truncate(n - 2);
                out.push(Event::Html(CowStr::from(toc.to_string())));
                continue;
            }
        }
        out.push(event);
    }
    out
}

fn heading_depth(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Lower-case, keep alphanumerics, turn whitespace and hyphens into single
/// hyphens. Duplicates get a numeric suffix.
fn unique_slug(title: &str, used: &mut HashSet<String>) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-') && !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let base = match slug.trim_end_matches('-') {
        "" => "section".to_string(),
        s => s.to_string(),
    };

    if !used.contains(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(base)
}

fn toc_html(entries: &[TocEntry]) -> String {
    let mut html = String::from("<div class=\"toc\">");
    let mut stack: Vec<u32> = Vec::new();

    for entry in entries {
        match stack.last() {
            Some(&top) if entry.level <= top => {
                html.push_str("</li>");
                while stack.len() > 1 && stack.last().is_some_and(|&top| entry.level < top) {
                    html.push_str("</ul>");
                    stack.pop();
                    if stack.last().is_some_and(|&parent| entry.level > parent) {
                        html.push_str("<ul>");
                        stack.push(entry.level);
                        break;
                    }
                    html.push_str("</li>");
                }
            }
            _ => {
                html.push_str("<ul>");
                stack.push(entry.level);
            }
        }
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape_html(&entry.slug),
            escape_html(&entry.title)
        ));
    }

    html.push_str("</li>");
    while stack.pop().is_some() {
        html.push_str("</ul>");
        if !stack.is_empty() {
            html.push_str("</li>");
        }
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{html, Options, Parser};

    fn render(markdown: &str) -> String {
        let events: Vec<_> = Parser::new_ext(markdown, Options::empty()).collect();
        let mut out = String::new();
        html::push_html(&mut out, apply(crate::merge_text(events)).into_iter());
        out
    }

    fn entry(level: u32, slug: &str) -> TocEntry {
        TocEntry {
            level,
            title: slug.to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn test_headings_get_ids() {
        let html = render("# Getting Started\n\n## Getting Started\n");
        assert!(html.contains(r#"<h1 id="getting-started">"#), "{}", html);
        assert!(html.contains(r#"<h2 id="getting-started-1">"#), "{}", html);
    }

    #[test]
    fn test_marker_replaced_with_list() {
        let html = render("[TOC]\n\n# Intro\n\n## Setup\n");
        assert!(!html.contains("[TOC]"));
        assert!(html.contains(r##"<a href="#intro">Intro</a>"##), "{}", html);
        assert!(html.contains(r##"<a href="#setup">Setup</a>"##));
    }

    #[test]
    fn test_marker_inside_text_kept() {
        let html = render("See [TOC] here\n\n# Intro\n");
        assert!(html.contains("See [TOC] here"));
    }

    #[test]
    fn test_nesting() {
        let html = toc_html(&[entry(1, "a"), entry(2, "b"), entry(1, "c")]);
        assert_eq!(
            html,
            "<div class=\"toc\"><ul><li><a href=\"#a\">a</a><ul><li><a href=\"#b\">b</a></li></ul></li><li><a href=\"#c\">c</a></li></ul></div>"
        );
    }

    #[test]
    fn test_skipped_level_then_middle() {
        let html = toc_html(&[entry(1, "a"), entry(3, "b"), entry(2, "c")]);
        assert_eq!(
            html,
            "<div class=\"toc\"><ul><li><a href=\"#a\">a</a><ul><li><a href=\"#b\">b</a></li></ul><ul><li><a href=\"#c\">c</a></li></ul></li></ul></div>"
        );
    }

    #[test]
    fn test_slug_fallback() {
        let mut used = HashSet::new();
        assert_eq!(unique_slug("!!!", &mut used), "section");
        assert_eq!(unique_slug("  Hello,  World! ", &mut used), "hello-world");
    }
}
