//! Autolinking of bare URLs and email addresses in rendered text.

use linkify::{LinkFinder, LinkKind};
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

use crate::escape_html;

/// Replace bare URLs and emails in text events with `rel="nofollow"` anchors.
///
/// Raw HTML is linked too, in the text between its tags. Text inside existing
/// links, images and code (Markdown or raw HTML) is left alone.
pub(crate) fn autolink(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut finder = LinkFinder::new();
    finder.url_must_have_scheme(false);

    let mut out = Vec::with_capacity(events.len());
    let mut link_depth = 0usize;
    let mut in_code_block = false;
    let mut raw = RawNesting::default();

    for event in events {
        match event {
            Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. }) => {
                link_depth += 1;
                out.push(event);
            }
            Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                link_depth = link_depth.saturating_sub(1);
                out.push(event);
            }
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                out.push(event);
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                out.push(event);
            }
            Event::Text(text) if link_depth == 0 && !in_code_block && !raw.suppresses() => {
                split_links(&finder, text, &mut out);
            }
            Event::Html(html) => {
                let linked = link_raw_html(&finder, &html, &mut raw, link_depth == 0);
                out.push(Event::Html(CowStr::from(linked)));
            }
            Event::InlineHtml(html) => {
                let linked = link_raw_html(&finder, &html, &mut raw, link_depth == 0);
                out.push(Event::InlineHtml(CowStr::from(linked)));
            }
            other => out.push(other),
        }
    }
    out
}

/// Open raw-HTML elements whose text must not be linked.
#[derive(Debug, Default)]
struct RawNesting {
    anchors: usize,
    code: usize,
}

impl RawNesting {
    fn suppresses(&self) -> bool {
        self.anchors > 0 || self.code > 0
    }

    fn observe(&mut self, tag: &str) {
        if tag.starts_with("<!") || tag.ends_with("/>") {
            return;
        }
        let body = &tag[1..];
        let closing = body.starts_with('/');
        let name: String = body
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let depth = match name.as_str() {
            "a" => &mut self.anchors,
            "code" | "pre" | "script" | "style" => &mut self.code,
            _ => return,
        };
        if closing {
            *depth = depth.saturating_sub(1);
        } else {
            *depth += 1;
        }
    }
}

/// Link bare URLs in the text runs of a raw HTML fragment.
///
/// Text runs are already HTML, so found links are copied through unescaped.
/// An unterminated tag ends scanning for this fragment.
fn link_raw_html(finder: &LinkFinder, html: &str, raw: &mut RawNesting, enabled: bool) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    loop {
        let Some(open) = rest.find('<') else {
            push_linked_html(finder, rest, enabled && !raw.suppresses(), &mut out);
            break;
        };
        push_linked_html(finder, &rest[..open], enabled && !raw.suppresses(), &mut out);

        let tail = &rest[open..];
        let end = if tail.starts_with("<!--") {
            tail.find("-->").map(|e| e + 3)
        } else {
            tail.find('>').map(|e| e + 1)
        };
        match end {
            Some(end) => {
                raw.observe(&tail[..end]);
                out.push_str(&tail[..end]);
                rest = &tail[end..];
            }
            None => {
                out.push_str(tail);
                break;
            }
        }
    }
    out
}

fn push_linked_html(finder: &LinkFinder, text: &str, enabled: bool, out: &mut String) {
    if !enabled {
        out.push_str(text);
        return;
    }
    let mut cursor = 0;
    for link in finder.links(text) {
        out.push_str(&text[cursor..link.start()]);
        let found = link.as_str();
        let href = link_href(found, matches!(link.kind(), LinkKind::Email));
        out.push_str(&format!(
            "<a href=\"{}\" rel=\"nofollow\">{}</a>",
            href.replace('"', "&quot;"),
            found
        ));
        cursor = link.end();
    }
    out.push_str(&text[cursor..]);
}

fn link_href(found: &str, is_email: bool) -> String {
    if is_email {
        format!("mailto:{}", found)
    } else if found.contains("://") {
        found.to_string()
    } else {
        format!("http://{}", found)
    }
}

fn split_links<'a>(finder: &LinkFinder, text: CowStr<'a>, out: &mut Vec<Event<'a>>) {
    let spans: Vec<(usize, usize, bool)> = finder
        .links(&text)
        .map(|link| (link.start(), link.end(), matches!(link.kind(), LinkKind::Email)))
        .collect();
    if spans.is_empty() {
        out.push(Event::Text(text));
        return;
    }

    let mut cursor = 0;
    for (start, end, is_email) in spans {
        if start > cursor {
            out.push(Event::Text(CowStr::from(text[cursor..start].to_string())));
        }
        let found = &text[start..end];
        let href = link_href(found, is_email);
        out.push(Event::Html(CowStr::from(format!(
            "<a href=\"{}\" rel=\"nofollow\">{}</a>",
            escape_html(&href),
            escape_html(found)
        ))));
        cursor = end;
    }
    if cursor < text.len() {
        out.push(Event::Text(CowStr::from(text[cursor..].to_string())));
    }
}
