//! End-to-end rendering through the public API.

use quire_render::{MarkdownExtension, MarkdownRenderer, RenderConfig};

#[test]
fn test_note_body_renders_heading_table_and_links() {
    let renderer = MarkdownRenderer::default();
    let html = renderer.render(
        "# Deploy Notes\n\nSee https://docs.example.com for details.\n\n| Env | Host |\n|-----|------|\n| prod | db1 |\n",
    );

    assert!(html.contains("<h1>Deploy Notes</h1>"), "{}", html);
    assert!(html.contains(r#"href="https://docs.example.com""#));
    assert!(html.contains("<td>prod</td>"));
}

#[test]
fn test_hostile_markup_is_neutralized() {
    let renderer = MarkdownRenderer::default();
    let html = renderer.render(concat!(
        "<script>document.cookie</script>\n\n",
        "<a href=\"javascript:steal()\" onclick=\"steal()\">x</a>\n\n",
        "<iframe src=\"https://evil.example\"></iframe>\n\n",
        "<p style=\"color:red\" onmouseover=\"steal()\">styled</p>\n",
    ));

    for needle in ["<script", "document.cookie", "javascript:", "onclick", "<iframe", "style=", "onmouseover"] {
        assert!(!html.contains(needle), "found {} in {}", needle, html);
    }
    assert!(html.contains("styled"));
}

#[test]
fn test_toc_with_anchor_ids_allowed() {
    let mut config = RenderConfig::default();
    for tag in ["h1", "h2"] {
        config
            .allowed_attributes
            .insert(tag.to_string(), ["id".to_string()].into_iter().collect());
    }
    let renderer = MarkdownRenderer::new(config);
    let html = renderer.render("[TOC]\n\n# Intro\n\n## Setup Steps\n");

    assert!(html.contains(r##"<a href="#setup-steps">Setup Steps</a>"##), "{}", html);
    assert!(html.contains(r#"<h2 id="setup-steps">"#), "{}", html);
    assert!(!html.contains("[TOC]"));
}

#[test]
fn test_tables_disabled_without_extension() {
    let config = RenderConfig::default().with_extensions(vec![MarkdownExtension::FencedCode]);
    let html = MarkdownRenderer::new(config).render("| a | b |\n|---|---|\n| 1 | 2 |");
    assert!(!html.contains("<table>"), "{}", html);
}

#[test]
fn test_preview_of_same_input_is_stable() {
    let renderer = MarkdownRenderer::default();
    let input = "Some *emphasis* and user@example.com";
    assert_eq!(renderer.render(input), renderer.render(input));
}
