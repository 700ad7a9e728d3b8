//! Renderer configuration: Markdown extension set and HTML allow-list.
//!
//! Both are overridable at the application-configuration boundary (a YAML
//! file and/or a comma-separated extension list); the defaults cover common
//! prose, tables, code, images and links.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use quire_core::{Error, Result};

/// Tags that can execute script or load active content. Never allowed,
/// whatever the configuration says.
const FORBIDDEN_TAGS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "form",
    "input", "button", "textarea", "select", "option", "link", "meta", "base", "svg", "math",
    "template", "noscript",
];

/// Attributes that carry script or styling regardless of tag.
const FORBIDDEN_ATTRIBUTES: &[&str] = &["style", "srcdoc", "formaction"];

const DEFAULT_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "ul", "ol", "li", "blockquote", "pre",
    "code", "a", "img", "strong", "em", "b", "i", "u", "s", "del", "table", "thead", "tbody",
    "tr", "th", "td",
];

const DEFAULT_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target", "rel"]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("td", &["colspan", "rowspan"]),
    ("th", &["colspan", "rowspan"]),
];

/// Optional Markdown features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MarkdownExtension {
    /// Tables, footnotes, strikethrough and heading attributes.
    Extra,
    /// Keep the fenced-code language as a `language-*` class for highlighters.
    CodeHilite,
    /// Heading anchors and `[TOC]` marker expansion.
    Toc,
    /// Pipe tables.
    Tables,
    /// Fenced code blocks (always recognized by CommonMark).
    FencedCode,
}

impl MarkdownExtension {
    pub const ALL: [MarkdownExtension; 5] = [
        MarkdownExtension::Extra,
        MarkdownExtension::CodeHilite,
        MarkdownExtension::Toc,
        MarkdownExtension::Tables,
        MarkdownExtension::FencedCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkdownExtension::Extra => "extra",
            MarkdownExtension::CodeHilite => "codehilite",
            MarkdownExtension::Toc => "toc",
            MarkdownExtension::Tables => "tables",
            MarkdownExtension::FencedCode => "fenced_code",
        }
    }

    /// Parse a comma-separated list such as `extra, toc,tables`.
    pub fn parse_list(list: &str) -> Result<Vec<MarkdownExtension>> {
        let mut extensions = Vec::new();
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let ext = name.parse::<MarkdownExtension>().map_err(Error::Config)?;
            if !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
        Ok(extensions)
    }
}

impl fmt::Display for MarkdownExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkdownExtension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        MarkdownExtension::ALL
            .into_iter()
            .find(|ext| ext.as_str() == name)
            .ok_or_else(|| {
                format!(
                    "Unknown markdown extension '{}'. Expected one of: extra, codehilite, toc, tables, fenced_code",
                    s
                )
            })
    }
}

impl TryFrom<String> for MarkdownExtension {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarkdownExtension> for String {
    fn from(ext: MarkdownExtension) -> Self {
        ext.as_str().to_string()
    }
}

/// Markdown extension set plus HTML allow-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub extensions: Vec<MarkdownExtension>,
    pub allowed_tags: BTreeSet<String>,
    /// Allowed attribute names per tag.
    pub allowed_attributes: BTreeMap<String, BTreeSet<String>>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            extensions: vec![
                MarkdownExtension::Extra,
                MarkdownExtension::CodeHilite,
                MarkdownExtension::Toc,
                MarkdownExtension::Tables,
                MarkdownExtension::FencedCode,
            ],
            allowed_tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            allowed_attributes: DEFAULT_ATTRIBUTES
                .iter()
                .map(|(tag, attrs)| {
                    (
                        tag.to_string(),
                        attrs.iter().map(|a| a.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl RenderConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Invalid render configuration: {}", e)))
    }

    /// Load a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Cannot read render configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Replace the extension set.
    pub fn with_extensions(mut self, extensions: Vec<MarkdownExtension>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn has_extension(&self, ext: MarkdownExtension) -> bool {
        self.extensions.contains(&ext)
    }

    /// Remove script-capable tags and attributes from the allow-list.
    ///
    /// Tag and attribute names are lower-cased; `on*` event handlers are
    /// always dropped.
    pub fn enforce_safety(mut self) -> Self {
        self.allowed_tags = std::mem::take(&mut self.allowed_tags)
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|tag| {
                let forbidden = tag.is_empty() || FORBIDDEN_TAGS.contains(&tag.as_str());
                if forbidden && !tag.is_empty() {
                    warn!(
                        subsystem = "render",
                        component = "config",
                        tag = %tag,
                        "Dropping forbidden tag from HTML allow-list"
                    );
                }
                !forbidden
            })
            .collect();

        self.allowed_attributes = std::mem::take(&mut self.allowed_attributes)
            .into_iter()
            .map(|(tag, attrs)| {
                let tag = tag.trim().to_lowercase();
                let attrs = attrs
                    .into_iter()
                    .map(|a| a.trim().to_lowercase())
                    .filter(|attr| {
                        let forbidden = attr.is_empty()
                            || attr.starts_with("on")
                            || FORBIDDEN_ATTRIBUTES.contains(&attr.as_str());
                        if forbidden && !attr.is_empty() {
                            warn!(
                                subsystem = "render",
                                component = "config",
                                tag = %tag,
                                attribute = %attr,
                                "Dropping forbidden attribute from HTML allow-list"
                            );
                        }
                        !forbidden
                    })
                    .collect();
                (tag, attrs)
            })
            .filter(|(tag, _)| !FORBIDDEN_TAGS.contains(&tag.as_str()))
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_prose_tables_code_images_links() {
        let config = RenderConfig::default();
        for tag in ["p", "h1", "table", "td", "pre", "code", "img", "a", "del"] {
            assert!(config.allowed_tags.contains(tag), "missing {}", tag);
        }
        let anchor = &config.allowed_attributes["a"];
        assert!(anchor.contains("target"));
        assert!(anchor.contains("rel"));
        assert_eq!(config.extensions.len(), 5);
    }

    #[test]
    fn test_parse_extension_list() {
        let exts = MarkdownExtension::parse_list("extra, TOC,,tables,extra").unwrap();
        assert_eq!(
            exts,
            vec![
                MarkdownExtension::Extra,
                MarkdownExtension::Toc,
                MarkdownExtension::Tables
            ]
        );
    }

    #[test]
    fn test_unknown_extension_is_config_error() {
        let err = MarkdownExtension::parse_list("extra,wikilinks").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("wikilinks")));
    }

    #[test]
    fn test_yaml_overrides_and_keeps_defaults() {
        let config = RenderConfig::from_yaml_str(
            r#"
allowed_tags: [p, a]
allowed_attributes:
  a: [href]
"#,
        )
        .unwrap();
        assert_eq!(config.allowed_tags.len(), 2);
        assert_eq!(config.allowed_attributes["a"].len(), 1);
        assert_eq!(config.extensions, RenderConfig::default().extensions);
    }

    #[test]
    fn test_yaml_extension_names() {
        let config = RenderConfig::from_yaml_str("extensions: [fenced_code, codehilite]").unwrap();
        assert!(config.has_extension(MarkdownExtension::FencedCode));
        assert!(config.has_extension(MarkdownExtension::CodeHilite));
        assert!(!config.has_extension(MarkdownExtension::Toc));

        assert!(RenderConfig::from_yaml_str("extensions: [nope]").is_err());
    }

    #[test]
    fn test_enforce_safety_drops_script_and_handlers() {
        let config = RenderConfig::from_yaml_str(
            r#"
allowed_tags: [p, Script, iframe, img]
allowed_attributes:
  img: [src, onerror, ONLOAD, style]
  script: [src]
"#,
        )
        .unwrap()
        .enforce_safety();

        assert!(config.allowed_tags.contains("p"));
        assert!(config.allowed_tags.contains("img"));
        assert!(!config.allowed_tags.contains("script"));
        assert!(!config.allowed_tags.contains("iframe"));
        assert_eq!(
            config.allowed_attributes["img"].iter().collect::<Vec<_>>(),
            vec!["src"]
        );
        assert!(!config.allowed_attributes.contains_key("script"));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.yaml");
        std::fs::write(&path, "allowed_tags: [p]\n").unwrap();
        let config = RenderConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.allowed_tags.len(), 1);

        let missing = RenderConfig::from_yaml_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
