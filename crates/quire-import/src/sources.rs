//! File discovery and conversion into import items.

use std::path::{Path, PathBuf};

use scraper::{Html, Selector};
use walkdir::WalkDir;

use quire_core::defaults::{
    HTML_IMPORT_EXTENSIONS, HTML_IMPORT_WRAP_WIDTH, NOTE_SOURCE_MAX_LEN, NOTE_TITLE_MAX_LEN,
    TEXT_IMPORT_EXTENSIONS,
};
use quire_core::{normalize_tag_names, Error, Result};

/// One external file, ready to reconcile against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    /// Canonical absolute path; the dedup key.
    pub source: String,
    pub title: String,
    pub body: String,
    /// Replacement tag set. `None` leaves an existing note's tags untouched.
    pub tags: Option<Vec<String>>,
}

/// A kind of importable file.
pub trait ImportSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// File extensions (without dot, lower-case) this source reads.
    fn extensions(&self) -> &'static [&'static str];

    /// Read and convert one file found under `root`.
    fn read(&self, root: &Path, path: &Path) -> Result<ImportItem>;
}

/// List matching files under `root`, recursively, in path order.
pub fn discover(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .collect()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
}

fn unreadable(path: &Path, reason: impl ToString) -> Error {
    Error::UnreadableSource {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Absolute, symlink-resolved path used as the dedup key.
fn canonical_source(path: &Path) -> Result<String> {
    let source = std::fs::canonicalize(path)
        .map_err(|e| unreadable(path, e))?
        .to_string_lossy()
        .into_owned();
    if source.chars().count() > NOTE_SOURCE_MAX_LEN {
        return Err(unreadable(
            path,
            format!("path longer than {} characters", NOTE_SOURCE_MAX_LEN),
        ));
    }
    Ok(source)
}

fn read_utf8(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| unreadable(path, e))
}

fn clamp_title(title: &str) -> String {
    title.trim().chars().take(NOTE_TITLE_MAX_LEN).collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// =============================================================================
// Plain text and Markdown
// =============================================================================

/// `.txt` and `.md` files. The title is the file name without extension and
/// the body is the file content verbatim.
#[derive(Debug, Clone, Default)]
pub struct TextFileSource {
    /// Tag each note with the names of the folders between the root and the file.
    pub tag_from_folders: bool,
    /// Tags applied to every imported note.
    pub default_tags: Vec<String>,
}

impl TextFileSource {
    pub fn new(tag_from_folders: bool, default_tags: &str) -> Self {
        Self {
            tag_from_folders,
            default_tags: normalize_tag_names([default_tags]),
        }
    }

    fn folder_labels(root: &Path, path: &Path) -> Vec<String> {
        path.parent()
            .and_then(|dir| dir.strip_prefix(root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ImportSource for TextFileSource {
    fn name(&self) -> &'static str {
        "files"
    }

    fn extensions(&self) -> &'static [&'static str] {
        TEXT_IMPORT_EXTENSIONS
    }

    fn read(&self, root: &Path, path: &Path) -> Result<ImportItem> {
        let body = read_utf8(path)?;
        let source = canonical_source(path)?;

        let mut labels = if self.tag_from_folders {
            Self::folder_labels(root, path)
        } else {
            Vec::new()
        };
        labels.extend(self.default_tags.iter().cloned());

        Ok(ImportItem {
            source,
            title: clamp_title(&file_stem(path)),
            body,
            tags: Some(normalize_tag_names(labels)),
        })
    }
}

// =============================================================================
// OneNote HTML export
// =============================================================================

/// `.html` pages exported from OneNote. The title comes from `<title>` (or
/// the file name), the body is the page converted to Markdown-style text.
/// Tags are never touched.
#[derive(Debug, Clone, Default)]
pub struct OneNoteHtmlSource;

impl OneNoteHtmlSource {
    fn page_title(document: &Html) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
    }
}

impl ImportSource for OneNoteHtmlSource {
    fn name(&self) -> &'static str {
        "onenote"
    }

    fn extensions(&self) -> &'static [&'static str] {
        HTML_IMPORT_EXTENSIONS
    }

    fn read(&self, _root: &Path, path: &Path) -> Result<ImportItem> {
        let html = read_utf8(path)?;
        let source = canonical_source(path)?;

        let document = Html::parse_document(&html);
        let title = Self::page_title(&document).unwrap_or_else(|| file_stem(path));
        let body = html2text::from_read(html.as_bytes(), HTML_IMPORT_WRAP_WIDTH)
            .trim()
            .to_string();

        Ok(ImportItem {
            source,
            title: clamp_title(&title),
            body,
            tags: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension_case_insensitive() {
        assert!(has_extension(Path::new("a/b/Notes.MD"), TEXT_IMPORT_EXTENSIONS));
        assert!(has_extension(Path::new("x.txt"), TEXT_IMPORT_EXTENSIONS));
        assert!(!has_extension(Path::new("x.html"), TEXT_IMPORT_EXTENSIONS));
        assert!(!has_extension(Path::new("README"), TEXT_IMPORT_EXTENSIONS));
    }

    #[test]
    fn test_folder_labels() {
        let labels = TextFileSource::folder_labels(
            Path::new("/data/export"),
            Path::new("/data/export/Work/Projects/plan.md"),
        );
        assert_eq!(labels, vec!["Work", "Projects"]);

        let labels =
            TextFileSource::folder_labels(Path::new("/data/export"), Path::new("/data/export/top.md"));
        assert!(labels.is_empty());
    }

    #[test]
    fn test_default_tags_normalized() {
        let source = TextFileSource::new(false, " Imported, legacy ,imported");
        assert_eq!(source.default_tags, vec!["imported", "legacy"]);
    }

    #[test]
    fn test_clamp_title() {
        let long = "t".repeat(NOTE_TITLE_MAX_LEN + 20);
        assert_eq!(clamp_title(&long).chars().count(), NOTE_TITLE_MAX_LEN);
        assert_eq!(clamp_title("  padded "), "padded");
    }

    #[test]
    fn test_page_title() {
        let doc = Html::parse_document("<html><head><title>\n  Meeting   notes </title></head></html>");
        assert_eq!(OneNoteHtmlSource::page_title(&doc), Some("Meeting notes".to_string()));

        let doc = Html::parse_document("<html><head><title>  </title></head><body>x</body></html>");
        assert_eq!(OneNoteHtmlSource::page_title(&doc), None);
    }
}
