//! Tag normalization.
//!
//! Raw tag text arrives as a comma-separated string from note forms, or as a
//! list of labels from importers (folder names plus default tags). Both paths
//! reduce to the same canonical form: trimmed, lower-cased, non-empty, unique.
//! Resolution of canonical names into stored [`crate::Tag`] rows happens in
//! the database layer inside the caller's transaction.

use std::collections::HashSet;

use crate::defaults::TAG_SEPARATOR;

/// Canonicalize a single tag label. Returns `None` for blank input.
pub fn canonical_tag_name(raw: &str) -> Option<String> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Split comma-separated tag text into canonical, deduplicated names.
///
/// Names keep the order of their first occurrence.
///
/// ```
/// use quire_core::normalize_tag_input;
///
/// assert_eq!(normalize_tag_input("test, sample, test"), vec!["test", "sample"]);
/// ```
pub fn normalize_tag_input(raw: &str) -> Vec<String> {
    normalize_tag_names(raw.split(TAG_SEPARATOR))
}

/// Canonicalize and deduplicate an arbitrary collection of labels.
///
/// Each label is also split on commas so mixed sources (a folder name and a
/// `--default-tags a,b` option) normalize the same way.
pub fn normalize_tag_names<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for label in labels {
        for part in label.as_ref().split(TAG_SEPARATOR) {
            if let Some(name) = canonical_tag_name(part) {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
    }
    names
}
