//! Note search parameters.
//!
//! A search request combines an optional free-text query, a set of required
//! tags (all must match), an archived-inclusion flag and a sort key. When a
//! free-text query is present, relevance ranking wins and the sort key is
//! ignored.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults::DEFAULT_SORT_KEY;
use crate::tags::canonical_tag_name;

/// Explicit sort orders for non-text searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSort {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    TitleAsc,
    TitleDesc,
    CreatedDesc,
}

impl NoteSort {
    /// Parse a sort key. Unknown keys yield `None`, meaning the store's
    /// natural order.
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim() {
            "updated_desc" => Some(NoteSort::UpdatedDesc),
            "updated_asc" => Some(NoteSort::UpdatedAsc),
            "title_asc" => Some(NoteSort::TitleAsc),
            "title_desc" => Some(NoteSort::TitleDesc),
            "created_desc" => Some(NoteSort::CreatedDesc),
            _ => None,
        }
    }

    /// The key this order is selected by.
    pub fn as_key(&self) -> &'static str {
        match self {
            NoteSort::UpdatedDesc => "updated_desc",
            NoteSort::UpdatedAsc => "updated_asc",
            NoteSort::TitleAsc => "title_asc",
            NoteSort::TitleDesc => "title_desc",
            NoteSort::CreatedDesc => "created_desc",
        }
    }
}

/// How a search orders its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Free-text match ordered by descending relevance.
    Relevance,
    /// Explicit sort order, or natural order for an unknown key.
    Sorted,
}

/// Criteria for a note search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteSearchParams {
    /// Free-text query; blank strings are treated as absent.
    pub query: Option<String>,
    /// Canonical tag names; a note must carry every one of them.
    pub tags: Vec<String>,
    /// Include archived notes (excluded by default).
    pub include_archived: bool,
    /// Explicit order; `None` leaves results in natural order.
    pub sort: Option<NoteSort>,
}

impl NoteSearchParams {
    /// Build search parameters from raw request values.
    ///
    /// - `query` is trimmed; an empty query selects sorted mode.
    /// - each of `tags` is one exact tag name: trimmed and lower-cased, never
    ///   split on commas. Blanks and duplicates are dropped.
    /// - A missing `sort` selects `updated_desc`; an unrecognized key falls
    ///   back to natural order rather than failing.
    pub fn from_raw<I, S>(
        query: Option<&str>,
        tags: I,
        include_archived: bool,
        sort: Option<&str>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        let sort_key = sort.unwrap_or(DEFAULT_SORT_KEY);
        let sort = NoteSort::parse(sort_key);
        if sort.is_none() {
            debug!(
                subsystem = "core",
                component = "note_search",
                sort = sort_key,
                "Unrecognized sort key, using natural order"
            );
        }

        let mut names: Vec<String> = Vec::new();
        for name in tags.into_iter().filter_map(|t| canonical_tag_name(t.as_ref())) {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        Self {
            query,
            tags: names,
            include_archived,
            sort,
        }
    }

    /// The free-text query, if any.
    pub fn text_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Which ordering the search will use.
    pub fn mode(&self) -> SearchMode {
        if self.query.is_some() {
            SearchMode::Relevance
        } else {
            SearchMode::Sorted
        }
    }
}
