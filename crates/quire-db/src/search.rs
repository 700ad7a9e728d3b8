//! Note search.
//!
//! Two modes share one query shape:
//! - **Relevance**: a non-empty free-text query is matched with
//!   `plainto_tsquery('english', ...)` against the weighted `search_vector`
//!   (title A, summary B, body C) and ordered by `ts_rank` descending. Any
//!   requested sort key is ignored.
//! - **Sorted**: no text query; results follow the explicit sort order, or
//!   the store's natural order when the key was unrecognized.
//!
//! Tag filtering is AND-only: one `EXISTS` clause per required tag. Archived
//! notes are excluded unless explicitly requested.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use quire_core::defaults::FTS_CONFIG;
use quire_core::{Error, NoteSearch, NoteSearchParams, NoteSort, NoteSummary, Result, SearchMode};

/// Builds the parameterized SQL for a [`NoteSearchParams`].
///
/// # Example
///
/// ```rust
/// use quire_db::{NoteQueryBuilder, NoteSearchParams};
///
/// let params = NoteSearchParams::from_raw(Some("postgres"), ["database"], false, None);
/// let (sql, binds) = NoteQueryBuilder::new(&params).build();
/// assert!(sql.contains("ts_rank"));
/// assert_eq!(binds, vec!["postgres".to_string(), "database".to_string()]);
/// ```
pub struct NoteQueryBuilder<'a> {
    params: &'a NoteSearchParams,
}

impl<'a> NoteQueryBuilder<'a> {
    pub fn new(params: &'a NoteSearchParams) -> Self {
        Self { params }
    }

    /// Build the SQL text and its positional text parameters, in bind order.
    pub fn build(&self) -> (String, Vec<String>) {
        let mut binds = Vec::new();
        let mut clauses = Vec::new();

        let score = match self.params.text_query() {
            Some(query) => {
                binds.push(query.to_string());
                let tsquery = format!("plainto_tsquery('{}', $1)", FTS_CONFIG);
                clauses.push(format!("n.search_vector @@ {}", tsquery));
                format!("ts_rank(n.search_vector, {})", tsquery)
            }
            None => "NULL::real".to_string(),
        };

        if !self.params.include_archived {
            clauses.push("n.archived = FALSE".to_string());
        }

        for tag in &self.params.tags {
            binds.push(tag.clone());
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM note_tag nt JOIN tag t ON t.id = nt.tag_id \
                 WHERE nt.note_id = n.id AND t.name = ${})",
                binds.len()
            ));
        }

        let mut sql = format!(
            "SELECT n.id, n.title, n.summary, n.source, n.archived, \
             n.created_at_utc, n.updated_at_utc, n.created_by, n.updated_by, \
             ARRAY(SELECT t.name::text FROM note_tag nt JOIN tag t ON t.id = nt.tag_id \
                   WHERE nt.note_id = n.id ORDER BY t.name) AS tags, \
             {} AS score \
             FROM note n",
            score
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if let Some(order) = self.order_clause() {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        (sql, binds)
    }

    fn order_clause(&self) -> Option<&'static str> {
        match self.params.mode() {
            SearchMode::Relevance => Some("score DESC, n.updated_at_utc DESC"),
            SearchMode::Sorted => self.params.sort.map(|sort| match sort {
                NoteSort::UpdatedDesc => "n.updated_at_utc DESC",
                NoteSort::UpdatedAsc => "n.updated_at_utc ASC",
                NoteSort::TitleAsc => "n.title ASC",
                NoteSort::TitleDesc => "n.title DESC",
                NoteSort::CreatedDesc => "n.created_at_utc DESC",
            }),
        }
    }
}

fn map_row_to_summary(row: sqlx::postgres::PgRow) -> NoteSummary {
    NoteSummary {
        id: row.get("id"),
        title: row.get("title"),
        summary: row.get("summary"),
        source: row.get("source"),
        archived: row.get("archived"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
        created_by: row.get("created_by"),
        updated_by: row.get("updated_by"),
        tags: row.get("tags"),
        score: row.get("score"),
    }
}

/// PostgreSQL implementation of NoteSearch.
#[derive(Clone)]
pub struct PgNoteSearch {
    pool: Pool<Postgres>,
}

impl PgNoteSearch {
    /// Create a new PgNoteSearch with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteSearch for PgNoteSearch {
    async fn search(&self, params: &NoteSearchParams) -> Result<Vec<NoteSummary>> {
        let start = Instant::now();
        let (sql, binds) = NoteQueryBuilder::new(params).build();

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let notes: Vec<NoteSummary> = rows.into_iter().map(map_row_to_summary).collect();

        debug!(
            subsystem = "search",
            component = "note_search",
            query = params.text_query().unwrap_or(""),
            tag_count = params.tags.len(),
            include_archived = params.include_archived,
            sort = params.sort.map(|s| s.as_key()).unwrap_or("natural"),
            result_count = notes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Note search completed"
        );
        Ok(notes)
    }
}
