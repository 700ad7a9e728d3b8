//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use quire_core::{
    blank_to_none, new_v7, normalize_tag_input, ArchiveToggle, CreateNoteRequest, Error, Note,
    NoteRepository, Result, Tag, UpdateNoteRequest,
};

use crate::tags::PgTagRepository;

const NOTE_COLUMNS: &str = "id, title, body, summary, source, archived, metadata, \
     created_at_utc, updated_at_utc, created_by, updated_by";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
    tags: PgTagRepository,
}

fn map_row_to_note(row: sqlx::postgres::PgRow, tags: Vec<Tag>) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        summary: row.get("summary"),
        source: row.get("source"),
        archived: row.get("archived"),
        metadata: row.get("metadata"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
        created_by: row.get("created_by"),
        updated_by: row.get("updated_by"),
        tags,
    }
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            tags: PgTagRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, req: CreateNoteRequest, actor: Uuid) -> Result<Note> {
        req.validate()?;
        let tag_names = normalize_tag_input(&req.tags);

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let id = self.insert_tx(&mut tx, &req, &tag_names, actor).await?;
        let note = self.fetch_conn(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "create",
            note_id = %id,
            tag_count = tag_names.len(),
            "Note created"
        );
        Ok(note)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        self.fetch_conn(&mut conn, id).await
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest, actor: Uuid) -> Result<Note> {
        req.validate()?;
        let tag_names = normalize_tag_input(&req.tags);

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.update_tx(&mut tx, id, &req, actor).await?;
        let tags = self.tags.resolve_tx(&mut tx, &tag_names).await?;
        self.set_tags_tx(&mut tx, id, &tags).await?;
        let note = self.fetch_conn(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "update",
            note_id = %id,
            tag_count = tags.len(),
            "Note updated"
        );
        Ok(note)
    }

    async fn toggle_archive(&self, id: Uuid, actor: Uuid) -> Result<ArchiveToggle> {
        let archived: bool = sqlx::query_scalar(
            "UPDATE note
             SET archived = NOT archived, updated_by = $2, updated_at_utc = $3
             WHERE id = $1
             RETURNING archived",
        )
        .bind(id)
        .bind(actor)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::NoteNotFound(id))?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "toggle_archive",
            note_id = %id,
            archived,
            "Note archive state changed"
        );
        Ok(ArchiveToggle { id, archived })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }

        info!(
            subsystem = "database",
            component = "notes",
            op = "delete",
            note_id = %id,
            "Note deleted"
        );
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        self.exists_conn(&mut conn, id).await
    }
}

// =============================================================================
// Transaction-aware variants
// =============================================================================

/// Reads take a plain connection so they can run with or without a
/// surrounding transaction; writes require one.
impl PgNoteRepository {
    /// Insert a note and attach the given canonical tag names.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        req: &CreateNoteRequest,
        tag_names: &[String],
        actor: Uuid,
    ) -> Result<Uuid> {
        let note_id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO note (id, title, body, summary, source, metadata, created_at_utc, updated_at_utc, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{}'::jsonb), $7, $7, $8, $8)",
        )
        .bind(note_id)
        .bind(req.title.trim())
        .bind(&req.body)
        .bind(blank_to_none(req.summary.clone()))
        .bind(blank_to_none(req.source.clone()))
        .bind(&req.metadata)
        .bind(now)
        .bind(actor)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let tags = self.tags.resolve_tx(tx, tag_names).await?;
        self.set_tags_tx(tx, note_id, &tags).await?;

        Ok(note_id)
    }

    /// Overwrite every editable field of a note.
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        req: &UpdateNoteRequest,
        actor: Uuid,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note
             SET title = $2, body = $3, summary = $4, source = $5, updated_by = $6, updated_at_utc = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(req.title.trim())
        .bind(&req.body)
        .bind(blank_to_none(req.summary.clone()))
        .bind(blank_to_none(req.source.clone()))
        .bind(actor)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    /// Replace title and body only, as re-import does.
    pub async fn update_content_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        title: &str,
        body: &str,
        actor: Uuid,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note SET title = $2, body = $3, updated_by = $4, updated_at_utc = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(title)
        .bind(body)
        .bind(actor)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    /// Replace a note's tag set.
    pub async fn set_tags_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        tags: &[Tag],
    ) -> Result<()> {
        sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        for tag in tags {
            sqlx::query(
                "INSERT INTO note_tag (note_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(note_id)
            .bind(tag.id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        }

        debug!(
            subsystem = "database",
            component = "notes",
            op = "set_tags",
            note_id = %note_id,
            tag_count = tags.len(),
            "Note tags replaced"
        );
        Ok(())
    }

    /// Fetch a note with its tags.
    pub async fn fetch_conn(&self, conn: &mut PgConnection, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!("SELECT {} FROM note WHERE id = $1", NOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;

        let tags = self.tags.get_for_note_conn(conn, id).await?;
        Ok(map_row_to_note(row, tags))
    }

    /// Find the note previously imported from `source`.
    ///
    /// Should duplicates exist, the oldest wins.
    pub async fn find_by_source(
        &self,
        conn: &mut PgConnection,
        source: &str,
    ) -> Result<Option<Uuid>> {
        sqlx::query_scalar(
            "SELECT id FROM note WHERE source = $1 ORDER BY created_at_utc, id LIMIT 1",
        )
        .bind(source)
        .fetch_optional(conn)
        .await
        .map_err(Error::Database)
    }

    pub async fn exists_conn(&self, conn: &mut PgConnection, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM note WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await
            .map_err(Error::Database)?;
        Ok(exists)
    }
}
