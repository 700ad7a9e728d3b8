//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use quire_core::defaults::TAG_NAME_MAX_LEN;
use quire_core::tags::canonical_tag_name;
use quire_core::{max_len, Error, Result, Tag, TagRepository, TagWithCount};

use crate::escape_like;

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Resolve canonical names to tag rows within an existing transaction,
    /// creating any that do not exist yet.
    ///
    /// Safe under concurrency: when two transactions create the same name,
    /// one insert wins and the other reuses the committed row.
    pub async fn resolve_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        names: &[String],
    ) -> Result<Vec<Tag>> {
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            max_len("Tag name", name, TAG_NAME_MAX_LEN)?;

            sqlx::query("INSERT INTO tag (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
                .bind(name)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;

            let tag: Tag = sqlx::query_as("SELECT id, name FROM tag WHERE name = $1")
                .bind(name)
                .fetch_one(&mut **tx)
                .await
                .map_err(Error::Database)?;
            tags.push(tag);
        }
        Ok(tags)
    }

    /// Tags attached to a note, ordered by name.
    pub async fn get_for_note_conn(
        &self,
        conn: &mut PgConnection,
        note_id: Uuid,
    ) -> Result<Vec<Tag>> {
        sqlx::query_as(
            "SELECT t.id, t.name FROM tag t
             JOIN note_tag nt ON nt.tag_id = t.id
             WHERE nt.note_id = $1
             ORDER BY t.name",
        )
        .bind(note_id)
        .fetch_all(conn)
        .await
        .map_err(Error::Database)
    }

    async fn fetch_tag(conn: &mut PgConnection, id: i64) -> Result<Tag> {
        sqlx::query_as("SELECT id, name FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::TagNotFound(id))
    }

    async fn count_notes(conn: &mut PgConnection, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM note_tag WHERE tag_id = $1")
            .bind(id)
            .fetch_one(conn)
            .await
            .map_err(Error::Database)?;
        Ok(count)
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self, filter: Option<&str>) -> Result<Vec<TagWithCount>> {
        let pattern = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| format!("%{}%", escape_like(f)));

        let tags = sqlx::query_as::<_, TagWithCount>(
            r#"
            SELECT
                t.id,
                t.name,
                COUNT(nt.note_id) AS note_count
            FROM tag t
            LEFT JOIN note_tag nt ON nt.tag_id = t.id
            WHERE $1::text IS NULL OR t.name ILIKE $1 ESCAPE '\'
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(tags)
    }

    async fn get(&self, id: i64) -> Result<Tag> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        Self::fetch_tag(&mut conn, id).await
    }

    async fn resolve(&self, names: &[String]) -> Result<Vec<Tag>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let tags = self.resolve_tx(&mut tx, names).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(tags)
    }

    async fn rename(&self, id: i64, name: &str) -> Result<Tag> {
        let name = canonical_tag_name(name)
            .ok_or_else(|| Error::InvalidInput("Tag name cannot be empty.".to_string()))?;
        max_len("Tag name", &name, TAG_NAME_MAX_LEN)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let current = Self::fetch_tag(&mut tx, id).await?;
        if current.name == name {
            tx.commit().await.map_err(Error::Database)?;
            return Ok(current);
        }

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM tag WHERE name = $1")
            .bind(&name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if taken.is_some() {
            return Err(Error::Conflict(
                "A tag with this name already exists.".to_string(),
            ));
        }

        let tag: Tag = sqlx::query_as("UPDATE tag SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(&name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Error::from_unique_violation(e, "A tag with this name already exists."))?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "tags",
            op = "rename",
            tag_id = id,
            from = %current.name,
            to = %tag.name,
            "Tag renamed"
        );
        Ok(tag)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let tag = Self::fetch_tag(&mut tx, id).await?;

        let note_count = Self::count_notes(&mut tx, id).await?;
        if note_count > 0 {
            debug!(
                subsystem = "database",
                component = "tags",
                op = "delete",
                tag_id = id,
                note_count,
                "Refusing to delete tag in use"
            );
            return Err(Error::TagInUse {
                name: tag.name,
                note_count,
            });
        }

        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                // A note picked up the tag after the count.
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    Error::TagInUse {
                        name: tag.name.clone(),
                        note_count: 1,
                    }
                }
                _ => Error::Database(e),
            })?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "tags",
            op = "delete",
            tag_id = id,
            "Tag deleted"
        );
        Ok(())
    }

    async fn note_count(&self, id: i64) -> Result<i64> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        Self::count_notes(&mut conn, id).await
    }

    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<Tag>> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        self.get_for_note_conn(&mut conn, note_id).await
    }
}
