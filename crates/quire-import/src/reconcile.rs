//! Create-or-update of imported notes, keyed by source path.

use sqlx::pool::PoolConnection;
use sqlx::{Pool, Postgres, Transaction};
use tracing::trace;
use uuid::Uuid;

use quire_core::{CreateNoteRequest, Error, ImportAction, Result};
use quire_db::notes::PgNoteRepository;
use quire_db::tags::PgTagRepository;

use crate::sources::ImportItem;

/// Store access for one import batch.
///
/// A dry run only ever reads, through a plain pooled connection, so nothing
/// can persist. A write batch holds one transaction committed by [`finish`].
///
/// [`finish`]: ImportSession::finish
pub enum ImportSession {
    DryRun(PoolConnection<Postgres>),
    Write(Transaction<'static, Postgres>),
}

impl ImportSession {
    pub async fn begin(pool: &Pool<Postgres>, dry_run: bool) -> Result<Self> {
        if dry_run {
            Ok(Self::DryRun(pool.acquire().await.map_err(Error::Database)?))
        } else {
            Ok(Self::Write(pool.begin().await.map_err(Error::Database)?))
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun(_))
    }

    /// Commit a write batch. A dry run releases its connection untouched.
    pub async fn finish(self) -> Result<()> {
        match self {
            Self::DryRun(_) => Ok(()),
            Self::Write(tx) => tx.commit().await.map_err(Error::Database),
        }
    }
}

/// What happened (or would happen) to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub action: ImportAction,
    /// The affected note. `None` for a dry-run create.
    pub note_id: Option<Uuid>,
}

/// Matches import items to existing notes by exact source path.
pub struct ImportReconciler<'a> {
    notes: &'a PgNoteRepository,
    tags: &'a PgTagRepository,
    actor: Uuid,
}

impl<'a> ImportReconciler<'a> {
    pub fn new(notes: &'a PgNoteRepository, tags: &'a PgTagRepository, actor: Uuid) -> Self {
        Self { notes, tags, actor }
    }

    /// Create the item's note, or overwrite the note previously imported
    /// from the same source.
    ///
    /// On update, title and body are replaced. The tag set is replaced only
    /// when the item carries tags.
    pub async fn reconcile(
        &self,
        session: &mut ImportSession,
        item: &ImportItem,
    ) -> Result<ReconcileOutcome> {
        let tx = match session {
            ImportSession::DryRun(conn) => {
                let existing = self.notes.find_by_source(&mut **conn, &item.source).await?;
                return Ok(classify(existing));
            }
            ImportSession::Write(tx) => tx,
        };

        let existing = self.notes.find_by_source(&mut **tx, &item.source).await?;
        let outcome = match existing {
            Some(id) => {
                self.notes
                    .update_content_tx(tx, id, &item.title, &item.body, self.actor)
                    .await?;
                if let Some(names) = &item.tags {
                    let tags = self.tags.resolve_tx(tx, names).await?;
                    self.notes.set_tags_tx(tx, id, &tags).await?;
                }
                ReconcileOutcome {
                    action: ImportAction::Updated,
                    note_id: Some(id),
                }
            }
            None => {
                let req = CreateNoteRequest {
                    title: item.title.clone(),
                    body: item.body.clone(),
                    source: Some(item.source.clone()),
                    ..Default::default()
                };
                let names = item.tags.as_deref().unwrap_or_default();
                let id = self.notes.insert_tx(tx, &req, names, self.actor).await?;
                ReconcileOutcome {
                    action: ImportAction::Created,
                    note_id: Some(id),
                }
            }
        };

        trace!(
            subsystem = "import",
            component = "reconciler",
            op = "reconcile",
            source_path = %item.source,
            action = %outcome.action,
            "Item reconciled"
        );
        Ok(outcome)
    }
}

fn classify(existing: Option<Uuid>) -> ReconcileOutcome {
    match existing {
        Some(id) => ReconcileOutcome {
            action: ImportAction::Updated,
            note_id: Some(id),
        },
        None => ReconcileOutcome {
            action: ImportAction::Created,
            note_id: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let id = Uuid::new_v4();
        assert_eq!(
            classify(Some(id)),
            ReconcileOutcome {
                action: ImportAction::Updated,
                note_id: Some(id)
            }
        );
        assert_eq!(classify(None).action, ImportAction::Created);
        assert_eq!(classify(None).note_id, None);
    }
}
