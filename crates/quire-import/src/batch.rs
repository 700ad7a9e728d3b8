//! Running a whole import over a directory tree.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use quire_core::{Error, ImportAction, Result};
use quire_db::Database;

use crate::actor::resolve_actor;
use crate::reconcile::{ImportReconciler, ImportSession};
use crate::sources::{discover, ImportSource};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Directory to walk.
    pub root: PathBuf,
    /// Classify only; persist nothing.
    pub dry_run: bool,
    /// Attribute notes to this user instead of the first administrator.
    pub user_id: Option<Uuid>,
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Files read and reconciled.
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    /// Files that could not be read.
    pub skipped: usize,
}

impl ImportSummary {
    fn record(&mut self, action: ImportAction) {
        self.processed += 1;
        match action {
            ImportAction::Created => self.created += 1,
            ImportAction::Updated => self.updated += 1,
        }
    }
}

/// Import every matching file under `options.root`.
///
/// Files are processed one at a time in path order. Unreadable files are
/// skipped; any other failure aborts the batch. A write batch commits once,
/// after the last file.
pub async fn run_import(
    db: &Database,
    source: &dyn ImportSource,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let start = Instant::now();
    let actor = resolve_actor(&db.users, options.user_id).await?;

    if !options.root.exists() {
        return Err(Error::InvalidInput(format!(
            "Path does not exist: {}",
            options.root.display()
        )));
    }
    let root = options.root.canonicalize().map_err(Error::Io)?;

    info!(
        subsystem = "import",
        component = "batch",
        op = "run_import",
        importer = source.name(),
        root = %root.display(),
        user_id = %actor.id,
        dry_run = options.dry_run,
        "Import started"
    );

    let reconciler = ImportReconciler::new(&db.notes, &db.tags, actor.id);
    let mut session = ImportSession::begin(db.pool(), options.dry_run).await?;
    let mut summary = ImportSummary::default();

    for path in discover(&root, source.extensions()) {
        let item = match source.read(&root, &path) {
            Ok(item) => item,
            Err(e @ Error::UnreadableSource { .. }) => {
                warn!(
                    subsystem = "import",
                    component = "batch",
                    source_path = %path.display(),
                    error = %e,
                    "Skipping unreadable file"
                );
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let outcome = reconciler.reconcile(&mut session, &item).await?;
        summary.record(outcome.action);

        let verb = match (session.is_dry_run(), outcome.action) {
            (true, ImportAction::Created) => "Would create",
            (true, ImportAction::Updated) => "Would update",
            (false, ImportAction::Created) => "Created",
            (false, ImportAction::Updated) => "Updated",
        };
        info!(
            subsystem = "import",
            component = "batch",
            source_path = %item.source,
            title = %item.title,
            "{} note",
            verb
        );
    }

    session.finish().await?;

    info!(
        subsystem = "import",
        component = "batch",
        op = "run_import",
        processed = summary.processed,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        dry_run = options.dry_run,
        duration_ms = start.elapsed().as_millis() as u64,
        "Import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_record() {
        let mut summary = ImportSummary::default();
        summary.record(ImportAction::Created);
        summary.record(ImportAction::Created);
        summary.record(ImportAction::Updated);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = ImportSummary {
            processed: 2,
            created: 1,
            updated: 1,
            skipped: 1,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["processed"], 2);
    }
}
