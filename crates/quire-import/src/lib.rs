//! # quire-import
//!
//! Bulk import of external files into quire notes.
//!
//! Each file is matched to a previously imported note by its canonical
//! absolute path and either updates that note or creates a new one. A batch
//! runs in a single transaction, or reads only when it is a dry run.
//!
//! ```rust,ignore
//! use quire_import::{run_import, ImportOptions, TextFileSource};
//!
//! let source = TextFileSource::new(true, "imported");
//! let options = ImportOptions { root: "/data/notes".into(), dry_run: true, user_id: None };
//! let summary = run_import(&db, &source, &options).await?;
//! println!("{} would be created", summary.created);
//! ```

pub mod actor;
pub mod batch;
pub mod reconcile;
pub mod sources;

pub use actor::resolve_actor;
pub use batch::{run_import, ImportOptions, ImportSummary};
pub use reconcile::{ImportReconciler, ImportSession, ReconcileOutcome};
pub use sources::{discover, ImportItem, ImportSource, OneNoteHtmlSource, TextFileSource};
