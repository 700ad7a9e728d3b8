//! quire: administrative command-line tool.
//!
//! Creates administrator accounts, applies migrations and imports text,
//! Markdown or OneNote HTML exports into the knowledge base.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use quire_core::defaults::DEFAULT_DATABASE_URL;
use quire_db::{Database, PoolConfig};
use quire_import::{
    run_import, ImportOptions, ImportSource, ImportSummary, OneNoteHtmlSource, TextFileSource,
};

#[derive(Parser)]
#[command(name = "quire")]
#[command(author, version, about = "Administration and bulk import for quire")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator, or promote and reset an existing account
    CreateAdmin {
        /// Account email
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Password (min 6 characters)
        #[arg(long)]
        password: String,
    },

    /// Import .txt and .md files from a directory tree
    ImportFiles {
        /// Directory to import
        #[arg(long)]
        path: PathBuf,

        /// Tag notes with the folder names between the root and the file
        #[arg(long)]
        tag_from_folders: bool,

        /// Comma-separated tags applied to every note
        #[arg(long, default_value = "")]
        default_tags: String,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// User to attribute notes to (default: first administrator)
        #[arg(long)]
        user_id: Option<Uuid>,
    },

    /// Import a OneNote HTML export
    ImportOnenote {
        /// Directory containing the exported .html pages
        #[arg(long)]
        path: PathBuf,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// User to attribute notes to (default: first administrator)
        #[arg(long)]
        user_id: Option<Uuid>,
    },

    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "quire_import=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn connect() -> anyhow::Result<Database> {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    Database::connect_with_config(&url, PoolConfig::from_env().max_connections(2))
        .await
        .context("Failed to connect to database")
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::CreateAdmin {
            email,
            name,
            password,
        } => {
            let db = connect().await?;
            let (user, created) = db.users.upsert_admin(&email, &name, &password).await?;
            if created {
                println!("Created admin user {} ({})", user.email, user.id);
            } else {
                println!("Updated existing user {} to admin ({})", user.email, user.id);
            }
        }

        Commands::ImportFiles {
            path,
            tag_from_folders,
            default_tags,
            dry_run,
            user_id,
        } => {
            let source = TextFileSource::new(tag_from_folders, &default_tags);
            import(&source, path, dry_run, user_id).await?;
        }

        Commands::ImportOnenote {
            path,
            dry_run,
            user_id,
        } => {
            import(&OneNoteHtmlSource, path, dry_run, user_id).await?;
        }

        Commands::Migrate => {
            let db = connect().await?;
            db.migrate().await.context("Migration failed")?;
            println!("Migrations applied");
        }
    }

    Ok(())
}

async fn import(
    source: &dyn ImportSource,
    root: PathBuf,
    dry_run: bool,
    user_id: Option<Uuid>,
) -> anyhow::Result<()> {
    let db = connect().await?;
    let options = ImportOptions {
        root,
        dry_run,
        user_id,
    };
    let summary = run_import(&db, source, &options).await?;
    print_summary(&summary, dry_run);
    Ok(())
}

fn print_summary(summary: &ImportSummary, dry_run: bool) {
    let prefix = if dry_run { "[dry run] " } else { "" };
    println!(
        "{}Processed {} file(s): {} created, {} updated, {} skipped",
        prefix, summary.processed, summary.created, summary.updated, summary.skipped
    );
}
