//! Songbook - command-line song list manager

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use songbook::cli::{self, Cli};
use songbook::config::Settings;
use songbook::{Database, SongService};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    match run(args).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> anyhow::Result<String> {
    let mut settings = match &args.config {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::load()?,
    };
    if let Some(path) = args.database {
        settings.database_path = Some(path);
    }

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let db_path = settings.resolved_database_path();
    tracing::debug!("Using database at: {}", db_path.display());
    let db = Database::new(&db_path, settings.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    let service = SongService::new(Arc::new(db));
    let output = cli::run(&service, args.command, args.json).await?;
    Ok(output)
}
