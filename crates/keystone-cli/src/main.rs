//! Keystone CLI - Inspect and migrate keystone stores

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "keystone")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the database directory
    #[arg(short, long, default_value = "./data")]
    db_path: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migration management commands
    #[command(subcommand)]
    Migrate(MigrateCommands),

    /// Database information and status
    Status,
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// List all built-in migrations
    List,

    /// Show migration history
    History,

    /// Show pending migrations
    Pending,

    /// Run pending migrations
    Run {
        /// Dry run - show what would be migrated without applying
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Migrate(migrate_cmd) => {
            commands::migrate::execute(cli.db_path, migrate_cmd)?;
        }
        Commands::Status => {
            commands::status::execute(cli.db_path)?;
        }
    }

    Ok(())
}
