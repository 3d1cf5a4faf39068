//! Migration command implementations

use anyhow::{Context, Result};
use keystone::prelude::*;
use std::path::PathBuf;

pub fn execute(db_path: PathBuf, command: crate::MigrateCommands) -> Result<()> {
    match command {
        crate::MigrateCommands::List => {
            list_migrations()?;
        }
        crate::MigrateCommands::History => {
            show_history(db_path)?;
        }
        crate::MigrateCommands::Pending => {
            show_pending(db_path)?;
        }
        crate::MigrateCommands::Run { dry_run } => {
            run_migrations(db_path, dry_run)?;
        }
    }

    Ok(())
}

fn list_migrations() -> Result<()> {
    let manager = MigrationManager::with_defaults();
    let migrations = manager.list();

    println!("\nRegistered Migrations:");
    println!("{:<10} Name", "Version");
    println!("{}", "=".repeat(60));

    for migration in &migrations {
        println!("{:<10} {}", migration.version, migration.name);
    }

    println!("\nTotal: {} migration(s)", migrations.len());

    Ok(())
}

fn show_history(db_path: PathBuf) -> Result<()> {
    let db = super::open_db(&db_path)?;

    let history = db.history().context("Failed to get migration history")?;

    if history.is_empty() {
        println!("No migrations have been applied yet");
    } else {
        println!("\nMigration History:");
        println!("{:<10} {:<30} Applied At", "Version", "Name");
        println!("{}", "=".repeat(80));

        for entry in history {
            println!(
                "{:<10} {:<30} {}",
                entry.version, entry.name, entry.applied_at
            );
        }
    }

    let current_version = db
        .schema_version()
        .context("Failed to get schema version")?;
    println!("\nCurrent schema version: {}", current_version);

    Ok(())
}

fn show_pending(db_path: PathBuf) -> Result<()> {
    let db = super::open_db(&db_path)?;

    let pending = db.pending().context("Failed to get pending migrations")?;

    if pending.is_empty() {
        println!("No pending migrations - database is up to date");
        return Ok(());
    }

    println!("\nPending Migrations:");
    println!("{:<10} Name", "Version");
    println!("{}", "=".repeat(60));

    for migration in &pending {
        println!("{:<10} {}", migration.version, migration.name);
    }

    println!("\nTotal: {} pending migration(s)", pending.len());

    Ok(())
}

fn run_migrations(db_path: PathBuf, dry_run: bool) -> Result<()> {
    let latest = MigrationManager::with_defaults().latest_version();

    if !LmdbBucketStore::exists(&db_path) {
        if dry_run {
            println!(
                "[DRY RUN] Would create a new store at {} (schema v{})",
                db_path.display(),
                latest
            );
            return Ok(());
        }
        KeystoneDb::create(StoreConfig::new(db_path.clone()))
            .with_context(|| format!("Failed to create database at {}", db_path.display()))?;
        println!("✓ Created new store at schema v{}", latest);
        return Ok(());
    }

    let db = super::open_db(&db_path)?;

    if db.is_fresh().context("Failed to inspect database")? {
        if dry_run {
            println!("[DRY RUN] Would lay out the empty store at schema v{}", latest);
            return Ok(());
        }
        db.initialize_if_fresh()
            .context("Failed to initialize database")?;
        println!("✓ Initialized empty store at schema v{}", latest);
        return Ok(());
    }

    let pending = db.pending().context("Failed to get pending migrations")?;

    if pending.is_empty() {
        println!("No pending migrations - database is up to date");
        return Ok(());
    }

    println!("\nPending Migrations:");
    for migration in &pending {
        println!("  v{}: {}", migration.version, migration.name);
    }

    if dry_run {
        println!("\n[DRY RUN] Would apply {} migration(s)", pending.len());
        return Ok(());
    }

    println!("\nApplying {} migration(s)...", pending.len());

    let report = db.migrate().context("Failed to run migrations")?;

    if report.to_version < db.migrations().latest_version() {
        println!(
            "⚠️  Stopped at v{}; later migrations are not contiguous",
            report.to_version
        );
    } else {
        println!("✓ All migrations applied successfully");
    }
    println!(
        "Schema version: v{} -> v{}",
        report.from_version, report.to_version
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_creates_fresh_store_at_latest() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");

        run_migrations(db_path.clone(), false).unwrap();

        let db = crate::commands::open_db(&db_path).unwrap();
        assert_eq!(db.schema_version().unwrap(), LATEST_VERSION);
        assert!(db.history().unwrap().is_empty());
        assert!(db.pending().unwrap().is_empty());
        let txn = db.store().read_txn().unwrap();
        for name in schema::TOP_LEVEL_BUCKETS {
            assert!(txn.bucket_exists(&BucketPath::root(name)).unwrap());
        }
    }

    #[test]
    fn test_dry_run_leaves_missing_path_alone() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");

        run_migrations(db_path.clone(), true).unwrap();
        assert!(!db_path.exists());
    }

    #[test]
    fn test_read_only_commands_refuse_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");

        assert!(show_pending(db_path.clone()).is_err());
        assert!(show_history(db_path.clone()).is_err());
        assert!(crate::commands::status::execute(db_path.clone()).is_err());
        assert!(!db_path.exists());
    }

    #[test]
    fn test_run_is_noop_once_current() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("db");

        run_migrations(db_path.clone(), false).unwrap();
        run_migrations(db_path.clone(), false).unwrap();

        let db = crate::commands::open_db(&db_path).unwrap();
        assert_eq!(db.schema_version().unwrap(), LATEST_VERSION);
        assert!(db.history().unwrap().is_empty());
    }
}
