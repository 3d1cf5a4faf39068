//! Status command implementation

use anyhow::{Context, Result};
use keystone::prelude::*;
use std::path::PathBuf;

pub fn execute(db_path: PathBuf) -> Result<()> {
    tracing::info!("Checking database status: {}", db_path.display());

    let db = super::open_db(&db_path)?;

    println!("\nDatabase Status");
    println!("{}", "=".repeat(60));
    println!("Path: {}", db_path.display());

    let schema_version = db
        .schema_version()
        .context("Failed to get schema version")?;
    println!("Schema Version: {}", schema_version);
    println!("Latest Version: {}", db.migrations().latest_version());

    let buckets = {
        let txn = db.store().read_txn().context("Failed to begin read")?;
        txn.top_level_buckets()
            .context("Failed to list buckets")?
    };
    println!("\nBuckets:");
    if buckets.is_empty() {
        println!("  (none)");
    }
    for bucket in &buckets {
        println!("  {}", BucketPath::root(&bucket.key));
    }

    if schema_version > db.migrations().latest_version() {
        println!(
            "\n⚠️  Store is newer than this tool (v{}); upgrade keystone",
            schema_version
        );
        return Ok(());
    }

    let pending = db.pending().context("Failed to get pending migrations")?;
    if pending.is_empty() {
        println!("\n✓ Schema is up to date");
    } else {
        println!("\n⚠️  {} pending migration(s)", pending.len());
        println!("Run 'keystone migrate run' to apply them");
    }

    Ok(())
}
