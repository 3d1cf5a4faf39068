pub mod migrate;
pub mod status;

use anyhow::{Context, Result};
use keystone::{KeystoneDb, StoreConfig};
use std::path::Path;

/// Open a store as it is on disk, without initializing or migrating it
pub fn open_db(db_path: &Path) -> Result<KeystoneDb> {
    KeystoneDb::open_unmigrated(StoreConfig::new(db_path.to_path_buf()))
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}
