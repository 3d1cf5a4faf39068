//! Unified keystone database interface
//!
//! Opening a database brings it to the latest schema: a fresh store is laid
//! out at the latest version directly, an existing one is migrated forward.
//! [`KeystoneDb::create`] only ever lays out a new store, and
//! [`KeystoneDb::open_unmigrated`] only ever opens one that already exists.

use crate::migration::{MigrationInfo, MigrationManager, MigrationReport};
use crate::schema;
use crate::version::{self, HistoryEntry};
use keystone_core::{BucketStore, BucketTxn, KeystoneError, Result, StoreConfig};
use keystone_lmdb::LmdbBucketStore;
use std::path::Path;
use std::sync::Arc;

/// Keystone database
///
/// Bundles a bucket store with the migrations that define its schema.
pub struct KeystoneDb<S: BucketStore = LmdbBucketStore> {
    store: Arc<S>,
    migrations: MigrationManager,
}

impl KeystoneDb<LmdbBucketStore> {
    /// Open a keystone database at the given path, migrating it if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref().to_path_buf()))
    }

    /// Open with a custom store configuration
    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        let store = LmdbBucketStore::open(config)?;
        Self::with_store(store)
    }

    /// Create a new store at the latest schema version
    ///
    /// Fails if the store at `config.path` already holds data.
    pub fn create(config: StoreConfig) -> Result<Self> {
        let store = LmdbBucketStore::open(config)?;
        Self::create_with_store(store)
    }

    /// Open an existing store without initializing or migrating
    ///
    /// For inspection tools that must not change the store. A path with no
    /// store is a [`KeystoneError::Config`] error and is left untouched.
    pub fn open_unmigrated(config: StoreConfig) -> Result<Self> {
        let store = LmdbBucketStore::open_existing(config)?;
        Ok(Self {
            store: Arc::new(store),
            migrations: MigrationManager::with_defaults(),
        })
    }
}

impl<S: BucketStore> KeystoneDb<S> {
    /// Wrap an already opened store and bring it to the latest schema
    pub fn with_store(store: S) -> Result<Self> {
        Self::with_migrations(store, MigrationManager::with_defaults())
    }

    /// Like [`KeystoneDb::with_store`], with a custom set of migrations
    pub fn with_migrations(store: S, migrations: MigrationManager) -> Result<Self> {
        let db = Self {
            store: Arc::new(store),
            migrations,
        };

        if db.initialize_if_fresh()? {
            return Ok(db);
        }
        db.migrate()?;
        Ok(db)
    }

    /// Lay out an empty store at the latest version, skipping every migration
    pub fn create_with_store(store: S) -> Result<Self> {
        let db = Self {
            store: Arc::new(store),
            migrations: MigrationManager::with_defaults(),
        };
        if !db.initialize_if_fresh()? {
            return Err(KeystoneError::InvalidState(
                "store already holds data".to_string(),
            ));
        }
        Ok(db)
    }

    /// Get reference to the underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn migrations(&self) -> &MigrationManager {
        &self.migrations
    }

    /// Schema version recorded in the store
    pub fn schema_version(&self) -> Result<u32> {
        let txn = self.store.read_txn()?;
        version::read_version(&txn)
    }

    /// Run pending migrations
    pub fn migrate(&self) -> Result<MigrationReport> {
        self.migrations.run(&*self.store)
    }

    pub fn pending(&self) -> Result<Vec<MigrationInfo>> {
        self.migrations.pending(&*self.store)
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        self.migrations.history(&*self.store)
    }

    /// True if none of the top-level buckets exist yet
    pub fn is_fresh(&self) -> Result<bool> {
        let txn = self.store.read_txn()?;
        is_fresh(&txn)
    }

    /// Lay out an empty store at the latest version
    ///
    /// Returns false, without writing, if the store already holds data.
    pub fn initialize_if_fresh(&self) -> Result<bool> {
        let mut txn = self.store.write_txn()?;
        if !is_fresh(&txn)? {
            txn.abort();
            return Ok(false);
        }

        let latest = self.migrations.latest_version();
        tracing::info!("Creating new store at schema v{}", latest);
        create_layout(&mut txn)?;
        version::write_version(&mut txn, latest)?;
        txn.commit()?;
        Ok(true)
    }
}

fn is_fresh(txn: &dyn BucketTxn) -> Result<bool> {
    for name in schema::TOP_LEVEL_BUCKETS {
        if txn.bucket_exists(&keystone_core::BucketPath::root(name))? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn create_layout(txn: &mut dyn BucketTxn) -> Result<()> {
    for name in schema::TOP_LEVEL_BUCKETS {
        txn.create_bucket_if_absent(&keystone_core::BucketPath::root(name))?;
    }
    txn.create_bucket_if_absent(&schema::node_update_index())?;
    txn.create_bucket_if_absent(&schema::edge_update_index())?;
    txn.create_bucket_if_absent(&schema::history_bucket())
}
