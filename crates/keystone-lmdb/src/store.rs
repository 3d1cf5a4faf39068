use keystone_core::{
    config::SyncMode,
    error::{KeystoneError, Result},
    traits::BucketStore,
    StoreConfig,
};
use lmdb::{Database, DatabaseFlags, Environment, EnvironmentFlags};
use std::path::{Path, PathBuf};

use crate::lmdb_err;
use crate::txn::LmdbTxn;

/// Name of the LMDB database holding every bucket entry
const BUCKETS_DB: &str = "buckets";

/// File LMDB keeps its data in, inside the store directory
const DATA_FILE: &str = "data.mdb";

/// LMDB-backed bucket store
pub struct LmdbBucketStore {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl LmdbBucketStore {
    /// Open (or create) a store in `cfg.path`
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        std::fs::create_dir_all(&cfg.path)?;

        let mut env_builder = Environment::new();
        env_builder.set_max_dbs(1);
        env_builder.set_map_size(cfg.map_size);
        env_builder.set_max_readers(cfg.max_readers);

        let mut flags = EnvironmentFlags::empty();
        match cfg.sync_mode {
            SyncMode::Full => {}
            SyncMode::NoMetaSync => {
                flags.insert(EnvironmentFlags::NO_META_SYNC);
            }
            SyncMode::NoSync => {
                flags.insert(EnvironmentFlags::NO_SYNC);
            }
        }
        env_builder.set_flags(flags);

        let env = env_builder
            .open(&cfg.path)
            .map_err(|e| KeystoneError::Io(std::io::Error::other(e)))?;

        let db = env
            .create_db(Some(BUCKETS_DB), DatabaseFlags::empty())
            .map_err(lmdb_err)?;

        tracing::debug!("Opened LMDB bucket store at {}", cfg.path.display());

        Ok(Self {
            env,
            db,
            path: cfg.path,
        })
    }

    /// Open a store that must already exist
    ///
    /// Unlike [`LmdbBucketStore::open`], never creates a directory or file.
    pub fn open_existing(cfg: StoreConfig) -> Result<Self> {
        if !Self::exists(&cfg.path) {
            return Err(KeystoneError::Config(format!(
                "no store at {}",
                cfg.path.display()
            )));
        }
        Self::open(cfg)
    }

    /// Whether `path` holds an LMDB store
    pub fn exists(path: &Path) -> bool {
        path.join(DATA_FILE).is_file()
    }

    /// Directory the store lives in
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BucketStore for LmdbBucketStore {
    type Txn<'a> = LmdbTxn<'a>;

    fn read_txn(&self) -> Result<Self::Txn<'_>> {
        let txn = self.env.begin_ro_txn().map_err(lmdb_err)?;
        Ok(LmdbTxn::read(txn, self.db))
    }

    fn write_txn(&self) -> Result<Self::Txn<'_>> {
        // Blocks until any other write transaction finishes
        let txn = self.env.begin_rw_txn().map_err(lmdb_err)?;
        Ok(LmdbTxn::write(txn, self.db))
    }
}
