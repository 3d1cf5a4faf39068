//! Keystone: versioned schema migrations for a nested-bucket channel store
//!
//! Keystone keeps a channel store's on-disk schema current:
//! - **Record codecs**: node, edge policy, invoice, payment and forwarding
//!   event layouts, parameterized by schema version
//! - **Update indexes**: time-ordered secondary indexes over nodes and edges
//! - **Migrations**: one transactional step per schema version, tracked by a
//!   persisted version marker and history
//!
//! # Quick Start
//!
//! ```no_run
//! use keystone::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // Opening migrates the store to the latest schema
//! let db = KeystoneDb::open("./data")?;
//! assert_eq!(db.schema_version()?, LATEST_VERSION);
//!
//! // Nodes updated during the first hour of 2019
//! let txn = db.store().read_txn()?;
//! let recent = updates_in_range(&txn, &schema::node_update_index(), 1_546_300_800, 1_546_304_400)?;
//! println!("{} nodes", recent.len());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod db;
pub mod index_key;
pub mod migration;
pub mod migrations;
pub mod prelude;
pub mod scanner;
pub mod schema;
pub mod version;

// Re-export core types
pub use keystone_core::{
    config::{StoreConfig, SyncMode},
    error::{DecodeErrorKind, KeystoneError, Result},
    traits::{BucketStore, BucketTxn},
    types::{BucketEntry, BucketPath},
    MemoryStore,
};

// Re-export implementations
pub use keystone_lmdb::LmdbBucketStore;

// Re-export main types from this crate
pub use codec::RecordCodec;
pub use db::KeystoneDb;
pub use index_key::{updates_in_range, UpdateIndexKey};
pub use migration::{Migration, MigrationInfo, MigrationManager, MigrationReport};
pub use scanner::{for_each_entry, for_each_record, ScanStats};
pub use version::{HistoryEntry, LATEST_VERSION};
