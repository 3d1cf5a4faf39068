//! Keystone Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use keystone::prelude::*;
//! ```

// Core types
pub use crate::{BucketEntry, BucketPath, DecodeErrorKind, KeystoneDb, KeystoneError, Result};

// Configs
pub use crate::{StoreConfig, SyncMode};

// Traits
pub use crate::{BucketStore, BucketTxn, RecordCodec};

// Implementations
pub use crate::{LmdbBucketStore, MemoryStore};

// Migrations
pub use crate::{HistoryEntry, Migration, MigrationManager, MigrationReport, LATEST_VERSION};

// Indexes
pub use crate::schema;
pub use crate::{updates_in_range, UpdateIndexKey};

// Re-export common external deps
pub use anyhow;
pub use std::sync::Arc;
pub use tracing;
