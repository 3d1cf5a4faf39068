//! Keystone Core: Traits and types for the keystone bucket store
//!
//! This crate defines the abstractions the migration engine is written
//! against:
//! - Bucket store: transactional, nested, byte-keyed buckets
//! - Bucket transactions: all-or-nothing writes with an exclusive writer
//! - An in-memory store for tests and tooling
//! - A shared error taxonomy (structural, decode, encode)

pub mod config;
pub mod error;
pub mod memory;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{StoreConfig, SyncMode};
pub use error::{DecodeErrorKind, KeystoneError, Result};
pub use memory::{MemoryBucket, MemoryNode, MemoryStore, MemoryTxn};
pub use traits::{BucketStore, BucketTxn};
pub use types::{BucketEntry, BucketPath};
