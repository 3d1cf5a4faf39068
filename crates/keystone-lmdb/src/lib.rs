//! LMDB-backed bucket store implementation
//!
//! Provides nested, byte-keyed buckets on top of a single LMDB database.
//!
//! Key features:
//! - Atomic commits across every bucket touched by a transaction
//! - Order-preserving path encoding, so bucket scans come back in key order
//! - Single-writer semantics (enforced by LMDB's write lock)
//! - Read transactions that never block the writer

pub mod keys;
pub mod store;
pub mod txn;

pub use store::LmdbBucketStore;
pub use txn::LmdbTxn;

pub(crate) fn lmdb_err(e: lmdb::Error) -> keystone_core::KeystoneError {
    keystone_core::KeystoneError::Transaction(e.to_string())
}
