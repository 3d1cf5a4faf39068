use crate::error::Result;
use crate::types::{BucketEntry, BucketPath};

/// Transaction over a store of nested, byte-keyed buckets
///
/// Migration steps only ever see `&mut dyn BucketTxn`; commit and abort stay
/// with whoever opened the transaction.
///
/// Note: Not required to be Send, as some backends (LMDB) have thread-affine transactions
pub trait BucketTxn {
    /// Whether this transaction rejects writes
    fn is_read_only(&self) -> bool;

    /// Check whether a bucket exists
    fn bucket_exists(&self, path: &BucketPath) -> Result<bool>;

    /// Create the bucket named by the last segment of `path`
    ///
    /// The parent must already exist. Fails if the name is taken by a leaf.
    /// Existing buckets are left untouched.
    fn create_bucket_if_absent(&mut self, path: &BucketPath) -> Result<()>;

    /// Read a leaf value
    ///
    /// Returns `None` for missing keys and for keys naming a nested bucket.
    fn get(&self, path: &BucketPath, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite a leaf value
    fn put(&mut self, path: &BucketPath, key: &[u8], value: &[u8]) -> Result<()>;

    /// Snapshot the direct children of a bucket in key order
    ///
    /// Nested buckets appear with a `None` value; their contents are not
    /// included. The result is detached from the transaction, so callers may
    /// write while walking it.
    fn entries(&self, path: &BucketPath) -> Result<Vec<BucketEntry>>;

    /// Like [`BucketTxn::entries`], limited to keys in `start..end`
    ///
    /// `end` is exclusive; `None` runs to the end of the bucket. Engines seek
    /// to `start` instead of walking the whole bucket.
    fn entries_in_range(
        &self,
        path: &BucketPath,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<Vec<BucketEntry>>;

    /// Commit all writes atomically
    fn commit(self) -> Result<()>
    where
        Self: Sized;

    /// Discard all writes
    fn abort(self)
    where
        Self: Sized;
}

/// Transactional bucket store
///
/// Write transactions are exclusive: at most one is open at a time, and
/// nothing it writes is visible to readers until it commits.
pub trait BucketStore: Send + Sync {
    type Txn<'a>: BucketTxn
    where
        Self: 'a;

    /// Begin a read-only transaction
    fn read_txn(&self) -> Result<Self::Txn<'_>>;

    /// Begin a write transaction
    fn write_txn(&self) -> Result<Self::Txn<'_>>;
}
