//! Bucket scans for migration steps
//!
//! A scan first snapshots the bucket's direct children, then hands each one
//! to the visitor together with the live transaction. Because the key set is
//! buffered up front, the visitor may overwrite the entry it is visiting (or
//! write to other buckets) without disturbing the walk. Every entry present
//! when the scan started is visited exactly once; entries added during the
//! scan are not visited.

use keystone_core::{BucketPath, BucketTxn, Result};

/// Counts reported by [`for_each_record`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Records handed to the visitor
    pub visited: u64,
    /// Nested buckets and keys of the wrong width
    pub skipped: u64,
}

/// Visit every direct child of `path` in key order
///
/// `value` is `None` for nested buckets. Returns how many entries were
/// visited. The first visitor error stops the scan and is returned as is.
pub fn for_each_entry<F>(txn: &mut dyn BucketTxn, path: &BucketPath, mut visit: F) -> Result<u64>
where
    F: FnMut(&mut dyn BucketTxn, &[u8], Option<&[u8]>) -> Result<()>,
{
    let entries = txn.entries(path)?;
    let mut visited = 0;
    for entry in &entries {
        visit(&mut *txn, &entry.key, entry.value.as_deref())?;
        visited += 1;
    }
    Ok(visited)
}

/// Visit the leaf records of `path`, skipping nested buckets
///
/// With `key_len` set, keys of any other width are skipped too: buckets mix
/// records with bookkeeping keys and sub-buckets whose names are shorter or
/// longer than a record key.
pub fn for_each_record<F>(
    txn: &mut dyn BucketTxn,
    path: &BucketPath,
    key_len: Option<usize>,
    mut visit: F,
) -> Result<ScanStats>
where
    F: FnMut(&mut dyn BucketTxn, &[u8], &[u8]) -> Result<()>,
{
    let mut stats = ScanStats::default();
    for_each_entry(txn, path, |txn, key, value| {
        if key_len.is_some_and(|len| key.len() != len) {
            stats.skipped += 1;
            return Ok(());
        }
        let Some(value) = value else {
            stats.skipped += 1;
            return Ok(());
        };
        visit(txn, key, value)?;
        stats.visited += 1;
        Ok(())
    })?;
    Ok(stats)
}
