//! Keys of the update-time indexes
//!
//! An index key is `update time (8 bytes, big-endian) || identity`, with an
//! empty value: the key's presence is the whole entry. Big-endian timestamps
//! make byte order and chronological order agree, so a key-ordered scan of an
//! index visits records from least to most recently updated.

use crate::codec::NODE_PUB_KEY_LEN;
use keystone_core::{BucketPath, BucketTxn, Result};
use std::fmt;

pub const TIMESTAMP_LEN: usize = 8;

/// `update time || node pub key`
pub fn node_update_index_key(
    update_time: [u8; TIMESTAMP_LEN],
    pub_key: &[u8; NODE_PUB_KEY_LEN],
) -> [u8; TIMESTAMP_LEN + NODE_PUB_KEY_LEN] {
    let mut key = [0u8; TIMESTAMP_LEN + NODE_PUB_KEY_LEN];
    key[..TIMESTAMP_LEN].copy_from_slice(&update_time);
    key[TIMESTAMP_LEN..].copy_from_slice(pub_key);
    key
}

/// `update time || channel id`
pub fn edge_update_index_key(update_time: u64, channel_id: [u8; 8]) -> [u8; TIMESTAMP_LEN + 8] {
    let mut key = [0u8; TIMESTAMP_LEN + 8];
    key[..TIMESTAMP_LEN].copy_from_slice(&update_time.to_be_bytes());
    key[TIMESTAMP_LEN..].copy_from_slice(&channel_id);
    key
}

/// An index key split back into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateIndexKey<'a> {
    pub update_time: u64,
    pub identity: &'a [u8],
}

impl<'a> UpdateIndexKey<'a> {
    /// `None` if the key is too short to carry a timestamp
    pub fn parse(key: &'a [u8]) -> Option<Self> {
        if key.len() < TIMESTAMP_LEN {
            return None;
        }
        let (ts, identity) = key.split_at(TIMESTAMP_LEN);
        Some(Self {
            update_time: u64::from_be_bytes(ts.try_into().ok()?),
            identity,
        })
    }
}

/// Identities updated within `[start, end]`, oldest first
///
/// Seeks to `start` and stops at the first key past `end`, so the cost
/// follows the size of the window rather than the index.
pub fn updates_in_range(
    txn: &dyn BucketTxn,
    index: &BucketPath,
    start: u64,
    end: u64,
) -> Result<Vec<(u64, Vec<u8>)>> {
    if start > end {
        return Ok(Vec::new());
    }
    let lower = start.to_be_bytes();
    let upper = end.checked_add(1).map(u64::to_be_bytes);

    let mut found = Vec::new();
    for entry in txn.entries_in_range(index, &lower, upper.as_ref().map(|u| &u[..]))? {
        if entry.is_bucket() {
            continue;
        }
        if let Some(key) = UpdateIndexKey::parse(&entry.key) {
            found.push((key.update_time, key.identity.to_vec()));
        }
    }
    Ok(found)
}

/// Lowercase hex rendering of a key, for log lines
pub(crate) struct HexKey<'a>(pub &'a [u8]);

impl fmt::Display for HexKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
