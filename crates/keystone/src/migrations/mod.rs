//! Built-in schema steps of the channel store, one per version

mod channel_point;
mod forward_type;
mod update_index;

pub use channel_point::InvoiceChannelPoint;
pub use forward_type::ForwardEventTypeBackfill;
pub use update_index::NodeEdgeUpdateIndex;

use crate::codec::RecordCodec;
use crate::index_key::HexKey;
use crate::migration::Migration;
use crate::scanner::for_each_record;
use keystone_core::{BucketPath, BucketTxn, KeystoneError, Result};

/// Every built-in step, in version order
pub fn all() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(NodeEdgeUpdateIndex),
        Box::new(InvoiceChannelPoint),
        Box::new(ForwardEventTypeBackfill),
    ]
}

/// Create a bucket, reporting failure as a structural error naming it
pub(crate) fn ensure_bucket(txn: &mut dyn BucketTxn, path: &BucketPath) -> Result<()> {
    txn.create_bucket_if_absent(path).map_err(|e| match e {
        KeystoneError::Structural(_) => e,
        other => KeystoneError::Structural(format!("cannot create bucket {}: {}", path, other)),
    })
}

/// Rewrite every record of `path` from the `from` layout to the `to` layout
///
/// Nested buckets are skipped. `upgrade` fills in fields the old layout
/// lacked. Returns the number of records rewritten.
pub(crate) fn reencode_records<R, F>(
    txn: &mut dyn BucketTxn,
    path: &BucketPath,
    from: u32,
    to: u32,
    mut upgrade: F,
) -> Result<u64>
where
    R: RecordCodec,
    F: FnMut(&mut R),
{
    let stats = for_each_record(txn, path, None, |txn, key, value| {
        let mut record = R::decode(value, from)?;
        upgrade(&mut record);
        tracing::trace!("Re-encoding {} {}", R::RECORD, HexKey(key));
        txn.put(path, key, &record.encode(to)?)
    })?;
    Ok(stats.visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::LATEST_VERSION;
    use keystone_core::{BucketStore, MemoryStore};

    #[test]
    fn test_all_covers_every_version() {
        let versions: Vec<u32> = all().iter().map(|m| m.version()).collect();
        assert_eq!(versions, (1..=LATEST_VERSION).collect::<Vec<_>>());
    }

    #[test]
    fn test_ensure_bucket_blocked_by_leaf() {
        let store = MemoryStore::new();
        let mut txn = store.write_txn().unwrap();
        let top = BucketPath::root("graph-node");
        txn.create_bucket_if_absent(&top).unwrap();
        txn.put(&top, b"index", b"leaf").unwrap();

        let err = ensure_bucket(&mut txn, &top.child("index")).unwrap_err();
        assert!(matches!(err, KeystoneError::Structural(_)));
    }
}
