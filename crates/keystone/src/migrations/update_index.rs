//! v1: populate the node and edge update-time indexes
//!
//! Node timestamps are read straight from the first eight bytes of each
//! encoded node. Edge policies carry their timestamp after a variable-length
//! signature, so every policy is decoded in full.

use super::ensure_bucket;
use crate::codec::{self, EdgePolicy, RecordCodec, EDGE_KEY_LEN, NODE_PUB_KEY_LEN};
use crate::index_key::{edge_update_index_key, node_update_index_key, HexKey};
use crate::migration::Migration;
use crate::scanner::for_each_record;
use crate::schema;
use crate::version::{BASE_VERSION, NODE_EDGE_UPDATE_INDEX_VERSION};
use keystone_core::{observe, BucketTxn, KeystoneError, Result};

pub struct NodeEdgeUpdateIndex;

impl Migration for NodeEdgeUpdateIndex {
    fn version(&self) -> u32 {
        NODE_EDGE_UPDATE_INDEX_VERSION
    }

    fn name(&self) -> &str {
        "node_edge_update_index"
    }

    fn apply(&self, txn: &mut dyn BucketTxn) -> Result<()> {
        let nodes = schema::node_bucket();
        let node_index = schema::node_update_index();
        let edges = schema::edge_bucket();
        let edge_index = schema::edge_update_index();

        ensure_bucket(txn, &nodes)?;
        ensure_bucket(txn, &node_index)?;
        ensure_bucket(txn, &edges)?;
        ensure_bucket(txn, &edge_index)?;

        tracing::info!("Populating new node update index bucket");
        let node_stats = for_each_record(txn, &nodes, Some(NODE_PUB_KEY_LEN), |txn, pub_key, node| {
            let update_time = codec::node::update_time_prefix(node)?;
            let pub_key: &[u8; NODE_PUB_KEY_LEN] = pub_key.try_into().map_err(|_| {
                KeystoneError::InvalidState(format!("node key of {} bytes", pub_key.len()))
            })?;
            let index_key = node_update_index_key(update_time, pub_key);
            tracing::trace!(
                "Adding {} to node update index, time {}",
                HexKey(pub_key.as_slice()),
                u64::from_be_bytes(update_time)
            );
            txn.put(&node_index, &index_key, &[])
        })?;
        observe::record_records_migrated("node_update_index", node_stats.visited);

        tracing::info!("Populating new edge update index bucket");
        let edge_stats = for_each_record(txn, &edges, Some(EDGE_KEY_LEN), |txn, edge_key, policy| {
            let policy = EdgePolicy::decode(policy, BASE_VERSION)?;
            let (_, channel_id) = codec::edge::split_edge_key(edge_key).ok_or_else(|| {
                KeystoneError::InvalidState(format!("edge key of {} bytes", edge_key.len()))
            })?;
            tracing::trace!(
                "Adding channel {} to edge update index, time {}",
                u64::from_be_bytes(channel_id),
                policy.last_update
            );
            let index_key = edge_update_index_key(policy.last_update, channel_id);
            txn.put(&edge_index, &index_key, &[])
        })?;
        observe::record_records_migrated("edge_update_index", edge_stats.visited);

        tracing::info!(
            "Indexed {} nodes and {} edge policies",
            node_stats.visited,
            edge_stats.visited
        );
        Ok(())
    }

    fn verify(&self, txn: &dyn BucketTxn) -> Result<()> {
        for index in [schema::node_update_index(), schema::edge_update_index()] {
            if !txn.bucket_exists(&index)? {
                return Err(KeystoneError::Structural(format!("{} missing", index)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::{BucketStore, DecodeErrorKind, MemoryStore};

    #[test]
    fn test_empty_store_gets_index_buckets() {
        let store = MemoryStore::new();
        let mut txn = store.write_txn().unwrap();
        NodeEdgeUpdateIndex.apply(&mut txn).unwrap();
        NodeEdgeUpdateIndex.verify(&txn).unwrap();

        assert!(txn.entries(&schema::node_update_index()).unwrap().is_empty());
        assert!(txn.entries(&schema::edge_update_index()).unwrap().is_empty());
    }

    #[test]
    fn test_short_node_value_fails() {
        let store = MemoryStore::new();
        let mut txn = store.write_txn().unwrap();
        txn.create_bucket_if_absent(&schema::node_bucket()).unwrap();
        txn.put(&schema::node_bucket(), &[7; NODE_PUB_KEY_LEN], &[1, 2, 3])
            .unwrap();

        let err = NodeEdgeUpdateIndex.apply(&mut txn).unwrap_err();
        assert!(matches!(
            err,
            KeystoneError::Decode {
                kind: DecodeErrorKind::Truncated,
                ..
            }
        ));
    }

    #[test]
    fn test_existing_index_entries_kept() {
        let store = MemoryStore::new();
        let mut txn = store.write_txn().unwrap();
        txn.create_bucket_if_absent(&schema::node_bucket()).unwrap();
        txn.create_bucket_if_absent(&schema::node_update_index()).unwrap();
        txn.put(&schema::node_update_index(), b"stale", &[]).unwrap();

        NodeEdgeUpdateIndex.apply(&mut txn).unwrap();
        assert_eq!(
            txn.get(&schema::node_update_index(), b"stale").unwrap(),
            Some(Vec::new())
        );
    }
}
