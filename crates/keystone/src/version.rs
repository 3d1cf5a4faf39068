//! Schema versions, the persisted version marker and the migration history
//!
//! The marker is a big-endian `u32` stored under `metadata/dbp`. Only the
//! migration manager writes it, and only in the same transaction as the step
//! that justifies the new value.

use crate::schema;
use keystone_core::{BucketTxn, KeystoneError, Result};
use serde::{Deserialize, Serialize};

/// Schema of a store that predates every migration
pub const BASE_VERSION: u32 = 0;
/// Node and edge update-time indexes
pub const NODE_EDGE_UPDATE_INDEX_VERSION: u32 = 1;
/// Invoices (and the invoices embedded in payments) carry a channel point
pub const INVOICE_CHANNEL_POINT_VERSION: u32 = 2;
/// Forwarding events carry an outcome type and failure code
pub const FORWARD_EVENT_TYPE_VERSION: u32 = 3;

pub const LATEST_VERSION: u32 = FORWARD_EVENT_TYPE_VERSION;

/// Read the version marker; a store without one is at [`BASE_VERSION`]
pub fn read_version(txn: &dyn BucketTxn) -> Result<u32> {
    match txn.get(&schema::meta_bucket(), schema::VERSION_KEY)? {
        None => Ok(BASE_VERSION),
        Some(bytes) => {
            let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                KeystoneError::Structural(format!(
                    "version marker is {} bytes, expected 4",
                    bytes.len()
                ))
            })?;
            Ok(u32::from_be_bytes(raw))
        }
    }
}

pub(crate) fn write_version(txn: &mut dyn BucketTxn, version: u32) -> Result<()> {
    let meta = schema::meta_bucket();
    txn.create_bucket_if_absent(&meta)?;
    txn.put(&meta, schema::VERSION_KEY, &version.to_be_bytes())
}

/// One applied migration, as recorded next to the version marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub version: u32,
    pub name: String,
    /// RFC 3339
    pub applied_at: String,
}

impl HistoryEntry {
    pub fn now(version: u32, name: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            applied_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub(crate) fn record_history(txn: &mut dyn BucketTxn, entry: &HistoryEntry) -> Result<()> {
    let history = schema::history_bucket();
    txn.create_bucket_if_absent(&schema::meta_bucket())?;
    txn.create_bucket_if_absent(&history)?;

    let value = serde_json::to_vec(entry)
        .map_err(|e| KeystoneError::encode("history entry", e.to_string()))?;
    txn.put(&history, &entry.version.to_be_bytes(), &value)
}

/// Applied migrations in version order
pub fn read_history(txn: &dyn BucketTxn) -> Result<Vec<HistoryEntry>> {
    let history = schema::history_bucket();
    if !txn.bucket_exists(&history)? {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in txn.entries(&history)? {
        let Some(value) = entry.value else { continue };
        let parsed: HistoryEntry = serde_json::from_slice(&value).map_err(|e| {
            KeystoneError::decode(
                "history entry",
                keystone_core::DecodeErrorKind::InvalidField,
                e.to_string(),
            )
        })?;
        entries.push(parsed);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::{BucketStore, MemoryStore};

    #[test]
    fn test_missing_marker_is_base_version() {
        let store = MemoryStore::new();
        let txn = store.read_txn().unwrap();
        assert_eq!(read_version(&txn).unwrap(), BASE_VERSION);
    }

    #[test]
    fn test_marker_is_big_endian_u32() {
        let store = MemoryStore::new();
        let mut txn = store.write_txn().unwrap();
        write_version(&mut txn, 2).unwrap();
        assert_eq!(
            txn.get(&schema::meta_bucket(), schema::VERSION_KEY).unwrap(),
            Some(vec![0, 0, 0, 2])
        );
        assert_eq!(read_version(&txn).unwrap(), 2);
    }

    #[test]
    fn test_malformed_marker() {
        let store = MemoryStore::new();
        let mut txn = store.write_txn().unwrap();
        txn.create_bucket_if_absent(&schema::meta_bucket()).unwrap();
        txn.put(&schema::meta_bucket(), schema::VERSION_KEY, &[1]).unwrap();
        assert!(matches!(
            read_version(&txn),
            Err(KeystoneError::Structural(_))
        ));
    }

    #[test]
    fn test_history_in_version_order() {
        let store = MemoryStore::new();
        let mut txn = store.write_txn().unwrap();
        record_history(&mut txn, &HistoryEntry::now(2, "second")).unwrap();
        record_history(&mut txn, &HistoryEntry::now(1, "first")).unwrap();

        let history = read_history(&txn).unwrap();
        let versions: Vec<u32> = history.iter().map(|h| h.version).collect();
        assert_eq!(versions, vec![1, 2]);
        assert_eq!(history[0].name, "first");
        assert!(chrono::DateTime::parse_from_rfc3339(&history[0].applied_at).is_ok());
    }
}
