//! End-to-end tests against the LMDB engine

use keystone::codec::{ChannelPoint, Invoice, NodeRecord, NODE_PUB_KEY_LEN};
use keystone::prelude::*;
use keystone::version::read_version;
use tempfile::TempDir;

fn sample_invoice() -> Invoice {
    Invoice {
        creation_date: 1_546_300_800,
        settle_date: 1_546_300_900,
        memo: b"coffee".to_vec(),
        receipt: Vec::new(),
        payment_request: b"lnbc2500u1p".to_vec(),
        preimage: [7; 32],
        value_msat: 250_000_000,
        settled: true,
        channel_point: ChannelPoint::default(),
    }
}

fn sample_node(tag: u8, last_update: u64) -> NodeRecord {
    NodeRecord {
        last_update,
        pub_key: [tag; NODE_PUB_KEY_LEN],
        color: [0, 0, 0],
        alias: String::new(),
        features: Vec::new(),
        auth_sig: Vec::new(),
    }
}

/// Lay out a store the way it looked before any migration
fn seed_legacy(path: &std::path::Path) -> Result<()> {
    let store = LmdbBucketStore::open(StoreConfig::new(path.to_path_buf()))?;
    let mut txn = store.write_txn()?;
    txn.create_bucket_if_absent(&schema::node_bucket())?;
    txn.create_bucket_if_absent(&schema::edge_bucket())?;
    txn.create_bucket_if_absent(&schema::invoice_bucket())?;

    for (tag, ts) in [(1u8, 20u64), (2, 10)] {
        let node = sample_node(tag, ts);
        txn.put(&schema::node_bucket(), &node.pub_key, &node.encode(0)?)?;
    }
    txn.put(&schema::invoice_bucket(), b"inv1", &sample_invoice().encode(1)?)?;
    txn.commit()
}

#[test]
fn test_open_fresh_database() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = KeystoneDb::open(temp_dir.path())?;

    assert_eq!(db.schema_version()?, LATEST_VERSION);
    assert!(db.history()?.is_empty());
    assert!(db.pending()?.is_empty());

    let txn = db.store().read_txn()?;
    let names: Vec<Vec<u8>> = txn.top_level_buckets()?.into_iter().map(|e| e.key).collect();
    assert_eq!(names.len(), schema::TOP_LEVEL_BUCKETS.len());
    Ok(())
}

#[test]
fn test_open_migrates_legacy_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    seed_legacy(temp_dir.path())?;

    let db = KeystoneDb::open(temp_dir.path())?;
    assert_eq!(db.schema_version()?, LATEST_VERSION);

    let history = db.history()?;
    let versions: Vec<u32> = history.iter().map(|h| h.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);

    let txn = db.store().read_txn()?;
    let nodes = updates_in_range(&txn, &schema::node_update_index(), 0, u64::MAX)?;
    let order: Vec<(u64, u8)> = nodes.iter().map(|(ts, id)| (*ts, id[0])).collect();
    assert_eq!(order, vec![(10, 2), (20, 1)]);

    let raw = txn
        .get(&schema::invoice_bucket(), b"inv1")?
        .ok_or_else(|| KeystoneError::InvalidState("invoice missing".into()))?;
    assert_eq!(Invoice::decode(&raw, LATEST_VERSION)?, sample_invoice());
    Ok(())
}

#[test]
fn test_migration_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    seed_legacy(temp_dir.path())?;

    {
        let db = KeystoneDb::open(temp_dir.path())?;
        assert_eq!(db.schema_version()?, LATEST_VERSION);
    }

    let db = KeystoneDb::open(temp_dir.path())?;
    assert!(db.migrate()?.is_noop());
    assert_eq!(db.history()?.len(), 3);
    Ok(())
}

#[test]
fn test_failed_migration_is_rolled_back_on_disk() -> Result<()> {
    let temp_dir = TempDir::new()?;
    seed_legacy(temp_dir.path())?;
    {
        let store = LmdbBucketStore::open(StoreConfig::new(temp_dir.path().to_path_buf()))?;
        let mut txn = store.write_txn()?;
        txn.put(&schema::node_bucket(), &[9; NODE_PUB_KEY_LEN], &[0, 1])?;
        txn.commit()?;
    }

    let err = match KeystoneDb::open(temp_dir.path()) {
        Ok(_) => panic!("open should fail on a truncated node"),
        Err(e) => e,
    };
    assert!(matches!(
        err.root_cause(),
        KeystoneError::Decode {
            kind: DecodeErrorKind::Truncated,
            ..
        }
    ));

    let store = LmdbBucketStore::open(StoreConfig::new(temp_dir.path().to_path_buf()))?;
    let txn = store.read_txn()?;
    assert_eq!(read_version(&txn)?, 0);
    assert!(!txn.bucket_exists(&schema::node_update_index())?);
    Ok(())
}

#[test]
fn test_future_version_refused_on_open() -> Result<()> {
    let temp_dir = TempDir::new()?;
    {
        let db = KeystoneDb::open(temp_dir.path())?;
        let mut txn = db.store().write_txn()?;
        txn.put(&schema::meta_bucket(), schema::VERSION_KEY, &99u32.to_be_bytes())?;
        txn.commit()?;
    }

    assert!(matches!(
        KeystoneDb::open(temp_dir.path()),
        Err(KeystoneError::FutureVersion {
            stored: 99,
            latest: LATEST_VERSION
        })
    ));
    Ok(())
}

#[test]
fn test_unmigrated_open_reports_pending() -> Result<()> {
    let temp_dir = TempDir::new()?;
    seed_legacy(temp_dir.path())?;

    let db = KeystoneDb::open_unmigrated(StoreConfig::new(temp_dir.path().to_path_buf()))?;
    assert_eq!(db.schema_version()?, 0);
    assert_eq!(db.pending()?.len(), 3);
    assert_eq!(db.schema_version()?, 0);
    Ok(())
}

#[test]
fn test_create_lays_out_latest_schema() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("db");

    {
        let db = KeystoneDb::create(StoreConfig::new(path.clone()))?;
        assert_eq!(db.schema_version()?, LATEST_VERSION);
        assert!(db.history()?.is_empty());

        let txn = db.store().read_txn()?;
        for name in schema::TOP_LEVEL_BUCKETS {
            assert!(txn.bucket_exists(&BucketPath::root(name))?);
        }
        assert!(txn.bucket_exists(&schema::node_update_index())?);
        assert!(txn.bucket_exists(&schema::edge_update_index())?);
    }

    assert!(matches!(
        KeystoneDb::create(StoreConfig::new(path.clone())),
        Err(KeystoneError::InvalidState(_))
    ));
    Ok(())
}

#[test]
fn test_unmigrated_open_refuses_missing_path() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("missing");

    assert!(matches!(
        KeystoneDb::open_unmigrated(StoreConfig::new(path.clone())),
        Err(KeystoneError::Config(_))
    ));
    assert!(!path.exists());
    Ok(())
}
