use keystone_core::{
    error::{KeystoneError, Result},
    traits::BucketTxn,
    types::{BucketEntry, BucketPath},
};
use lmdb::{Cursor, Database, RoTransaction, RwTransaction, Transaction, WriteFlags};

use crate::keys::{self, TAG_BUCKET, TAG_LEAF};
use crate::lmdb_err;

enum Inner<'env> {
    Read(RoTransaction<'env>),
    Write(RwTransaction<'env>),
}

/// Transaction over an [`LmdbBucketStore`](crate::LmdbBucketStore)
///
/// Dropping the transaction without committing aborts it.
pub struct LmdbTxn<'env> {
    inner: Inner<'env>,
    db: Database,
}

fn get_raw<T: Transaction>(txn: &T, db: Database, key: &[u8]) -> Result<Option<Vec<u8>>> {
    match txn.get(db, &key) {
        Ok(bytes) => Ok(Some(bytes.to_vec())),
        Err(lmdb::Error::NotFound) => Ok(None),
        Err(e) => Err(lmdb_err(e)),
    }
}

/// Walk the keys that start with `prefix`, from the first key at or after
/// `seek`, until `visit` returns false
fn scan_prefix<T, F>(txn: &T, db: Database, prefix: &[u8], seek: &[u8], mut visit: F) -> Result<()>
where
    T: Transaction,
    F: FnMut(&[u8], &[u8]) -> Result<bool>,
{
    let mut cursor = txn.open_ro_cursor(db).map_err(lmdb_err)?;
    // `iter_start` panics on an empty database; an unpositioned cursor
    // starts at the first key
    let iter = if seek.is_empty() {
        cursor.iter()
    } else {
        cursor.iter_from(seek)
    };

    for (key, value) in iter {
        let key_bytes: &[u8] = key;
        if !key_bytes.starts_with(prefix) {
            break;
        }
        if !visit(key_bytes, value)? {
            break;
        }
    }
    Ok(())
}

impl<'env> LmdbTxn<'env> {
    pub(crate) fn read(txn: RoTransaction<'env>, db: Database) -> Self {
        Self {
            inner: Inner::Read(txn),
            db,
        }
    }

    pub(crate) fn write(txn: RwTransaction<'env>, db: Database) -> Self {
        Self {
            inner: Inner::Write(txn),
            db,
        }
    }

    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match &self.inner {
            Inner::Read(txn) => get_raw(txn, self.db, key),
            Inner::Write(txn) => get_raw(txn, self.db, key),
        }
    }

    fn raw_scan<F>(&self, prefix: &[u8], seek: &[u8], visit: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<bool>,
    {
        match &self.inner {
            Inner::Read(txn) => scan_prefix(txn, self.db, prefix, seek, visit),
            Inner::Write(txn) => scan_prefix(txn, self.db, prefix, seek, visit),
        }
    }

    fn writer(&mut self) -> Result<&mut RwTransaction<'env>> {
        match &mut self.inner {
            Inner::Write(txn) => Ok(txn),
            Inner::Read(_) => Err(KeystoneError::InvalidState(
                "Write attempted in a read-only transaction".into(),
            )),
        }
    }

    /// Direct children of the prefix with keys in `start..end`
    fn children(
        &self,
        prefix: &[u8],
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<Vec<BucketEntry>> {
        let mut seek = prefix.to_vec();
        if !start.is_empty() {
            keys::push_segment(&mut seek, start);
        }

        let mut entries = Vec::new();
        self.raw_scan(prefix, &seek, |key, value| {
            let rest = &key[prefix.len()..];
            if rest.is_empty() {
                // The bucket's own marker
                return Ok(true);
            }
            let mut segments = keys::decode_segments(rest).ok_or_else(|| {
                KeystoneError::Structural(format!("malformed store key {:02x?}", key))
            })?;
            if end.is_some_and(|end| segments[0].as_slice() >= end) {
                return Ok(false);
            }
            if segments.len() != 1 {
                // Belongs to a nested bucket further down
                return Ok(true);
            }
            let child = segments.remove(0);
            match value.split_first() {
                Some((&TAG_LEAF, record)) => entries.push(BucketEntry::leaf(child, record)),
                Some((&TAG_BUCKET, _)) => entries.push(BucketEntry::bucket(child)),
                _ => {
                    return Err(KeystoneError::Structural(format!(
                        "unknown entry tag for store key {:02x?}",
                        key
                    )))
                }
            }
            Ok(true)
        })?;
        Ok(entries)
    }

    fn marker_tag(&self, path: &BucketPath) -> Result<Option<u8>> {
        Ok(self
            .raw_get(&keys::bucket_marker_key(path))?
            .and_then(|v| v.first().copied()))
    }

    /// Every top-level bucket in the store, in key order
    pub fn top_level_buckets(&self) -> Result<Vec<BucketEntry>> {
        self.children(&[], &[], None)
    }
}

impl<'env> BucketTxn for LmdbTxn<'env> {
    fn is_read_only(&self) -> bool {
        matches!(self.inner, Inner::Read(_))
    }

    fn bucket_exists(&self, path: &BucketPath) -> Result<bool> {
        Ok(self.marker_tag(path)? == Some(TAG_BUCKET))
    }

    fn create_bucket_if_absent(&mut self, path: &BucketPath) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !self.bucket_exists(&parent)? {
                return Err(KeystoneError::BucketNotFound(parent.to_string()));
            }
        }

        match self.marker_tag(path)? {
            Some(TAG_BUCKET) => return Ok(()),
            Some(_) => {
                return Err(KeystoneError::IncompatibleValue(format!(
                    "cannot create bucket {}: key holds a value",
                    path
                )))
            }
            None => {}
        }

        let key = keys::bucket_marker_key(path);
        let db = self.db;
        self.writer()?
            .put(db, &key, &[TAG_BUCKET], WriteFlags::empty())
            .map_err(lmdb_err)?;
        tracing::trace!("Created bucket {}", path);
        Ok(())
    }

    fn get(&self, path: &BucketPath, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.raw_get(&keys::entry_key(path, key))? {
            Some(value) => match value.split_first() {
                Some((&TAG_LEAF, record)) => Ok(Some(record.to_vec())),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn put(&mut self, path: &BucketPath, key: &[u8], value: &[u8]) -> Result<()> {
        if !self.bucket_exists(path)? {
            return Err(KeystoneError::BucketNotFound(path.to_string()));
        }

        let entry_key = keys::entry_key(path, key);
        if let Some(existing) = self.raw_get(&entry_key)? {
            if existing.first() == Some(&TAG_BUCKET) {
                return Err(KeystoneError::IncompatibleValue(format!(
                    "cannot put into {}: key names a nested bucket",
                    path
                )));
            }
        }

        let mut tagged = Vec::with_capacity(value.len() + 1);
        tagged.push(TAG_LEAF);
        tagged.extend_from_slice(value);

        let db = self.db;
        self.writer()?
            .put(db, &entry_key, &tagged, WriteFlags::empty())
            .map_err(lmdb_err)
    }

    fn entries(&self, path: &BucketPath) -> Result<Vec<BucketEntry>> {
        if !self.bucket_exists(path)? {
            return Err(KeystoneError::BucketNotFound(path.to_string()));
        }
        self.children(&keys::bucket_prefix(path), &[], None)
    }

    fn entries_in_range(
        &self,
        path: &BucketPath,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<Vec<BucketEntry>> {
        if !self.bucket_exists(path)? {
            return Err(KeystoneError::BucketNotFound(path.to_string()));
        }
        self.children(&keys::bucket_prefix(path), start, end)
    }

    fn commit(self) -> Result<()> {
        match self.inner {
            Inner::Write(txn) => txn.commit().map_err(lmdb_err),
            Inner::Read(txn) => {
                txn.abort();
                Ok(())
            }
        }
    }

    fn abort(self) {
        match self.inner {
            Inner::Write(txn) => txn.abort(),
            Inner::Read(txn) => txn.abort(),
        }
    }
}
