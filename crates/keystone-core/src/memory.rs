//! In-memory bucket store for testing.
//!
//! Every transaction works on a private copy of the committed tree; commit
//! swaps the copy in. Data is lost when the store is dropped.

use crate::error::{KeystoneError, Result};
use crate::traits::{BucketStore, BucketTxn};
use crate::types::{BucketEntry, BucketPath};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::BTreeMap;
use std::ops::Bound;

/// A bucket's contents, ordered by raw key bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBucket {
    entries: BTreeMap<Vec<u8>, MemoryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryNode {
    Leaf(Vec<u8>),
    Bucket(MemoryBucket),
}

impl MemoryBucket {
    fn descend(&self, path: &BucketPath) -> Option<&MemoryBucket> {
        let mut current = self;
        for segment in path.segments() {
            match current.entries.get(segment) {
                Some(MemoryNode::Bucket(b)) => current = b,
                _ => return None,
            }
        }
        Some(current)
    }

    fn descend_mut(&mut self, segments: &[Vec<u8>]) -> Option<&mut MemoryBucket> {
        let mut current = self;
        for segment in segments {
            match current.entries.get_mut(segment) {
                Some(MemoryNode::Bucket(b)) => current = b,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory bucket store
pub struct MemoryStore {
    committed: RwLock<MemoryBucket>,
    writer: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(MemoryBucket::default()),
            writer: Mutex::new(()),
        }
    }

    /// Copy of the committed tree, for whole-store comparisons
    pub fn snapshot(&self) -> MemoryBucket {
        self.committed.read().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketStore for MemoryStore {
    type Txn<'a> = MemoryTxn<'a>;

    fn read_txn(&self) -> Result<Self::Txn<'_>> {
        Ok(MemoryTxn {
            store: self,
            working: self.snapshot(),
            writer: None,
        })
    }

    fn write_txn(&self) -> Result<Self::Txn<'_>> {
        // Single writer: held until commit, abort or drop
        let guard = self.writer.lock();
        Ok(MemoryTxn {
            store: self,
            working: self.snapshot(),
            writer: Some(guard),
        })
    }
}

/// Transaction over a [`MemoryStore`]
pub struct MemoryTxn<'a> {
    store: &'a MemoryStore,
    working: MemoryBucket,
    writer: Option<MutexGuard<'a, ()>>,
}

impl<'a> MemoryTxn<'a> {
    fn ensure_writable(&self) -> Result<()> {
        if self.writer.is_none() {
            return Err(KeystoneError::InvalidState(
                "Write attempted in a read-only transaction".into(),
            ));
        }
        Ok(())
    }
}

impl<'a> BucketTxn for MemoryTxn<'a> {
    fn is_read_only(&self) -> bool {
        self.writer.is_none()
    }

    fn bucket_exists(&self, path: &BucketPath) -> Result<bool> {
        Ok(self.working.descend(path).is_some())
    }

    fn create_bucket_if_absent(&mut self, path: &BucketPath) -> Result<()> {
        self.ensure_writable()?;

        let segments = path.segments();
        let parent = self
            .working
            .descend_mut(&segments[..segments.len() - 1])
            .ok_or_else(|| match path.parent() {
                Some(p) => KeystoneError::BucketNotFound(p.to_string()),
                None => KeystoneError::InvalidState("root bucket is always present".into()),
            })?;

        match parent.entries.get(path.name()) {
            Some(MemoryNode::Bucket(_)) => Ok(()),
            Some(MemoryNode::Leaf(_)) => Err(KeystoneError::IncompatibleValue(format!(
                "cannot create bucket {}: key holds a value",
                path
            ))),
            None => {
                parent
                    .entries
                    .insert(path.name().to_vec(), MemoryNode::Bucket(MemoryBucket::default()));
                Ok(())
            }
        }
    }

    fn get(&self, path: &BucketPath, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let bucket = match self.working.descend(path) {
            Some(b) => b,
            None => return Ok(None),
        };
        match bucket.entries.get(key) {
            Some(MemoryNode::Leaf(v)) => Ok(Some(v.clone())),
            _ => Ok(None),
        }
    }

    fn put(&mut self, path: &BucketPath, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_writable()?;

        let bucket = self
            .working
            .descend_mut(path.segments())
            .ok_or_else(|| KeystoneError::BucketNotFound(path.to_string()))?;

        if let Some(MemoryNode::Bucket(_)) = bucket.entries.get(key) {
            return Err(KeystoneError::IncompatibleValue(format!(
                "cannot put into {}: key names a nested bucket",
                path
            )));
        }
        bucket
            .entries
            .insert(key.to_vec(), MemoryNode::Leaf(value.to_vec()));
        Ok(())
    }

    fn entries(&self, path: &BucketPath) -> Result<Vec<BucketEntry>> {
        let bucket = self
            .working
            .descend(path)
            .ok_or_else(|| KeystoneError::BucketNotFound(path.to_string()))?;

        Ok(bucket
            .entries
            .iter()
            .map(|(key, node)| match node {
                MemoryNode::Leaf(v) => BucketEntry::leaf(key.clone(), v.clone()),
                MemoryNode::Bucket(_) => BucketEntry::bucket(key.clone()),
            })
            .collect())
    }

    fn entries_in_range(
        &self,
        path: &BucketPath,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<Vec<BucketEntry>> {
        let bucket = self
            .working
            .descend(path)
            .ok_or_else(|| KeystoneError::BucketNotFound(path.to_string()))?;

        if end.is_some_and(|end| end < start) {
            return Ok(Vec::new());
        }
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);

        Ok(bucket
            .entries
            .range::<[u8], _>((Bound::Included(start), upper))
            .map(|(key, node)| match node {
                MemoryNode::Leaf(v) => BucketEntry::leaf(key.clone(), v.clone()),
                MemoryNode::Bucket(_) => BucketEntry::bucket(key.clone()),
            })
            .collect())
    }

    fn commit(self) -> Result<()> {
        if self.writer.is_some() {
            *self.store.committed.write() = self.working;
        }
        Ok(())
    }

    fn abort(self) {}
}
