//! Schema migration system
//!
//! A store records its schema version in a marker next to its data. The
//! [`MigrationManager`] walks the marker forward one version at a time: each
//! step runs in its own write transaction together with the marker advance
//! and its history entry, so a step is either fully applied or not at all.
//!
//! # Example
//!
//! ```no_run
//! use keystone::prelude::*;
//! use keystone::{Migration, MigrationManager};
//!
//! struct CreateAuditBucket;
//!
//! impl Migration for CreateAuditBucket {
//!     fn version(&self) -> u32 {
//!         1
//!     }
//!
//!     fn name(&self) -> &str {
//!         "create_audit_bucket"
//!     }
//!
//!     fn apply(&self, txn: &mut dyn BucketTxn) -> Result<()> {
//!         txn.create_bucket_if_absent(&BucketPath::root("audit"))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let store = MemoryStore::new();
//! let mut manager = MigrationManager::new();
//! manager.add(Box::new(CreateAuditBucket));
//! let report = manager.run(&store)?;
//! assert_eq!(report.to_version, 1);
//! # Ok(())
//! # }
//! ```

use crate::migrations;
use crate::version::{self, HistoryEntry, BASE_VERSION};
use keystone_core::{observe, BucketStore, BucketTxn, KeystoneError, Result};
use std::collections::BTreeSet;
use std::time::Instant;

/// Migration trait
///
/// Implement this to define one schema step. A migration moves a store from
/// `version() - 1` to `version()`.
pub trait Migration: Send + Sync {
    /// The version number this migration produces
    fn version(&self) -> u32;

    /// Human-readable name for this migration
    fn name(&self) -> &str;

    /// Apply the migration
    ///
    /// Runs inside the step's write transaction. Returning an error discards
    /// everything the step wrote.
    fn apply(&self, txn: &mut dyn BucketTxn) -> Result<()>;

    /// Optional: verify the migration was applied correctly
    ///
    /// Runs in the same transaction after `apply`, before commit.
    fn verify(&self, _txn: &dyn BucketTxn) -> Result<()> {
        Ok(())
    }
}

/// Migration manager
///
/// Manages a collection of migrations and runs them in order.
pub struct MigrationManager {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationManager {
    /// Create a new migration manager
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    /// Manager loaded with every built-in schema step
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.add_all(migrations::all());
        manager
    }

    /// Add a migration
    ///
    /// Migrations will be sorted by version when run.
    pub fn add(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    /// Add multiple migrations
    pub fn add_all(&mut self, migrations: Vec<Box<dyn Migration>>) {
        for m in migrations {
            self.add(m);
        }
    }

    /// Highest registered version, or the base version if none are registered
    pub fn latest_version(&self) -> u32 {
        self.migrations
            .iter()
            .map(|m| m.version())
            .max()
            .unwrap_or(BASE_VERSION)
    }

    /// Run all pending migrations
    ///
    /// Applies migrations in version order, starting from the stored schema
    /// version. Steps already committed stay committed if a later one fails.
    pub fn run<S: BucketStore>(&self, store: &S) -> Result<MigrationReport> {
        self.check_unique()?;

        let from_version = self.current_version(store)?;
        let latest = self.latest_version();
        if from_version > latest {
            return Err(KeystoneError::FutureVersion {
                stored: from_version,
                latest,
            });
        }

        let sorted = self.sorted();
        let pending: Vec<_> = sorted
            .into_iter()
            .filter(|m| m.version() > from_version)
            .collect();

        if pending.is_empty() {
            tracing::info!("No pending migrations");
            return Ok(MigrationReport {
                from_version,
                to_version: from_version,
                applied: Vec::new(),
            });
        }

        tracing::info!("Running {} pending migrations", pending.len());

        let mut current = from_version;
        let mut applied = Vec::new();
        for migration in pending {
            if migration.version() != current + 1 {
                tracing::warn!(
                    "No migration registered for v{}; stopping at v{}",
                    current + 1,
                    current
                );
                break;
            }
            self.run_single(store, migration)?;
            current = migration.version();
            applied.push(MigrationInfo::of(migration));
        }

        Ok(MigrationReport {
            from_version,
            to_version: current,
            applied,
        })
    }

    /// Run a single migration
    fn run_single<S: BucketStore>(&self, store: &S, migration: &dyn Migration) -> Result<()> {
        let version = migration.version();
        tracing::info!("Applying migration v{}: {}", version, migration.name());

        let started = Instant::now();
        let mut txn = store.write_txn()?;
        let outcome = Self::apply_in(&mut txn, migration);

        let result = match outcome {
            Ok(()) => txn.commit(),
            Err(e) => {
                tracing::error!(
                    "Migration v{} ({}) failed, rolling back: {}",
                    version,
                    migration.name(),
                    e
                );
                txn.abort();
                Err(e)
            }
        };
        observe::record_migration(version, started.elapsed(), result.is_ok());

        result.map_err(|e| KeystoneError::Migration {
            version,
            name: migration.name().to_string(),
            source: Box::new(e),
        })?;

        tracing::info!("Migration v{} complete", version);
        Ok(())
    }

    fn apply_in(txn: &mut dyn BucketTxn, migration: &dyn Migration) -> Result<()> {
        // Re-read under the write lock: another writer may have moved it
        let stored = version::read_version(txn)?;
        if stored + 1 != migration.version() {
            return Err(KeystoneError::InvalidState(format!(
                "store is at v{}, cannot apply v{}",
                stored,
                migration.version()
            )));
        }

        migration.apply(txn)?;
        migration.verify(txn)?;

        version::write_version(txn, migration.version())?;
        version::record_history(txn, &HistoryEntry::now(migration.version(), migration.name()))
    }

    /// List all migrations
    pub fn list(&self) -> Vec<MigrationInfo> {
        self.sorted().into_iter().map(MigrationInfo::of).collect()
    }

    /// Get pending migrations
    pub fn pending<S: BucketStore>(&self, store: &S) -> Result<Vec<MigrationInfo>> {
        let current_version = self.current_version(store)?;

        Ok(self
            .sorted()
            .into_iter()
            .filter(|m| m.version() > current_version)
            .map(MigrationInfo::of)
            .collect())
    }

    /// Applied migrations recorded in the store
    pub fn history<S: BucketStore>(&self, store: &S) -> Result<Vec<HistoryEntry>> {
        let txn = store.read_txn()?;
        version::read_history(&txn)
    }

    fn current_version<S: BucketStore>(&self, store: &S) -> Result<u32> {
        let txn = store.read_txn()?;
        version::read_version(&txn)
    }

    fn sorted(&self) -> Vec<&dyn Migration> {
        let mut sorted: Vec<&dyn Migration> = self.migrations.iter().map(|m| &**m).collect();
        sorted.sort_by_key(|m| m.version());
        sorted
    }

    fn check_unique(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for m in &self.migrations {
            if m.version() == BASE_VERSION {
                return Err(KeystoneError::InvalidState(format!(
                    "migration '{}' targets the base version",
                    m.name()
                )));
            }
            if !seen.insert(m.version()) {
                return Err(KeystoneError::DuplicateMigration(m.version()));
            }
        }
        Ok(())
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Migration information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationInfo {
    pub version: u32,
    pub name: String,
}

impl MigrationInfo {
    fn of(m: &dyn Migration) -> Self {
        Self {
            version: m.version(),
            name: m.name().to_string(),
        }
    }
}

/// Outcome of [`MigrationManager::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: Vec<MigrationInfo>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Helper macro to define a migration
///
/// # Example
///
/// ```ignore
/// migration!(
///     CreateAuditBucket,
///     version: 4,
///     name: "create_audit_bucket",
///     apply: |txn| {
///         txn.create_bucket_if_absent(&BucketPath::root("audit"))
///     }
/// );
/// ```
#[macro_export]
macro_rules! migration {
    (
        $name:ident,
        version: $version:expr,
        name: $migration_name:expr,
        apply: |$apply_txn:ident| $apply_body:block
        $(, verify: |$verify_txn:ident| $verify_body:block)?
    ) => {
        struct $name;

        impl $crate::Migration for $name {
            fn version(&self) -> u32 {
                $version
            }

            fn name(&self) -> &str {
                $migration_name
            }

            fn apply(&self, $apply_txn: &mut dyn $crate::BucketTxn) -> $crate::Result<()> {
                $apply_body
            }

            $(
                fn verify(&self, $verify_txn: &dyn $crate::BucketTxn) -> $crate::Result<()> {
                    $verify_body
                }
            )?
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::{BucketPath, MemoryStore};

    crate::migration!(
        CreateA,
        version: 1,
        name: "create_a",
        apply: |txn| { txn.create_bucket_if_absent(&BucketPath::root("a")) }
    );

    crate::migration!(
        CreateB,
        version: 2,
        name: "create_b",
        apply: |txn| { txn.create_bucket_if_absent(&BucketPath::root("b")) },
        verify: |txn| {
            if txn.bucket_exists(&BucketPath::root("b"))? {
                Ok(())
            } else {
                Err(KeystoneError::Structural("b missing".into()))
            }
        }
    );

    crate::migration!(
        CreateD,
        version: 4,
        name: "create_d",
        apply: |txn| { txn.create_bucket_if_absent(&BucketPath::root("d")) }
    );

    crate::migration!(
        AlsoVersionOne,
        version: 1,
        name: "also_one",
        apply: |_txn| { Ok(()) }
    );

    crate::migration!(
        FailsVerify,
        version: 1,
        name: "fails_verify",
        apply: |txn| { txn.create_bucket_if_absent(&BucketPath::root("a")) },
        verify: |_txn| { Err(KeystoneError::Structural("never valid".into())) }
    );

    fn stored_version(store: &MemoryStore) -> u32 {
        let txn = store.read_txn().unwrap();
        version::read_version(&txn).unwrap()
    }

    #[test]
    fn test_migration_manager() {
        let mut manager = MigrationManager::new();
        manager.add(Box::new(CreateB));
        manager.add(Box::new(CreateA));

        let migrations = manager.list();
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].version, 1);
        assert_eq!(migrations[0].name, "create_a");
        assert_eq!(manager.latest_version(), 2);
    }

    #[test]
    fn test_run_applies_in_order_and_records_history() {
        let store = MemoryStore::new();
        let mut manager = MigrationManager::new();
        manager.add_all(vec![Box::new(CreateB), Box::new(CreateA)]);

        let report = manager.run(&store).unwrap();
        assert_eq!(report.from_version, 0);
        assert_eq!(report.to_version, 2);
        assert_eq!(report.applied.len(), 2);
        assert_eq!(stored_version(&store), 2);

        let history = manager.history(&store).unwrap();
        let names: Vec<_> = history.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["create_a", "create_b"]);
    }

    #[test]
    fn test_second_run_is_noop() {
        let store = MemoryStore::new();
        let mut manager = MigrationManager::new();
        manager.add(Box::new(CreateA));
        manager.run(&store).unwrap();

        let before = store.snapshot();
        let report = manager.run(&store).unwrap();
        assert!(report.is_noop());
        assert_eq!(store.snapshot(), before);
        assert!(manager.pending(&store).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_versions_rejected() {
        let store = MemoryStore::new();
        let mut manager = MigrationManager::new();
        manager.add(Box::new(CreateA));
        manager.add(Box::new(AlsoVersionOne));

        let err = manager.run(&store).unwrap_err();
        assert!(matches!(err, KeystoneError::DuplicateMigration(1)));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_future_version_refused() {
        let store = MemoryStore::new();
        {
            let mut txn = store.write_txn().unwrap();
            version::write_version(&mut txn, 9).unwrap();
            txn.commit().unwrap();
        }
        let before = store.snapshot();

        let mut manager = MigrationManager::new();
        manager.add(Box::new(CreateA));
        let err = manager.run(&store).unwrap_err();
        assert!(matches!(
            err,
            KeystoneError::FutureVersion {
                stored: 9,
                latest: 1
            }
        ));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_gap_stops_before_missing_version() {
        let store = MemoryStore::new();
        let mut manager = MigrationManager::new();
        manager.add_all(vec![Box::new(CreateA), Box::new(CreateB), Box::new(CreateD)]);

        let report = manager.run(&store).unwrap();
        assert_eq!(report.to_version, 2);
        assert_eq!(stored_version(&store), 2);

        let pending = manager.pending(&store).unwrap();
        assert_eq!(pending, vec![MigrationInfo { version: 4, name: "create_d".into() }]);
    }

    #[test]
    fn test_failed_verify_rolls_back() {
        let store = MemoryStore::new();
        let mut manager = MigrationManager::new();
        manager.add(Box::new(FailsVerify));

        let err = manager.run(&store).unwrap_err();
        match &err {
            KeystoneError::Migration { version, name, .. } => {
                assert_eq!(*version, 1);
                assert_eq!(name, "fails_verify");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(err.root_cause(), KeystoneError::Structural(_)));
        assert!(store.snapshot().is_empty());
        assert_eq!(stored_version(&store), 0);
    }
}
