//! Outbound Ports (Driven Ports / SPI)

use crate::domain::errors::StoreError;
use crate::domain::inventory::{ChangeSet, Inventory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of servers, cache groups and topologies.
///
/// Snapshots are immutable. `commit` applies a whole change set or nothing
/// and returns the snapshot that includes it.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// The latest committed snapshot.
    async fn snapshot(&self) -> Result<Arc<Inventory>, StoreError>;

    /// Apply `changes` atomically.
    ///
    /// Fails with [`StoreError::RevisionConflict`] if any guarded record moved
    /// since planning and with [`StoreError::MissingServer`] if a target is
    /// gone; in both cases nothing is written.
    async fn commit(&self, changes: ChangeSet) -> Result<Arc<Inventory>, StoreError>;
}

/// Time source for queue and status timestamps.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
