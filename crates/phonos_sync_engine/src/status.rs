//! Per-type sync status and its store.

use crate::error::SyncResult;
use parking_lot::RwLock;
use phonos_model::Timestamp;
use phonos_sync_protocol::EntityType;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Replication bookkeeping for one entity type.
///
/// `last_synced` stays `None` until the first fully successful run for the
/// type; once set it only moves forward. `last_sync_attempted` is written
/// at the start of every run so a crash mid-run is still observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    /// The type this row tracks.
    pub entity_type: EntityType,
    /// Ceiling of the last fully successful run, if any.
    pub last_synced: Option<Timestamp>,
    /// When a run last included this type.
    pub last_sync_attempted: Option<Timestamp>,
}

impl SyncStatus {
    /// Row for a type that has never been synced.
    pub fn never_synced(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            last_synced: None,
            last_sync_attempted: None,
        }
    }
}

/// Durable storage for [`SyncStatus`] rows, one per entity type.
///
/// Implementations need no internal locking for sync traffic: the
/// coordinator's single-flight guard serializes access.
pub trait SyncStatusStore: Send + Sync {
    /// Returns the row for `entity_type`, or `None` if it was never synced.
    fn get(&self, entity_type: EntityType) -> SyncResult<Option<SyncStatus>>;

    /// Creates or replaces the row for `status.entity_type`.
    fn put(&self, status: SyncStatus) -> SyncResult<()>;
}

/// An in-memory status store for tests and embedding experiments.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    rows: RwLock<HashMap<EntityType, SyncStatus>>,
}

impl MemoryStatusStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncStatusStore for MemoryStatusStore {
    fn get(&self, entity_type: EntityType) -> SyncResult<Option<SyncStatus>> {
        Ok(self.rows.read().get(&entity_type).copied())
    }

    fn put(&self, status: SyncStatus) -> SyncResult<()> {
        self.rows.write().insert(status.entity_type, status);
        Ok(())
    }
}

/// Current wall-clock time as epoch milliseconds.
pub(crate) fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as Timestamp
}
