//! Local entity store abstraction.

use crate::error::SyncResult;
use parking_lot::RwLock;
use phonos_model::{Playlist, PlaylistTrack, ReviewSource, Track, User};
use std::collections::HashMap;
use uuid::Uuid;

/// A locally replicated entity.
///
/// Identity equals the server-assigned id, never a locally generated key.
/// That is what makes repeated upserts and deletes idempotent and
/// collision-free across sync runs.
pub trait LocalEntity: Clone + Send + Sync + 'static {
    /// The server-assigned id.
    fn id(&self) -> Uuid;
}

impl LocalEntity for Track {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl LocalEntity for Playlist {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl LocalEntity for PlaylistTrack {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl LocalEntity for User {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl LocalEntity for ReviewSource {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Per-type persistence for replicated entities.
///
/// Only the sync engine writes to synced collections. Implementations are
/// serialized by the coordinator's single-flight guard.
pub trait EntityStore<L: LocalEntity>: Send + Sync {
    /// Loads one entity by server id.
    fn get(&self, id: Uuid) -> SyncResult<Option<L>>;

    /// Inserts or replaces a batch of entities in one call.
    fn upsert(&self, entities: Vec<L>) -> SyncResult<()>;

    /// Deletes a batch of entities. An id absent locally is a silent no-op.
    fn delete(&self, ids: &[Uuid]) -> SyncResult<()>;
}

/// An in-memory entity store keyed by server id.
#[derive(Debug)]
pub struct MemoryEntityStore<L: LocalEntity> {
    rows: RwLock<HashMap<Uuid, L>>,
}

impl<L: LocalEntity> MemoryEntityStore<L> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl<L: LocalEntity> Default for MemoryEntityStore<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: LocalEntity> EntityStore<L> for MemoryEntityStore<L> {
    fn get(&self, id: Uuid) -> SyncResult<Option<L>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    fn upsert(&self, entities: Vec<L>) -> SyncResult<()> {
        let mut rows = self.rows.write();
        for entity in entities {
            rows.insert(entity.id(), entity);
        }
        Ok(())
    }

    fn delete(&self, ids: &[Uuid]) -> SyncResult<()> {
        let mut rows = self.rows.write();
        for id in ids {
            rows.remove(id);
        }
        Ok(())
    }
}
