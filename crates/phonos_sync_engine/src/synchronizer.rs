//! The generic per-entity-type synchronizer.
//!
//! One engine drives pagination and page application for every entity
//! type, parameterized by the network representation, the local entity
//! type, a mapping function and an optional pre-persist hook — strategy
//! objects instead of five near-duplicate synchronizer classes.

use crate::error::SyncResult;
use crate::feed::ChangeFeedSource;
use crate::status::SyncStatus;
use crate::store::{EntityStore, LocalEntity};
use phonos_model::Timestamp;
use phonos_sync_protocol::{ChangeFeedPage, ChangeWindow, EntityType};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Progress callback: `(current_page, total_pages, entity_type)`.
///
/// Fires on whichever thread runs the sub-sync; redispatching to a UI
/// thread is the caller's responsibility.
pub type PageCallback = dyn Fn(u32, u32, EntityType) + Send + Sync;

/// Per-type hook that runs before a modified entity overwrites its
/// previous local row.
///
/// The hook sees the previous copy because invalidation decisions need the
/// old state; new entities have no previous row and skip the hook.
pub trait PrePersistHook<L>: Send + Sync {
    /// Adjusts `incoming` before it is persisted over `previous`.
    fn before_upsert(&self, incoming: &mut L, previous: Option<&L>) -> SyncResult<()>;

    /// Runs once after a type-wide fully successful pass.
    fn after_success(&self) {}
}

/// The default hook: no adjustments, no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl<L> PrePersistHook<L> for NoopHook {
    fn before_upsert(&self, _incoming: &mut L, _previous: Option<&L>) -> SyncResult<()> {
        Ok(())
    }
}

/// One registered synchronizer, as the coordinator sees it.
///
/// Object-safe so the coordinator can hold a heterogeneous set of
/// synchronizers whose concrete network/local types differ.
pub trait TypeSync: Send + Sync {
    /// The entity type this synchronizer is responsible for.
    fn entity_type(&self) -> EntityType;

    /// Syncs all changes in `(status.last_synced, maximum]`.
    ///
    /// Returns `true` only once every page up to the server-reported total
    /// succeeded. Failures are logged, never propagated; retry is achieved
    /// by a later coordinator run.
    fn sync(
        &self,
        status: &SyncStatus,
        maximum: Timestamp,
        on_page: Option<&PageCallback>,
    ) -> bool;
}

/// Drives pagination for one entity type and applies each page.
pub struct EntitySynchronizer<N, L, F, S, H>
where
    N: DeserializeOwned + Send + Sync,
    L: LocalEntity,
    F: ChangeFeedSource,
    S: EntityStore<L>,
    H: PrePersistHook<L>,
{
    entity_type: EntityType,
    feed: Arc<F>,
    store: Arc<S>,
    map: fn(N) -> L,
    hook: H,
    page_size: u32,
}

impl<N, L, F, S, H> EntitySynchronizer<N, L, F, S, H>
where
    N: DeserializeOwned + Send + Sync,
    L: LocalEntity,
    F: ChangeFeedSource,
    S: EntityStore<L>,
    H: PrePersistHook<L>,
{
    /// Creates a synchronizer for one entity type.
    pub fn new(
        entity_type: EntityType,
        feed: Arc<F>,
        store: Arc<S>,
        map: fn(N) -> L,
        hook: H,
        page_size: u32,
    ) -> Self {
        Self {
            entity_type,
            feed,
            store,
            map,
            hook,
            page_size,
        }
    }

    fn sync_inner(
        &self,
        status: &SyncStatus,
        maximum: Timestamp,
        on_page: Option<&PageCallback>,
    ) -> SyncResult<()> {
        let window = ChangeWindow::since(status.last_synced, maximum);
        let mut current_page = 0u32;

        // Do-while: the page count is only knowable after page 0 returns,
        // so at least one fetch always occurs.
        loop {
            let page: ChangeFeedPage<N> =
                self.feed
                    .fetch_page(self.entity_type, window, current_page, self.page_size)?;
            let total_pages = page.pageable.total_pages;

            self.apply_page(page)?;

            debug!(
                entity_type = %self.entity_type,
                page = current_page,
                total_pages,
                "applied change-feed page"
            );
            if let Some(callback) = on_page {
                callback(current_page, total_pages, self.entity_type);
            }

            current_page += 1;
            if current_page >= total_pages {
                break;
            }
        }

        self.hook.after_success();
        Ok(())
    }

    fn apply_page(&self, page: ChangeFeedPage<N>) -> SyncResult<()> {
        let content = page.content;
        let mut upserts = Vec::with_capacity(content.new.len() + content.modified.len());

        for dto in content.new {
            upserts.push((self.map)(dto));
        }

        // The hook runs on modified entities only, before overwrite,
        // because it needs the previous local state.
        for dto in content.modified {
            let mut entity = (self.map)(dto);
            let previous = self.store.get(entity.id())?;
            self.hook.before_upsert(&mut entity, previous.as_ref())?;
            upserts.push(entity);
        }

        self.store.upsert(upserts)?;
        self.store.delete(&content.removed)?;
        Ok(())
    }
}

impl<N, L, F, S, H> TypeSync for EntitySynchronizer<N, L, F, S, H>
where
    N: DeserializeOwned + Send + Sync,
    L: LocalEntity,
    F: ChangeFeedSource,
    S: EntityStore<L>,
    H: PrePersistHook<L>,
{
    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn sync(
        &self,
        status: &SyncStatus,
        maximum: Timestamp,
        on_page: Option<&PageCallback>,
    ) -> bool {
        match self.sync_inner(status, maximum, on_page) {
            Ok(()) => {
                info!(entity_type = %self.entity_type, "entity sync complete");
                true
            }
            Err(error) => {
                warn!(
                    entity_type = %self.entity_type,
                    %error,
                    retryable = error.is_retryable(),
                    "entity sync failed; will retry on a later run"
                );
                false
            }
        }
    }
}
