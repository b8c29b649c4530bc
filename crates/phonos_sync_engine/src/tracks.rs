//! Track synchronization with media-cache invalidation.
//!
//! Tracks are the one entity type whose sync has side effects: a modified
//! track may invalidate cached media on this device, and a successful pass
//! re-triggers the cache's storage accounting and pinned-download policy.

use crate::error::SyncResult;
use crate::feed::ChangeFeedSource;
use crate::store::EntityStore;
use crate::synchronizer::{EntitySynchronizer, PrePersistHook};
use phonos_model::{ResourceCategory, Track};
use phonos_sync_protocol::{EntityType, TrackDto};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// The on-disk media cache, consumed as a collaborator.
///
/// Implemented by the platform; its eviction and quota policy is out of
/// this crate's scope.
pub trait MediaCache: Send + Sync {
    /// Drops the cached file for one track resource.
    fn purge(&self, track_id: Uuid, category: ResourceCategory);

    /// Recomputes total used offline storage.
    fn recompute_used_storage(&self);

    /// Evaluates the "always keep offline" policy and enqueues background
    /// downloads for newly-qualifying, not-yet-cached tracks.
    fn enqueue_pinned_downloads(&self);
}

/// Maps a track DTO to its local entity.
///
/// Cache bookkeeping starts empty; [`TrackCacheHook`] carries the previous
/// values forward for modified tracks.
pub fn map_track(dto: TrackDto) -> Track {
    Track {
        id: dto.id,
        title: dto.title,
        artist: dto.artist,
        album: dto.album,
        duration_ms: dto.duration_ms,
        audio_updated_at: dto.audio_updated_at,
        art_updated_at: dto.art_updated_at,
        thumbnail_updated_at: dto.thumbnail_updated_at,
        audio_cached_at: None,
        art_cached_at: None,
        thumbnail_cached_at: None,
        pinned_offline: dto.pinned_offline,
    }
}

/// Pre-persist hook that reconciles local cache state with server-side
/// media updates.
///
/// Staleness uses strict less-than: a cache written at exactly the
/// server's modification instant is considered fresh and kept.
pub struct TrackCacheHook<C: MediaCache + 'static> {
    cache: Arc<C>,
}

impl<C: MediaCache + 'static> TrackCacheHook<C> {
    /// Creates a hook backed by the given media cache.
    pub fn new(cache: Arc<C>) -> Self {
        Self { cache }
    }
}

impl<C: MediaCache + 'static> PrePersistHook<Track> for TrackCacheHook<C> {
    fn before_upsert(&self, incoming: &mut Track, previous: Option<&Track>) -> SyncResult<()> {
        let Some(previous) = previous else {
            return Ok(());
        };

        for category in ResourceCategory::ALL {
            match (previous.cached_at(category), incoming.updated_at(category)) {
                (Some(cached), Some(updated)) if cached < updated => {
                    debug!(
                        track_id = %incoming.id,
                        category = %category,
                        cached,
                        updated,
                        "cached resource is stale; purging"
                    );
                    self.cache.purge(incoming.id, category);
                    incoming.set_cached_at(category, None);
                }
                // The incoming DTO never carries cache fields; everything
                // still fresh is carried forward from the previous row.
                (cached, _) => incoming.set_cached_at(category, cached),
            }
        }

        Ok(())
    }

    fn after_success(&self) {
        // Storage accounting and the pinned-download pass must not block
        // sync completion.
        let cache = Arc::clone(&self.cache);
        std::thread::spawn(move || {
            cache.recompute_used_storage();
            cache.enqueue_pinned_downloads();
        });
    }
}

/// Builds the standard track synchronizer.
pub fn track_synchronizer<F, S, C>(
    feed: Arc<F>,
    store: Arc<S>,
    cache: Arc<C>,
    page_size: u32,
) -> EntitySynchronizer<TrackDto, Track, F, S, TrackCacheHook<C>>
where
    F: ChangeFeedSource,
    S: EntityStore<Track>,
    C: MediaCache + 'static,
{
    EntitySynchronizer::new(
        EntityType::Track,
        feed,
        store,
        map_track,
        TrackCacheHook::new(cache),
        page_size,
    )
}

/// A media cache that records every call, for tests.
#[derive(Debug, Default)]
pub struct MockMediaCache {
    purges: parking_lot::Mutex<Vec<(Uuid, ResourceCategory)>>,
    recomputes: std::sync::atomic::AtomicU32,
    enqueues: std::sync::atomic::AtomicU32,
}

impl MockMediaCache {
    /// Creates an empty recording cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `purge` call so far, in order.
    pub fn purges(&self) -> Vec<(Uuid, ResourceCategory)> {
        self.purges.lock().clone()
    }

    /// Number of `recompute_used_storage` calls so far.
    pub fn recomputes(&self) -> u32 {
        self.recomputes.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Number of `enqueue_pinned_downloads` calls so far.
    pub fn enqueues(&self) -> u32 {
        self.enqueues.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl MediaCache for MockMediaCache {
    fn purge(&self, track_id: Uuid, category: ResourceCategory) {
        self.purges.lock().push((track_id, category));
    }

    fn recompute_used_storage(&self) {
        self.recomputes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn enqueue_pinned_downloads(&self) {
        self.enqueues
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
