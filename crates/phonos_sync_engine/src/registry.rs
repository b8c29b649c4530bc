//! Constructors for the standard synchronizer set.
//!
//! Everything except tracks syncs with the default no-op hook; the track
//! synchronizer lives in [`crate::tracks`] because of its cache side
//! effects.

use crate::feed::ChangeFeedSource;
use crate::store::EntityStore;
use crate::synchronizer::{EntitySynchronizer, NoopHook};
use phonos_model::{Playlist, PlaylistTrack, ReviewSource, User};
use phonos_sync_protocol::{
    EntityType, PlaylistDto, PlaylistTrackDto, ReviewSourceDto, UserDto,
};
use std::sync::Arc;

/// Maps a playlist DTO to its local entity.
pub fn map_playlist(dto: PlaylistDto) -> Playlist {
    Playlist {
        id: dto.id,
        name: dto.name,
        owner_id: dto.owner_id,
        updated_at: dto.updated_at,
    }
}

/// Maps a playlist membership DTO to its local entity.
pub fn map_playlist_track(dto: PlaylistTrackDto) -> PlaylistTrack {
    PlaylistTrack {
        id: dto.id,
        playlist_id: dto.playlist_id,
        track_id: dto.track_id,
        position: dto.position,
    }
}

/// Maps a user DTO to its local entity.
pub fn map_user(dto: UserDto) -> User {
    User {
        id: dto.id,
        username: dto.username,
        display_name: dto.display_name,
    }
}

/// Maps a discovery-queue source DTO to its local entity.
pub fn map_review_source(dto: ReviewSourceDto) -> ReviewSource {
    ReviewSource {
        id: dto.id,
        name: dto.name,
        source_url: dto.source_url,
    }
}

/// Builds the playlist synchronizer.
pub fn playlist_synchronizer<F, S>(
    feed: Arc<F>,
    store: Arc<S>,
    page_size: u32,
) -> EntitySynchronizer<PlaylistDto, Playlist, F, S, NoopHook>
where
    F: ChangeFeedSource,
    S: EntityStore<Playlist>,
{
    EntitySynchronizer::new(
        EntityType::Playlist,
        feed,
        store,
        map_playlist,
        NoopHook,
        page_size,
    )
}

/// Builds the playlist membership synchronizer.
pub fn playlist_track_synchronizer<F, S>(
    feed: Arc<F>,
    store: Arc<S>,
    page_size: u32,
) -> EntitySynchronizer<PlaylistTrackDto, PlaylistTrack, F, S, NoopHook>
where
    F: ChangeFeedSource,
    S: EntityStore<PlaylistTrack>,
{
    EntitySynchronizer::new(
        EntityType::PlaylistTrack,
        feed,
        store,
        map_playlist_track,
        NoopHook,
        page_size,
    )
}

/// Builds the user synchronizer.
pub fn user_synchronizer<F, S>(
    feed: Arc<F>,
    store: Arc<S>,
    page_size: u32,
) -> EntitySynchronizer<UserDto, User, F, S, NoopHook>
where
    F: ChangeFeedSource,
    S: EntityStore<User>,
{
    EntitySynchronizer::new(EntityType::User, feed, store, map_user, NoopHook, page_size)
}

/// Builds the discovery-queue source synchronizer.
pub fn review_source_synchronizer<F, S>(
    feed: Arc<F>,
    store: Arc<S>,
    page_size: u32,
) -> EntitySynchronizer<ReviewSourceDto, ReviewSource, F, S, NoopHook>
where
    F: ChangeFeedSource,
    S: EntityStore<ReviewSource>,
{
    EntitySynchronizer::new(
        EntityType::ReviewSource,
        feed,
        store,
        map_review_source,
        NoopHook,
        page_size,
    )
}
