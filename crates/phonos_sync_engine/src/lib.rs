//! # Phonos Sync Engine
//!
//! Incremental, paginated, per-entity-type replication for phonos clients.
//!
//! This crate provides:
//! - [`SyncCoordinator`]: session lifecycle, single-flight, throttling
//! - [`EntitySynchronizer`]: one generic page-loop engine for every type
//! - [`TrackCacheHook`]: media-cache invalidation for modified tracks
//! - Store and change-feed abstractions with in-memory/mock impls
//!
//! ## Architecture
//!
//! The engine implements a **pull-only** replication model: the server is
//! authoritative and clients never push entity edits through this
//! protocol. A session captures one time ceiling, fetches the server's
//! per-type last-modified map, and runs one synchronizer per type that is
//! behind. Each synchronizer pages through the change feed for the window
//! `(last_synced, maximum]` and applies creates, updates and deletions to
//! the local store.
//!
//! ## Key invariants
//!
//! - At most one session runs at a time (single-flight)
//! - `last_synced` only moves forward, and only after a fully
//!   successful per-type pass
//! - Applying a page twice yields the same local state as applying it
//!   once (entity identity is the server id)
//! - One type's failure never aborts a sibling type's run
//!
//! All network calls are blocking I/O; never drive a session from a UI
//! thread.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod coordinator;
mod error;
mod feed;
mod http;
mod registry;
mod status;
mod store;
mod synchronizer;
mod tracks;

pub use config::SyncConfig;
pub use coordinator::SyncCoordinator;
pub use error::{SyncError, SyncResult};
pub use feed::{ChangeFeedSource, MockChangeFeed};
pub use http::{HttpChangeFeed, HttpClient, HttpError};
pub use registry::{
    map_playlist, map_playlist_track, map_review_source, map_user, playlist_synchronizer,
    playlist_track_synchronizer, review_source_synchronizer, user_synchronizer,
};
pub use status::{MemoryStatusStore, SyncStatus, SyncStatusStore};
pub use store::{EntityStore, LocalEntity, MemoryEntityStore};
pub use synchronizer::{EntitySynchronizer, NoopHook, PageCallback, PrePersistHook, TypeSync};
pub use tracks::{map_track, track_synchronizer, MediaCache, MockMediaCache, TrackCacheHook};
