//! # Phonos Model
//!
//! Local entity types shared by every phonos client surface.
//!
//! Entities mirror the server representation and keep the server-assigned
//! id as their identity. That is the invariant that makes replication
//! upserts and deletes idempotent: applying the same change-feed page twice
//! writes the same rows.
//!
//! [`Track`] additionally carries local-only cache bookkeeping
//! (`*_cached_at` fields) that the server never sends; those fields are
//! mutated exclusively by the sync engine's invalidation step or by the
//! media cache collaborator.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod track;

pub use catalog::{Playlist, PlaylistTrack, ReviewSource, User};
pub use track::{ResourceCategory, Track};

/// Epoch milliseconds, matching the wire representation of instants.
pub type Timestamp = i64;
