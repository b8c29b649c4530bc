//! Playlist, user and discovery-queue entities.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A playlist in the local replica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Server-assigned identity.
    pub id: Uuid,
    /// Playlist name.
    pub name: String,
    /// Owning user.
    pub owner_id: Uuid,
    /// When the server last modified this playlist.
    pub updated_at: Option<Timestamp>,
}

/// A playlist membership row.
///
/// Carries its own server id so that reordering and removal replicate as
/// plain upserts and deletes, like any other entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    /// Server-assigned identity of the membership row itself.
    pub id: Uuid,
    /// The playlist this row belongs to.
    pub playlist_id: Uuid,
    /// The referenced track.
    pub track_id: Uuid,
    /// Zero-based position within the playlist.
    pub position: u32,
}

/// A user visible to this device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identity.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Optional display name.
    pub display_name: Option<String>,
}

/// A discovery-queue source the user follows for new music.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSource {
    /// Server-assigned identity.
    pub id: Uuid,
    /// Human-readable source name.
    pub name: String,
    /// Where the source is fetched from.
    pub source_url: Option<String>,
}
