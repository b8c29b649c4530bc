//! Network representations of syncable entities.
//!
//! These mirror the server's JSON bodies field for field. None of them
//! carries local cache bookkeeping; that is layered on by the sync engine
//! when a DTO is mapped to its local entity.

use phonos_model::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A track as served by the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDto {
    /// Server-assigned identity.
    pub id: Uuid,
    /// Track title.
    pub title: String,
    /// Artist name.
    pub artist: String,
    /// Album name, if any.
    #[serde(default)]
    pub album: Option<String>,
    /// Track length in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<i64>,
    /// When the server last modified the audio file.
    #[serde(default)]
    pub audio_updated_at: Option<Timestamp>,
    /// When the server last modified the album art.
    #[serde(default)]
    pub art_updated_at: Option<Timestamp>,
    /// When the server last modified the thumbnail.
    #[serde(default)]
    pub thumbnail_updated_at: Option<Timestamp>,
    /// Whether the user pinned this track for offline playback.
    #[serde(default)]
    pub pinned_offline: bool,
}

/// A playlist header as served by the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDto {
    /// Server-assigned identity.
    pub id: Uuid,
    /// Playlist name.
    pub name: String,
    /// Owning user.
    pub owner_id: Uuid,
    /// When the server last modified this playlist.
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// A playlist membership row as served by the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrackDto {
    /// Server-assigned identity of the membership row.
    pub id: Uuid,
    /// The playlist this row belongs to.
    pub playlist_id: Uuid,
    /// The referenced track.
    pub track_id: Uuid,
    /// Zero-based position within the playlist.
    pub position: u32,
}

/// A user as served by the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Server-assigned identity.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Optional display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A discovery-queue source as served by the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSourceDto {
    /// Server-assigned identity.
    pub id: Uuid,
    /// Human-readable source name.
    pub name: String,
    /// Where the source is fetched from.
    #[serde(default)]
    pub source_url: Option<String>,
}
