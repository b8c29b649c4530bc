//! Track entity and media resource categories.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cacheable media resource attached to a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// The playable audio file.
    Audio,
    /// Full-size album art.
    Art,
    /// Scaled-down art for list views.
    Thumbnail,
}

impl ResourceCategory {
    /// All categories, in a fixed order.
    pub const ALL: [ResourceCategory; 3] = [
        ResourceCategory::Audio,
        ResourceCategory::Art,
        ResourceCategory::Thumbnail,
    ];

    /// Stable lowercase name, used in log lines and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceCategory::Audio => "audio",
            ResourceCategory::Art => "art",
            ResourceCategory::Thumbnail => "thumbnail",
        }
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A track in the local replica.
///
/// The `*_updated_at` fields are the server's per-resource modification
/// instants. The `*_cached_at` fields record when this device last cached
/// the corresponding resource; they are local-only and never arrive over
/// the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Server-assigned identity.
    pub id: Uuid,
    /// Track title.
    pub title: String,
    /// Artist name.
    pub artist: String,
    /// Album name, if any.
    pub album: Option<String>,
    /// Track length in milliseconds.
    pub duration_ms: Option<i64>,
    /// When the server last modified the audio file.
    pub audio_updated_at: Option<Timestamp>,
    /// When the server last modified the album art.
    pub art_updated_at: Option<Timestamp>,
    /// When the server last modified the thumbnail.
    pub thumbnail_updated_at: Option<Timestamp>,
    /// When this device last cached the audio file.
    pub audio_cached_at: Option<Timestamp>,
    /// When this device last cached the album art.
    pub art_cached_at: Option<Timestamp>,
    /// When this device last cached the thumbnail.
    pub thumbnail_cached_at: Option<Timestamp>,
    /// Whether the user pinned this track for offline playback.
    pub pinned_offline: bool,
}

impl Track {
    /// Returns when this device cached the given resource, if ever.
    pub fn cached_at(&self, category: ResourceCategory) -> Option<Timestamp> {
        match category {
            ResourceCategory::Audio => self.audio_cached_at,
            ResourceCategory::Art => self.art_cached_at,
            ResourceCategory::Thumbnail => self.thumbnail_cached_at,
        }
    }

    /// Sets the local cache instant for the given resource.
    pub fn set_cached_at(&mut self, category: ResourceCategory, value: Option<Timestamp>) {
        match category {
            ResourceCategory::Audio => self.audio_cached_at = value,
            ResourceCategory::Art => self.art_cached_at = value,
            ResourceCategory::Thumbnail => self.thumbnail_cached_at = value,
        }
    }

    /// Returns the server's last modification instant for the given resource.
    pub fn updated_at(&self, category: ResourceCategory) -> Option<Timestamp> {
        match category {
            ResourceCategory::Audio => self.audio_updated_at,
            ResourceCategory::Art => self.art_updated_at,
            ResourceCategory::Thumbnail => self.thumbnail_updated_at,
        }
    }
}
