//! The closed set of syncable entity types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A syncable record kind.
///
/// The set is closed by design: adding a type requires a new server
/// endpoint and a new synchronizer registration on every client, so an
/// unknown name from the server is a protocol error, not something to
/// skip over silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A track and its media resource timestamps.
    Track,
    /// A playlist header.
    Playlist,
    /// A playlist membership row.
    PlaylistTrack,
    /// A user visible to this device.
    User,
    /// A discovery-queue source.
    ReviewSource,
}

impl EntityType {
    /// Every syncable type, in the order a full sync visits them.
    pub const ALL: [EntityType; 5] = [
        EntityType::Track,
        EntityType::Playlist,
        EntityType::PlaylistTrack,
        EntityType::User,
        EntityType::ReviewSource,
    ];

    /// Stable wire name, also used as the change-feed path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Track => "track",
            EntityType::Playlist => "playlist",
            EntityType::PlaylistTrack => "playlist_track",
            EntityType::User => "user",
            EntityType::ReviewSource => "review_source",
        }
    }
}

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(EntityType::Track),
            "playlist" => Ok(EntityType::Playlist),
            "playlist_track" => Ok(EntityType::PlaylistTrack),
            "user" => Ok(EntityType::User),
            "review_source" => Ok(EntityType::ReviewSource),
            other => Err(UnknownEntityType(other.to_string())),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an entity-type name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityType(pub String);

impl std::fmt::Display for UnknownEntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown entity type: {}", self.0)
    }
}

impl std::error::Error for UnknownEntityType {}
