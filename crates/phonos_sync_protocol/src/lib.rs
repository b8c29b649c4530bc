//! # Phonos Sync Protocol
//!
//! Wire types for the phonos change-feed protocol.
//!
//! This crate provides:
//! - [`EntityType`], the closed set of syncable record kinds
//! - [`ChangeFeedPage`] and its pagination block
//! - Network representations (`*Dto`) of each entity type
//! - [`ChangeWindow`], the half-open time window a sync run fetches
//!
//! This is a pure protocol crate with no I/O operations. The server speaks
//! JSON; every type here derives serde with camelCase field names to match
//! the wire.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dto;
mod entity_type;
mod page;

pub use dto::{PlaylistDto, PlaylistTrackDto, ReviewSourceDto, TrackDto, UserDto};
pub use entity_type::{EntityType, UnknownEntityType};
pub use page::{ChangeFeedPage, ChangeWindow, LastModified, PageContent, Pageable};
