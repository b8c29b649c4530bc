//! Change-feed pages, pagination and time windows.

use crate::EntityType;
use phonos_model::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One paginated unit of a type's change feed.
///
/// `T` is the network representation of the entity type being fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeFeedPage<T> {
    /// The changes themselves.
    pub content: PageContent<T>,
    /// Pagination block describing this page's position in the feed.
    pub pageable: Pageable,
}

/// Creates, updates and deletions for one entity type within a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent<T> {
    /// Entities created within the window.
    pub new: Vec<T>,
    /// Entities modified within the window.
    pub modified: Vec<T>,
    /// Ids of entities deleted within the window.
    pub removed: Vec<Uuid>,
}

impl<T> PageContent<T> {
    /// Total number of changes carried by this page.
    pub fn change_count(&self) -> usize {
        self.new.len() + self.modified.len() + self.removed.len()
    }
}

/// Pagination metadata as reported by the server.
///
/// `total_pages` is only knowable after page 0 returns; the per-type page
/// loop reads it from every page and trusts the server to report it
/// consistently for the duration of a window (which is why the window's
/// upper bound is fixed before the first fetch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    /// Index of the first element on this page within the whole feed.
    pub offset: u64,
    /// Requested page size.
    pub page_size: u32,
    /// Zero-based page number.
    pub page_number: u32,
    /// Total number of pages in the feed.
    pub total_pages: u32,
    /// Total number of elements across all pages.
    pub total_elements: u64,
}

impl Pageable {
    /// Number of pages needed for `total_elements` at `page_size` per page.
    ///
    /// Zero elements means zero pages; the page loop still performs its
    /// initial fetch to learn that.
    pub fn pages_for(total_elements: u64, page_size: u32) -> u32 {
        if page_size == 0 {
            return 0;
        }
        total_elements.div_ceil(u64::from(page_size)) as u32
    }
}

/// The half-open time window a sync run fetches: `(after, until]`.
///
/// Bounds are epoch milliseconds. `after` is exclusive so that an entity
/// modified exactly at a previous run's ceiling is not fetched twice;
/// `until` is inclusive and equals the run's captured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeWindow {
    /// Exclusive lower bound.
    pub after: Timestamp,
    /// Inclusive upper bound.
    pub until: Timestamp,
}

impl ChangeWindow {
    /// Builds the window for one type's run.
    ///
    /// A type that has never fully synced (`last_synced` absent) opens its
    /// window at the epoch start, which fetches the full library.
    pub fn since(last_synced: Option<Timestamp>, until: Timestamp) -> Self {
        Self {
            after: last_synced.unwrap_or(0),
            until,
        }
    }
}

/// Per-type most-recent-modification instants, as reported by the server.
pub type LastModified = HashMap<EntityType, Timestamp>;
