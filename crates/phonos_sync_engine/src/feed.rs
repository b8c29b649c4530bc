//! Change-feed client abstraction.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use phonos_sync_protocol::{ChangeFeedPage, ChangeWindow, EntityType, LastModified};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

/// A remote source of change-feed pages.
///
/// This trait abstracts the network layer, allowing different
/// implementations (HTTP, mock for testing). Calls are blocking I/O and
/// must never run on a UI thread; bounding each call with the configured
/// timeout is the implementation's responsibility.
pub trait ChangeFeedSource: Send + Sync {
    /// Fetches one page of changes for a type within a window.
    fn fetch_page<T: DeserializeOwned>(
        &self,
        entity_type: EntityType,
        window: ChangeWindow,
        page: u32,
        size: u32,
    ) -> SyncResult<ChangeFeedPage<T>>;

    /// Fetches the server's most-recent-modification instant per type.
    fn fetch_last_modified(&self) -> SyncResult<LastModified>;
}

/// A scripted change feed for testing.
///
/// Pages are stored as JSON values so one mock serves every entity type.
/// Individual pages and the last-modified call can be failed on demand,
/// and every fetch is counted so tests can assert that short-circuit paths
/// perform no network work.
#[derive(Debug, Default)]
pub struct MockChangeFeed {
    pages: Mutex<HashMap<(EntityType, u32), serde_json::Value>>,
    failing_pages: Mutex<HashSet<(EntityType, u32)>>,
    last_modified: Mutex<Option<LastModified>>,
    fail_last_modified: Mutex<bool>,
    page_fetches: Mutex<HashMap<EntityType, u32>>,
    last_modified_fetches: AtomicU32,
    observed_windows: Mutex<Vec<(EntityType, ChangeWindow)>>,
}

impl MockChangeFeed {
    /// Creates an empty mock with no scripted pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts one page for a type.
    pub fn push_page<T: Serialize>(
        &self,
        entity_type: EntityType,
        page_number: u32,
        page: ChangeFeedPage<T>,
    ) {
        let value = serde_json::to_value(page).unwrap_or(serde_json::Value::Null);
        self.pages.lock().insert((entity_type, page_number), value);
    }

    /// Makes one page fetch fail with a retryable network error.
    pub fn fail_page(&self, entity_type: EntityType, page_number: u32) {
        self.failing_pages.lock().insert((entity_type, page_number));
    }

    /// Scripts the last-modified response.
    pub fn set_last_modified(&self, last_modified: LastModified) {
        *self.last_modified.lock() = Some(last_modified);
    }

    /// Makes the last-modified fetch fail.
    pub fn fail_last_modified(&self) {
        *self.fail_last_modified.lock() = true;
    }

    /// Number of page fetches attempted for a type (failed ones included).
    pub fn page_fetches(&self, entity_type: EntityType) -> u32 {
        self.page_fetches
            .lock()
            .get(&entity_type)
            .copied()
            .unwrap_or(0)
    }

    /// Total page fetches attempted across all types.
    pub fn total_page_fetches(&self) -> u32 {
        self.page_fetches.lock().values().sum()
    }

    /// Number of last-modified fetches attempted.
    pub fn last_modified_fetches(&self) -> u32 {
        self.last_modified_fetches.load(Ordering::SeqCst)
    }

    /// Windows observed per fetched page, in fetch order.
    pub fn observed_windows(&self) -> Vec<(EntityType, ChangeWindow)> {
        self.observed_windows.lock().clone()
    }
}

impl ChangeFeedSource for MockChangeFeed {
    fn fetch_page<T: DeserializeOwned>(
        &self,
        entity_type: EntityType,
        window: ChangeWindow,
        page: u32,
        _size: u32,
    ) -> SyncResult<ChangeFeedPage<T>> {
        *self.page_fetches.lock().entry(entity_type).or_insert(0) += 1;
        self.observed_windows.lock().push((entity_type, window));

        if self.failing_pages.lock().contains(&(entity_type, page)) {
            return Err(SyncError::network_retryable(format!(
                "scripted failure for {} page {}",
                entity_type, page
            )));
        }

        let value = self
            .pages
            .lock()
            .get(&(entity_type, page))
            .cloned()
            .ok_or_else(|| {
                SyncError::network_fatal(format!("no scripted {} page {}", entity_type, page))
            })?;

        serde_json::from_value(value).map_err(|e| SyncError::Decode(e.to_string()))
    }

    fn fetch_last_modified(&self) -> SyncResult<LastModified> {
        self.last_modified_fetches.fetch_add(1, Ordering::SeqCst);

        if *self.fail_last_modified.lock() {
            return Err(SyncError::network_retryable(
                "scripted last-modified failure",
            ));
        }

        Ok(self.last_modified.lock().clone().unwrap_or_default())
    }
}
