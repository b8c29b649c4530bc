//! The sync coordinator.
//!
//! Owns the session lifecycle: single-flight, throttling, the run's time
//! ceiling, per-type dispatch and final status persistence.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::feed::ChangeFeedSource;
use crate::status::{now_millis, SyncStatus, SyncStatusStore};
use crate::synchronizer::{PageCallback, TypeSync};
use parking_lot::Mutex;
use phonos_model::Timestamp;
use phonos_sync_protocol::EntityType;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Process-wide session state: at most one sync session runs at a time.
///
/// Explicitly owned by the coordinator and guarded by one mutex, not
/// spread across module globals.
#[derive(Debug, Default)]
struct Session {
    in_flight: bool,
    last_attempted: Option<Timestamp>,
}

/// Releases the single-flight guard when the run finishes, on every exit
/// path including per-type failures.
struct SessionGuard<'a> {
    session: &'a Mutex<Session>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.session.lock().in_flight = false;
    }
}

/// Decides which types need syncing, fixes the run's time ceiling, drives
/// all registered synchronizers and persists final statuses.
pub struct SyncCoordinator<F: ChangeFeedSource, S: SyncStatusStore> {
    config: SyncConfig,
    feed: Arc<F>,
    status_store: Arc<S>,
    synchronizers: Vec<Box<dyn TypeSync>>,
    session: Mutex<Session>,
    offline: AtomicBool,
}

impl<F: ChangeFeedSource, S: SyncStatusStore> SyncCoordinator<F, S> {
    /// Creates a coordinator with no synchronizers registered.
    pub fn new(config: SyncConfig, feed: Arc<F>, status_store: Arc<S>) -> Self {
        Self {
            config,
            feed,
            status_store,
            synchronizers: Vec::new(),
            session: Mutex::new(Session::default()),
            offline: AtomicBool::new(false),
        }
    }

    /// Registers a synchronizer for one entity type.
    pub fn with_synchronizer(mut self, synchronizer: Box<dyn TypeSync>) -> Self {
        self.synchronizers.push(synchronizer);
        self
    }

    /// Sets the process-wide offline flag. While set, sessions
    /// short-circuit without network calls.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns true while a session is in flight.
    pub fn is_syncing(&self) -> bool {
        self.session.lock().in_flight
    }

    /// When a session last started, if ever.
    pub fn last_attempted(&self) -> Option<Timestamp> {
        self.session.lock().last_attempted
    }

    #[cfg(test)]
    fn force_last_attempted(&self, value: Option<Timestamp>) {
        self.session.lock().last_attempted = value;
    }

    /// Runs one sync session over the requested types.
    ///
    /// Returns `false` without any network call when a session is already
    /// in flight, the offline flag is set, or `abort_if_recently_synced`
    /// and the previous run started within the throttle window. Also
    /// returns `false` when the last-modified fetch fails, since every
    /// type's skip/run decision depends on it. Otherwise returns `true`:
    /// network work was attempted, and per-type outcomes are inspectable
    /// through the status store.
    pub fn sync_with_server(
        &self,
        types: &[EntityType],
        abort_if_recently_synced: bool,
        on_page: Option<&PageCallback>,
    ) -> bool {
        // The ceiling is captured once for the whole run; every type's
        // window is (last_synced, maximum], fixed before any fetch, so
        // pagination cannot be destabilized by changes arriving mid-run.
        let maximum = now_millis();

        {
            let mut session = self.session.lock();
            if session.in_flight {
                debug!("sync session already in flight; skipping");
                return false;
            }
            if self.offline.load(Ordering::SeqCst) {
                debug!("offline; skipping sync session");
                return false;
            }
            if abort_if_recently_synced {
                if let Some(last) = session.last_attempted {
                    let throttle = self.config.throttle.as_millis() as Timestamp;
                    if maximum < last + throttle {
                        debug!(last, "recently synced; skipping session");
                        return false;
                    }
                }
            }
            session.in_flight = true;
            session.last_attempted = Some(maximum);
        }
        let _guard = SessionGuard {
            session: &self.session,
        };

        info!(types = types.len(), maximum, "starting sync session");

        // Mark every requested type as attempted up front, so a crash
        // mid-run is still observable.
        let mut statuses: Vec<SyncStatus> = Vec::with_capacity(types.len());
        for &entity_type in types {
            let mut status = self
                .load_status(entity_type)
                .unwrap_or_else(|| SyncStatus::never_synced(entity_type));
            status.last_sync_attempted = Some(maximum);
            self.persist_status(status);
            statuses.push(status);
        }

        // Prerequisite context for every type's skip/run decision; not
        // worth running individual type syncs without it.
        let last_modified = match self.feed.fetch_last_modified() {
            Ok(map) => map,
            Err(error) => {
                warn!(%error, "last-modified fetch failed; aborting session");
                return false;
            }
        };

        let mut to_run: Vec<(&dyn TypeSync, SyncStatus)> = Vec::new();
        for status in statuses {
            let entity_type = status.entity_type;
            let remote = last_modified.get(&entity_type).copied().unwrap_or(0);

            if matches!(status.last_synced, Some(local) if local >= remote) {
                // Caught up: no network work for this type, status bump only.
                debug!(%entity_type, "already caught up; skipping");
                let mut bumped = status;
                bumped.last_synced = Some(maximum);
                self.persist_status(bumped);
                continue;
            }

            match self.synchronizer_for(entity_type) {
                Some(synchronizer) => to_run.push((synchronizer, status)),
                None => warn!(%entity_type, "no synchronizer registered; skipping"),
            }
        }

        // Entity types are disjoint, so sub-syncs never contend over the
        // same status row; the session still waits for all of them.
        let outcomes: Vec<(EntityType, bool)> = std::thread::scope(|scope| {
            let handles: Vec<_> = to_run
                .iter()
                .map(|(synchronizer, status)| {
                    let entity_type = synchronizer.entity_type();
                    let handle =
                        scope.spawn(move || synchronizer.sync(status, maximum, on_page));
                    (entity_type, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(entity_type, handle)| match handle.join() {
                    Ok(succeeded) => (entity_type, succeeded),
                    Err(_) => {
                        warn!(%entity_type, "entity sync panicked");
                        (entity_type, false)
                    }
                })
                .collect()
        });

        for (entity_type, succeeded) in outcomes {
            if !succeeded {
                // last_synced stays put; last_sync_attempted already
                // records this run.
                continue;
            }
            if let Some(mut status) = self.load_status(entity_type) {
                status.last_synced = Some(maximum);
                self.persist_status(status);
            }
        }

        info!(maximum, "sync session finished");
        true
    }

    fn synchronizer_for(&self, entity_type: EntityType) -> Option<&dyn TypeSync> {
        self.synchronizers
            .iter()
            .find(|s| s.entity_type() == entity_type)
            .map(|s| s.as_ref())
    }

    fn load_status(&self, entity_type: EntityType) -> Option<SyncStatus> {
        match self.status_store.get(entity_type) {
            Ok(status) => status,
            Err(error) => {
                self.log_store_error(entity_type, &error);
                None
            }
        }
    }

    fn persist_status(&self, status: SyncStatus) {
        if let Err(error) = self.status_store.put(status) {
            self.log_store_error(status.entity_type, &error);
        }
    }

    fn log_store_error(&self, entity_type: EntityType, error: &SyncError) {
        warn!(%entity_type, %error, "sync status store failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MockChangeFeed;
    use crate::registry::{playlist_synchronizer, user_synchronizer};
    use crate::status::MemoryStatusStore;
    use crate::store::MemoryEntityStore;
    use crate::SyncResult;
    use phonos_model::{Playlist, User};
    use phonos_sync_protocol::{
        ChangeFeedPage, ChangeWindow, LastModified, PageContent, Pageable, PlaylistDto, UserDto,
    };
    use serde::de::DeserializeOwned;
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::time::Duration;
    use uuid::Uuid;

    fn user_dto(name: &str) -> UserDto {
        UserDto {
            id: Uuid::new_v4(),
            username: name.into(),
            display_name: None,
        }
    }

    fn playlist_dto(name: &str) -> PlaylistDto {
        PlaylistDto {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id: Uuid::new_v4(),
            updated_at: Some(1_000),
        }
    }

    fn page<T>(new: Vec<T>, page_number: u32, total_pages: u32) -> ChangeFeedPage<T> {
        let total_elements = new.len() as u64 * u64::from(total_pages.max(1));
        ChangeFeedPage {
            content: PageContent {
                new,
                modified: vec![],
                removed: vec![],
            },
            pageable: Pageable {
                offset: u64::from(page_number) * 400,
                page_size: 400,
                page_number,
                total_pages,
                total_elements,
            },
        }
    }

    struct Fixture {
        feed: Arc<MockChangeFeed>,
        status_store: Arc<MemoryStatusStore>,
        users: Arc<MemoryEntityStore<User>>,
        playlists: Arc<MemoryEntityStore<Playlist>>,
        coordinator: SyncCoordinator<MockChangeFeed, MemoryStatusStore>,
    }

    fn fixture() -> Fixture {
        let feed = Arc::new(MockChangeFeed::new());
        let status_store = Arc::new(MemoryStatusStore::new());
        let users = Arc::new(MemoryEntityStore::new());
        let playlists = Arc::new(MemoryEntityStore::new());

        let coordinator = SyncCoordinator::new(
            SyncConfig::new("https://library.example.com"),
            Arc::clone(&feed),
            Arc::clone(&status_store),
        )
        .with_synchronizer(Box::new(user_synchronizer(
            Arc::clone(&feed),
            Arc::clone(&users),
            400,
        )))
        .with_synchronizer(Box::new(playlist_synchronizer(
            Arc::clone(&feed),
            Arc::clone(&playlists),
            400,
        )));

        Fixture {
            feed,
            status_store,
            users,
            playlists,
            coordinator,
        }
    }

    fn recent_last_modified() -> LastModified {
        // Far in the future relative to any stored last_synced in tests,
        // so requested types always need network work.
        let mut map = LastModified::new();
        for entity_type in EntityType::ALL {
            map.insert(entity_type, now_millis() + 1_000_000);
        }
        map
    }

    #[test]
    fn successful_run_sets_last_synced_to_the_ceiling() {
        let f = fixture();
        f.feed.set_last_modified(recent_last_modified());
        f.feed
            .push_page(EntityType::User, 0, page(vec![user_dto("a")], 0, 1));

        let before = now_millis();
        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));
        let after = now_millis();

        let status = f.status_store.get(EntityType::User).unwrap().unwrap();
        let last_synced = status.last_synced.unwrap();
        assert!(last_synced >= before && last_synced <= after);
        assert_eq!(status.last_sync_attempted, Some(last_synced));
        assert_eq!(f.users.len(), 1);
    }

    #[test]
    fn offline_short_circuits_without_network() {
        let f = fixture();
        f.feed.set_last_modified(recent_last_modified());
        f.coordinator.set_offline(true);

        assert!(!f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));
        assert_eq!(f.feed.last_modified_fetches(), 0);
        assert_eq!(f.feed.total_page_fetches(), 0);

        f.coordinator.set_offline(false);
        f.feed
            .push_page(EntityType::User, 0, page::<UserDto>(vec![], 0, 0));
        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));
    }

    #[test]
    fn throttle_blocks_within_window_only() {
        let f = fixture();
        f.feed.set_last_modified(recent_last_modified());
        f.feed
            .push_page(EntityType::User, 0, page::<UserDto>(vec![], 0, 0));

        // A run that just started blocks a throttled follow-up...
        f.coordinator.force_last_attempted(Some(now_millis()));
        assert!(!f
            .coordinator
            .sync_with_server(&[EntityType::User], true, None));
        assert_eq!(f.feed.last_modified_fetches(), 0);

        // ...but a run exactly one window ago sits on the open boundary
        // and is allowed through.
        let throttle = f.coordinator.config.throttle.as_millis() as Timestamp;
        f.coordinator
            .force_last_attempted(Some(now_millis() - throttle));
        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], true, None));

        // Without the flag the throttle is ignored entirely.
        f.coordinator.force_last_attempted(Some(now_millis()));
        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));
    }

    #[test]
    fn last_modified_failure_aborts_but_records_attempt() {
        let f = fixture();
        f.feed.fail_last_modified();

        assert!(!f
            .coordinator
            .sync_with_server(&[EntityType::User, EntityType::Playlist], false, None));

        // Attempted statuses were persisted before the abort.
        for entity_type in [EntityType::User, EntityType::Playlist] {
            let status = f.status_store.get(entity_type).unwrap().unwrap();
            assert!(status.last_sync_attempted.is_some());
            assert_eq!(status.last_synced, None);
        }
        assert_eq!(f.feed.total_page_fetches(), 0);
        // The guard was released despite the abort.
        assert!(!f.coordinator.is_syncing());
    }

    #[test]
    fn caught_up_type_skips_network_work() {
        let f = fixture();
        let mut last_modified = LastModified::new();
        last_modified.insert(EntityType::User, 1_000);
        f.feed.set_last_modified(last_modified);

        f.status_store
            .put(SyncStatus {
                entity_type: EntityType::User,
                last_synced: Some(2_000),
                last_sync_attempted: Some(2_000),
            })
            .unwrap();

        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));

        assert_eq!(f.feed.page_fetches(EntityType::User), 0);
        // Status bump only: last_synced moved forward to the new ceiling.
        let status = f.status_store.get(EntityType::User).unwrap().unwrap();
        assert!(status.last_synced.unwrap() > 2_000);
    }

    #[test]
    fn failing_type_does_not_abort_sibling() {
        let f = fixture();
        f.feed.set_last_modified(recent_last_modified());

        // User: three pages, page 2 fails. Playlist: fully succeeds.
        f.feed
            .push_page(EntityType::User, 0, page(vec![user_dto("a")], 0, 3));
        f.feed
            .push_page(EntityType::User, 1, page(vec![user_dto("b")], 1, 3));
        f.feed.fail_page(EntityType::User, 2);
        f.feed
            .push_page(EntityType::Playlist, 0, page(vec![playlist_dto("mix")], 0, 1));

        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User, EntityType::Playlist], false, None));

        let user_status = f.status_store.get(EntityType::User).unwrap().unwrap();
        let playlist_status = f.status_store.get(EntityType::Playlist).unwrap().unwrap();

        // Users' last_synced unchanged, playlists' equals the ceiling.
        assert_eq!(user_status.last_synced, None);
        assert!(user_status.last_sync_attempted.is_some());
        assert_eq!(
            playlist_status.last_synced,
            playlist_status.last_sync_attempted
        );
        // The user pages applied before the failure are nonetheless present.
        assert_eq!(f.users.len(), 2);
        assert_eq!(f.playlists.len(), 1);
    }

    #[test]
    fn failed_type_reopens_the_same_window_on_next_run() {
        let f = fixture();
        f.feed.set_last_modified(recent_last_modified());
        f.feed.fail_page(EntityType::User, 0);

        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));
        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));

        // last_synced never advanced, so both windows open at the epoch.
        let windows = f.feed.observed_windows();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].1.after, 0);
        assert_eq!(windows[1].1.after, 0);
        assert_eq!(
            f.status_store
                .get(EntityType::User)
                .unwrap()
                .unwrap()
                .last_synced,
            None
        );
    }

    /// A feed whose last-modified call blocks until released, to hold a
    /// session in flight.
    struct GatedFeed {
        inner: MockChangeFeed,
        gate: Mutex<Receiver<()>>,
    }

    impl GatedFeed {
        fn new(inner: MockChangeFeed) -> (Arc<Self>, Sender<()>) {
            let (tx, rx) = channel();
            (
                Arc::new(Self {
                    inner,
                    gate: Mutex::new(rx),
                }),
                tx,
            )
        }
    }

    impl ChangeFeedSource for GatedFeed {
        fn fetch_page<T: DeserializeOwned>(
            &self,
            entity_type: EntityType,
            window: ChangeWindow,
            page: u32,
            size: u32,
        ) -> SyncResult<ChangeFeedPage<T>> {
            self.inner.fetch_page(entity_type, window, page, size)
        }

        fn fetch_last_modified(&self) -> SyncResult<LastModified> {
            let _ = self.gate.lock().recv();
            self.inner.fetch_last_modified()
        }
    }

    #[test]
    fn concurrent_session_returns_false_without_network() {
        let inner = MockChangeFeed::new();
        inner.set_last_modified(LastModified::new());
        let (feed, release) = GatedFeed::new(inner);
        let status_store = Arc::new(MemoryStatusStore::new());

        let coordinator = Arc::new(SyncCoordinator::new(
            SyncConfig::new("https://library.example.com"),
            Arc::clone(&feed),
            status_store,
        ));

        let background = {
            let coordinator = Arc::clone(&coordinator);
            std::thread::spawn(move || {
                coordinator.sync_with_server(&[EntityType::User], false, None)
            })
        };

        // Wait for the background session to take the guard.
        while !coordinator.is_syncing() {
            std::thread::sleep(Duration::from_millis(1));
        }

        // The concurrent call observes the flag and returns immediately.
        assert!(!coordinator.sync_with_server(&[EntityType::User], false, None));
        assert_eq!(feed.inner.last_modified_fetches(), 0);
        assert_eq!(feed.inner.total_page_fetches(), 0);

        release.send(()).unwrap();
        assert!(background.join().unwrap());
        assert!(!coordinator.is_syncing());
    }

    #[test]
    fn last_synced_is_monotonic_across_runs() {
        let f = fixture();
        f.feed.set_last_modified(recent_last_modified());
        f.feed
            .push_page(EntityType::User, 0, page::<UserDto>(vec![], 0, 0));

        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));
        let first = f
            .status_store
            .get(EntityType::User)
            .unwrap()
            .unwrap()
            .last_synced
            .unwrap();

        std::thread::sleep(Duration::from_millis(5));
        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::User], false, None));
        let second = f
            .status_store
            .get(EntityType::User)
            .unwrap()
            .unwrap()
            .last_synced
            .unwrap();

        assert!(second >= first);
    }

    #[test]
    fn unregistered_type_is_skipped_without_status_change() {
        let f = fixture();
        f.feed.set_last_modified(recent_last_modified());

        // Track has no synchronizer registered in this fixture.
        assert!(f
            .coordinator
            .sync_with_server(&[EntityType::Track], false, None));
        let status = f.status_store.get(EntityType::Track).unwrap().unwrap();
        assert_eq!(status.last_synced, None);
        assert!(status.last_sync_attempted.is_some());
        assert_eq!(f.feed.page_fetches(EntityType::Track), 0);
    }
}
