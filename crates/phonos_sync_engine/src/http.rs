//! HTTP-backed change feed.
//!
//! The actual HTTP client is abstracted via a trait so platforms can plug
//! in whichever library they already ship (reqwest, ureq, a platform
//! webview bridge) without this crate taking the dependency.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::feed::ChangeFeedSource;
use phonos_sync_protocol::{ChangeFeedPage, ChangeWindow, EntityType, LastModified};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client abstraction.
///
/// Implementations must bound each request by `timeout` and report expiry
/// as [`HttpError::Timeout`]; the engine treats that as a page failure
/// rather than stalling the session.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, HttpError>;
}

/// Transport-level failure reported by an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The request exceeded its timeout.
    Timeout,
    /// The server answered with a non-success status.
    Status(u16),
    /// The connection failed before a response arrived.
    Connection(String),
}

impl From<HttpError> for SyncError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout => SyncError::Timeout,
            // Server-side trouble is worth retrying on a later run;
            // a 4xx means the request itself is wrong.
            HttpError::Status(code) if code >= 500 => {
                SyncError::network_retryable(format!("status {}", code))
            }
            HttpError::Status(code) => SyncError::network_fatal(format!("status {}", code)),
            HttpError::Connection(message) => SyncError::network_retryable(message),
        }
    }
}

/// A [`ChangeFeedSource`] speaking the server's JSON REST dialect.
pub struct HttpChangeFeed<C: HttpClient> {
    base_url: String,
    timeout: Duration,
    client: C,
}

impl<C: HttpClient> HttpChangeFeed<C> {
    /// Creates a feed for the configured server.
    pub fn new(config: &SyncConfig, client: C) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
            client,
        }
    }

    /// Returns the base URL requests are routed to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> SyncResult<T> {
        let body = self.client.get(url, self.timeout)?;
        serde_json::from_slice(&body).map_err(|e| SyncError::Decode(e.to_string()))
    }
}

impl<C: HttpClient> ChangeFeedSource for HttpChangeFeed<C> {
    fn fetch_page<T: DeserializeOwned>(
        &self,
        entity_type: EntityType,
        window: ChangeWindow,
        page: u32,
        size: u32,
    ) -> SyncResult<ChangeFeedPage<T>> {
        let url = format!(
            "{}/sync/{}?updatedAfter={}&updatedUntil={}&page={}&size={}",
            self.base_url,
            entity_type.as_str(),
            window.after,
            window.until,
            page,
            size
        );
        self.get_json(&url)
    }

    fn fetch_last_modified(&self) -> SyncResult<LastModified> {
        let url = format!("{}/sync/last-modified", self.base_url);
        self.get_json(&url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records requested URLs and replays a scripted body.
    struct ScriptedClient {
        body: Mutex<Result<Vec<u8>, HttpError>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn ok(body: &str) -> Self {
            Self {
                body: Mutex::new(Ok(body.as_bytes().to_vec())),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn err(err: HttpError) -> Self {
            Self {
                body: Mutex::new(Err(err)),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for ScriptedClient {
        fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, HttpError> {
            self.urls.lock().push(url.to_string());
            self.body.lock().clone()
        }
    }

    fn config() -> SyncConfig {
        SyncConfig::new("https://library.example.com/")
    }

    #[test]
    fn page_url_carries_window_and_pagination() {
        let client = ScriptedClient::ok(
            r#"{"content":{"new":[],"modified":[],"removed":[]},
                "pageable":{"offset":0,"pageSize":400,"pageNumber":0,
                            "totalPages":0,"totalElements":0}}"#,
        );
        let feed = HttpChangeFeed::new(&config(), client);
        let window = ChangeWindow {
            after: 1_000,
            until: 2_000,
        };

        let page: ChangeFeedPage<phonos_sync_protocol::TrackDto> = feed
            .fetch_page(EntityType::Track, window, 2, 400)
            .unwrap();
        assert_eq!(page.pageable.total_pages, 0);

        let urls = feed.client.urls.lock().clone();
        assert_eq!(
            urls[0],
            "https://library.example.com/sync/track?updatedAfter=1000&updatedUntil=2000&page=2&size=400"
        );
    }

    #[test]
    fn last_modified_url_and_decode() {
        let client =
            ScriptedClient::ok(r#"{"track": 1700000000000, "playlist": 1600000000000}"#);
        let feed = HttpChangeFeed::new(&config(), client);

        let last_modified = feed.fetch_last_modified().unwrap();
        assert_eq!(
            last_modified.get(&EntityType::Track),
            Some(&1_700_000_000_000)
        );
        assert_eq!(
            feed.client.urls.lock()[0],
            "https://library.example.com/sync/last-modified"
        );
    }

    #[test]
    fn timeout_maps_to_page_failure() {
        let client = ScriptedClient::err(HttpError::Timeout);
        let feed = HttpChangeFeed::new(&config(), client);
        let result = feed.fetch_last_modified();
        assert!(matches!(result, Err(SyncError::Timeout)));
    }

    #[test]
    fn status_codes_classify_retryability() {
        let err: SyncError = HttpError::Status(503).into();
        assert!(err.is_retryable());
        let err: SyncError = HttpError::Status(404).into();
        assert!(!err.is_retryable());
        let err: SyncError = HttpError::Connection("refused".into()).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn malformed_body_is_a_decode_failure() {
        let client = ScriptedClient::ok("not json");
        let feed = HttpChangeFeed::new(&config(), client);
        let result = feed.fetch_last_modified();
        assert!(matches!(result, Err(SyncError::Decode(_))));
    }
}
