//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for sync sessions.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the library server (e.g. "https://library.example.com").
    pub base_url: String,
    /// Page size requested from the change feed.
    pub page_size: u32,
    /// Minimum gap between runs when the caller asks to skip recent syncs.
    pub throttle: Duration,
    /// Upper bound on each network call. Expiry counts as a page failure.
    pub request_timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration with the standard defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: 400,
            throttle: Duration::from_secs(10 * 60),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the change-feed page size.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the throttle window.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::new("https://library.example.com");
        assert_eq!(config.page_size, 400);
        assert_eq!(config.throttle, Duration::from_secs(600));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn builder() {
        let config = SyncConfig::new("https://library.example.com")
            .with_page_size(100)
            .with_throttle(Duration::from_secs(60))
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.page_size, 100);
        assert_eq!(config.throttle, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
