//! Blocking HTTP fetcher for the SomaFM channel feed
//!
//! [`HttpFeedFetcher`] issues one GET per call and streams the response body
//! straight into the XML parser. There is no caching or retrying here:
//! [`StationDirectory`](crate::StationDirectory) owns the cache.
//!
//! # Example
//!
//! ```no_run
//! use pmosomafm::{FeedFetcher, HttpFeedFetcher};
//! use std::time::Duration;
//!
//! # fn main() -> pmosomafm::Result<()> {
//! let fetcher = HttpFeedFetcher::builder()
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let stations = fetcher.fetch_stations()?;
//! println!("{} stations", stations.len());
//! # Ok(())
//! # }
//! ```

use std::io::BufReader;
use std::time::Duration;

use tracing::{debug, warn};
use ureq::Agent;
use url::Url;

use crate::config::SomaFmConfig;
use crate::error::{Error, Result};
use crate::models::Station;
use crate::parser::parse_stations;

/// Public SomaFM channel feed
pub const DEFAULT_FEED_URL: &str = "http://somafm.com/channels.xml";

/// Default timeout for the whole feed request (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str =
    concat!("PMOMusic/", env!("CARGO_PKG_VERSION"), " (pmosomafm)");

/// Source of station lists
///
/// Implemented by [`HttpFeedFetcher`]; tests and embedders can provide their
/// own (a local file, a canned document) and hand it to
/// [`StationDirectory::with_fetcher`](crate::StationDirectory::with_fetcher).
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse the full station list, in feed order
    fn fetch_stations(&self) -> Result<Vec<Station>>;

    /// Human-readable description of where stations come from
    fn source(&self) -> &str;
}

/// SomaFM feed fetcher over blocking HTTP
#[derive(Clone)]
pub struct HttpFeedFetcher {
    agent: Agent,
    url: String,
    timeout: Duration,
    user_agent: String,
}

impl HttpFeedFetcher {
    /// Fetcher for the public feed with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the fetcher
    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    /// Fetcher configured from a [`SomaFmConfig`]
    pub fn from_config(config: &SomaFmConfig) -> Result<Self> {
        Self::builder()
            .url(&config.feed_url)
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()
    }

    /// Feed URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Timeout applied to each fetch
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for HttpFeedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFeedFetcher")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch_stations(&self) -> Result<Vec<Station>> {
        debug!("Fetching SomaFM channel feed from {}", self.url);

        let response = self
            .agent
            .get(&self.url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|e| {
                warn!("SomaFM feed request to {} failed: {}", self.url, e);
                Error::from(e)
            })?;

        let (_parts, body) = response.into_parts();
        let reader = BufReader::new(body.into_reader());

        parse_stations(reader).inspect_err(|e| {
            warn!("Failed to read SomaFM feed from {}: {}", self.url, e);
        })
    }

    fn source(&self) -> &str {
        &self.url
    }
}

/// Builder for [`HttpFeedFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherBuilder {
    url: String,
    timeout: Duration,
    user_agent: String,
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetcherBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the feed URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout (connection, headers and body together)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the fetcher
    ///
    /// Fails with [`Error::InvalidUrl`] if the feed URL does not parse. A
    /// zero timeout falls back to the default.
    pub fn build(self) -> Result<HttpFeedFetcher> {
        Url::parse(&self.url)?;

        let timeout = if self.timeout.is_zero() {
            warn!(
                "Ignoring zero feed timeout, using {}s",
                DEFAULT_REQUEST_TIMEOUT_SECS
            );
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        } else {
            self.timeout
        };

        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Ok(HttpFeedFetcher {
            agent,
            url: self.url,
            timeout,
            user_agent: self.user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = FetcherBuilder::default();
        assert_eq!(builder.url, DEFAULT_FEED_URL);
        assert_eq!(
            builder.timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert!(builder.user_agent.starts_with("PMOMusic/"));
    }

    #[test]
    fn test_build_rejects_invalid_url() {
        let err = HttpFeedFetcher::builder()
            .url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_from_config() {
        let config = SomaFmConfig {
            feed_url: "https://mirror.example.com/channels.xml".to_string(),
            timeout_secs: 5,
            ..Default::default()
        };
        let fetcher = HttpFeedFetcher::from_config(&config).unwrap();
        assert_eq!(fetcher.url(), "https://mirror.example.com/channels.xml");
        assert_eq!(fetcher.source(), fetcher.url());
        assert_eq!(fetcher.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let fetcher = HttpFeedFetcher::builder()
            .timeout(Duration::ZERO)
            .build()
            .unwrap();
        assert_eq!(
            fetcher.timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_connection_refused_is_unavailable() {
        // Bind then drop to get a local port with nothing listening
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let fetcher = HttpFeedFetcher::builder()
            .url(format!("http://127.0.0.1:{}/channels.xml", port))
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let err = fetcher.fetch_stations().unwrap_err();
        assert!(err.is_feed_unavailable(), "{err}");
    }
}
