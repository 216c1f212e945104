//! Station directory with lazy, fetch-once caching
//!
//! [`StationDirectory`] owns the parsed channel list for the life of the
//! process (or until [`invalidate`](StationDirectory::invalidate) is
//! called). The first lookup fetches the feed; every later lookup is served
//! from memory.
//!
//! # Example
//!
//! ```no_run
//! use pmosomafm::StationDirectory;
//!
//! # fn main() -> pmosomafm::Result<()> {
//! let directory = StationDirectory::new()?;
//!
//! // First call fetches the feed, later calls hit the cache
//! for station in directory.get_channels()?.iter() {
//!     println!("{} - {}", station.id, station.title);
//! }
//!
//! match directory.get_channel("groovesalad")? {
//!     Some(station) => println!("{:?}", station.best_stream("mp3")),
//!     None => println!("no such station"),
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::client::{FeedFetcher, HttpFeedFetcher};
use crate::config::SomaFmConfig;
use crate::error::{Error, Result};
use crate::models::Station;
use crate::track::{StationTrack, DEFAULT_STREAM_FORMAT};

// ============================================================================
// Catalog
// ============================================================================

/// Immutable snapshot of a fully parsed feed
///
/// Stations keep feed order for iteration; lookups go through an id index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationCatalog {
    stations: Vec<Station>,
    index: HashMap<String, usize>,
}

impl StationCatalog {
    /// Build a catalog; a repeated id keeps its first occurrence
    pub fn new(stations: Vec<Station>) -> Self {
        let mut kept = Vec::with_capacity(stations.len());
        let mut index = HashMap::with_capacity(stations.len());

        for station in stations {
            if index.contains_key(&station.id) {
                warn!("Duplicate station id {} in feed, keeping first", station.id);
                continue;
            }
            index.insert(station.id.clone(), kept.len());
            kept.push(station);
        }

        Self {
            stations: kept,
            index,
        }
    }

    /// Stations in feed order
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Exact-match lookup by id
    pub fn get(&self, id: &str) -> Option<&Station> {
        self.index.get(id).map(|&pos| &self.stations[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Station> {
        self.stations.iter()
    }

    /// Station ids in feed order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.stations.iter().map(|s| s.id.as_str())
    }
}

impl<'a> IntoIterator for &'a StationCatalog {
    type Item = &'a Station;
    type IntoIter = std::slice::Iter<'a, Station>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

// ============================================================================
// Directory
// ============================================================================

/// Process-wide station cache in front of a [`FeedFetcher`]
///
/// # Caching Strategy
///
/// - The cache is filled on the first lookup and then reused forever.
/// - A failed fetch leaves it empty; the next lookup fetches again.
/// - Population is single-flight: concurrent first callers wait for one
///   fetch and share its catalog.
///
/// # Thread Safety
///
/// `StationDirectory` is `Send + Sync`; share it behind an `Arc`. Fetches
/// block the calling thread, so async callers should use `spawn_blocking`.
pub struct StationDirectory<F = HttpFeedFetcher> {
    fetcher: F,
    preferred_format: String,
    cache: RwLock<Option<Arc<StationCatalog>>>,
    /// Held for the duration of a fetch
    populate: Mutex<()>,
}

impl StationDirectory<HttpFeedFetcher> {
    /// Directory over the public SomaFM feed
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(HttpFeedFetcher::new()?))
    }

    /// Directory built from a [`SomaFmConfig`]
    pub fn from_config(config: &SomaFmConfig) -> Result<Self> {
        Ok(Self::with_fetcher(HttpFeedFetcher::from_config(config)?)
            .with_preferred_format(&config.preferred_format))
    }
}

impl<F: FeedFetcher> StationDirectory<F> {
    /// Directory over any station source
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            preferred_format: DEFAULT_STREAM_FORMAT.to_string(),
            cache: RwLock::new(None),
            populate: Mutex::new(()),
        }
    }

    /// Set the stream format used by [`resolve_track`](Self::resolve_track)
    pub fn with_preferred_format(mut self, format: impl Into<String>) -> Self {
        self.preferred_format = format.into();
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn preferred_format(&self) -> &str {
        &self.preferred_format
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// All stations in feed order, fetching the feed on first use
    ///
    /// Fetch errors are returned unchanged to the caller that triggered the
    /// fetch; the cache stays empty so a later call retries.
    pub fn get_channels(&self) -> Result<Arc<StationCatalog>> {
        if let Some(catalog) = self.cached() {
            return Ok(catalog);
        }

        let _guard = self.populate.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have filled the cache while we waited
        if let Some(catalog) = self.cached() {
            debug!("Station cache filled by concurrent fetch");
            return Ok(catalog);
        }

        info!("Station cache empty, fetching from {}", self.fetcher.source());
        self.fetch_and_store()
    }

    /// Station with this exact id
    ///
    /// An unknown id is `Ok(None)`, not an error.
    pub fn get_channel(&self, id: &str) -> Result<Option<Station>> {
        let catalog = self.get_channels()?;
        let station = catalog.get(id).cloned();
        if station.is_none() {
            debug!("Station {} not in directory", id);
        }
        Ok(station)
    }

    /// Playable record for a station in the preferred format
    pub fn resolve_track(&self, id: &str) -> Result<StationTrack> {
        self.resolve_track_with_format(id, &self.preferred_format)
    }

    /// Playable record for a station in a specific format
    ///
    /// Fails with [`Error::StationNotFound`] for an unknown id and
    /// [`Error::NoPlayableStream`] when the station has no matching stream.
    pub fn resolve_track_with_format(&self, id: &str, format: &str) -> Result<StationTrack> {
        let catalog = self.get_channels()?;
        let station = catalog
            .get(id)
            .ok_or_else(|| Error::StationNotFound(id.to_string()))?;
        StationTrack::from_station(station, format)
    }

    // ========================================================================
    // Cache management
    // ========================================================================

    /// Whether the cache currently holds a catalog
    pub fn is_populated(&self) -> bool {
        self.cached().is_some()
    }

    /// Drop the cached catalog; the next lookup fetches again
    ///
    /// Catalogs already handed out stay valid.
    pub fn invalidate(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Station cache invalidated");
    }

    /// Fetch now and replace the cache
    ///
    /// On failure the previous catalog (if any) is kept.
    pub fn refresh(&self) -> Result<Arc<StationCatalog>> {
        let _guard = self.populate.lock().unwrap_or_else(PoisonError::into_inner);
        info!("Force refreshing stations from {}", self.fetcher.source());
        self.fetch_and_store()
    }

    fn cached(&self) -> Option<Arc<StationCatalog>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Caller must hold `populate`
    fn fetch_and_store(&self) -> Result<Arc<StationCatalog>> {
        let stations = self.fetcher.fetch_stations()?;
        let catalog = Arc::new(StationCatalog::new(stations));

        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(catalog.clone());
        info!("Cached {} stations", catalog.len());

        Ok(catalog)
    }
}

impl<F: FeedFetcher> std::fmt::Debug for StationDirectory<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cached().map(|c| c.len());
        f.debug_struct("StationDirectory")
            .field("source", &self.fetcher.source())
            .field("preferred_format", &self.preferred_format)
            .field("cached_stations", &cached)
            .finish()
    }
}
