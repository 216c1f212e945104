//! SomaFM client library for PMOMusic
//!
//! This crate resolves the SomaFM channel directory (`channels.xml`) into
//! typed stations and picks the best stream and artwork for each one.
//!
//! # Features
//!
//! - **Streaming Parse**: The feed is read as XML events straight off the
//!   HTTP body, no DOM is built
//! - **Fetch Once**: [`StationDirectory`] fetches on first use and caches the
//!   catalog for the life of the process (explicit `invalidate`/`refresh`)
//! - **Fixed Preferences**: `highestpls > fastpls > slowpls` for streams,
//!   `largeimage > xlimage > image` for artwork
//! - **Track Records**: [`StationTrack`] is the stream/title/artwork record a
//!   media server needs to render a station
//!
//! # Example
//!
//! ```no_run
//! use pmosomafm::StationDirectory;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = StationDirectory::new()?;
//!
//!     let stations = directory.get_channels()?;
//!     println!("Found {} stations", stations.len());
//!
//!     if let Some(station) = directory.get_channel("groovesalad")? {
//!         if let Some(stream) = station.best_stream("mp3") {
//!             println!("Stream: {}", stream.url);
//!         }
//!         if let Some(image) = station.best_image() {
//!             println!("Logo: {}", image.url);
//!         }
//!     }
//!
//!     let track = directory.resolve_track("dronezone")?;
//!     println!("{} by {} ({})", track.title, track.artist, track.stream_url);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Blocking I/O
//!
//! Fetching uses a blocking HTTP client. From async code, call the directory
//! inside `tokio::task::spawn_blocking` (or an equivalent worker thread).

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod parser;
pub mod track;

// Re-exports
pub use client::{FeedFetcher, FetcherBuilder, HttpFeedFetcher, DEFAULT_FEED_URL};
pub use config::SomaFmConfig;
pub use directory::{StationCatalog, StationDirectory};
pub use error::{Error, Result};
pub use models::{
    ImageKind, ImageVariant, Station, StreamKind, StreamVariant, IMAGE_PREFERENCE,
    STREAM_PREFERENCE,
};
pub use parser::{parse_stations, parse_stations_str};
pub use track::{AlbumArt, ImageFormat, MediaType, StationTrack, StreamFormat};
