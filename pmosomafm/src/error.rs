//! Error types for the SomaFM client

/// Result type alias for SomaFM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the SomaFM client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The channel feed could not be reached (DNS, connection, timeout,
    /// non-success HTTP status, or the body stream broke mid-read)
    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),

    /// The feed was received but lacks the required structure
    #[error("Malformed feed: {0}")]
    FeedMalformed(String),

    /// No station with this id in the directory
    #[error("Station not found: {0}")]
    StationNotFound(String),

    /// The station has no stream in the requested format
    #[error("No {format} stream found for station: {station}")]
    NoPlayableStream { station: String, format: String },

    /// Invalid feed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error (configuration file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a malformed-feed error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::FeedMalformed(msg.into())
    }

    /// Create a feed-unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::FeedUnavailable(msg.into())
    }

    /// Whether the feed could not be reached
    pub fn is_feed_unavailable(&self) -> bool {
        matches!(self, Self::FeedUnavailable(_))
    }

    /// Whether the feed was reached but could not be parsed
    pub fn is_feed_malformed(&self) -> bool {
        matches!(self, Self::FeedMalformed(_))
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Self::FeedUnavailable(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            // Body bytes are pulled straight off the socket
            quick_xml::Error::Io(io) => Self::FeedUnavailable(io.to_string()),
            other => Self::FeedMalformed(other.to_string()),
        }
    }
}
