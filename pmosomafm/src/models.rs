//! Data models for the SomaFM channel feed
//!
//! A [`Station`] carries its stream and image candidates in feed document
//! order. Selection of the best candidate follows fixed preference lists
//! ([`STREAM_PREFERENCE`], [`IMAGE_PREFERENCE`]): the feed only publishes
//! categorical tier labels, never bitrates or resolutions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Variant kinds
// ============================================================================

/// Stream tier published by the feed (playlist element name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// `<fastpls>`
    FastPls,
    /// `<slowpls>`
    SlowPls,
    /// `<highestpls>`
    HighestPls,
}

impl StreamKind {
    /// Feed element name for this tier
    pub const fn tag(self) -> &'static str {
        match self {
            Self::FastPls => "fastpls",
            Self::SlowPls => "slowpls",
            Self::HighestPls => "highestpls",
        }
    }

    /// Map a feed element name onto a stream tier
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "fastpls" => Some(Self::FastPls),
            "slowpls" => Some(Self::SlowPls),
            "highestpls" => Some(Self::HighestPls),
            _ => None,
        }
    }
}

/// Artwork tier published by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// `<image>`
    Image,
    /// `<largeimage>`
    LargeImage,
    /// `<xlimage>`
    XlImage,
}

impl ImageKind {
    /// Feed element name for this tier
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::LargeImage => "largeimage",
            Self::XlImage => "xlimage",
        }
    }

    /// Map a feed element name onto an image tier
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "image" => Some(Self::Image),
            "largeimage" => Some(Self::LargeImage),
            "xlimage" => Some(Self::XlImage),
            _ => None,
        }
    }
}

macro_rules! impl_tag_traits {
    ($kind:ty, $label:literal) => {
        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.tag())
            }
        }

        impl FromStr for $kind {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Self::from_tag(s).ok_or_else(|| format!(concat!("Unknown ", $label, ": {}"), s))
            }
        }
    };
}

impl_tag_traits!(StreamKind, "stream kind");
impl_tag_traits!(ImageKind, "image kind");

/// Stream tiers, most preferred first
pub const STREAM_PREFERENCE: [StreamKind; 3] = [
    StreamKind::HighestPls,
    StreamKind::FastPls,
    StreamKind::SlowPls,
];

/// Image tiers, most preferred first
pub const IMAGE_PREFERENCE: [ImageKind; 3] =
    [ImageKind::LargeImage, ImageKind::XlImage, ImageKind::Image];

// ============================================================================
// Variants
// ============================================================================

/// One playable URL option for a station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamVariant {
    pub kind: StreamKind,
    /// Codec/container tag as published (e.g. "mp3", "aacp")
    pub format: String,
    pub url: String,
}

impl StreamVariant {
    pub fn new(kind: StreamKind, format: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind,
            format: format.into(),
            url: url.into(),
        }
    }

    /// Case-insensitive format comparison
    pub fn has_format(&self, format: &str) -> bool {
        self.format.eq_ignore_ascii_case(format)
    }
}

/// One artwork option for a station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariant {
    pub kind: ImageKind,
    pub url: String,
}

impl ImageVariant {
    pub fn new(kind: ImageKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

// ============================================================================
// Station
// ============================================================================

/// A SomaFM channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Stable identifier from the feed (e.g. "groovesalad")
    pub id: String,
    /// Display name, empty when the feed omits it
    pub title: String,
    /// Stream candidates in document order
    pub streams: Vec<StreamVariant>,
    /// Image candidates in document order
    pub images: Vec<ImageVariant>,
}

impl Station {
    /// Create a station with no title, streams or images
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the title (builder style)
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Append a stream candidate (builder style)
    pub fn with_stream(mut self, stream: StreamVariant) -> Self {
        self.streams.push(stream);
        self
    }

    /// Append an image candidate (builder style)
    pub fn with_image(mut self, image: ImageVariant) -> Self {
        self.images.push(image);
        self
    }

    /// Best stream in the requested format
    ///
    /// Tiers are tried in [`STREAM_PREFERENCE`] order; within a tier the
    /// first matching entry in document order wins. A `highestpls` entry
    /// anywhere in the list beats every `fastpls`/`slowpls` entry.
    ///
    /// `format` is compared case-insensitively. Returns `None` when no
    /// stream matches at any tier.
    pub fn best_stream(&self, format: &str) -> Option<&StreamVariant> {
        STREAM_PREFERENCE.iter().find_map(|kind| {
            self.streams
                .iter()
                .find(|stream| stream.kind == *kind && stream.has_format(format))
        })
    }

    /// Best artwork, tried in [`IMAGE_PREFERENCE`] order
    ///
    /// Within a tier the first entry in document order wins. Returns `None`
    /// when the station has no images.
    pub fn best_image(&self) -> Option<&ImageVariant> {
        IMAGE_PREFERENCE
            .iter()
            .find_map(|kind| self.images.iter().find(|image| image.kind == *kind))
    }

    /// Distinct stream formats published for this station, in first-seen order
    pub fn formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = Vec::new();
        for stream in &self.streams {
            if !formats
                .iter()
                .any(|seen| seen.eq_ignore_ascii_case(&stream.format))
            {
                formats.push(&stream.format);
            }
        }
        formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp3(kind: StreamKind, url: &str) -> StreamVariant {
        StreamVariant::new(kind, "mp3", url)
    }

    #[test]
    fn test_highest_wins_regardless_of_order() {
        let orders = [
            [StreamKind::FastPls, StreamKind::SlowPls, StreamKind::HighestPls],
            [StreamKind::HighestPls, StreamKind::FastPls, StreamKind::SlowPls],
            [StreamKind::SlowPls, StreamKind::HighestPls, StreamKind::FastPls],
        ];

        for order in orders {
            let mut station = Station::new("groovesalad");
            for kind in order {
                let url = match kind {
                    StreamKind::FastPls => "A",
                    StreamKind::SlowPls => "B",
                    StreamKind::HighestPls => "C",
                };
                station = station.with_stream(mp3(kind, url));
            }
            assert_eq!(station.best_stream("mp3").unwrap().url, "C");
        }
    }

    #[test]
    fn test_fast_beats_slow_without_highest() {
        let station = Station::new("dronezone")
            .with_stream(mp3(StreamKind::SlowPls, "B"))
            .with_stream(mp3(StreamKind::FastPls, "A"));
        assert_eq!(station.best_stream("mp3").unwrap().url, "A");
    }

    #[test]
    fn test_format_is_case_insensitive() {
        let station = Station::new("lush")
            .with_stream(StreamVariant::new(StreamKind::FastPls, "MP3", "A"));
        assert_eq!(station.best_stream("mp3").unwrap().url, "A");
        assert_eq!(station.best_stream("Mp3").unwrap().url, "A");
    }

    #[test]
    fn test_format_filters_before_tier() {
        let station = Station::new("secretagent")
            .with_stream(StreamVariant::new(StreamKind::HighestPls, "aac", "AAC"))
            .with_stream(mp3(StreamKind::SlowPls, "SLOW"));
        assert_eq!(station.best_stream("mp3").unwrap().url, "SLOW");
        assert_eq!(station.best_stream("aac").unwrap().url, "AAC");
        assert!(station.best_stream("ogg").is_none());
    }

    #[test]
    fn test_first_in_document_order_within_tier() {
        let station = Station::new("indiepop")
            .with_stream(mp3(StreamKind::FastPls, "first"))
            .with_stream(mp3(StreamKind::FastPls, "second"));
        assert_eq!(station.best_stream("mp3").unwrap().url, "first");
    }

    #[test]
    fn test_no_streams() {
        assert!(Station::new("empty").best_stream("mp3").is_none());
    }

    #[test]
    fn test_xlimage_beats_image_without_largeimage() {
        let station = Station::new("groovesalad")
            .with_image(ImageVariant::new(ImageKind::Image, "I1"))
            .with_image(ImageVariant::new(ImageKind::XlImage, "I2"));
        assert_eq!(station.best_image().unwrap().url, "I2");
    }

    #[test]
    fn test_largeimage_preferred() {
        let station = Station::new("groovesalad")
            .with_image(ImageVariant::new(ImageKind::XlImage, "XL"))
            .with_image(ImageVariant::new(ImageKind::Image, "SMALL"))
            .with_image(ImageVariant::new(ImageKind::LargeImage, "LARGE"));
        assert_eq!(station.best_image().unwrap().kind, ImageKind::LargeImage);
        assert_eq!(station.best_image().unwrap().url, "LARGE");
    }

    #[test]
    fn test_no_images() {
        assert!(Station::new("groovesalad").best_image().is_none());
    }

    #[test]
    fn test_kind_tags() {
        for kind in STREAM_PREFERENCE {
            assert_eq!(StreamKind::from_tag(kind.tag()), Some(kind));
        }
        for kind in IMAGE_PREFERENCE {
            assert_eq!(kind.to_string().parse::<ImageKind>(), Ok(kind));
        }
        assert!(StreamKind::from_tag("title").is_none());
        assert!("HIGHESTPLS".parse::<StreamKind>().is_err());
    }

    #[test]
    fn test_formats_dedup() {
        let station = Station::new("groovesalad")
            .with_stream(mp3(StreamKind::HighestPls, "a"))
            .with_stream(StreamVariant::new(StreamKind::FastPls, "aacp", "b"))
            .with_stream(StreamVariant::new(StreamKind::SlowPls, "MP3", "c"));
        assert_eq!(station.formats(), vec!["mp3", "aacp"]);
    }
}
