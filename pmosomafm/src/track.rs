//! Playable track record for a station
//!
//! A media server renders a SomaFM station as a single radio item: one
//! stream URL, a display title, fixed artist/album labels and optional
//! artwork. [`StationTrack`] is that record, built from a [`Station`] with
//! [`Station::best_stream`] and [`Station::best_image`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Station;

/// Stream format requested when none is configured
pub const DEFAULT_STREAM_FORMAT: &str = "mp3";

/// Artist label shown for every station
pub const STATION_ARTIST: &str = "SomaFM";

/// Album label shown for every station
pub const STATION_ALBUM: &str = "Various";

/// Audio format of a stream, from the feed's `format` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamFormat {
    Mp3,
    Aac,
    /// HE-AAC, published as "aacp"
    AacPlus,
    Other(String),
}

impl StreamFormat {
    /// Map a feed format tag (case-insensitive)
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "mp3" => Self::Mp3,
            "aac" => Self::Aac,
            "aacp" => Self::AacPlus,
            _ => Self::Other(tag.to_string()),
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Aac | Self::AacPlus => "audio/aac",
            Self::Other(_) => "application/octet-stream",
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mp3 => f.write_str("mp3"),
            Self::Aac => f.write_str("aac"),
            Self::AacPlus => f.write_str("aacp"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

/// Media type marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Radio,
}

/// Artwork format; SomaFM publishes PNG logos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
        }
    }
}

/// Station artwork
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumArt {
    pub url: String,
    pub format: ImageFormat,
}

/// Normalized, playable record for one station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationTrack {
    pub id: String,
    pub title: String,
    pub stream_url: String,
    pub stream_format: StreamFormat,
    pub artist: String,
    pub album: String,
    pub media_type: MediaType,
    /// `None` is still a playable result
    pub album_art: Option<AlbumArt>,
}

impl StationTrack {
    /// Build the record for a station using its best stream in `format`
    ///
    /// Fails with [`Error::NoPlayableStream`] when no stream matches.
    pub fn from_station(station: &Station, format: &str) -> Result<Self> {
        let stream = station
            .best_stream(format)
            .ok_or_else(|| Error::NoPlayableStream {
                station: station.id.clone(),
                format: format.to_string(),
            })?;

        let album_art = station.best_image().map(|image| AlbumArt {
            url: image.url.clone(),
            format: ImageFormat::Png,
        });

        Ok(Self {
            id: station.id.clone(),
            title: station.title.clone(),
            stream_url: stream.url.clone(),
            stream_format: StreamFormat::from_tag(&stream.format),
            artist: STATION_ARTIST.to_string(),
            album: STATION_ALBUM.to_string(),
            media_type: MediaType::Radio,
            album_art,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageKind, ImageVariant, StreamKind, StreamVariant};

    fn station() -> Station {
        Station::new("groovesalad")
            .with_title("Groove Salad")
            .with_stream(StreamVariant::new(StreamKind::FastPls, "mp3", "http://fast.pls"))
            .with_stream(StreamVariant::new(
                StreamKind::HighestPls,
                "MP3",
                "http://highest.pls",
            ))
    }

    #[test]
    fn test_track_from_station() {
        let station = station()
            .with_image(ImageVariant::new(ImageKind::Image, "http://small.png"))
            .with_image(ImageVariant::new(ImageKind::LargeImage, "http://large.png"));

        let track = StationTrack::from_station(&station, "mp3").unwrap();
        assert_eq!(track.id, "groovesalad");
        assert_eq!(track.title, "Groove Salad");
        assert_eq!(track.stream_url, "http://highest.pls");
        assert_eq!(track.stream_format, StreamFormat::Mp3);
        assert_eq!(track.artist, "SomaFM");
        assert_eq!(track.album, "Various");
        assert_eq!(track.media_type, MediaType::Radio);
        assert_eq!(
            track.album_art,
            Some(AlbumArt {
                url: "http://large.png".to_string(),
                format: ImageFormat::Png,
            })
        );
    }

    #[test]
    fn test_missing_image_is_still_playable() {
        let track = StationTrack::from_station(&station(), "mp3").unwrap();
        assert!(track.album_art.is_none());
    }

    #[test]
    fn test_no_stream_in_format() {
        let err = StationTrack::from_station(&station(), "aacp").unwrap_err();
        assert!(matches!(
            err,
            Error::NoPlayableStream { ref station, ref format }
                if station == "groovesalad" && format == "aacp"
        ));
    }

    #[test]
    fn test_stream_format_tags() {
        assert_eq!(StreamFormat::from_tag("AACP"), StreamFormat::AacPlus);
        assert_eq!(StreamFormat::from_tag("aac").mime_type(), "audio/aac");
        assert_eq!(StreamFormat::from_tag("mp3").mime_type(), "audio/mpeg");
        assert_eq!(
            StreamFormat::from_tag("ogg"),
            StreamFormat::Other("ogg".to_string())
        );
        assert_eq!(StreamFormat::AacPlus.to_string(), "aacp");
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
    }
}
