//! Streaming parser for the SomaFM `channels.xml` feed
//!
//! The document is read as a flat stream of `quick-xml` events. A small
//! state machine walks it: scanning for the next `<channel>`, then reading
//! the channel's immediate children until its closing tag.
//!
//! ```text
//! <channels>
//!   <channel id="groovesalad">
//!     <title><![CDATA[Groove Salad]]></title>
//!     <image>https://somafm.com/img/groovesalad120.png</image>
//!     <highestpls format="mp3">https://somafm.com/groovesalad130.pls</highestpls>
//!     ...
//!   </channel>
//! </channels>
//! ```

use std::io::BufRead;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::models::{ImageKind, ImageVariant, Station, StreamKind, StreamVariant};

const CHANNEL_TAG: &[u8] = b"channel";
const TITLE_TAG: &[u8] = b"title";
const ID_ATTR: &[u8] = b"id";
const FORMAT_ATTR: &[u8] = b"format";

/// Parse a feed held in memory
pub fn parse_stations_str(xml: &str) -> Result<Vec<Station>> {
    parse_stations(xml.as_bytes())
}

/// Parse a feed from any buffered reader
///
/// Stations are returned in document order. Unknown elements are ignored.
/// Fails with [`Error::FeedMalformed`] when the document has no `<channel>`
/// element, a channel lacks its `id` attribute, a stream element lacks its
/// `format` attribute, the document ends before its root element closes, or
/// the XML itself is ill-formed. I/O failures while
/// reading surface as [`Error::FeedUnavailable`].
pub fn parse_stations<R: BufRead>(source: R) -> Result<Vec<Station>> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut stations = Vec::new();
    let mut state = ParseState::Scanning;
    let mut seen_channel = false;
    // Elements open outside any channel, the root included
    let mut open_elements = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf)?;

        state = match state {
            ParseState::Scanning => match event {
                Event::Start(e) => {
                    open_elements += 1;
                    if e.local_name().as_ref() == CHANNEL_TAG {
                        seen_channel = true;
                        ParseState::InChannel(ChannelReader::open(&e, &reader)?)
                    } else {
                        ParseState::Scanning
                    }
                }
                Event::End(_) => {
                    open_elements = open_elements.saturating_sub(1);
                    ParseState::Scanning
                }
                Event::Empty(e) if e.local_name().as_ref() == CHANNEL_TAG => {
                    seen_channel = true;
                    let channel = ChannelReader::open(&e, &reader)?;
                    stations.push(channel.station);
                    ParseState::Scanning
                }
                Event::Eof if open_elements > 0 => {
                    return Err(Error::malformed(
                        "document ends before root element closes",
                    ));
                }
                Event::Eof => break,
                _ => ParseState::Scanning,
            },
            ParseState::InChannel(mut channel) => match event {
                Event::Start(e) => {
                    channel.enter(&e, &reader)?;
                    ParseState::InChannel(channel)
                }
                Event::Empty(e) => {
                    if channel.depth == 0 {
                        if let Some(capture) = Capture::classify(&e, &reader)? {
                            channel.finish(capture);
                        }
                    }
                    ParseState::InChannel(channel)
                }
                Event::End(_) if channel.depth == 0 => {
                    trace!(
                        "Parsed channel {} ({} streams, {} images)",
                        channel.station.id,
                        channel.station.streams.len(),
                        channel.station.images.len()
                    );
                    stations.push(channel.station);
                    open_elements = open_elements.saturating_sub(1);
                    ParseState::Scanning
                }
                Event::End(_) => {
                    channel.leave();
                    ParseState::InChannel(channel)
                }
                Event::Text(e) => {
                    if let Some(capture) = channel.capture_mut() {
                        let text = e.decode().map_err(quick_xml::Error::Encoding)?;
                        capture.text.push_str(&text);
                    }
                    ParseState::InChannel(channel)
                }
                Event::CData(e) => {
                    if let Some(capture) = channel.capture_mut() {
                        let text = e.decode().map_err(quick_xml::Error::Encoding)?;
                        capture.text.push_str(&text);
                    }
                    ParseState::InChannel(channel)
                }
                Event::GeneralRef(e) => {
                    if let Some(capture) = channel.capture_mut() {
                        if let Some(ch) = e.resolve_char_ref()? {
                            capture.text.push(ch);
                        } else {
                            let name = e.decode().map_err(quick_xml::Error::Encoding)?;
                            match resolve_predefined_entity(&name) {
                                Some(value) => capture.text.push_str(value),
                                None => {
                                    capture.text.push('&');
                                    capture.text.push_str(&name);
                                    capture.text.push(';');
                                }
                            }
                        }
                    }
                    ParseState::InChannel(channel)
                }
                Event::Eof => {
                    return Err(Error::malformed(format!(
                        "document ends inside channel {}",
                        channel.station.id
                    )));
                }
                _ => ParseState::InChannel(channel),
            },
        };

        buf.clear();
    }

    if !seen_channel {
        return Err(Error::malformed("no channel element found"));
    }

    debug!("Parsed {} stations from feed", stations.len());
    Ok(stations)
}

enum ParseState {
    Scanning,
    InChannel(ChannelReader),
}

/// Channel being read, with the child element currently captured
struct ChannelReader {
    station: Station,
    /// Element depth below `<channel>`; 0 means between its children
    depth: usize,
    capture: Option<Capture>,
}

impl ChannelReader {
    fn open<R>(start: &BytesStart<'_>, reader: &Reader<R>) -> Result<Self> {
        let id = required_attr(start, ID_ATTR, reader)
            .ok_or_else(|| Error::malformed("channel element without id attribute"))??;

        Ok(Self {
            station: Station::new(id),
            depth: 0,
            capture: None,
        })
    }

    fn enter<R>(&mut self, start: &BytesStart<'_>, reader: &Reader<R>) -> Result<()> {
        if self.depth == 0 {
            self.capture = Capture::classify(start, reader)?;
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
        if self.depth == 0 {
            if let Some(capture) = self.capture.take() {
                self.finish(capture);
            }
        }
    }

    /// Text only counts when it sits directly inside a captured child
    fn capture_mut(&mut self) -> Option<&mut Capture> {
        if self.depth == 1 {
            self.capture.as_mut()
        } else {
            None
        }
    }

    fn finish(&mut self, capture: Capture) {
        let text = capture.text.trim();
        match capture.target {
            Target::Title => self.station.title = text.to_string(),
            Target::Stream { kind, format } => {
                if text.is_empty() {
                    debug!("Skipping empty {} URL on channel {}", kind, self.station.id);
                } else {
                    self.station
                        .streams
                        .push(StreamVariant::new(kind, format, text));
                }
            }
            Target::Image(kind) => {
                if text.is_empty() {
                    debug!("Skipping empty {} URL on channel {}", kind, self.station.id);
                } else {
                    self.station.images.push(ImageVariant::new(kind, text));
                }
            }
        }
    }
}

struct Capture {
    target: Target,
    text: String,
}

enum Target {
    Title,
    Stream { kind: StreamKind, format: String },
    Image(ImageKind),
}

impl Capture {
    /// Decide what a direct child of `<channel>` feeds into, if anything
    fn classify<R>(start: &BytesStart<'_>, reader: &Reader<R>) -> Result<Option<Self>> {
        let local = start.local_name();
        let name = std::str::from_utf8(local.as_ref()).unwrap_or_default();

        let target = if local.as_ref() == TITLE_TAG {
            Target::Title
        } else if let Some(kind) = StreamKind::from_tag(name) {
            let format = required_attr(start, FORMAT_ATTR, reader).ok_or_else(|| {
                Error::malformed(format!("{} element without format attribute", kind))
            })??;
            Target::Stream { kind, format }
        } else if let Some(kind) = ImageKind::from_tag(name) {
            Target::Image(kind)
        } else {
            return Ok(None);
        };

        Ok(Some(Self {
            target,
            text: String::new(),
        }))
    }
}

/// Look up and unescape an attribute; `None` when absent
fn required_attr<R>(
    start: &BytesStart<'_>,
    name: &[u8],
    reader: &Reader<R>,
) -> Option<Result<String>> {
    let attr = match start.try_get_attribute(name) {
        Ok(Some(attr)) => attr,
        Ok(None) => return None,
        Err(e) => return Some(Err(quick_xml::Error::from(e).into())),
    };

    Some(
        attr.decode_and_unescape_value(reader.decoder())
            .map(|value| value.into_owned())
            .map_err(Error::from),
    )
}
