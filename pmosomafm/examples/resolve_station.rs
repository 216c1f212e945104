//! Example: Resolve one station to its playable track record
//!
//! Run with: cargo run -p pmosomafm --example resolve_station -- groovesalad

use pmosomafm::{Error, SomaFmConfig, StationDirectory};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "groovesalad".to_string());

    let config = SomaFmConfig::load()?;
    let directory = StationDirectory::from_config(&config)?;

    match directory.resolve_track(&id) {
        Ok(track) => {
            println!("Title:  {}", track.title);
            println!("Artist: {}", track.artist);
            println!("Album:  {}", track.album);
            println!(
                "Stream: {} ({})",
                track.stream_url,
                track.stream_format.mime_type()
            );
            match &track.album_art {
                Some(art) => println!("Art:    {} ({})", art.url, art.format.mime_type()),
                None => println!("Art:    none"),
            }
        }
        Err(Error::StationNotFound(id)) => {
            println!("Station '{}' is not in the SomaFM directory", id);
        }
        Err(Error::NoPlayableStream { station, format }) => {
            println!("Station '{}' has no {} stream", station, format);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
