//! Example: List every SomaFM station with its best stream and logo
//!
//! Run with: cargo run -p pmosomafm --example list_channels
//!
//! Set `RUST_LOG=pmosomafm=debug` to watch the fetch and parse.

use pmosomafm::{SomaFmConfig, StationDirectory};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = SomaFmConfig::load()?;
    let directory = StationDirectory::from_config(&config)?;

    println!("Fetching {}...\n", config.feed_url);
    let stations = directory.get_channels()?;

    println!("Found {} stations:\n", stations.len());
    for station in stations.iter() {
        let stream = station
            .best_stream(&config.preferred_format)
            .map(|s| format!("{} [{}]", s.url, s.kind))
            .unwrap_or_else(|| format!("no {} stream", config.preferred_format));
        let image = station
            .best_image()
            .map(|i| i.url.as_str())
            .unwrap_or("-");

        println!("  {} ({})", station.title, station.id);
        println!("    formats: {}", station.formats().join(", "));
        println!("    stream:  {}", stream);
        println!("    logo:    {}", image);
    }

    Ok(())
}
