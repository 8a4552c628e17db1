//! Route demo - render and animate a multi-leg route on a headless map.
//!
//! Usage:
//!   cargo run -p flightmap-cli --bin route_demo -- \
//!     --segment JFK-LHR --segment LHR-CDG --hotel 'h1:48.86,2.35:$310'
//!
//! Airports not in `--airports` are fetched from the lookup service when
//! `AIRPORT_LOOKUP_URL` (or `--lookup-url`) is set.

use anyhow::Result;
use clap::Parser;
use flightmap_cli::{
    load_airports, load_hotels, parse_hotel, parse_segment, resolve_until_shutdown,
    run_animation_loop,
};
use flightmap_core::{
    AirportCache, AirportResolver, FrameQueue, HeadlessMap, HotelPoint, MapConfig, MapHandle,
    RouteMapController, SegmentCodes,
};
use flightmap_lookup::{AirportLookupClient, LookupConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render and animate a flight route on a headless map")]
struct Args {
    /// Route leg as FROM-TO, repeatable
    #[arg(long = "segment", value_parser = parse_segment)]
    segments: Vec<SegmentCodes>,

    /// Hotel pin as ID:LAT,LON[:LABEL], repeatable
    #[arg(long = "hotel", value_parser = parse_hotel)]
    hotels: Vec<HotelPoint>,

    /// JSON file with more hotel pins
    #[arg(long)]
    hotels_file: Option<PathBuf>,

    /// JSON file of known airports, loaded into the cache up front
    #[arg(long)]
    airports: Option<PathBuf>,

    /// Airport lookup service base URL
    #[arg(long, env = "AIRPORT_LOOKUP_URL")]
    lookup_url: Option<String>,

    /// Airport lookup API key
    #[arg(long, env = "AIRPORT_LOOKUP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Airport lookup request timeout in seconds
    #[arg(long, env = "AIRPORT_LOOKUP_TIMEOUT_SECS", default_value_t = 10)]
    lookup_timeout_secs: u64,

    /// Interpolation steps per leg
    #[arg(long, default_value_t = 900)]
    steps: usize,

    /// Glyph frames to emit before exiting (0 runs until Ctrl-C)
    #[arg(long, default_value_t = 240)]
    frames: usize,

    /// Milliseconds between frames
    #[arg(long, default_value_t = 16)]
    interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("route_demo=info".parse()?)
            .add_directive("flightmap_cli=info".parse()?))
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.steps > 0, "--steps must be at least 1");

    let cache = AirportCache::global();
    if let Some(path) = &args.airports {
        let added = cache.merge(load_airports(path)?);
        tracing::info!("Loaded {} airport(s) from {}", added, path.display());
    }

    let mut hotels = args.hotels.clone();
    if let Some(path) = &args.hotels_file {
        hotels.extend(load_hotels(path)?);
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut lookup_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let config = MapConfig {
        arc_steps: args.steps,
        ..MapConfig::default()
    };
    let map = HeadlessMap::new(config.style_url.clone(), config.default_center, config.default_zoom);
    let mut controller = RouteMapController::new(map, FrameQueue::new(), config, cache.clone());

    let outcome = controller.apply_data(args.segments.clone(), hotels);
    if let Some(pending) = outcome.pending {
        match &args.lookup_url {
            Some(url) => {
                let lookup_config = LookupConfig::new(url, args.api_key.clone())
                    .with_timeout(Duration::from_secs(args.lookup_timeout_secs));
                let lookup = AirportLookupClient::new(&lookup_config)?;
                let resolver = AirportResolver::with_cache(lookup, cache.clone());
                let Some(resolved) =
                    resolve_until_shutdown(&resolver, pending.codes(), &mut lookup_shutdown).await
                else {
                    controller.dispose();
                    return Ok(());
                };
                controller.finish_resolution(pending, resolved);
            }
            None => tracing::warn!(
                "No lookup URL configured, unresolved airports: {}",
                pending.codes().join(", ")
            ),
        }
    }

    // The headless style loads as soon as it is asked to.
    controller.map_mut().finish_style_load();
    if let Some(summary) = controller.on_style_loaded() {
        tracing::info!(
            "Map ready: {} route(s), {} unresolved, {} marker(s), camera {:?}",
            summary.routes,
            summary.dropped,
            summary.markers,
            controller.map().camera()
        );
    }

    let max_frames = (args.frames > 0).then_some(args.frames);
    let emitted = run_animation_loop(
        &mut controller,
        Duration::from_millis(args.interval_ms.max(1)),
        max_frames,
        shutdown_rx,
    )
    .await;

    tracing::info!("Emitted {} glyph frame(s)", emitted);
    controller.dispose();
    Ok(())
}
