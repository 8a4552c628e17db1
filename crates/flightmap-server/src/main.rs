//! Flightmap Server - airport lookup proxy for the route map

use anyhow::Result;
use flightmap_lookup::AirportLookupClient;
use flightmap_server::{api, config::Config, state::AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("flightmap_server=debug".parse()?))
        .init();

    tracing::info!("Starting flightmap server...");

    let config = Config::from_env();
    let port = config.server_port;
    if config.lookup.api_key.is_none() {
        tracing::warn!("AIRPORT_LOOKUP_API_KEY not set; upstream may reject lookups");
    }
    tracing::info!("Airport lookup upstream: {}", config.lookup.base_url);

    let lookup = AirportLookupClient::new(&config.lookup)?;
    let state = Arc::new(AppState::new(lookup));

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
