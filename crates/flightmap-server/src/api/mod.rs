//! API routes for the flightmap server.

pub mod airports;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use flightmap_core::AirportLookup;
use std::sync::Arc;

pub fn routes<L>() -> Router<Arc<AppState<L>>>
where
    L: AirportLookup + Send + Sync + 'static,
{
    Router::new()
        .route("/api/airport", post(airports::lookup_airports::<L>))
        .route("/health", get(|| async { "OK" }))
}

#[cfg(test)]
mod tests;
