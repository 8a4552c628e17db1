//! Airport coordinate proxy.
//!
//! Forwards a batch of IATA codes to the upstream lookup with the server-held
//! API key, so browsers never see it. Results go through the shared cache.

use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use flightmap_core::{normalize_iata, AirportLookup};
use flightmap_lookup::AirportRecord;
use serde_json::{json, Value};
use std::sync::Arc;

fn codes_from_body(body: &Value) -> Option<Vec<String>> {
    body.get("airport_iata_codes")?
        .as_array()?
        .iter()
        .map(|code| code.as_str().map(String::from))
        .collect()
}

/// POST /api/airport
pub async fn lookup_airports<L>(
    State(state): State<Arc<AppState<L>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Value>)
where
    L: AirportLookup + Send + Sync + 'static,
{
    let Some(codes) = body.ok().and_then(|Json(body)| codes_from_body(&body)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid airport codes"})),
        );
    };

    let airports = match state.resolver.resolve(codes.iter()).await {
        Ok(airports) => airports,
        Err(err) => {
            tracing::error!("[/api/airport] Lookup failed: {}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch airport information"})),
            );
        }
    };

    // Request order, each code once.
    let mut records: Vec<AirportRecord> = Vec::with_capacity(airports.len());
    for code in codes.iter().filter_map(|code| normalize_iata(code)) {
        if records.iter().any(|record| record.iata_code == code) {
            continue;
        }
        if let Some(airport) = airports.get(&code) {
            records.push(AirportRecord::from(airport.clone()));
        }
    }

    tracing::debug!(
        "[/api/airport] Resolved {} of {} code(s)",
        records.len(),
        codes.len()
    );
    (StatusCode::OK, Json(json!(records)))
}
