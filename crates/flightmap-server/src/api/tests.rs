use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use flightmap_core::{Airport, AirportCache, AirportLookup, LookupError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, state::AppState};

#[derive(Default)]
struct FakeLookup {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl AirportLookup for FakeLookup {
    async fn lookup(&self, codes: &[String]) -> Result<Vec<Airport>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LookupError::Status(502));
        }
        let mut cdg = Airport::new("CDG", 49.0097, 2.5479);
        cdg.name = Some("Charles de Gaulle".to_string());
        cdg.city = Some("Paris".to_string());
        cdg.timezone = Some("Europe/Paris".to_string());
        Ok([Airport::new("JFK", 40.6413, -73.7781), cdg]
            .into_iter()
            .filter(|airport| codes.contains(&airport.iata_code))
            .collect())
    }
}

fn setup_app(lookup: FakeLookup) -> axum::Router {
    let state = Arc::new(AppState::with_cache(lookup, AirportCache::new()));
    api::routes().with_state(state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn airport_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/airport")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let app = setup_app(FakeLookup::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn returns_flat_records_in_request_order() {
    let app = setup_app(FakeLookup::default());

    let response = app
        .oneshot(airport_request(
            json!({"airport_iata_codes": ["cdg", "ZZZ", "JFK", "CDG"]}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let rows = body.as_array().expect("array body");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["iataCode"], "CDG");
    assert_eq!(rows[0]["city"], "Paris");
    assert_eq!(rows[0]["latitude"], 49.0097);
    assert_eq!(rows[0]["longitude"], 2.5479);
    assert_eq!(rows[1]["iataCode"], "JFK");
    assert_eq!(rows[1]["name"], Value::Null);
}

#[tokio::test]
async fn repeated_codes_are_served_from_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = setup_app(FakeLookup {
        calls: calls.clone(),
        fail: false,
    });
    let body = json!({"airport_iata_codes": ["JFK", "CDG"]}).to_string();

    let first = app.clone().oneshot(airport_request(body.clone())).await.unwrap();
    let second = app.oneshot(airport_request(body)).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(read_json(second).await.as_array().map(Vec::len), Some(2));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejects_missing_or_malformed_codes() {
    for body in [
        json!({}).to_string(),
        json!({"airport_iata_codes": "JFK"}).to_string(),
        json!({"airport_iata_codes": [1, 2]}).to_string(),
        "not json".to_string(),
    ] {
        let app = setup_app(FakeLookup::default());
        let response = app.oneshot(airport_request(body.clone())).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let payload = read_json(response).await;
        assert_eq!(payload["error"], "Invalid airport codes");
    }
}

#[tokio::test]
async fn upstream_failure_is_internal_error() {
    let app = setup_app(FakeLookup {
        fail: true,
        ..FakeLookup::default()
    });

    let response = app
        .oneshot(airport_request(
            json!({"airport_iata_codes": ["JFK"]}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json(response).await["error"],
        "Failed to fetch airport information"
    );
}
