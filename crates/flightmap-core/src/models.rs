//! Core data models for the flight route map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolved airports keyed by IATA code.
pub type AirportMap = HashMap<String, Airport>;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `[lon, lat]` order, as GeoJSON expects.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Bit-exact key used to collapse identical positions. Signed zeros
    /// share a key.
    pub(crate) fn dedupe_key(&self) -> (u64, u64) {
        ((self.latitude + 0.0).to_bits(), (self.longitude + 0.0).to_bits())
    }
}

/// An airport with a known position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    pub iata_code: String,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Airport {
    pub fn new(iata_code: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            iata_code: iata_code.into(),
            coordinate: Coordinate::new(latitude, longitude),
            name: None,
            city: None,
            timezone: None,
        }
    }
}

/// A route segment as the host describes it, before coordinates are known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentCodes {
    pub from: String,
    pub to: String,
}

impl SegmentCodes {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Resolve both endpoints, or `None` if either is unknown.
    pub fn resolve(&self, airports: &AirportMap) -> Option<RouteSegment> {
        let from = airports.get(&normalize_iata(&self.from)?)?;
        let to = airports.get(&normalize_iata(&self.to)?)?;
        Some(RouteSegment {
            from: from.clone(),
            to: to.clone(),
        })
    }
}

/// A route segment with both endpoints resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from: Airport,
    pub to: Airport,
}

/// A hotel pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelPoint {
    pub id: String,
    pub coordinate: Coordinate,
    pub label: String,
}

impl HotelPoint {
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            coordinate: Coordinate::new(latitude, longitude),
            label: label.into(),
        }
    }
}

/// Canonical form of an IATA code: trimmed, upper-case, non-empty.
pub fn normalize_iata(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

/// Resolve every segment whose endpoints are both known, preserving order.
pub fn resolve_segments(segments: &[SegmentCodes], airports: &AirportMap) -> Vec<RouteSegment> {
    segments
        .iter()
        .filter_map(|segment| segment.resolve(airports))
        .collect()
}
