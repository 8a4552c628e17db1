//! Airport and hotel marker lifecycle.

use crate::map::{MapHandle, MarkerId, MarkerKind, MarkerSpec};
use crate::models::{HotelPoint, RouteSegment};
use std::collections::HashSet;

/// Markers this engine has attached to a map.
///
/// Every update is a full replace. Marker sets are small, so there is no diffing.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    handles: Vec<MarkerId>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all markers with `points`, collapsing identical coordinates.
    ///
    /// Returns the number of markers attached.
    pub fn set_markers<M: MapHandle>(&mut self, map: &mut M, points: Vec<MarkerSpec>) -> usize {
        self.clear(map);

        let mut seen = HashSet::new();
        for point in points {
            if !seen.insert(point.coordinate.dedupe_key()) {
                continue;
            }
            let key = point.render_key.clone();
            match map.add_marker(point) {
                Ok(handle) => self.handles.push(handle),
                Err(err) => tracing::warn!("Failed to add marker {}: {}", key, err),
            }
        }

        tracing::debug!("Attached {} marker(s)", self.handles.len());
        self.handles.len()
    }

    /// Detach every marker. Clearing an empty registry does nothing.
    pub fn clear<M: MapHandle>(&mut self, map: &mut M) {
        for handle in self.handles.drain(..) {
            map.remove_marker(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// One marker per segment endpoint, labelled with the IATA code.
pub fn airport_markers(segments: &[RouteSegment]) -> Vec<MarkerSpec> {
    segments
        .iter()
        .flat_map(|segment| [&segment.from, &segment.to])
        .map(|airport| MarkerSpec {
            coordinate: airport.coordinate,
            label: airport.iata_code.clone(),
            kind: MarkerKind::Airport,
            render_key: airport.iata_code.clone(),
        })
        .collect()
}

pub fn hotel_markers(hotels: &[HotelPoint]) -> Vec<MarkerSpec> {
    hotels
        .iter()
        .filter(|hotel| hotel.coordinate.is_finite())
        .map(|hotel| MarkerSpec {
            coordinate: hotel.coordinate,
            label: hotel.label.clone(),
            kind: MarkerKind::Hotel,
            render_key: hotel.id.clone(),
        })
        .collect()
}
