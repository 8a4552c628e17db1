//! In-memory map engine.
//!
//! Keeps the same bookkeeping a real engine would (style readiness, named
//! sources and layers, markers, camera) without drawing anything. Used by the
//! demo binary and by tests.

use crate::geometry::Bounds;
use crate::map::{
    Camera, EaseOptions, Feature, FitOptions, LayerSpec, ListenerId, MapError, MapHandle,
    MarkerId, MarkerSpec,
};
use crate::models::Coordinate;
use std::collections::{BTreeMap, VecDeque};

const MAX_ZOOM: f64 = 22.0;
/// Oldest entries are dropped past this many recorded ops.
pub const HISTORY_LIMIT: usize = 256;

/// A recorded mutation, in call order.
///
/// Only the most recent [`HISTORY_LIMIT`] ops are kept, so an endless
/// animation does not grow the log.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    AddSource(String),
    RemoveSource(String),
    SetSourceData(String),
    AddLayer(String),
    RemoveLayer(String),
    AddMarker(MarkerId),
    RemoveMarker(MarkerId),
    FitBounds(Bounds, FitOptions),
    JumpTo(Coordinate, f64),
    EaseTo(EaseOptions),
    SetStyle(String),
}

#[derive(Debug, Clone)]
pub struct HeadlessMap {
    style_url: String,
    style_loaded: bool,
    removed: bool,
    introspection_fails: bool,
    next_id: u64,
    listeners: Vec<ListenerId>,
    sources: BTreeMap<String, Feature>,
    layers: Vec<LayerSpec>,
    markers: BTreeMap<MarkerId, MarkerSpec>,
    camera: Camera,
    history: VecDeque<MapOp>,
}

impl HeadlessMap {
    /// A map whose style is still loading.
    pub fn new(style_url: impl Into<String>, center: Coordinate, zoom: f64) -> Self {
        Self {
            style_url: style_url.into(),
            style_loaded: false,
            removed: false,
            introspection_fails: false,
            next_id: 1,
            listeners: Vec::new(),
            sources: BTreeMap::new(),
            layers: Vec::new(),
            markers: BTreeMap::new(),
            camera: Camera {
                center,
                zoom,
                pitch: 0.0,
                bearing: 0.0,
            },
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// A map whose style has already loaded.
    pub fn loaded(style_url: impl Into<String>, center: Coordinate, zoom: f64) -> Self {
        let mut map = Self::new(style_url, center, zoom);
        map.style_loaded = true;
        map
    }

    /// Fire (consume) the one-shot listeners without loading the style.
    pub fn fire_style_event(&mut self) -> Vec<ListenerId> {
        std::mem::take(&mut self.listeners)
    }

    /// Mark the style as loaded and fire (consume) the one-shot listeners.
    pub fn finish_style_load(&mut self) -> Vec<ListenerId> {
        self.style_loaded = true;
        std::mem::take(&mut self.listeners)
    }

    /// Destroy the map; every later call fails with [`MapError::Removed`].
    pub fn remove(&mut self) {
        self.removed = true;
        self.style_loaded = false;
        self.listeners.clear();
        self.sources.clear();
        self.layers.clear();
        self.markers.clear();
    }

    /// Make style enumeration fail, as engines do mid-load.
    pub fn set_introspection_failure(&mut self, fails: bool) {
        self.introspection_fails = fails;
    }

    pub fn style_url(&self) -> &str {
        &self.style_url
    }

    pub fn pending_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn source(&self, id: &str) -> Option<&Feature> {
        self.sources.get(id)
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerSpec> {
        self.markers.values()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Recorded ops, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &MapOp> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn record(&mut self, op: MapOp) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(op);
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn ensure_alive(&self) -> Result<(), MapError> {
        if self.removed {
            return Err(MapError::Removed);
        }
        Ok(())
    }

    fn ensure_style(&self) -> Result<(), MapError> {
        self.ensure_alive()?;
        if !self.style_loaded {
            return Err(MapError::StyleNotLoaded);
        }
        Ok(())
    }
}

impl MapHandle for HeadlessMap {
    fn is_style_loaded(&self) -> bool {
        !self.removed && self.style_loaded
    }

    fn once_style_loaded(&mut self) -> ListenerId {
        let listener = ListenerId(self.next_id());
        if !self.removed {
            self.listeners.push(listener);
        }
        listener
    }

    fn cancel_listener(&mut self, listener: ListenerId) {
        self.listeners.retain(|existing| *existing != listener);
    }

    fn set_style(&mut self, url: &str) -> Result<(), MapError> {
        self.ensure_alive()?;
        self.style_url = url.to_string();
        self.style_loaded = false;
        self.sources.clear();
        self.layers.clear();
        self.record(MapOp::SetStyle(url.to_string()));
        Ok(())
    }

    fn layer_ids(&self) -> Result<Vec<String>, MapError> {
        self.ensure_style()?;
        if self.introspection_fails {
            return Err(MapError::Engine("style is not queryable".to_string()));
        }
        Ok(self.layers.iter().map(|layer| layer.id.clone()).collect())
    }

    fn source_ids(&self) -> Result<Vec<String>, MapError> {
        self.ensure_style()?;
        if self.introspection_fails {
            return Err(MapError::Engine("style is not queryable".to_string()));
        }
        Ok(self.sources.keys().cloned().collect())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, data: Feature) -> Result<(), MapError> {
        self.ensure_style()?;
        if self.sources.contains_key(id) {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), data);
        self.record(MapOp::AddSource(id.to_string()));
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: Feature) -> Result<(), MapError> {
        self.ensure_style()?;
        let source = self
            .sources
            .get_mut(id)
            .ok_or_else(|| MapError::UnknownSource(id.to_string()))?;
        *source = data;
        self.record(MapOp::SetSourceData(id.to_string()));
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), MapError> {
        self.ensure_style()?;
        if self.layers.iter().any(|layer| layer.source == id) {
            return Err(MapError::SourceInUse(id.to_string()));
        }
        if self.sources.remove(id).is_none() {
            return Err(MapError::UnknownSource(id.to_string()));
        }
        self.record(MapOp::RemoveSource(id.to_string()));
        Ok(())
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), MapError> {
        self.ensure_style()?;
        if self.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::UnknownSource(layer.source));
        }
        self.record(MapOp::AddLayer(layer.id.clone()));
        self.layers.push(layer);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError> {
        self.ensure_style()?;
        let before = self.layers.len();
        self.layers.retain(|layer| layer.id != id);
        if self.layers.len() == before {
            return Err(MapError::UnknownLayer(id.to_string()));
        }
        self.record(MapOp::RemoveLayer(id.to_string()));
        Ok(())
    }

    fn add_marker(&mut self, marker: MarkerSpec) -> Result<MarkerId, MapError> {
        self.ensure_alive()?;
        let id = MarkerId(self.next_id());
        self.markers.insert(id, marker);
        self.record(MapOp::AddMarker(id));
        Ok(id)
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        if self.markers.remove(&marker).is_some() {
            self.record(MapOp::RemoveMarker(marker));
        }
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn camera_bounds(&self) -> Option<Bounds> {
        if self.removed {
            return None;
        }
        let scale = 2f64.powf(self.camera.zoom);
        let half_lon = (180.0 / scale).min(180.0);
        let half_lat = (85.0 / scale).min(85.0);
        let center = self.camera.center;
        Some(Bounds {
            min_lat: (center.latitude - half_lat).max(-85.0),
            min_lon: (center.longitude - half_lon).max(-180.0),
            max_lat: (center.latitude + half_lat).min(85.0),
            max_lon: (center.longitude + half_lon).min(180.0),
        })
    }

    fn fit_bounds(&mut self, bounds: Bounds, options: FitOptions) {
        if self.removed {
            return;
        }
        let span = (bounds.max_lon - bounds.min_lon).max(bounds.max_lat - bounds.min_lat);
        let mut zoom = if span > 0.0 {
            (360.0 / span).log2()
        } else {
            MAX_ZOOM
        };
        if let Some(max_zoom) = options.max_zoom {
            zoom = zoom.min(max_zoom);
        }
        if let Some(min_zoom) = options.min_zoom {
            zoom = zoom.max(min_zoom);
        }
        self.camera.center = bounds.center();
        self.camera.zoom = zoom.clamp(0.0, MAX_ZOOM);
        self.record(MapOp::FitBounds(bounds, options));
    }

    fn jump_to(&mut self, center: Coordinate, zoom: f64) {
        if self.removed {
            return;
        }
        self.camera.center = center;
        self.camera.zoom = zoom;
        self.record(MapOp::JumpTo(center, zoom));
    }

    fn ease_to(&mut self, options: EaseOptions) {
        if self.removed {
            return;
        }
        // No clock here: the move lands immediately.
        self.camera.center = options.center;
        self.camera.zoom = options.zoom;
        if let Some(pitch) = options.pitch {
            self.camera.pitch = pitch;
        }
        if let Some(bearing) = options.bearing {
            self.camera.bearing = bearing;
        }
        self.record(MapOp::EaseTo(options));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::LayerKind;

    fn line_layer(id: &str, source: &str) -> LayerSpec {
        LayerSpec {
            id: id.to_string(),
            source: source.to_string(),
            kind: LayerKind::Line {
                color: "#000".to_string(),
                width: 1.0,
            },
        }
    }

    #[test]
    fn sources_require_loaded_style() {
        let mut map = HeadlessMap::new("style", Coordinate::new(0.0, 0.0), 1.0);
        let err = map
            .add_source("a", Feature::point(Coordinate::new(0.0, 0.0)))
            .unwrap_err();
        assert_eq!(err, MapError::StyleNotLoaded);

        let listener = map.once_style_loaded();
        assert_eq!(map.finish_style_load(), vec![listener]);
        assert!(map.add_source("a", Feature::point(Coordinate::new(0.0, 0.0))).is_ok());
    }

    #[test]
    fn cancelled_listener_never_fires() {
        let mut map = HeadlessMap::new("style", Coordinate::new(0.0, 0.0), 1.0);
        let listener = map.once_style_loaded();
        map.cancel_listener(listener);
        assert!(map.finish_style_load().is_empty());
    }

    #[test]
    fn source_in_use_cannot_be_removed() {
        let mut map = HeadlessMap::loaded("style", Coordinate::new(0.0, 0.0), 1.0);
        map.add_source("s", Feature::line_string(vec![[0.0, 0.0], [1.0, 1.0]]))
            .unwrap();
        map.add_layer(line_layer("l", "s")).unwrap();
        assert_eq!(map.remove_source("s"), Err(MapError::SourceInUse("s".into())));
        map.remove_layer("l").unwrap();
        map.remove_source("s").unwrap();
        assert!(map.source_ids().unwrap().is_empty());
    }

    #[test]
    fn set_style_drops_sources_and_layers() {
        let mut map = HeadlessMap::loaded("a", Coordinate::new(0.0, 0.0), 1.0);
        map.add_source("s", Feature::point(Coordinate::new(0.0, 0.0))).unwrap();
        map.set_style("b").unwrap();
        assert!(!map.is_style_loaded());
        map.finish_style_load();
        assert!(!map.has_source("s"));
        assert_eq!(map.style_url(), "b");
    }

    #[test]
    fn fit_bounds_respects_zoom_floor() {
        let mut map = HeadlessMap::loaded("a", Coordinate::new(0.0, 0.0), 1.0);
        let bounds = Bounds::from_point(Coordinate::new(40.0, -73.9));
        map.fit_bounds(
            bounds,
            FitOptions {
                padding_px: 100.0,
                min_zoom: Some(12.0),
                max_zoom: Some(16.0),
            },
        );
        assert_eq!(map.camera().zoom, 16.0);
        assert_eq!(map.camera().center, Coordinate::new(40.0, -73.9));
    }

    #[test]
    fn history_records_teardown_order() {
        let mut map = HeadlessMap::loaded("a", Coordinate::new(0.0, 0.0), 1.0);
        map.add_source("s", Feature::point(Coordinate::new(0.0, 0.0))).unwrap();
        map.add_layer(line_layer("l", "s")).unwrap();
        map.clear_history();

        map.remove_layer("l").unwrap();
        map.remove_source("s").unwrap();

        let ops: Vec<&MapOp> = map.history().collect();
        assert_eq!(
            ops,
            vec![&MapOp::RemoveLayer("l".into()), &MapOp::RemoveSource("s".into())]
        );
    }

    #[test]
    fn history_is_bounded() {
        let mut map = HeadlessMap::loaded("a", Coordinate::new(0.0, 0.0), 1.0);
        map.add_source("plane", Feature::point(Coordinate::new(0.0, 0.0))).unwrap();

        for i in 0..HISTORY_LIMIT * 4 {
            map.set_source_data("plane", Feature::point(Coordinate::new(0.0, i as f64 / 1000.0)))
                .unwrap();
        }

        assert_eq!(map.history().count(), HISTORY_LIMIT);
        assert!(map
            .history()
            .all(|op| *op == MapOp::SetSourceData("plane".into())));
    }

    #[test]
    fn camera_bounds_follow_zoom() {
        let mut map = HeadlessMap::loaded("a", Coordinate::new(10.0, 20.0), 0.0);
        assert_eq!(
            map.camera_bounds(),
            Some(Bounds {
                min_lat: -75.0,
                min_lon: -160.0,
                max_lat: 85.0,
                max_lon: 180.0,
            })
        );

        map.jump_to(Coordinate::new(10.0, 20.0), 10.0);
        let bounds = map.camera_bounds().unwrap();
        let half_lon = 180.0 / 1024.0;
        let half_lat = 85.0 / 1024.0;
        assert_eq!(bounds.min_lon, 20.0 - half_lon);
        assert_eq!(bounds.max_lon, 20.0 + half_lon);
        assert_eq!(bounds.min_lat, 10.0 - half_lat);
        assert_eq!(bounds.max_lat, 10.0 + half_lat);
        assert!(bounds.contains(Coordinate::new(10.0, 20.0)));

        map.remove();
        assert_eq!(map.camera_bounds(), None);
    }
}
