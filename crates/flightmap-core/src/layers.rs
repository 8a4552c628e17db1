//! Route and glyph sources/layers, gated on style readiness.
//!
//! Artifacts are named by convention (`segment-{i}`, `segment-{i}-layer`,
//! `plane`, `planeLayer`) and cleanup only ever removes ids matching those
//! names exactly, so other overlays on the same map are left alone.

use crate::config::MapConfig;
use crate::geometry::RouteArc;
use crate::map::{Feature, LayerKind, LayerSpec, ListenerId, MapError, MapHandle};
use crate::models::Coordinate;

pub const PLANE_SOURCE: &str = "plane";
pub const PLANE_LAYER: &str = "planeLayer";
pub const BEARING_PROPERTY: &str = "bearing";

const ROUTE_PREFIX: &str = "segment-";
const LAYER_SUFFIX: &str = "-layer";

pub fn route_source_id(index: usize) -> String {
    format!("{ROUTE_PREFIX}{index}")
}

pub fn route_layer_id(index: usize) -> String {
    format!("{ROUTE_PREFIX}{index}{LAYER_SUFFIX}")
}

/// A source or layer id owned by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedId {
    RouteSource(usize),
    RouteLayer(usize),
    PlaneSource,
    PlaneLayer,
}

impl ManagedId {
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            PLANE_SOURCE => return Some(ManagedId::PlaneSource),
            PLANE_LAYER => return Some(ManagedId::PlaneLayer),
            _ => {}
        }

        let rest = id.strip_prefix(ROUTE_PREFIX)?;
        let (digits, is_layer) = match rest.strip_suffix(LAYER_SUFFIX) {
            Some(digits) => (digits, true),
            None => (rest, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index = digits.parse().ok()?;
        Some(if is_layer {
            ManagedId::RouteLayer(index)
        } else {
            ManagedId::RouteSource(index)
        })
    }
}

/// Readiness of the underlying style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleState {
    NotReady,
    Ready,
    /// The base style is being swapped.
    Reloading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerUpdate {
    Applied { routes: usize },
    Deferred,
}

#[derive(Debug, Clone)]
struct LayerStyle {
    line_color: String,
    line_width: f64,
    glyph_icon: String,
    glyph_icon_size: f64,
}

/// Owns the route sources/layers and the plane glyph on one map.
#[derive(Debug)]
pub struct MapLayerManager {
    state: StyleState,
    // Latest deferred update only; older ones are dropped.
    pending: Option<Vec<RouteArc>>,
    listener: Option<ListenerId>,
    style: LayerStyle,
}

impl MapLayerManager {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            state: StyleState::NotReady,
            pending: None,
            listener: None,
            style: LayerStyle {
                line_color: config.route_line_color.clone(),
                line_width: config.route_line_width,
                glyph_icon: config.glyph_icon.clone(),
                glyph_icon_size: config.glyph_icon_size,
            },
        }
    }

    pub fn state(&self) -> StyleState {
        self.state
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Current readiness, reconciled with what the engine reports.
    pub fn sync_state<M: MapHandle>(&mut self, map: &M) -> StyleState {
        let loaded = map.is_style_loaded();
        self.state = match (self.state, loaded) {
            (StyleState::NotReady | StyleState::Reloading, true) => StyleState::Ready,
            (StyleState::Ready, false) => StyleState::Reloading,
            (state, _) => state,
        };
        self.state
    }

    /// Replace every route layer with one per arc, or defer until the style loads.
    pub fn replace_route_layers<M: MapHandle>(
        &mut self,
        map: &mut M,
        arcs: Vec<RouteArc>,
    ) -> LayerUpdate {
        if self.sync_state(map) != StyleState::Ready {
            self.defer(map, arcs);
            return LayerUpdate::Deferred;
        }
        self.apply(map, &arcs)
    }

    /// Called when the engine fires style-loaded. Replays the latest deferred update.
    pub fn on_style_loaded<M: MapHandle>(&mut self, map: &mut M) -> Option<LayerUpdate> {
        let fired = self.listener.take();
        if !map.is_style_loaded() {
            // Spurious event; keep waiting on a single listener.
            if self.pending.is_some() || self.state == StyleState::Reloading {
                if let Some(listener) = fired {
                    map.cancel_listener(listener);
                }
                self.listener = Some(map.once_style_loaded());
            }
            return None;
        }

        self.state = StyleState::Ready;
        let arcs = self.pending.take()?;
        tracing::debug!("Style loaded, replaying {} deferred route(s)", arcs.len());
        Some(self.apply(map, &arcs))
    }

    /// The engine started swapping its base style.
    pub fn begin_reload<M: MapHandle>(&mut self, map: &mut M) {
        self.state = StyleState::Reloading;
        if self.listener.is_none() {
            self.listener = Some(map.once_style_loaded());
        }
    }

    /// Drop any deferred update and unsubscribe from style-loaded.
    pub fn cancel_pending<M: MapHandle>(&mut self, map: &mut M) {
        self.pending = None;
        if let Some(listener) = self.listener.take() {
            map.cancel_listener(listener);
        }
    }

    /// Remove every managed source and layer. Returns how many were removed.
    ///
    /// Does nothing while the style cannot be queried.
    pub fn remove_all_managed_layers<M: MapHandle>(&mut self, map: &mut M) -> usize {
        if self.sync_state(map) != StyleState::Ready {
            return 0;
        }

        let (layer_ids, source_ids) = match (map.layer_ids(), map.source_ids()) {
            (Ok(layers), Ok(sources)) => (layers, sources),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!("Map style not queryable, skipping cleanup: {}", err);
                return 0;
            }
        };

        let mut removed = 0;
        // Layers first: a source cannot go while a layer still reads it.
        for id in layer_ids.iter().filter(|id| ManagedId::parse(id).is_some()) {
            match map.remove_layer(id) {
                Ok(()) => removed += 1,
                Err(err) => tracing::debug!("Failed to remove layer {}: {}", id, err),
            }
        }
        for id in source_ids.iter().filter(|id| ManagedId::parse(id).is_some()) {
            match map.remove_source(id) {
                Ok(()) => removed += 1,
                Err(err) => tracing::debug!("Failed to remove source {}: {}", id, err),
            }
        }

        if removed > 0 {
            tracing::debug!("Removed {} managed map artifact(s)", removed);
        }
        removed
    }

    /// Add the plane glyph at `position`.
    pub fn show_glyph<M: MapHandle>(
        &mut self,
        map: &mut M,
        position: Coordinate,
    ) -> Result<(), MapError> {
        if self.sync_state(map) != StyleState::Ready {
            return Err(MapError::StyleNotLoaded);
        }

        let feature = Feature::point(position);
        if map.has_source(PLANE_SOURCE) {
            map.set_source_data(PLANE_SOURCE, feature)?;
        } else {
            map.add_source(PLANE_SOURCE, feature)?;
        }
        if !map.has_layer(PLANE_LAYER) {
            map.add_layer(LayerSpec {
                id: PLANE_LAYER.to_string(),
                source: PLANE_SOURCE.to_string(),
                kind: LayerKind::Symbol {
                    icon_image: self.style.glyph_icon.clone(),
                    icon_size: self.style.glyph_icon_size,
                    rotate_property: Some(BEARING_PROPERTY.to_string()),
                },
            })?;
        }
        Ok(())
    }

    /// Move the glyph, rotating it when a bearing is known.
    pub fn move_glyph<M: MapHandle>(
        &self,
        map: &mut M,
        position: Coordinate,
        bearing: Option<f64>,
    ) -> Result<(), MapError> {
        let mut feature = Feature::point(position);
        if let Some(bearing) = bearing {
            feature = feature.with_property(BEARING_PROPERTY, bearing);
        }
        map.set_source_data(PLANE_SOURCE, feature)
    }

    fn defer<M: MapHandle>(&mut self, map: &mut M, arcs: Vec<RouteArc>) {
        if self.pending.replace(arcs).is_some() {
            tracing::debug!("Superseded a deferred route update");
        }
        if self.listener.is_none() {
            self.listener = Some(map.once_style_loaded());
        }
    }

    fn apply<M: MapHandle>(&mut self, map: &mut M, arcs: &[RouteArc]) -> LayerUpdate {
        // Drawn now, so nothing is left to replay.
        self.pending = None;
        if let Some(listener) = self.listener.take() {
            map.cancel_listener(listener);
        }
        self.remove_all_managed_layers(map);

        let mut routes = 0;
        for (index, arc) in arcs.iter().enumerate() {
            let source_id = route_source_id(index);
            let added = map
                .add_source(&source_id, Feature::line_string(arc.line_string()))
                .and_then(|()| {
                    map.add_layer(LayerSpec {
                        id: route_layer_id(index),
                        source: source_id.clone(),
                        kind: LayerKind::Line {
                            color: self.style.line_color.clone(),
                            width: self.style.line_width,
                        },
                    })
                });
            match added {
                Ok(()) => routes += 1,
                Err(err) => tracing::warn!(
                    "Failed to draw route {} {}->{}: {}",
                    index,
                    arc.from_code,
                    arc.to_code,
                    err
                ),
            }
        }

        LayerUpdate::Applied { routes }
    }
}
