//! Narrow interface over the imperative base map engine.
//!
//! Everything the route engine does to a map goes through [`MapHandle`], so the
//! engine can sit on any map library (or the in-memory [`crate::HeadlessMap`]).

use crate::geometry::Bounds;
use crate::models::Coordinate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map style is not loaded")]
    StyleNotLoaded,
    #[error("source `{0}` already exists")]
    DuplicateSource(String),
    #[error("layer `{0}` already exists")]
    DuplicateLayer(String),
    #[error("source `{0}` not found")]
    UnknownSource(String),
    #[error("layer `{0}` not found")]
    UnknownLayer(String),
    #[error("source `{0}` is still used by a layer")]
    SourceInUse(String),
    #[error("map has been removed")]
    Removed,
    #[error("map engine error: {0}")]
    Engine(String),
}

/// Handle to a one-shot event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle to a marker attached to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<[f64; 2]> },
    Point { coordinates: [f64; 2] },
}

/// A GeoJSON feature used as source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn line_string(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            geometry: Geometry::LineString { coordinates },
            properties: Map::new(),
        }
    }

    pub fn point(position: Coordinate) -> Self {
        Self {
            geometry: Geometry::Point {
                coordinates: position.lon_lat(),
            },
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Line {
        color: String,
        width: f64,
    },
    Symbol {
        icon_image: String,
        icon_size: f64,
        /// Feature property the icon rotation is bound to
        rotate_property: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Airport,
    Hotel,
}

/// A DOM-backed marker as the engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub coordinate: Coordinate,
    pub label: String,
    pub kind: MarkerKind,
    /// Caller key, e.g. the IATA code or hotel id
    pub render_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub padding_px: f64,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    #[default]
    InOutQuad,
}

impl Easing {
    /// Progress along the curve for `t` in [0, 1].
    pub fn at(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseOptions {
    pub center: Coordinate,
    pub zoom: f64,
    pub pitch: Option<f64>,
    pub bearing: Option<f64>,
    pub duration_ms: u64,
    pub easing: Easing,
}

/// Current camera state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: Coordinate,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

/// The operations the route engine needs from a map instance.
///
/// Source and layer calls fail with [`MapError::StyleNotLoaded`] until the
/// style has loaded; markers and camera calls work at any time.
pub trait MapHandle {
    fn is_style_loaded(&self) -> bool;

    /// Subscribe once to the next style-loaded event.
    fn once_style_loaded(&mut self) -> ListenerId;

    fn cancel_listener(&mut self, listener: ListenerId);

    /// Swap the base style. Managed sources and layers are lost.
    fn set_style(&mut self, url: &str) -> Result<(), MapError>;

    fn layer_ids(&self) -> Result<Vec<String>, MapError>;

    fn source_ids(&self) -> Result<Vec<String>, MapError>;

    fn has_layer(&self, id: &str) -> bool;

    fn has_source(&self, id: &str) -> bool;

    fn add_source(&mut self, id: &str, data: Feature) -> Result<(), MapError>;

    fn set_source_data(&mut self, id: &str, data: Feature) -> Result<(), MapError>;

    fn remove_source(&mut self, id: &str) -> Result<(), MapError>;

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), MapError>;

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError>;

    fn add_marker(&mut self, marker: MarkerSpec) -> Result<MarkerId, MapError>;

    fn remove_marker(&mut self, marker: MarkerId);

    fn camera(&self) -> Camera;

    fn camera_bounds(&self) -> Option<Bounds>;

    fn fit_bounds(&mut self, bounds: Bounds, options: FitOptions);

    fn jump_to(&mut self, center: Coordinate, zoom: f64);

    fn ease_to(&mut self, options: EaseOptions);
}
