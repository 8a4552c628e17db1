//! Rendering and camera policy for the route map.

use crate::models::Coordinate;
use serde::{Deserialize, Serialize};

/// Which content drives the camera when both routes and hotels are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPriority {
    #[default]
    RoutesFirst,
    HotelsFirst,
}

/// Configuration for the map engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Interpolation steps per arc (an arc has steps + 1 points)
    pub arc_steps: usize,
    /// Base map style URL
    pub style_url: String,
    /// Camera center when there is nothing to show
    pub default_center: Coordinate,
    /// Camera zoom when there is nothing to show
    pub default_zoom: f64,
    /// Padding in pixels around a route fit
    pub route_padding_px: f64,
    /// Padding in pixels around a hotel-only fit
    pub hotel_padding_px: f64,
    /// Zoom floor for a hotel-only fit
    pub hotel_min_zoom: f64,
    /// Zoom ceiling for a hotel-only fit
    pub hotel_max_zoom: f64,
    /// Zoom used when focusing a single hotel
    pub hotel_focus_zoom: f64,
    pub fit_priority: FitPriority,
    pub route_line_color: String,
    pub route_line_width: f64,
    /// Sprite name for the animated plane
    pub glyph_icon: String,
    pub glyph_icon_size: f64,
    pub intro: IntroFlight,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            arc_steps: 900,
            style_url: "mapbox://styles/mapbox/streets-v12".to_string(),
            // Geographic center of the contiguous US
            default_center: Coordinate::new(39.8283, -98.5795),
            default_zoom: 1.0,
            route_padding_px: 50.0,
            hotel_padding_px: 100.0,
            hotel_min_zoom: 12.0,
            hotel_max_zoom: 16.0,
            hotel_focus_zoom: 15.0,
            fit_priority: FitPriority::RoutesFirst,
            route_line_color: "#1DC167".to_string(),
            route_line_width: 2.0,
            glyph_icon: "airport".to_string(),
            glyph_icon_size: 1.5,
            intro: IntroFlight::default(),
        }
    }
}

/// Camera move played when a welcome map first loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroFlight {
    pub start_center: Coordinate,
    pub start_zoom: f64,
    pub start_pitch: f64,
    pub target_center: Coordinate,
    pub target_zoom: f64,
    pub duration_ms: u64,
}

impl Default for IntroFlight {
    fn default() -> Self {
        Self {
            start_center: Coordinate::new(-45.0, -80.0),
            start_zoom: 1.0,
            start_pitch: 20.0,
            target_center: Coordinate::new(39.8283, -98.5795),
            target_zoom: 4.0,
            duration_ms: 6000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: MapConfig =
            serde_json::from_str(r#"{"arc_steps": 120, "fit_priority": "hotels_first"}"#).unwrap();
        assert_eq!(config.arc_steps, 120);
        assert_eq!(config.fit_priority, FitPriority::HotelsFirst);
        assert_eq!(config.hotel_padding_px, 100.0);
        assert_eq!(config.intro.duration_ms, 6000);
    }
}
