//! Camera fitting for the current routes and hotels.

use crate::config::{FitPriority, IntroFlight, MapConfig};
use crate::geometry::{Bounds, RouteArc};
use crate::map::{EaseOptions, Easing, FitOptions, MapHandle};
use crate::models::{Coordinate, HotelPoint};

/// What the camera was told to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewPlan {
    /// Nothing to show: fixed fallback view.
    Default { center: Coordinate, zoom: f64 },
    FitRoutes { bounds: Bounds, options: FitOptions },
    FitHotels { bounds: Bounds, options: FitOptions },
}

#[derive(Debug, Clone)]
pub struct MapViewController {
    default_center: Coordinate,
    default_zoom: f64,
    route_fit: FitOptions,
    hotel_fit: FitOptions,
    hotel_focus_zoom: f64,
    priority: FitPriority,
    intro: IntroFlight,
}

impl MapViewController {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            default_center: config.default_center,
            default_zoom: config.default_zoom,
            route_fit: FitOptions {
                padding_px: config.route_padding_px,
                min_zoom: None,
                max_zoom: None,
            },
            hotel_fit: FitOptions {
                padding_px: config.hotel_padding_px,
                min_zoom: Some(config.hotel_min_zoom),
                max_zoom: Some(config.hotel_max_zoom),
            },
            hotel_focus_zoom: config.hotel_focus_zoom,
            priority: config.fit_priority,
            intro: config.intro.clone(),
        }
    }

    /// Decide the camera move without touching a map.
    pub fn plan(&self, arcs: &[RouteArc], hotels: &[HotelPoint]) -> ViewPlan {
        let fit_routes = || {
            Bounds::from_points(arcs.iter().flat_map(|arc| [arc.origin(), arc.destination()]))
                .map(|bounds| ViewPlan::FitRoutes {
                    bounds,
                    options: self.route_fit,
                })
        };
        let fit_hotels = || {
            Bounds::from_points(hotels.iter().map(|hotel| hotel.coordinate)).map(|bounds| {
                ViewPlan::FitHotels {
                    bounds,
                    options: self.hotel_fit,
                }
            })
        };

        let chosen = match self.priority {
            FitPriority::RoutesFirst => fit_routes().or_else(fit_hotels),
            FitPriority::HotelsFirst => fit_hotels().or_else(fit_routes),
        };

        chosen.unwrap_or(ViewPlan::Default {
            center: self.default_center,
            zoom: self.default_zoom,
        })
    }

    /// Fit the camera to the given content and return what was done.
    pub fn fit_to_content<M: MapHandle>(
        &self,
        map: &mut M,
        arcs: &[RouteArc],
        hotels: &[HotelPoint],
    ) -> ViewPlan {
        let plan = self.plan(arcs, hotels);
        match plan {
            ViewPlan::Default { center, zoom } => map.jump_to(center, zoom),
            ViewPlan::FitRoutes { bounds, options } | ViewPlan::FitHotels { bounds, options } => {
                map.fit_bounds(bounds, options)
            }
        }
        tracing::debug!("Camera plan: {:?}", plan);
        plan
    }

    /// Ease to a single hotel.
    pub fn focus_hotel<M: MapHandle>(&self, map: &mut M, hotel: &HotelPoint) {
        if !hotel.coordinate.is_finite() {
            return;
        }
        map.ease_to(EaseOptions {
            center: hotel.coordinate,
            zoom: self.hotel_focus_zoom,
            pitch: None,
            bearing: None,
            duration_ms: 1000,
            easing: Easing::InOutQuad,
        });
    }

    /// Tilted globe start position for a welcome map: (center, zoom, pitch).
    pub fn intro_start(&self) -> (Coordinate, f64, f64) {
        (
            self.intro.start_center,
            self.intro.start_zoom,
            self.intro.start_pitch,
        )
    }

    /// Ease from wherever the camera is to the intro target, flattening the pitch.
    pub fn intro_flight<M: MapHandle>(&self, map: &mut M) {
        map.ease_to(EaseOptions {
            center: self.intro.target_center,
            zoom: self.intro.target_zoom,
            pitch: Some(0.0),
            bearing: None,
            duration_ms: self.intro.duration_ms,
            easing: Easing::InOutQuad,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessMap;
    use crate::models::{Airport, RouteSegment};

    fn arcs() -> Vec<RouteArc> {
        let jfk = Airport::new("JFK", 40.6413, -73.7781);
        let lhr = Airport::new("LHR", 51.47, -0.4543);
        let cdg = Airport::new("CDG", 49.0097, 2.5479);
        [
            RouteSegment { from: jfk, to: lhr.clone() },
            RouteSegment { from: lhr, to: cdg },
        ]
        .iter()
        .map(|segment| RouteArc::from_segment(segment, 900).unwrap())
        .collect()
    }

    fn hotels() -> Vec<HotelPoint> {
        vec![HotelPoint::new("h1", 40.0, -73.9, "$189")]
    }

    #[test]
    fn empty_content_uses_default_view() {
        let view = MapViewController::new(&MapConfig::default());
        let mut map = HeadlessMap::loaded("style", Coordinate::new(0.0, 0.0), 5.0);

        let plan = view.fit_to_content(&mut map, &[], &[]);

        assert_eq!(
            plan,
            ViewPlan::Default {
                center: Coordinate::new(39.8283, -98.5795),
                zoom: 1.0
            }
        );
        assert_eq!(map.camera().zoom, 1.0);
    }

    #[test]
    fn routes_fit_covers_endpoints() {
        let view = MapViewController::new(&MapConfig::default());
        let ViewPlan::FitRoutes { bounds, options } = view.plan(&arcs(), &[]) else {
            panic!("expected route fit");
        };
        assert_eq!(bounds.min_lon, -73.7781);
        assert_eq!(bounds.max_lon, 2.5479);
        assert_eq!(bounds.min_lat, 40.6413);
        assert_eq!(bounds.max_lat, 51.47);
        assert_eq!(options.padding_px, 50.0);
        assert_eq!(options.min_zoom, None);
    }

    #[test]
    fn hotels_only_use_hotel_zoom_floor() {
        let view = MapViewController::new(&MapConfig::default());
        let mut map = HeadlessMap::loaded("style", Coordinate::new(0.0, 0.0), 1.0);

        let plan = view.fit_to_content(&mut map, &[], &hotels());

        let ViewPlan::FitHotels { bounds, options } = plan else {
            panic!("expected hotel fit");
        };
        assert!(bounds.contains(Coordinate::new(40.0, -73.9)));
        assert_eq!(options.padding_px, 100.0);
        assert_eq!(options.min_zoom, Some(12.0));
        assert!(map.camera().zoom >= 12.0);
    }

    #[test]
    fn routes_win_unless_priority_says_otherwise() {
        let view = MapViewController::new(&MapConfig::default());
        assert!(matches!(view.plan(&arcs(), &hotels()), ViewPlan::FitRoutes { .. }));

        let config = MapConfig {
            fit_priority: FitPriority::HotelsFirst,
            ..MapConfig::default()
        };
        let view = MapViewController::new(&config);
        assert!(matches!(view.plan(&arcs(), &hotels()), ViewPlan::FitHotels { .. }));
    }

    #[test]
    fn intro_flight_flattens_pitch() {
        let view = MapViewController::new(&MapConfig::default());
        let (center, zoom, pitch) = view.intro_start();
        let mut map = HeadlessMap::loaded("style", center, zoom);
        assert_eq!(pitch, 20.0);

        view.intro_flight(&mut map);

        assert_eq!(map.camera().pitch, 0.0);
        assert_eq!(map.camera().zoom, 4.0);
    }
}
