pub mod animation;
pub mod config;
pub mod controller;
pub mod geometry;
pub mod headless;
pub mod layers;
pub mod map;
pub mod markers;
pub mod models;
pub mod resolver;
pub mod view;

pub use animation::{
    AnimationCursor, AnimationLoop, AnimatorState, FrameQueue, FrameToken, GlyphFrame,
    PlaneAnimator,
};
pub use config::{FitPriority, IntroFlight, MapConfig};
pub use controller::{ApplyOutcome, PendingResolution, RenderSummary, RouteMapController};
pub use geometry::{bearing_degrees, build_arcs, compute_arc, Bounds, GeometryError, RouteArc};
pub use headless::{HeadlessMap, MapOp, HISTORY_LIMIT};
pub use layers::{LayerUpdate, ManagedId, MapLayerManager, StyleState};
pub use map::{
    Camera, EaseOptions, Easing, Feature, FitOptions, Geometry, LayerKind, LayerSpec, ListenerId,
    MapError, MapHandle, MarkerId, MarkerKind, MarkerSpec,
};
pub use markers::{airport_markers, hotel_markers, MarkerRegistry};
pub use models::{
    normalize_iata, resolve_segments, Airport, AirportMap, Coordinate, HotelPoint, RouteSegment,
    SegmentCodes,
};
pub use resolver::{AirportCache, AirportLookup, AirportResolver, LookupError, ResolveError};
pub use view::{MapViewController, ViewPlan};
