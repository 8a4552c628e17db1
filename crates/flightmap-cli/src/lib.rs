//! Flightmap CLI - tools for exercising the route map engine.
//!
//! - route_demo: resolves a route, renders it on a headless map and animates
//!   the plane glyph on a fixed interval

pub mod animate;
pub mod input;
pub mod lookup;

pub use animate::run_animation_loop;
pub use input::{load_airports, load_hotels, parse_hotel, parse_segment};
pub use lookup::resolve_until_shutdown;
