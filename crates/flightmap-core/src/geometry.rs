//! Arc interpolation, bearings and bounding boxes.
//!
//! Arcs are straight lines in (lon, lat) space, not great circles. Long
//! east-west routes near the poles look distorted; that is accepted.

use crate::models::{Coordinate, RouteSegment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("arc needs at least one step")]
    ZeroSteps,
}

/// Interpolate `steps + 1` points from `from` to `to`, inclusive of both ends.
pub fn compute_arc(
    from: Coordinate,
    to: Coordinate,
    steps: usize,
) -> Result<Vec<Coordinate>, GeometryError> {
    if steps == 0 {
        return Err(GeometryError::ZeroSteps);
    }

    let mut points = Vec::with_capacity(steps + 1);
    points.push(from);
    for i in 1..steps {
        let t = i as f64 / steps as f64;
        points.push(Coordinate {
            latitude: lerp(from.latitude, to.latitude, t),
            longitude: lerp(from.longitude, to.longitude, t),
        });
    }
    points.push(to);
    Ok(points)
}

// Clamped so rounding never steps past the exact endpoint.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let value = a + (b - a) * t;
    if a <= b {
        value.clamp(a, b)
    } else {
        value.clamp(b, a)
    }
}

/// Initial bearing in degrees from `from` to `to`, in (-180, 180].
///
/// 0 is north, 90 east. Identical points yield 0.
pub fn bearing_degrees(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let dlambda = (to.longitude - from.longitude).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    y.atan2(x).to_degrees()
}

/// The rendered path for one resolved segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteArc {
    pub from_code: String,
    pub to_code: String,
    points: Vec<Coordinate>,
}

impl RouteArc {
    pub fn from_segment(segment: &RouteSegment, steps: usize) -> Result<Self, GeometryError> {
        Ok(Self {
            from_code: segment.from.iata_code.clone(),
            to_code: segment.to.iata_code.clone(),
            points: compute_arc(segment.from.coordinate, segment.to.coordinate, steps)?,
        })
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn origin(&self) -> Coordinate {
        self.points[0]
    }

    pub fn destination(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Coordinates as GeoJSON `[lon, lat]` pairs.
    pub fn line_string(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(Coordinate::lon_lat).collect()
    }
}

/// Build arcs for every segment.
pub fn build_arcs(segments: &[RouteSegment], steps: usize) -> Result<Vec<RouteArc>, GeometryError> {
    segments
        .iter()
        .map(|segment| RouteArc::from_segment(segment, steps))
        .collect()
}

/// Axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn from_point(point: Coordinate) -> Self {
        Self {
            min_lat: point.latitude,
            min_lon: point.longitude,
            max_lat: point.latitude,
            max_lon: point.longitude,
        }
    }

    /// Smallest box holding every finite point, or `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut bounds: Option<Bounds> = None;
        for point in points.into_iter().filter(Coordinate::is_finite) {
            match bounds.as_mut() {
                Some(existing) => existing.extend(point),
                None => bounds = Some(Bounds::from_point(point)),
            }
        }
        bounds
    }

    pub fn extend(&mut self, point: Coordinate) {
        self.min_lat = self.min_lat.min(point.latitude);
        self.min_lon = self.min_lon.min(point.longitude);
        self.max_lat = self.max_lat.max(point.latitude);
        self.max_lon = self.max_lon.max(point.longitude);
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}
