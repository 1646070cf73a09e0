//! Distance buffer around a projected center

use geo::{BoundingRect, Coord, Distance, Euclidean, Geometry, Intersects, LineString, Point, Polygon, Rect};
use geoselect_core::config::MIN_BUFFER_SEGMENTS;
use geoselect_core::error::{GeoselectError, Result};

/// Absolute slack, in CRS units, applied to the boundary test so features
/// exactly `radius` away survive floating point rounding.
pub const DISTANCE_TOLERANCE: f64 = 1e-9;

/// Disk of all points within `radius` of `center`.
///
/// Coordinates and radius are in the linear unit of the (projected) CRS the
/// center was expressed in. Membership is tested against the exact disk; the
/// polygon form from [`Buffer::to_polygon`] is for output only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Buffer {
    center: Point<f64>,
    radius: f64,
}

impl Buffer {
    pub fn new(center: Point<f64>, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GeoselectError::invalid_parameter(
                "radius",
                radius,
                "must be a positive finite distance",
            ));
        }
        if !center.x().is_finite() || !center.y().is_finite() {
            return Err(GeoselectError::invalid_parameter(
                "center",
                format!("({}, {})", center.x(), center.y()),
                "coordinates must be finite",
            ));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Point<f64> {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Axis-aligned box enclosing the disk, tolerance included
    pub fn envelope(&self) -> Rect<f64> {
        let reach = self.radius + DISTANCE_TOLERANCE;
        Rect::new(
            Coord { x: self.center.x() - reach, y: self.center.y() - reach },
            Coord { x: self.center.x() + reach, y: self.center.y() + reach },
        )
    }

    /// True when `geometry` shares at least one point with the disk.
    /// Touching the boundary counts; empty geometries never intersect.
    pub fn intersects(&self, geometry: &Geometry<f64>) -> bool {
        let Some(bounds) = geometry.bounding_rect() else {
            return false;
        };
        if !self.envelope().intersects(&bounds) {
            return false;
        }

        let center = Geometry::Point(self.center);
        Euclidean.distance(&center, geometry) <= self.radius + DISTANCE_TOLERANCE
    }

    /// Regular polygon with `segments` vertices inscribed in the disk
    pub fn to_polygon(&self, segments: usize) -> Result<Polygon<f64>> {
        if segments < MIN_BUFFER_SEGMENTS {
            return Err(GeoselectError::invalid_parameter(
                "segments",
                segments,
                format!("a buffer polygon needs at least {} segments", MIN_BUFFER_SEGMENTS),
            ));
        }

        let step = std::f64::consts::TAU / segments as f64;
        let mut ring: Vec<Coord<f64>> = (0..segments)
            .map(|i| {
                let angle = step * i as f64;
                Coord {
                    x: self.center.x() + self.radius * angle.cos(),
                    y: self.center.y() + self.radius * angle.sin(),
                }
            })
            .collect();
        ring.push(ring[0]);

        Ok(Polygon::new(LineString::from(ring), vec![]))
    }
}
