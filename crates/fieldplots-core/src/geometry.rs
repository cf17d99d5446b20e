//! Planar vector geometry in CRS units.
//!
//! Rings are stored *open*: the closing vertex that GeoJSON repeats is
//! stripped on construction and re-added by [`Ring::closed`].

use crate::GeometryError;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut b = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in it {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn corners(&self) -> [Point2<f64>; 4] {
        [
            Point2::new(self.min_x, self.min_y),
            Point2::new(self.max_x, self.min_y),
            Point2::new(self.max_x, self.max_y),
            Point2::new(self.min_x, self.max_y),
        ]
    }
}

/// A line segment; also used as an infinite line for intersections.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Segment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Unit vector from `start` to `end`, `None` for a zero-length segment.
    pub fn direction(&self) -> Option<Vector2<f64>> {
        let d = self.end - self.start;
        let len = d.norm();
        if !len.is_finite() || len <= f64::EPSILON {
            return None;
        }
        Some(d / len)
    }

    /// Intersection point of the infinite lines through `self` and `other`.
    pub fn intersect_lines(&self, other: &Segment) -> Result<Point2<f64>, GeometryError> {
        // Lines in implicit form a*x + b*y = c.
        let a1 = self.end.y - self.start.y;
        let b1 = self.start.x - self.end.x;
        let c1 = a1 * self.start.x + b1 * self.start.y;

        let a2 = other.end.y - other.start.y;
        let b2 = other.start.x - other.end.x;
        let c2 = a2 * other.start.x + b2 * other.start.y;

        let det = a1 * b2 - a2 * b1;
        let scale = (a1.abs() + b1.abs()) * (a2.abs() + b2.abs());
        if !det.is_finite() || det.abs() <= 1e-12 * scale || scale == 0.0 {
            return Err(GeometryError::ParallelLines);
        }
        Ok(Point2::new(
            (b2 * c1 - b1 * c2) / det,
            (a1 * c2 - a2 * c1) / det,
        ))
    }
}

/// Simple ring of vertices, stored open.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    points: Vec<Point2<f64>>,
}

impl Ring {
    /// Build a ring; a trailing copy of the first vertex is dropped.
    pub fn new(mut points: Vec<Point2<f64>>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    /// Regular polygon approximating a circle.
    pub fn circle(center: Point2<f64>, radius: f64, segments: usize) -> Self {
        let n = segments.max(3);
        let points = (0..n)
            .map(|k| {
                let t = std::f64::consts::TAU * k as f64 / n as f64;
                Point2::new(center.x + radius * t.cos(), center.y + radius * t.sin())
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vertices with the first one repeated at the end.
    pub fn closed(&self) -> Vec<Point2<f64>> {
        let mut out = self.points.clone();
        if let Some(first) = self.points.first() {
            out.push(*first);
        }
        out
    }

    /// Shoelace area; positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            acc += p.x * q.y - q.x * p.y;
        }
        0.5 * acc
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area-weighted centroid; vertex mean for degenerate rings.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        let n = self.points.len();
        if n == 0 {
            return None;
        }
        let a = self.signed_area();
        if a.abs() <= f64::EPSILON {
            let sum = self
                .points
                .iter()
                .fold(Vector2::zeros(), |acc, p| acc + p.coords);
            return Some(Point2::from(sum / n as f64));
        }
        let (mut cx, mut cy) = (0.0, 0.0);
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        Some(Point2::new(cx / (6.0 * a), cy / (6.0 * a)))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// Even-odd point-in-ring test.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y) {
                let x_cross = pj.x + (p.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Sutherland-Hodgman clip keeping the side where `normal . p >= offset`.
    pub fn clip_half_plane(&self, normal: Vector2<f64>, offset: f64) -> Ring {
        let n = self.points.len();
        let mut out = Vec::with_capacity(n + 2);
        if n == 0 {
            return Ring { points: out };
        }
        let side = |p: &Point2<f64>| normal.dot(&p.coords) - offset;
        for i in 0..n {
            let cur = self.points[i];
            let prev = self.points[(i + n - 1) % n];
            let (sc, sp) = (side(&cur), side(&prev));
            if sc >= 0.0 {
                if sp < 0.0 {
                    out.push(prev + (cur - prev) * (sp / (sp - sc)));
                }
                out.push(cur);
            } else if sp >= 0.0 {
                out.push(prev + (cur - prev) * (sp / (sp - sc)));
            }
        }
        out.dedup();
        Ring::new(out)
    }

    /// Fail unless the ring has at least three distinct vertices.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let mut distinct: Vec<Point2<f64>> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if !distinct.contains(p) {
                distinct.push(*p);
            }
        }
        if distinct.len() < 3 {
            return Err(GeometryError::DegenerateRing {
                got: distinct.len(),
            });
        }
        Ok(())
    }
}

/// Polygon with an exterior ring and optional holes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Ring,
    #[serde(default)]
    pub interiors: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring) -> Self {
        Self {
            exterior,
            interiors: Vec::new(),
        }
    }

    pub fn with_interiors(exterior: Ring, interiors: Vec<Ring>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    pub fn contains(&self, p: Point2<f64>) -> bool {
        self.exterior.contains(p) && !self.interiors.iter().any(|r| r.contains(p))
    }

    pub fn area(&self) -> f64 {
        self.exterior.area() - self.interiors.iter().map(Ring::area).sum::<f64>()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.exterior.bounds()
    }

    pub fn centroid(&self) -> Option<Point2<f64>> {
        self.exterior.centroid()
    }
}

/// Region geometry decided at parse time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "geometry", rename_all = "snake_case")]
pub enum RegionGeometry {
    Point(Point2<f64>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl RegionGeometry {
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            RegionGeometry::Point(p) => Bounds::from_points([p]),
            RegionGeometry::Polygon(poly) => poly.bounds(),
            RegionGeometry::MultiPolygon(parts) => parts
                .iter()
                .filter_map(Polygon::bounds)
                .reduce(|a, b| a.union(&b)),
        }
    }

    /// Point-in-region test; a point region contains nothing.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        match self {
            RegionGeometry::Point(_) => false,
            RegionGeometry::Polygon(poly) => poly.contains(p),
            RegionGeometry::MultiPolygon(parts) => parts.iter().any(|poly| poly.contains(p)),
        }
    }

    /// Exterior ring used for pixel outlines: the polygon's exterior, or the
    /// first member's exterior for multipolygons.
    pub fn outline(&self) -> Option<&Ring> {
        match self {
            RegionGeometry::Point(_) => None,
            RegionGeometry::Polygon(poly) => Some(&poly.exterior),
            RegionGeometry::MultiPolygon(parts) => parts.first().map(|poly| &poly.exterior),
        }
    }

    pub fn centroid(&self) -> Option<Point2<f64>> {
        match self {
            RegionGeometry::Point(p) => Some(*p),
            RegionGeometry::Polygon(poly) => poly.centroid(),
            RegionGeometry::MultiPolygon(parts) => {
                let mut area = 0.0;
                let mut acc = Vector2::zeros();
                for poly in parts {
                    let (a, c) = (poly.area(), poly.centroid()?);
                    area += a;
                    acc += c.coords * a;
                }
                if area > 0.0 {
                    Some(Point2::from(acc / area))
                } else {
                    parts.first().and_then(Polygon::centroid)
                }
            }
        }
    }
}

impl From<Polygon> for RegionGeometry {
    fn from(poly: Polygon) -> Self {
        RegionGeometry::Polygon(poly)
    }
}

impl From<Ring> for RegionGeometry {
    fn from(ring: Ring) -> Self {
        RegionGeometry::Polygon(Polygon::new(ring))
    }
}
