//! Field corners and the local frame derived from them.

use crate::GridError;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Relative tolerance on `|h x v|` below which the two edges count as parallel.
const PARALLEL_TOL: f64 = 1e-9;

/// Corners of a field, named by the order they were digitized in.
///
/// Users click bottom-left, bottom-right, top-right and optionally top-left.
/// Nothing checks that the clicks really are in that order; a reversed order
/// produces a mirrored frame, which [`FieldCorners::frame`] reports with a
/// warning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldCorners {
    pub bottom_left: Point2<f64>,
    pub bottom_right: Point2<f64>,
    pub top_right: Point2<f64>,
    #[serde(default)]
    pub top_left: Option<Point2<f64>>,
}

impl FieldCorners {
    /// Name the first three (or four) points in click order.
    pub fn from_click_order(points: &[Point2<f64>]) -> Result<Self, GridError> {
        if points.len() < 3 {
            return Err(GridError::InvalidInput(format!(
                "need at least 3 corner points, got {}",
                points.len()
            )));
        }
        if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(GridError::InvalidInput(format!(
                "corner point ({}, {}) is not finite",
                p.x, p.y
            )));
        }
        if points.len() > 4 {
            log::debug!("ignoring {} extra corner points", points.len() - 4);
        }
        Ok(Self {
            bottom_left: points[0],
            bottom_right: points[1],
            top_right: points[2],
            top_left: points.get(3).copied(),
        })
    }

    /// Derive the field frame.
    ///
    /// The horizontal direction runs bottom-left -> bottom-right, the vertical
    /// one bottom-right -> top-right, and the anchor is the bottom-left corner.
    pub fn frame(&self) -> Result<DirectionFrame, GridError> {
        let horizontal = unit(self.bottom_left, self.bottom_right, "bottom edge")?;
        let vertical = unit(self.bottom_right, self.top_right, "right edge")?;
        DirectionFrame::new(self.bottom_left, horizontal, vertical)
    }

    /// The four corners in ring order, filling a missing top-left corner so
    /// the shape is a parallelogram.
    pub fn quad(&self) -> [Point2<f64>; 4] {
        let top_left = self
            .top_left
            .unwrap_or(self.bottom_left + (self.top_right - self.bottom_right));
        [
            self.bottom_left,
            self.bottom_right,
            self.top_right,
            top_left,
        ]
    }
}

fn unit(from: Point2<f64>, to: Point2<f64>, what: &str) -> Result<Vector2<f64>, GridError> {
    let d = to - from;
    let len = d.norm();
    if !len.is_finite() || len <= f64::EPSILON * (1.0 + from.coords.norm()) {
        return Err(GridError::InvalidInput(format!(
            "{what} has zero length (coincident corner points)"
        )));
    }
    Ok(d / len)
}

/// Local coordinate frame of a field: an anchor and two unit directions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionFrame {
    pub anchor: Point2<f64>,
    pub horizontal: Vector2<f64>,
    pub vertical: Vector2<f64>,
}

impl DirectionFrame {
    /// Build a frame, normalizing the directions and rejecting parallel ones.
    pub fn new(
        anchor: Point2<f64>,
        horizontal: Vector2<f64>,
        vertical: Vector2<f64>,
    ) -> Result<Self, GridError> {
        let (hn, vn) = (horizontal.norm(), vertical.norm());
        if !(hn.is_finite() && vn.is_finite()) || hn == 0.0 || vn == 0.0 {
            return Err(GridError::InvalidInput(
                "direction vectors must be finite and non-zero".to_string(),
            ));
        }
        let (horizontal, vertical) = (horizontal / hn, vertical / vn);
        let cross = horizontal.perp(&vertical);
        if cross.abs() < PARALLEL_TOL {
            return Err(GridError::InvalidInput(
                "field edges are parallel; corner points are collinear".to_string(),
            ));
        }
        if cross < 0.0 {
            log::warn!(
                "field frame is clockwise (h x v = {cross:.3}); corner click order may be swapped"
            );
        }
        Ok(Self {
            anchor,
            horizontal,
            vertical,
        })
    }

    /// `anchor + u * horizontal + v * vertical`.
    #[inline]
    pub fn point_at(&self, u: f64, v: f64) -> Point2<f64> {
        self.anchor + self.horizontal * u + self.vertical * v
    }

    /// Same directions, different origin.
    pub fn with_anchor(&self, anchor: Point2<f64>) -> Self {
        Self { anchor, ..*self }
    }

    /// True when the horizontal direction is not aligned with the x axis.
    pub fn is_rotated(&self) -> bool {
        self.horizontal.y.abs() > 1e-9
    }
}
