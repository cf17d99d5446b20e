//! Line grids over a four-sided field polygon.

use crate::GridError;
use fieldplots_core::{Ring, Segment};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Two families of dividing lines across a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineFamilies {
    /// Lines from edge `f0 -> f1` to edge `f3 -> f2`.
    pub first: Vec<Segment>,
    /// Lines from edge `f1 -> f2` to edge `f0 -> f3`.
    pub second: Vec<Segment>,
}

fn linspace(a: Point2<f64>, b: Point2<f64>, n: usize) -> impl Iterator<Item = Point2<f64>> {
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n).map(move |i| a + (b - a) * i as f64 / last)
}

/// Divide `field` into `divisions[0] x divisions[1]` parts with straight lines.
///
/// Each family has `divisions[k] + 1` lines, including the field edges.
pub fn field_grid_lines(
    field: &[Point2<f64>; 4],
    divisions: [usize; 2],
) -> Result<LineFamilies, GridError> {
    if divisions.contains(&0) {
        return Err(GridError::InvalidParameter(
            "grid divisions must be >= 1".to_string(),
        ));
    }
    let [f0, f1, f2, f3] = *field;
    let first = linspace(f0, f1, divisions[0] + 1)
        .zip(linspace(f3, f2, divisions[0] + 1))
        .map(|(a, b)| Segment::new(a, b))
        .collect();
    let second = linspace(f1, f2, divisions[1] + 1)
        .zip(linspace(f0, f3, divisions[1] + 1))
        .map(|(a, b)| Segment::new(a, b))
        .collect();
    Ok(LineFamilies { first, second })
}

/// Quads bounded by consecutive lines of both families.
///
/// Quad `(i, j)` has corners at the intersections `(i, j)`, `(i+1, j)`,
/// `(i+1, j+1)`, `(i, j+1)`; quads are ordered by `i` then `j`. The lines are
/// treated as infinite, so hand-edited lines need not reach each other.
pub fn polygons_from_grid_lines(
    first: &[Segment],
    second: &[Segment],
) -> Result<Vec<Ring>, GridError> {
    // Intersections are shared by up to four quads; compute each once.
    let mut nodes = Vec::with_capacity(first.len() * second.len());
    for a in first {
        for b in second {
            nodes.push(a.intersect_lines(b)?);
        }
    }
    let stride = second.len();
    let node = |i: usize, j: usize| nodes[i * stride + j];

    let mut quads = Vec::new();
    for i in 0..first.len().saturating_sub(1) {
        for j in 0..second.len().saturating_sub(1) {
            quads.push(Ring::new(vec![
                node(i, j),
                node(i + 1, j),
                node(i + 1, j + 1),
                node(i, j + 1),
            ]));
        }
    }
    Ok(quads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fieldplots_core::GeometryError;

    fn field() -> [Point2<f64>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 4.0),
            Point2::new(0.0, 4.0),
        ]
    }

    #[test]
    fn lines_divide_edges_evenly() {
        let lines = field_grid_lines(&field(), [3, 2]).expect("lines");
        assert_eq!(lines.first.len(), 4);
        assert_eq!(lines.second.len(), 3);
        assert_eq!(lines.first[1].start, Point2::new(2.0, 0.0));
        assert_eq!(lines.first[1].end, Point2::new(2.0, 4.0));
        assert_eq!(lines.second[1].start, Point2::new(6.0, 2.0));
        assert_eq!(lines.second[1].end, Point2::new(0.0, 2.0));
    }

    #[test]
    fn polygons_tile_the_field() {
        let lines = field_grid_lines(&field(), [3, 2]).expect("lines");
        let quads = polygons_from_grid_lines(&lines.first, &lines.second).expect("quads");
        assert_eq!(quads.len(), 6);
        for q in &quads {
            assert_relative_eq!(q.area(), 4.0, epsilon = 1e-9);
        }
        let total: f64 = quads.iter().map(Ring::area).sum();
        assert_relative_eq!(total, 24.0, epsilon = 1e-9);
    }

    #[test]
    fn parallel_lines_fail() {
        let a = [
            Segment::new(Point2::new(0.0, 0.0), Point2::new(0.0, 1.0)),
            Segment::new(Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)),
        ];
        let b = [
            Segment::new(Point2::new(5.0, 0.0), Point2::new(5.0, 1.0)),
            Segment::new(Point2::new(6.0, 0.0), Point2::new(6.0, 1.0)),
        ];
        assert_eq!(
            polygons_from_grid_lines(&a, &b),
            Err(GridError::Geometry(GeometryError::ParallelLines))
        );
    }

    #[test]
    fn zero_divisions_rejected() {
        assert!(matches!(
            field_grid_lines(&field(), [0, 2]),
            Err(GridError::InvalidParameter(_))
        ));
    }
}
