//! Splitting plots into row strips.
//!
//! Strip boundaries are vertical lines at equal x steps across the plot's
//! axis-aligned bounding box. For a plot aligned with the x axis this yields
//! exact rows; for a rotated plot the strips are slices of the bounding box,
//! not of the plot's own horizontal axis.

use fieldplots_core::Ring;
use nalgebra::Vector2;

/// Cut `ring` into `num_divisions` strips of equal bounding-box width.
///
/// Strips are returned left to right. Slices that miss the ring (possible
/// only for rotated shapes) are dropped.
pub fn split_into_strips(ring: &Ring, num_divisions: usize) -> Vec<Ring> {
    let Some(bounds) = ring.bounds() else {
        return Vec::new();
    };
    if num_divisions <= 1 {
        return vec![ring.clone()];
    }

    let step = bounds.width() / num_divisions as f64;
    let min_area = 1e-12 * ring.area().max(f64::MIN_POSITIVE);
    let mut strips = Vec::with_capacity(num_divisions);
    for i in 0..num_divisions {
        let x0 = bounds.min_x + i as f64 * step;
        let x1 = if i + 1 == num_divisions {
            bounds.max_x
        } else {
            bounds.min_x + (i + 1) as f64 * step
        };
        let strip = ring
            .clip_half_plane(Vector2::new(1.0, 0.0), x0)
            .clip_half_plane(Vector2::new(-1.0, 0.0), -x1);
        if strip.len() >= 3 && strip.area() > min_area {
            strips.push(strip);
        }
    }
    strips
}
