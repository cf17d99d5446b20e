//! 8-bit RGB conversions used by the color analysis.
//!
//! Inputs are `[r, g, b]` in `0..=255`. Hue follows the OpenCV 8-bit
//! convention (degrees halved into `0..180`) before being scaled back to
//! degrees, so hues are quantized to 2 degree steps.

use palette::encoding::Srgb as SrgbStandard;
use palette::white_point::D65;
use palette::{Hsv, IntoColor, Lab, LinSrgb, Srgb};

fn srgb(rgb: [f64; 3]) -> Srgb<f64> {
    let [r, g, b] = rgb.map(|c| c.clamp(0.0, 255.0) / 255.0);
    Srgb::new(r, g, b)
}

fn hsv(rgb: [f64; 3]) -> Hsv<SrgbStandard, f64> {
    srgb(rgb).into_color()
}

/// OpenCV 8-bit hue `0..180` of an RGB pixel. Achromatic pixels get 0.
pub fn hue8(rgb: [f64; 3]) -> u8 {
    let degrees = hsv(rgb).hue.into_positive_degrees();
    ((degrees / 2.0).round() as u32 % 180) as u8
}

/// `[hue degrees 0..360, saturation 0..100, value 0..100]`.
pub fn rgb_to_hsv(rgb: [f64; 3]) -> [f64; 3] {
    let hsv = hsv(rgb);
    [
        f64::from(hue8(rgb)) * 2.0,
        hsv.saturation * 100.0,
        hsv.value * 100.0,
    ]
}

/// CIE L*a*b* under D65: `[L 0..100, a, b]`, with `a`/`b` roughly in
/// `-128..127`.
pub fn rgb_to_lab(rgb: [f64; 3]) -> [f64; 3] {
    let linear: LinSrgb<f64> = srgb(rgb).into_linear();
    let lab: Lab<D65, f64> = linear.into_color();
    [lab.l, lab.a, lab.b]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn primary_hues() {
        assert_eq!(hue8([255.0, 0.0, 0.0]), 0);
        assert_eq!(hue8([0.0, 255.0, 0.0]), 60);
        assert_eq!(hue8([0.0, 0.0, 255.0]), 120);
        assert_eq!(hue8([128.0, 128.0, 128.0]), 0);
        // Just below 360 degrees wraps to 0.
        assert_eq!(hue8([255.0, 0.0, 1.0]), 0);
    }

    #[test]
    fn hsv_scales() {
        let [h, s, v] = rgb_to_hsv([0.0, 255.0, 0.0]);
        assert_relative_eq!(h, 120.0);
        assert_relative_eq!(s, 100.0);
        assert_relative_eq!(v, 100.0);
        let [_, s, v] = rgb_to_hsv([0.0, 0.0, 0.0]);
        assert_eq!((s, v), (0.0, 0.0));
    }

    #[test]
    fn lab_reference_colors() {
        let [l, a, b] = rgb_to_lab([255.0, 255.0, 255.0]);
        assert_relative_eq!(l, 100.0, epsilon = 0.01);
        assert_relative_eq!(a, 0.0, epsilon = 0.01);
        assert_relative_eq!(b, 0.0, epsilon = 0.01);

        let [l, a, b] = rgb_to_lab([0.0, 0.0, 0.0]);
        assert_relative_eq!(l, 0.0);
        assert_relative_eq!(a, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b, 0.0, epsilon = 1e-9);

        // Pure green: strongly negative a, positive b.
        let [l, a, b] = rgb_to_lab([0.0, 255.0, 0.0]);
        assert_relative_eq!(l, 87.7, epsilon = 0.2);
        assert!(a < -80.0);
        assert!(b > 80.0);
    }

    #[test]
    fn red_matches_reference_values() {
        let [l, a, b] = rgb_to_lab([255.0, 0.0, 0.0]);
        assert_relative_eq!(l, 53.24, epsilon = 0.05);
        assert_relative_eq!(a, 80.09, epsilon = 0.1);
        assert_relative_eq!(b, 67.20, epsilon = 0.1);
        assert_eq!(rgb_to_hsv([255.0, 0.0, 0.0]), [0.0, 100.0, 100.0]);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        assert_eq!(rgb_to_hsv([300.0, -5.0, 0.0]), rgb_to_hsv([255.0, 0.0, 0.0]));
    }
}
