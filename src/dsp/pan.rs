//! Equal-power stereo panning.

use std::f32::consts::FRAC_PI_2;

/// Map a pan position in [-100, 100] to a left/right gain pair on the
/// constant-power quarter circle, so `gl^2 + gr^2 == 1` for the whole
/// sweep. Out-of-range positions (a mis-clamped CV upstream) pin to the
/// nearest extreme rather than leaving the circle.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    let u = ((pan + 100.0) / 200.0).clamp(0.0, 1.0);
    let theta = u * FRAC_PI_2;
    (theta.cos(), theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_power_across_sweep() {
        let mut pan = -100.0f32;
        while pan <= 100.0 {
            let (gl, gr) = equal_power_pan(pan);
            let power = gl * gl + gr * gr;
            assert!((power - 1.0).abs() < 1e-5, "power {power} at pan {pan}");
            pan += 0.5;
        }
    }

    #[test]
    fn test_extremes() {
        let (gl, gr) = equal_power_pan(-100.0);
        assert!((gl - 1.0).abs() < 1e-6 && gr.abs() < 1e-6);
        let (gl, gr) = equal_power_pan(100.0);
        assert!(gl.abs() < 1e-6 && (gr - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_center_is_minus_3db() {
        let (gl, gr) = equal_power_pan(0.0);
        assert!((gl - gr).abs() < 1e-6);
        assert!((gl - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_pins_to_extreme() {
        assert_eq!(equal_power_pan(-250.0), equal_power_pan(-100.0));
        assert_eq!(equal_power_pan(300.0), equal_power_pan(100.0));
    }
}
