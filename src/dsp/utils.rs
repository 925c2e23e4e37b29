use std::f32::consts::TAU;

/// One-pole smoothing coefficient for a corner frequency in Hz.
///
/// The returned value is the per-sample blend factor `a` in
/// `state += a * (target - state)`.
#[inline]
pub fn pole_coeff(freq_hz: f32, sample_rate: f32) -> f32 {
    1.0 - (-TAU * freq_hz / sample_rate).exp()
}

pub fn lin_to_db(x: f32) -> f32 {
    20.0 * x.max(1e-12).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pole_coeff_range() {
        for sr in [44_100.0, 48_000.0, 96_000.0] {
            for hz in [5.0, 30.0, 50.0, 1000.0] {
                let a = pole_coeff(hz, sr);
                assert!(a > 0.0 && a < 1.0, "coeff out of range: {a} ({hz} Hz @ {sr})");
            }
        }
    }

    #[test]
    fn test_pole_coeff_faster_corner_is_larger() {
        let slow = pole_coeff(50.0, 48_000.0);
        let fast = pole_coeff(1000.0, 48_000.0);
        assert!(fast > slow);
    }

    #[test]
    fn test_lin_to_db_reference_points() {
        assert!((lin_to_db(1.0) - 0.0).abs() < 1e-4);
        assert!((lin_to_db(0.5) + 6.0206).abs() < 1e-3);
    }
}
