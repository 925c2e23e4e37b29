//! One-pole control smoother.
//!
//! Smooths *control values* (feedback amount, pan position, master level)
//! so parameter and CV changes never step audibly. This is not a filter for
//! audio; it never sits in the signal path itself.

#[derive(Clone, Copy, Debug)]
pub struct OnePole {
    state: f32,
    coeff: f32,
}

impl OnePole {
    pub fn new(coeff: f32) -> Self {
        Self { state: 0.0, coeff }
    }

    /// Start from a non-zero value instead of slewing up from silence.
    pub fn with_state(coeff: f32, state: f32) -> Self {
        Self { state, coeff }
    }

    /// Move one step toward `target` and return the smoothed value.
    #[inline]
    pub fn advance(&mut self, target: f32) -> f32 {
        self.state += self.coeff * (target - self.state);
        self.state
    }

    #[inline]
    #[allow(dead_code)]
    pub fn value(&self) -> f32 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::utils::pole_coeff;

    #[test]
    fn test_converges_to_target() {
        let mut s = OnePole::new(pole_coeff(50.0, 48_000.0));
        let mut v = 0.0;
        for _ in 0..10_000 {
            v = s.advance(1.0);
        }
        assert!((v - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_single_step_is_partial() {
        let mut s = OnePole::new(pole_coeff(50.0, 48_000.0));
        let v = s.advance(1.0);
        assert!(v > 0.0 && v < 0.05, "one step should move only slightly: {v}");
    }

    #[test]
    fn test_with_state_starts_there() {
        let s = OnePole::with_state(0.01, 0.8);
        assert!((s.value() - 0.8).abs() < f32::EPSILON);
    }
}
