//! Per-instance coefficient cache.
//!
//! Every smoothing and filter pole used by the mixer is derived from the
//! sample rate exactly once, at construction. The sample rate is fixed for
//! the lifetime of a processing instance, so nothing in here is ever
//! recomputed while audio is running.

use crate::dsp::utils::pole_coeff;
use std::f32::consts::TAU;

/// Corner frequency of the feedback-path DC blocker (Hz).
const DC_BLOCKER_HZ: f32 = 5.0;
/// Control-value smoothing corner, shared by feedback, pan and master level.
const CONTROL_SMOOTHING_HZ: f32 = 50.0;
/// Limiter envelope attack corner. Fast, so transients are caught early.
const ENVELOPE_ATTACK_HZ: f32 = 1000.0;
/// Limiter envelope release corner.
const ENVELOPE_RELEASE_HZ: f32 = 50.0;
/// Gain-reduction smoothing corner.
const GAIN_SMOOTHING_HZ: f32 = 30.0;

#[derive(Clone, Copy, Debug)]
pub struct Coefficients {
    /// DC-blocker feedback pole `R` (close to but below 1.0).
    pub dc_pole: f32,
    /// One-pole blend factor for control-value smoothing.
    pub smoothing: f32,
    /// Envelope follower blend factor while the peak is rising.
    pub envelope_attack: f32,
    /// Envelope follower blend factor while the peak is falling.
    pub envelope_release: f32,
    /// Blend factor for the limiter's applied-gain smoothing.
    pub gain_smoothing: f32,
}

impl Coefficients {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            dc_pole: 1.0 - TAU * DC_BLOCKER_HZ / sample_rate,
            smoothing: pole_coeff(CONTROL_SMOOTHING_HZ, sample_rate),
            envelope_attack: pole_coeff(ENVELOPE_ATTACK_HZ, sample_rate),
            envelope_release: pole_coeff(ENVELOPE_RELEASE_HZ, sample_rate),
            gain_smoothing: pole_coeff(GAIN_SMOOTHING_HZ, sample_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poles_are_stable() {
        for sr in [44_100.0, 48_000.0, 96_000.0] {
            let c = Coefficients::new(sr);
            assert!(c.dc_pole > 0.99 && c.dc_pole < 1.0);
            for a in [c.smoothing, c.envelope_attack, c.envelope_release, c.gain_smoothing] {
                assert!(a > 0.0 && a < 1.0);
            }
        }
    }

    #[test]
    fn test_attack_faster_than_release() {
        let c = Coefficients::new(48_000.0);
        assert!(c.envelope_attack > c.envelope_release);
    }
}
