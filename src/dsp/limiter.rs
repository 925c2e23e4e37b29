//! Lookahead safety limiter.
//!
//! # Perceptual Contract
//! - **Target Source**: The summed stereo mix, which can run away under
//!   high feedback gains.
//! - **Intended Effect**: Keep sustained peaks at the configured ceiling,
//!   reacting *before* a transient reaches the output by delaying the
//!   output path and deciding gain from the un-delayed signal.
//! - **Failure Modes**:
//!   - Residual overshoot bounded by the attack time constant.
//!   - Saturation coloration while gain reduction is active (intended).
//! - **Will Not Do**:
//!   - Color signal that is below the ceiling (shaping only engages while
//!     limiting).
//!   - Loudness leveling; this is purely a safety stage.
//!
//! The gain decision and the signal it is applied to are deliberately
//! offset in time: the envelope follows the mix as it enters the ring, and
//! the smoothed gain multiplies the mix as it leaves the ring one lookahead
//! window later. By the time a transient emerges, the follower has already
//! been pulling gain down for the whole window.

use crate::dsp::coefficients::Coefficients;
use crate::dsp::delay_line::{StereoDelayLine, RING_CAPACITY};
use crate::dsp::saturation::Saturation;
use crate::dsp::utils::lin_to_db;

// Busses carry volt-scaled signal, so the ceiling is expressed in volts.
/// Ceiling at squash = 0 (least limiting).
pub const THRESHOLD_MAX_VOLTS: f32 = 10.0;
/// Ceiling at squash = 1 (most limiting).
pub const THRESHOLD_MIN_VOLTS: f32 = 1.0;

/// Below this applied gain the limiter counts as working and the
/// saturation stage engages.
const ENGAGE_BELOW: f32 = 0.9999;

pub struct LookaheadLimiter {
    ring: StereoDelayLine,
    envelope: f32,
    gain: f32,
    threshold: f32,
    attack: f32,
    release: f32,
    gain_smoothing: f32,
}

impl LookaheadLimiter {
    pub fn new(coeffs: &Coefficients) -> Self {
        Self {
            ring: StereoDelayLine::new(),
            envelope: 0.0,
            gain: 1.0,
            threshold: THRESHOLD_MAX_VOLTS,
            attack: coeffs.envelope_attack,
            release: coeffs.envelope_release,
            gain_smoothing: coeffs.gain_smoothing,
        }
    }

    /// Map the squash amount in [0, 1] onto the ceiling: 0 leaves the most
    /// headroom, 1 pulls the ceiling all the way down.
    pub fn set_squash(&mut self, squash: f32) {
        let squash = squash.clamp(0.0, 1.0);
        self.threshold = THRESHOLD_MAX_VOLTS - (THRESHOLD_MAX_VOLTS - THRESHOLD_MIN_VOLTS) * squash;
    }

    /// Reconfigure the lookahead window. Only a scalar sample count moves;
    /// the ring itself is never touched.
    pub fn set_lookahead_ms(&mut self, ms: f32, sample_rate: f32) {
        let samples = (sample_rate * ms / 1000.0).round() as usize;
        self.ring.set_lookahead_samples(samples.clamp(1, RING_CAPACITY));
    }

    /// Process one stereo frame of the summed mix, returning the delayed,
    /// gain-reduced (and, while limiting, saturated) frame.
    #[inline]
    pub fn process(&mut self, mix_l: f32, mix_r: f32, shaper: Saturation) -> (f32, f32) {
        // Write first, then read: the delayed frame sits exactly one
        // lookahead window behind the slot just written.
        let (delayed_l, delayed_r) = self.ring.exchange(mix_l, mix_r);

        // Peak of the signal that has NOT reached the output yet.
        let peak = mix_l.abs().max(mix_r.abs());
        let coeff = if peak > self.envelope { self.attack } else { self.release };
        self.envelope += coeff * (peak - self.envelope);

        let target = if self.envelope > self.threshold {
            self.threshold / self.envelope
        } else {
            1.0
        };
        self.gain += self.gain_smoothing * (target - self.gain);

        let limited_l = delayed_l * self.gain;
        let limited_r = delayed_r * self.gain;

        if self.gain < ENGAGE_BELOW || self.envelope > self.threshold {
            // Normalize to the ceiling, shape, scale back. Clean signal
            // never takes this branch, so nothing colors an unlimited mix.
            let l = shaper.apply(limited_l / self.threshold) * self.threshold;
            let r = shaper.apply(limited_r / self.threshold) * self.threshold;
            (l, r)
        } else {
            (limited_l, limited_r)
        }
    }

    /// Current applied gain (1.0 = no reduction).
    #[allow(dead_code)]
    pub fn gain_reduction(&self) -> f32 {
        self.gain
    }

    /// Current gain reduction in dB (for metering).
    #[allow(dead_code)]
    pub fn gain_reduction_db(&self) -> f32 {
        lin_to_db(self.gain).abs()
    }

    #[allow(dead_code)]
    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    #[allow(dead_code)]
    pub fn threshold_volts(&self) -> f32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter_at(sample_rate: f32, threshold: f32, lookahead_ms: f32) -> LookaheadLimiter {
        let coeffs = Coefficients::new(sample_rate);
        let mut lim = LookaheadLimiter::new(&coeffs);
        let squash = (THRESHOLD_MAX_VOLTS - threshold) / (THRESHOLD_MAX_VOLTS - THRESHOLD_MIN_VOLTS);
        lim.set_squash(squash);
        lim.set_lookahead_ms(lookahead_ms, sample_rate);
        lim
    }

    #[test]
    fn test_squash_mapping() {
        let coeffs = Coefficients::new(48_000.0);
        let mut lim = LookaheadLimiter::new(&coeffs);
        lim.set_squash(0.0);
        assert!((lim.threshold_volts() - THRESHOLD_MAX_VOLTS).abs() < 1e-6);
        lim.set_squash(1.0);
        assert!((lim.threshold_volts() - THRESHOLD_MIN_VOLTS).abs() < 1e-6);
        lim.set_squash(7.0);
        assert!((lim.threshold_volts() - THRESHOLD_MIN_VOLTS).abs() < 1e-6);
    }

    #[test]
    fn test_sub_threshold_signal_is_delayed_untouched() {
        let sr = 48_000.0;
        let mut lim = limiter_at(sr, THRESHOLD_MAX_VOLTS, 0.5);
        let lookahead = 24;
        let mut history = Vec::new();
        for n in 0..2000usize {
            let x = (std::f32::consts::TAU * 440.0 * n as f32 / sr).sin();
            history.push(x);
            let (l, r) = lim.process(x, x, Saturation::Soft);
            if n >= lookahead {
                let expect = history[n - lookahead];
                assert!((l - expect).abs() < 1e-6, "frame {n}: {l} vs {expect}");
                assert!((r - expect).abs() < 1e-6);
            } else {
                assert!(l.abs() < 1e-6 && r.abs() < 1e-6);
            }
        }
        assert!((lim.gain_reduction() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_gain_anticipates_step_onset() {
        let sr = 48_000.0;
        let threshold = 5.0;
        let lookahead = 240; // 5 ms
        let mut lim = limiter_at(sr, threshold, 5.0);
        let mut outputs = Vec::new();
        for _ in 0..(lookahead + 1) {
            let (l, _) = lim.process(8.0, 8.0, Saturation::Soft);
            outputs.push(l);
        }
        // Nothing emerges before the window ends.
        for (n, &out) in outputs[..lookahead].iter().enumerate() {
            assert!(out.abs() < 1e-6, "leak {out} at pre-onset frame {n}");
        }
        // The first emerging sample already carries gain reduction that was
        // accumulated while it sat in the ring: anticipation, not reaction.
        let onset = outputs[lookahead];
        assert!(onset > 0.5, "onset vanished: {onset}");
        assert!(onset < 8.0 * 0.9, "no anticipatory reduction at onset: {onset}");
        assert!(lim.gain_reduction() < 0.9);
    }

    #[test]
    fn test_sustained_peak_is_bounded() {
        let sr = 48_000.0;
        let threshold = 5.0;
        let mut lim = limiter_at(sr, threshold, 5.0);
        let mut tail_peak = 0.0f32;
        for n in 0..48_000usize {
            let (l, r) = lim.process(8.0, -8.0, Saturation::Soft);
            if n > 40_000 {
                tail_peak = tail_peak.max(l.abs()).max(r.abs());
            }
        }
        // Steady state must sit at or under the ceiling (the soft shaper
        // keeps it strictly below); allow the attack-bounded residual.
        assert!(tail_peak <= threshold + 0.5, "peak {tail_peak} over ceiling");
        assert!(lim.gain_reduction() < 0.7);
    }

    #[test]
    fn test_release_recovers_after_burst() {
        let sr = 48_000.0;
        let mut lim = limiter_at(sr, 5.0, 1.0);
        for _ in 0..4800 {
            lim.process(9.0, 9.0, Saturation::Soft);
        }
        assert!(lim.gain_reduction() < 0.9);
        for _ in 0..200_000 {
            lim.process(0.0, 0.0, Saturation::Soft);
        }
        assert!(lim.gain_reduction() > 0.999, "gain stuck at {}", lim.gain_reduction());
    }
}
