//! The feedback mixer core.
//!
//! # Perceptual Contract
//! - **Target Source**: 1–8 mono busses summed onto a stereo pair through
//!   per-channel feedback loops.
//! - **Intended Effect**: Controllable, CV-modulatable feedback textures
//!   that stay stable and inside the ceiling no matter how hot the loops
//!   are driven.
//! - **Failure Modes**:
//!   - Changing the feedback delay time jumps the read point; the skip is
//!     audible and accepted.
//! - **Will Not Do**:
//!   - Cross-feed between channels; every loop is isolated in its own
//!     delay lane.
//!
//! One `process` call covers one audio block. Per frame: every active
//! channel reads its input bus, resolves and smooths its feedback and pan
//! targets (base value blended with CV), drains its DC-blocked delay-lane
//! tap back into the mix, and pans into the stereo accumulators; the summed
//! mix runs through the lookahead limiter; the smoothed master level is
//! applied last and the result lands on the destination busses.
//!
//! Everything is preallocated in `new`; the processing path allocates
//! nothing, takes no locks and has no unbounded loops.

use crate::dsp::{
    equal_power_pan, Coefficients, DcBlocker, LaneDelayLine, LookaheadLimiter, OnePole, Saturation,
};
use crate::params::{ChannelParam, GlobalParam, ParamLayout};
use crate::MAX_CHANNELS;

/// CV busses are bipolar, ±5 V.
const CV_RANGE_VOLTS: f32 = 5.0;
/// Master smoother seed; the level glides from here to its target after
/// construction instead of slamming in at full scale.
const MASTER_LEVEL_SEED: f32 = 0.8;

/// Per-channel state: control smoothers plus the feedback-path DC blocker.
struct ChannelStrip {
    feedback: OnePole,
    pan: OnePole,
    dc_blocker: DcBlocker,
}

impl ChannelStrip {
    fn new(coeffs: &Coefficients) -> Self {
        Self {
            feedback: OnePole::new(coeffs.smoothing),
            pan: OnePole::new(coeffs.smoothing),
            dc_blocker: DcBlocker::new(coeffs.dc_pole),
        }
    }
}

pub struct FeedbackMixer {
    sample_rate: f32,
    num_channels: usize,
    layout: ParamLayout,
    values: Vec<i32>,
    strips: [ChannelStrip; MAX_CHANNELS],
    feedback_delay: LaneDelayLine,
    limiter: LookaheadLimiter,
    master: OnePole,
}

impl FeedbackMixer {
    /// Build a mixer for `num_channels` inputs (clamped to 1..=8) at a
    /// fixed sample rate. All buffers are sized here, once, for the
    /// compile-time maxima; nothing is ever resized afterwards.
    pub fn new(sample_rate: f32, num_channels: usize) -> Self {
        let layout = ParamLayout::new(num_channels);
        let num_channels = layout.num_channels();
        let coeffs = Coefficients::new(sample_rate);
        let values = layout.defaults();

        let mut mixer = Self {
            sample_rate,
            num_channels,
            layout,
            values,
            strips: std::array::from_fn(|_| ChannelStrip::new(&coeffs)),
            feedback_delay: LaneDelayLine::new(),
            limiter: LookaheadLimiter::new(&coeffs),
            master: OnePole::with_state(coeffs.smoothing, MASTER_LEVEL_SEED),
        };
        mixer.refresh_lookahead();
        mixer.refresh_feedback_delay();
        log::info!("feedback mixer ready: {num_channels} channels at {sample_rate} Hz");
        mixer
    }

    /// Store a host-quantized parameter value and refresh whatever derived
    /// state depends on it. Safe to call interleaved with `process`; only
    /// scalar fields move here, never the buffers. Unknown slots are
    /// ignored, out-of-range values clamped.
    pub fn set_parameter(&mut self, index: usize, value: i32) {
        if index >= self.values.len() {
            return;
        }
        let value = self.layout.clamp_value(index, value);
        self.values[index] = value;
        if index == self.layout.global_index(GlobalParam::Lookahead) {
            self.refresh_lookahead();
        } else if index == self.layout.global_index(GlobalParam::FeedbackDelay) {
            self.refresh_feedback_delay();
        }
    }

    fn refresh_lookahead(&mut self) {
        let tenths = self.values[self.layout.global_index(GlobalParam::Lookahead)];
        let ms = tenths as f32 / 10.0;
        self.limiter.set_lookahead_ms(ms, self.sample_rate);
        crate::lm_log!("lookahead -> {ms} ms");
    }

    fn refresh_feedback_delay(&mut self) {
        let tenths = self.values[self.layout.global_index(GlobalParam::FeedbackDelay)];
        let ms = tenths as f32 / 10.0;
        let samples = (self.sample_rate * ms / 1000.0).round() as usize;
        self.feedback_delay.set_delay_samples(samples);
        crate::lm_log!("feedback delay -> {ms} ms");
    }

    /// Process one block. `bus_frames` is the host's flat, bus-major
    /// signal memory (`bus_frames[bus * num_frames + frame]`); the bus
    /// count is inferred from its length. Unrouted or out-of-range bus
    /// selections read as silence and write nowhere.
    pub fn process(&mut self, bus_frames: &mut [f32], num_frames: usize) {
        if num_frames == 0 || bus_frames.len() < num_frames {
            return;
        }
        let num_busses = bus_frames.len() / num_frames;

        let out_left = self.values[self.layout.global_index(GlobalParam::OutputLeft)];
        let out_right = self.values[self.layout.global_index(GlobalParam::OutputRight)];
        let replace = self.values[self.layout.global_index(GlobalParam::OutputMode)] != 0;
        let master_target =
            self.values[self.layout.global_index(GlobalParam::MasterLevel)] as f32 / 100.0;
        let shaper =
            Saturation::from_index(self.values[self.layout.global_index(GlobalParam::Saturation)]);
        let squash = self.values[self.layout.global_index(GlobalParam::Squash)] as f32 / 100.0;
        self.limiter.set_squash(squash);

        let FeedbackMixer {
            layout,
            values,
            strips,
            feedback_delay,
            limiter,
            master,
            num_channels,
            ..
        } = self;
        let num_channels = *num_channels;

        for i in 0..num_frames {
            let mut mix_l = 0.0f32;
            let mut mix_r = 0.0f32;

            for (ch, strip) in strips[..num_channels].iter_mut().enumerate() {
                let input = read_bus(
                    bus_frames,
                    num_busses,
                    num_frames,
                    values[layout.channel_index(ch, ChannelParam::Input)],
                    i,
                );

                let mut feedback_target =
                    values[layout.channel_index(ch, ChannelParam::Feedback)] as f32 / 100.0;
                let feedback_cv_bus = values[layout.channel_index(ch, ChannelParam::FeedbackCv)];
                if feedback_cv_bus > 0 {
                    let depth = values[layout.channel_index(ch, ChannelParam::FeedbackCvDepth)]
                        as f32
                        / 100.0;
                    let cv =
                        read_bus(bus_frames, num_busses, num_frames, feedback_cv_bus, i)
                            / CV_RANGE_VOLTS;
                    let cv = (cv * 0.5 + 0.5).clamp(0.0, 1.0);
                    feedback_target = feedback_target * (1.0 - depth) + cv * depth;
                }
                let feedback_gain = strip.feedback.advance(feedback_target);

                // The DC blocker sits on the tap only; the dry input keeps
                // its full spectrum.
                let tap = strip.dc_blocker.process(feedback_delay.tap(ch));
                let processed = input + tap * feedback_gain;
                feedback_delay.push(ch, processed);

                let mut pan_target = values[layout.channel_index(ch, ChannelParam::Pan)] as f32;
                let pan_cv_bus = values[layout.channel_index(ch, ChannelParam::PanCv)];
                if pan_cv_bus > 0 {
                    let depth =
                        values[layout.channel_index(ch, ChannelParam::PanCvDepth)] as f32 / 100.0;
                    let cv = read_bus(bus_frames, num_busses, num_frames, pan_cv_bus, i)
                        / CV_RANGE_VOLTS;
                    pan_target = (pan_target + cv * 100.0 * depth).clamp(-100.0, 100.0);
                }
                let (gain_l, gain_r) = equal_power_pan(strip.pan.advance(pan_target));
                mix_l += processed * gain_l;
                mix_r += processed * gain_r;
            }

            feedback_delay.advance();

            let (limited_l, limited_r) = limiter.process(mix_l, mix_r, shaper);

            // Master level sits after the limiter so it can never move the
            // signal relative to the threshold comparison.
            let level = master.advance(master_target);
            write_bus(bus_frames, num_busses, num_frames, out_left, i, limited_l * level, replace);
            write_bus(bus_frames, num_busses, num_frames, out_right, i, limited_r * level, replace);
        }
    }

    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    pub fn parameter(&self, index: usize) -> Option<i32> {
        self.values.get(index).copied()
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Limiter metering access.
    pub fn limiter(&self) -> &LookaheadLimiter {
        &self.limiter
    }
}

#[inline]
fn read_bus(
    bus_frames: &[f32],
    num_busses: usize,
    num_frames: usize,
    selector: i32,
    frame: usize,
) -> f32 {
    if selector < 1 || selector as usize > num_busses {
        return 0.0;
    }
    bus_frames[(selector as usize - 1) * num_frames + frame]
}

#[inline]
fn write_bus(
    bus_frames: &mut [f32],
    num_busses: usize,
    num_frames: usize,
    selector: i32,
    frame: usize,
    value: f32,
    replace: bool,
) {
    if selector < 1 || selector as usize > num_busses {
        return;
    }
    let slot = &mut bus_frames[(selector as usize - 1) * num_frames + frame];
    if replace {
        *slot = value;
    } else {
        *slot += value;
    }
}
