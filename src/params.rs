//! Parameter layout and metadata.
//!
//! Every mixer instance owns its layout outright: the slot table is built
//! from the requested channel count at construction, so two instances with
//! different channel counts never share (or rebuild) any common table.
//!
//! Slot order matches the processing model: each channel contributes a
//! contiguous block of seven slots, then the eight global slots follow.
//! Hosts address parameters purely by slot index; the layout provides the
//! arithmetic and the per-slot metadata (range, default, unit).

use crate::MAX_CHANNELS;
use serde::Serialize;

/// Slots per channel block.
pub const CHANNEL_PARAMS: usize = 7;
/// Global slots after the channel blocks.
pub const GLOBAL_PARAMS: usize = 8;
/// Highest addressable bus index on the host fabric.
pub const MAX_BUS: i32 = 28;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelParam {
    /// Input bus selector (0 = unconnected).
    Input = 0,
    /// Feedback amount, percent.
    Feedback,
    /// Feedback CV bus selector (0 = unconnected).
    FeedbackCv,
    /// Feedback CV depth, percent.
    FeedbackCvDepth,
    /// Pan position, -100..100.
    Pan,
    /// Pan CV bus selector (0 = unconnected).
    PanCv,
    /// Pan CV depth, percent.
    PanCvDepth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalParam {
    OutputLeft = 0,
    OutputRight,
    /// 0 = add into the destination busses, 1 = replace them.
    OutputMode,
    /// Master level, percent.
    MasterLevel,
    /// Limiter lookahead, tenths of a millisecond.
    Lookahead,
    /// Saturation curve selector.
    Saturation,
    /// Feedback delay, tenths of a millisecond.
    FeedbackDelay,
    /// Limiter squash amount, percent.
    Squash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParamUnit {
    None,
    Percent,
    /// Tenths of a millisecond (a value of 50 means 5.0 ms).
    TenthsMs,
    AudioBus,
    CvBus,
    Choice,
    Toggle,
}

/// Static description of one parameter slot.
#[derive(Clone, Debug, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub min: i32,
    pub max: i32,
    pub default: i32,
    pub unit: ParamUnit,
}

impl ParamSpec {
    fn new(name: String, min: i32, max: i32, default: i32, unit: ParamUnit) -> Self {
        Self { name, min, max, default, unit }
    }
}

/// Instance-local slot table for a given channel count.
#[derive(Clone, Debug)]
pub struct ParamLayout {
    num_channels: usize,
    specs: Vec<ParamSpec>,
}

impl ParamLayout {
    pub fn new(num_channels: usize) -> Self {
        let num_channels = num_channels.clamp(1, MAX_CHANNELS);
        let mut specs = Vec::with_capacity(num_channels * CHANNEL_PARAMS + GLOBAL_PARAMS);

        for ch in 0..num_channels {
            let label = ch + 1;
            // Inputs default to sequential busses so a fresh instance
            // picks up adjacent sources without any routing work.
            specs.push(ParamSpec::new(
                format!("{label}:Input"),
                0,
                MAX_BUS,
                label as i32,
                ParamUnit::AudioBus,
            ));
            specs.push(ParamSpec::new(format!("{label}:Feedback"), 0, 100, 0, ParamUnit::Percent));
            specs.push(ParamSpec::new(format!("{label}:FB CV"), 0, MAX_BUS, 0, ParamUnit::CvBus));
            specs.push(ParamSpec::new(format!("{label}:FB Depth"), 0, 100, 50, ParamUnit::Percent));
            specs.push(ParamSpec::new(format!("{label}:Pan"), -100, 100, 0, ParamUnit::None));
            specs.push(ParamSpec::new(format!("{label}:Pan CV"), 0, MAX_BUS, 0, ParamUnit::CvBus));
            specs.push(ParamSpec::new(format!("{label}:Pan Depth"), 0, 100, 50, ParamUnit::Percent));
        }

        specs.push(ParamSpec::new("Out L".into(), 1, MAX_BUS, 13, ParamUnit::AudioBus));
        specs.push(ParamSpec::new("Out R".into(), 1, MAX_BUS, 14, ParamUnit::AudioBus));
        specs.push(ParamSpec::new("Mode".into(), 0, 1, 1, ParamUnit::Toggle));
        specs.push(ParamSpec::new("Level".into(), 0, 100, 100, ParamUnit::Percent));
        specs.push(ParamSpec::new("Lookahead".into(), 5, 200, 50, ParamUnit::TenthsMs));
        specs.push(ParamSpec::new("Saturation".into(), 0, 2, 0, ParamUnit::Choice));
        specs.push(ParamSpec::new("FB Delay".into(), 5, 200, 50, ParamUnit::TenthsMs));
        specs.push(ParamSpec::new("Squash".into(), 0, 100, 56, ParamUnit::Percent));

        Self { num_channels, specs }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Slot index of a per-channel parameter.
    #[inline]
    pub fn channel_index(&self, channel: usize, param: ChannelParam) -> usize {
        channel * CHANNEL_PARAMS + param as usize
    }

    /// Slot index of a global parameter.
    #[inline]
    pub fn global_index(&self, param: GlobalParam) -> usize {
        self.num_channels * CHANNEL_PARAMS + param as usize
    }

    pub fn spec(&self, index: usize) -> Option<&ParamSpec> {
        self.specs.get(index)
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    /// The host is expected to deliver in-range values; clamp anyway so a
    /// misbehaving host can never push derived state out of bounds.
    pub fn clamp_value(&self, index: usize, value: i32) -> i32 {
        match self.specs.get(index) {
            Some(spec) => value.clamp(spec.min, spec.max),
            None => value,
        }
    }

    /// Fresh value table, one default per slot.
    pub fn defaults(&self) -> Vec<i32> {
        self.specs.iter().map(|s| s.default).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_length() {
        for channels in 1..=MAX_CHANNELS {
            let layout = ParamLayout::new(channels);
            assert_eq!(layout.len(), channels * CHANNEL_PARAMS + GLOBAL_PARAMS);
        }
    }

    #[test]
    fn test_channel_count_clamps() {
        assert_eq!(ParamLayout::new(0).num_channels(), 1);
        assert_eq!(ParamLayout::new(99).num_channels(), MAX_CHANNELS);
    }

    #[test]
    fn test_globals_follow_channel_blocks() {
        let layout = ParamLayout::new(3);
        assert_eq!(layout.global_index(GlobalParam::OutputLeft), 3 * CHANNEL_PARAMS);
        assert_eq!(
            layout.global_index(GlobalParam::Squash),
            3 * CHANNEL_PARAMS + GLOBAL_PARAMS - 1
        );
    }

    #[test]
    fn test_sequential_input_defaults() {
        let layout = ParamLayout::new(4);
        for ch in 0..4 {
            let idx = layout.channel_index(ch, ChannelParam::Input);
            assert_eq!(layout.spec(idx).unwrap().default, ch as i32 + 1);
        }
    }

    #[test]
    fn test_clamp_value() {
        let layout = ParamLayout::new(2);
        let pan = layout.channel_index(1, ChannelParam::Pan);
        assert_eq!(layout.clamp_value(pan, 500), 100);
        assert_eq!(layout.clamp_value(pan, -500), -100);
        assert_eq!(layout.clamp_value(pan, 25), 25);
        // Unknown slots pass through untouched; the caller ignores them.
        assert_eq!(layout.clamp_value(10_000, 42), 42);
    }

    #[test]
    fn test_defaults_match_specs() {
        let layout = ParamLayout::new(2);
        let defaults = layout.defaults();
        assert_eq!(defaults.len(), layout.len());
        let squash = layout.global_index(GlobalParam::Squash);
        assert_eq!(defaults[squash], 56);
        let mode = layout.global_index(GlobalParam::OutputMode);
        assert_eq!(defaults[mode], 1);
    }
}
