//! loopmix: a multi-channel feedback mixer with a lookahead safety
//! limiter.
//!
//! Up to eight mono inputs feed a stereo bus, each through its own
//! CV-modulatable feedback loop (DC-blocked, with a configurable 0.5–20 ms
//! delay) and equal-power panner. The summed mix passes through a lookahead
//! peak limiter with selectable saturation before the smoothed master level
//! writes it to the destination busses.
//!
//! The crate is the DSP core only. A host owns the bus memory, quantizes
//! parameter values, and calls [`FeedbackMixer::process`] once per audio
//! block on its real-time thread; the processing path never allocates,
//! locks or blocks.

pub mod debug;
pub mod dsp;
pub mod mixer;
pub mod params;
pub mod scene;

pub use mixer::FeedbackMixer;
pub use params::{ChannelParam, GlobalParam, ParamLayout, ParamSpec, ParamUnit};
pub use scene::{Scene, SceneValue};

/// Hard upper bound on mixer channels; instances may be built with fewer.
pub const MAX_CHANNELS: usize = 8;
