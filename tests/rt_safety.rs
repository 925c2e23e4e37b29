//! The processing path must never touch the allocator.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};
use loopmix::{ChannelParam, FeedbackMixer, GlobalParam};

#[global_allocator]
static ALLOC: AllocDisabler = AllocDisabler;

#[test]
fn process_does_not_allocate() {
    let num_frames = 256;
    let mut mixer = FeedbackMixer::new(48_000.0, 4);
    let layout = mixer.layout().clone();
    for ch in 0..4 {
        mixer.set_parameter(layout.channel_index(ch, ChannelParam::Feedback), 70);
    }
    let mut busses = vec![0.0f32; 16 * num_frames];
    for i in 0..num_frames {
        busses[i] = (i as f32 * 0.01).sin() * 4.0;
    }

    assert_no_alloc(|| {
        for _ in 0..64 {
            mixer.process(&mut busses, num_frames);
        }
    });
}

#[test]
fn parameter_changes_do_not_allocate() {
    let mut mixer = FeedbackMixer::new(96_000.0, 8);
    let layout = mixer.layout().clone();
    let lookahead = layout.global_index(GlobalParam::Lookahead);
    let delay = layout.global_index(GlobalParam::FeedbackDelay);

    assert_no_alloc(|| {
        for v in (5..=200).step_by(5) {
            mixer.set_parameter(lookahead, v);
            mixer.set_parameter(delay, 205 - v);
        }
    });
}
