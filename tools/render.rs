use anyhow::{ensure, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use loopmix::{FeedbackMixer, GlobalParam, Scene};
use std::path::PathBuf;

const SAMPLE_RATE: u32 = 48_000;
const NUM_BUSSES: usize = 16;
const BLOCK: usize = 256;
const RENDER_SECONDS: usize = 6;

/// Offline validation render: feed the mixer a pair of swelling test
/// tones, optionally under a scene file, and write what comes off the
/// output busses to a WAV for listening and analysis.
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let scene_path = args.next().map(PathBuf::from);
    let out_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("loopmix_render.wav"));

    let mut mixer = FeedbackMixer::new(SAMPLE_RATE as f32, 2);
    let layout = mixer.layout().clone();

    match &scene_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read scene '{}'", path.display()))?;
            let scene = Scene::from_json(&json)?;
            println!("applying scene '{}'", scene.name);
            scene.apply(&mut mixer);
        }
        None => {
            let factory = Scene::factory(&layout);
            println!("no scene given; applying factory scene '{}'", factory[0].name);
            factory[0].apply(&mut mixer);
        }
    }

    let out_left = mixer
        .parameter(layout.global_index(GlobalParam::OutputLeft))
        .unwrap_or(13) as usize;
    let out_right = mixer
        .parameter(layout.global_index(GlobalParam::OutputRight))
        .unwrap_or(14) as usize;
    ensure!(
        (1..=NUM_BUSSES).contains(&out_left) && (1..=NUM_BUSSES).contains(&out_right),
        "scene routes output to busses outside the render fabric"
    );

    let spec = WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&out_path, spec)
        .with_context(|| format!("failed to create '{}'", out_path.display()))?;

    let total_frames = SAMPLE_RATE as usize * RENDER_SECONDS;
    let mut bus = vec![0.0f32; NUM_BUSSES * BLOCK];
    let mut frame_count = 0usize;
    let mut peak = 0.0f32;
    let mut max_reduction_db = 0.0f32;

    while frame_count < total_frames {
        bus.fill(0.0);
        for i in 0..BLOCK {
            let t = (frame_count + i) as f32 / SAMPLE_RATE as f32;
            // Two detuned tones with a slow swell so the loops get
            // something to chew on.
            let swell = (t / 2.0).min(1.0);
            bus[i] = (std::f32::consts::TAU * 220.0 * t).sin() * 4.0 * swell;
            bus[BLOCK + i] = (std::f32::consts::TAU * 331.0 * t).sin() * 4.0 * swell;
        }
        mixer.process(&mut bus, BLOCK);
        max_reduction_db = max_reduction_db.max(mixer.limiter().gain_reduction_db());

        let l_base = (out_left - 1) * BLOCK;
        let r_base = (out_right - 1) * BLOCK;
        for i in 0..BLOCK {
            let l = bus[l_base + i];
            let r = bus[r_base + i];
            peak = peak.max(l.abs()).max(r.abs());
            writer.write_sample(l)?;
            writer.write_sample(r)?;
        }
        frame_count += BLOCK;
    }
    writer.finalize().context("failed to finalize WAV")?;

    println!("Render summary for '{}':", out_path.display());
    println!("  frames rendered   : {frame_count}");
    println!("  output peak       : {peak:.3}");
    println!("  max gain reduction: {max_reduction_db:.2} dB");
    Ok(())
}
