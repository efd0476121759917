//! velvet - chorus engine demo
//!
//! Run with: cargo run
//!
//! Plays a plucked arpeggio through the chorus and tours every family and
//! quality tier, a few seconds each, so the character differences are easy
//! to hear. Parameter changes travel over a lock-free queue; the audio
//! callback owns the engine outright.

use std::sync::mpsc;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use velvet_chorus::engine::{ChorusEngine, ControlMessage};
use velvet_chorus::ProcessSpec;

const FAMILY_NAMES: [&str; 5] = ["silk", "ensemble", "analog", "vintage", "dream"];
const SECONDS_PER_STOP: u64 = 4;

/// Plucked sine arpeggio used as the dry source.
struct Pluck {
    phase: f32,
    env: f32,
    note: usize,
    countdown: usize,
    sample_rate: f32,
}

impl Pluck {
    const NOTES: [f32; 4] = [220.0, 277.18, 329.63, 440.0];

    fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            env: 0.0,
            note: 0,
            countdown: 0,
            sample_rate,
        }
    }

    fn fill(&mut self, block: &mut [f32]) {
        let decay = (-6.0 / (0.4 * self.sample_rate)).exp();
        let retrigger = (self.sample_rate * 0.5) as usize;
        for sample in block.iter_mut() {
            if self.countdown == 0 {
                self.countdown = retrigger;
                self.env = 0.8;
                self.phase = 0.0;
                self.note = (self.note + 1) % Self::NOTES.len();
            }
            self.countdown -= 1;

            let freq = Self::NOTES[self.note];
            self.phase = (self.phase + freq / self.sample_rate).fract();
            *sample = (std::f32::consts::TAU * self.phase).sin() * self.env;
            self.env *= decay;
        }
    }
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f64;
    let channels = config.channels() as usize;
    let block = 512;

    let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(sample_rate, block, 2));
    handle.set_mix(0.6);
    handle.set_depth(0.6);
    handle.set_rate_hz(0.4);

    let (mut tx, mut rx) = rtrb::RingBuffer::<ControlMessage>::new(64);

    println!("=== velvet ===");
    println!("Sample rate: {} Hz", sample_rate);
    println!("Channels: {}", channels);
    println!();

    let mut pluck = Pluck::new(sample_rate as f32);
    let mut left = vec![0.0f32; block];
    let mut right = vec![0.0f32; block];

    // cpal errors surface on its own thread; forward them to main.
    let (err_tx, err_rx) = mpsc::channel();

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            engine.drain_messages(&mut rx);

            let total_frames = data.len() / channels.max(1);
            let mut frames_written = 0;
            while frames_written < total_frames {
                let len = (total_frames - frames_written).min(block);

                pluck.fill(&mut left[..len]);
                right[..len].copy_from_slice(&left[..len]);
                {
                    let mut io: [&mut [f32]; 2] = [&mut left[..len], &mut right[..len]];
                    engine.process(&mut io);
                }

                let out_off = frames_written * channels;
                for i in 0..len {
                    for ch in 0..channels {
                        let source = if ch == 1 { right[i] } else { left[i] };
                        data[out_off + i * channels + ch] = source;
                    }
                }
                frames_written += len;
            }
        },
        move |err| {
            let _ = err_tx.send(err);
        },
        None,
    )?;
    stream.play()?;

    println!("Touring all five families at both quality tiers.");
    println!("Press Ctrl+C to stop.");
    println!();

    loop {
        for hq in [false, true] {
            for (family, name) in FAMILY_NAMES.iter().enumerate() {
                println!(
                    "  family: {:8}  quality: {}",
                    name,
                    if hq { "high" } else { "standard" }
                );
                let _ = tx.push(ControlMessage::SetFamily(family));
                let _ = tx.push(ControlMessage::SetHighQuality(hq));

                for _ in 0..SECONDS_PER_STOP * 10 {
                    if let Ok(err) = err_rx.try_recv() {
                        return Err(eyre!("audio stream error: {err}"));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    }
}
