//! End-to-end regression tests running the whole engine through its public
//! API, the way a host would.

use std::f32::consts::TAU;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use velvet_chorus::cores::CoreKind;
use velvet_chorus::engine::ChorusEngine;
use velvet_chorus::ProcessSpec;

const SAMPLE_RATE: f64 = 48_000.0;
const BLOCK: usize = 512;

fn sine(freq: f32, amplitude: f32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|n| (TAU * freq * n as f32 / SAMPLE_RATE as f32).sin() * amplitude)
        .collect()
}

fn process_stereo(engine: &mut ChorusEngine, left: &mut [f32], right: &mut [f32]) {
    let mut io: [&mut [f32]; 2] = [left, right];
    engine.process(&mut io);
}

/// Magnitude spectrum of a Hann-windowed slice.
fn spectrum(block: &[f32]) -> Vec<f32> {
    let n = block.len();
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer: Vec<Complex<f32>> = block
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let window = 0.5 - 0.5 * (TAU * i as f32 / n as f32).cos();
            Complex::new(s * window, 0.0)
        })
        .collect();
    fft.process(&mut buffer);
    buffer[..n / 2].iter().map(|c| c.norm()).collect()
}

#[test]
fn silence_in_is_silence_out_for_every_family() {
    for family in 0..5 {
        for hq in [false, true] {
            let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, BLOCK, 2));
            handle.set_family(family);
            handle.set_high_quality(hq);
            engine.reset();

            let mut left = vec![0.0f32; 48_000];
            let mut right = vec![0.0f32; 48_000];
            process_stereo(&mut engine, &mut left, &mut right);
            assert!(
                left.iter().chain(right.iter()).all(|s| s.abs() < 1e-6),
                "family {} hq {} leaked signal from silence",
                family,
                hq
            );
        }
    }
}

#[test]
fn single_sample_blocks_stay_finite() {
    let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, 1, 2));
    handle.set_family(4);
    let source = sine(330.0, 0.5, 2_000);
    for &sample in source.iter() {
        let mut left = [sample];
        let mut right = [sample];
        process_stereo(&mut engine, &mut left, &mut right);
        assert!(left[0].is_finite() && right[0].is_finite());
    }
}

#[test]
fn reset_reproduces_identical_output() {
    let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, BLOCK, 2));
    handle.set_depth(0.7);
    handle.set_family(2);

    let render = |engine: &mut ChorusEngine| -> Vec<f32> {
        engine.reset();
        let mut left = sine(440.0, 0.5, 24_000);
        let mut right = sine(440.0, 0.5, 24_000);
        process_stereo(engine, &mut left, &mut right);
        left
    };

    let first = render(&mut engine);
    let second = render(&mut engine);
    assert_eq!(first, second);
}

#[test]
fn zero_depth_full_wet_is_a_delay_at_the_centre() {
    for (family, hq) in [(0, false), (3, false), (3, true)] {
        let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, BLOCK, 2));
        handle.set_family(family);
        handle.set_high_quality(hq);
        handle.set_mix(1.0);
        handle.set_depth(0.0);
        handle.set_width(1.0);
        handle.set_centre_delay_ms(10.0);
        engine.reset();

        let mut left = vec![0.0f32; 4_096];
        let mut right = vec![0.0f32; 4_096];
        left[0] = 1.0;
        right[0] = 1.0;
        process_stereo(&mut engine, &mut left, &mut right);

        let peak = left
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(n, _)| n)
            .unwrap();
        assert!(
            (peak as isize - 480).unsigned_abs() <= 1,
            "family {} hq {} peaked at {} instead of 480",
            family,
            hq,
            peak
        );
    }
}

#[test]
fn cycling_families_mid_stream_stays_bounded() {
    let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, BLOCK, 2));
    handle.set_mix(0.8);
    handle.set_depth(0.6);

    let tour: [(usize, bool); 10] = [
        (0, false),
        (1, false),
        (2, false),
        (3, false),
        (4, false),
        (0, true),
        (1, true),
        (2, true),
        (3, true),
        (4, true),
    ];
    for (family, hq) in tour {
        handle.set_family(family);
        handle.set_high_quality(hq);
        // Half a second per stop, longer than warm-up plus fade.
        for _ in 0..47 {
            let mut left = sine(523.25, 0.5, BLOCK);
            let mut right = sine(523.25, 0.5, BLOCK);
            process_stereo(&mut engine, &mut left, &mut right);
            for s in left.iter().chain(right.iter()) {
                assert!(s.is_finite());
                assert!(s.abs() < 2.0, "family {} hq {} hit {}", family, hq, s);
            }
        }
        assert_eq!(engine.active_core(), CoreKind::from_selection(family, hq));
    }
}

#[test]
fn analog_family_keeps_a_sine_centred_on_its_frequency() {
    let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, BLOCK, 2));
    handle.set_family(2);
    handle.set_rate_hz(0.5);
    handle.set_depth(0.5);
    handle.set_mix(0.5);
    engine.reset();

    let frames = 48_000 * 10;
    let mut left = sine(1_000.0, 0.5, frames);
    let mut right = sine(1_000.0, 0.5, frames);
    process_stereo(&mut engine, &mut left, &mut right);

    assert!(left.iter().chain(right.iter()).all(|s| s.is_finite()));
    assert!(left.iter().chain(right.iter()).all(|s| s.abs() < 1.5));

    // Spectrum of a late window, once every smoother has settled. The
    // modulation spreads sidebands around the carrier, but the output must
    // stay concentrated near 1 kHz.
    let window = 16_384;
    let magnitudes = spectrum(&left[frames - window..]);
    let bin_hz = SAMPLE_RATE as f32 / window as f32;

    let peak_bin = magnitudes
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(n, _)| n)
        .unwrap();
    let peak_hz = peak_bin as f32 * bin_hz;
    assert!(
        (peak_hz - 1_000.0).abs() < 30.0,
        "spectral peak drifted to {} Hz",
        peak_hz
    );

    let total: f32 = magnitudes.iter().skip(1).map(|m| m * m).sum();
    let band: f32 = magnitudes
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(n, _)| {
            let hz = *n as f32 * bin_hz;
            (900.0..=1_100.0).contains(&hz)
        })
        .map(|(_, m)| m * m)
        .sum();
    assert!(
        band > total * 0.6,
        "only {}% of energy near the carrier",
        (band / total * 100.0) as u32
    );
}

#[test]
fn mono_and_stereo_agree_on_the_left_channel_shape() {
    let run_mono = || -> Vec<f32> {
        let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, BLOCK, 1));
        handle.set_offset_degrees(0.0);
        handle.set_width(1.0);
        engine.reset();
        let mut mono = sine(440.0, 0.4, 8_192);
        let mut io: [&mut [f32]; 1] = [&mut mono];
        engine.process(&mut io);
        mono
    };

    let mono = run_mono();
    assert!(mono.iter().all(|s| s.is_finite()));
    // The effect must audibly engage, not pass the input through.
    let input = sine(440.0, 0.4, 8_192);
    let diff: f32 = mono
        .iter()
        .zip(input.iter())
        .map(|(a, b)| (a - b).abs())
        .sum();
    assert!(diff > 1.0, "mono path appears to bypass the effect");
}
