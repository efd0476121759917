//! Benchmarks for complete engine blocks.

use std::f32::consts::TAU;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use velvet_chorus::engine::ChorusEngine;
use velvet_chorus::ProcessSpec;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f64 = 48_000.0;

const FAMILY_NAMES: [&str; 5] = ["silk", "ensemble", "analog", "vintage", "dream"];

fn stereo_input(size: usize) -> (Vec<f32>, Vec<f32>) {
    let left: Vec<f32> = (0..size)
        .map(|i| (TAU * 440.0 * i as f32 / SAMPLE_RATE as f32).sin() * 0.5)
        .collect();
    let right: Vec<f32> = (0..size)
        .map(|i| (TAU * 441.0 * i as f32 / SAMPLE_RATE as f32).sin() * 0.5)
        .collect();
    (left, right)
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let (input_l, input_r) = stereo_input(size);
        let mut left = input_l.clone();
        let mut right = input_r.clone();

        // === SETTLED BLOCK, EVERY FAMILY ===
        // The steady-state cost a host pays per callback.
        for (family, name) in FAMILY_NAMES.iter().enumerate() {
            let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, size, 2));
            handle.set_family(family);
            handle.set_mix(0.7);
            // Let the core switch and the smoothers settle first.
            for _ in 0..40 {
                left.copy_from_slice(&input_l);
                right.copy_from_slice(&input_r);
                let mut io: [&mut [f32]; 2] = [&mut left, &mut right];
                engine.process(&mut io);
            }

            group.bench_with_input(
                BenchmarkId::new(format!("stable_{}", name), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        left.copy_from_slice(&input_l);
                        right.copy_from_slice(&input_r);
                        let mut io: [&mut [f32]; 2] = [&mut left, &mut right];
                        engine.process(black_box(&mut io));
                    })
                },
            );
        }

        // === SWITCH IN FLIGHT ===
        // Worst case: a transition keeps two cores processing at once.
        let (mut engine, handle) = ChorusEngine::new(ProcessSpec::new(SAMPLE_RATE, size, 2));
        handle.set_mix(0.7);
        let mut flip = false;
        group.bench_with_input(BenchmarkId::new("switching", size), &size, |b, _| {
            b.iter(|| {
                flip = !flip;
                handle.set_family(if flip { 2 } else { 0 });
                left.copy_from_slice(&input_l);
                right.copy_from_slice(&input_r);
                let mut io: [&mut [f32]; 2] = [&mut left, &mut right];
                engine.process(black_box(&mut io));
            })
        });
    }

    group.finish();
}
