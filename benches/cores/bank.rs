//! Benchmarks for the ten delay cores, one channel at a time.

use std::f32::consts::TAU;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use velvet_chorus::cores::{CoreBank, CoreCtx, CoreKind};
use velvet_chorus::tuning::FamilyTuning;
use velvet_chorus::ProcessSpec;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_core_bank(c: &mut Criterion) {
    let mut group = c.benchmark_group("cores/bank");

    let mut bank = CoreBank::new();
    bank.prepare(&ProcessSpec::new(SAMPLE_RATE as f64, 512, 2));

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (TAU * 440.0 * i as f32 / SAMPLE_RATE).sin() * 0.5)
            .collect();
        // One cycle of slow modulation across the block, depth-scaled the
        // way the engine hands it to a core.
        let lfo: Vec<f32> = (0..size)
            .map(|i| (TAU * i as f32 / size as f32).sin() * 0.5)
            .collect();

        let mut buffer = input.clone();
        for kind in CoreKind::ALL {
            let (family, high_quality) = kind.selection();
            let tuning = FamilyTuning::defaults_for(family, high_quality);
            let ctx = CoreCtx {
                sample_rate: SAMPLE_RATE,
                lfo: [&lfo, &lfo],
                lfo_phase: 0.0,
                lfo_phase_inc: TAU * 0.5 / SAMPLE_RATE,
                phase_offset: 0.0,
                depth: 0.5,
                color: 0.5,
                tuning: &tuning,
            };

            let core = bank.get_mut(kind);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", kind), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        core.process(black_box(&ctx), 0, black_box(&mut buffer), 15.0);
                    })
                },
            );
        }
    }

    group.finish();
}
