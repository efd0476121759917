//! Benchmarks for fractional delay-line reads.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use velvet_chorus::dsp::delay_line::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_interpolators(c: &mut Criterion) {
    let mut group = c.benchmark_group("cores/interpolators");

    let mut line = DelayLine::new();
    line.prepare(4_096);
    for i in 0..4_096 {
        line.write((i as f32 * 0.1).sin());
    }

    for &size in BLOCK_SIZES {
        // Modulated read positions, chorus-like: a centre tap swaying by
        // one millisecond at 48 kHz.
        let delays: Vec<f32> = (0..size)
            .map(|i| 480.0 + (i as f32 * 0.01).sin() * 48.0)
            .collect();

        group.bench_with_input(BenchmarkId::new("linear", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &delay in &delays {
                    sum += line.read_linear(black_box(delay));
                }
                sum
            })
        });

        group.bench_with_input(BenchmarkId::new("catmull_rom", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &delay in &delays {
                    sum += line.read_catmull_rom(black_box(delay));
                }
                sum
            })
        });

        group.bench_with_input(BenchmarkId::new("hermite", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &delay in &delays {
                    sum += line.read_hermite(black_box(delay), 0.25);
                }
                sum
            })
        });

        group.bench_with_input(BenchmarkId::new("lagrange3", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &delay in &delays {
                    sum += line.read_lagrange3(black_box(delay));
                }
                sum
            })
        });

        group.bench_with_input(BenchmarkId::new("lagrange5", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &delay in &delays {
                    sum += line.read_lagrange5(black_box(delay));
                }
                sum
            })
        });
    }

    group.finish();
}
