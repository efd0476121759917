//! Polyphase windowed-sinc FIR fractional read.
//!
//! A 1024-phase table of 32-tap Blackman-windowed sinc kernels, built once
//! at prepare time. Each read picks the two rows bracketing the fractional
//! position and blends them, so the effective kernel moves continuously as
//! the delay sweeps. The delay itself runs through a one-pole smoother
//! because a kernel this sharp makes stepped delay audible as zipper noise.

use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::one_pole;
use crate::{ProcessSpec, MAX_CHANNELS};

const PHASES: usize = 1_024;
const TAPS: usize = 32;
const HALF_SPAN: usize = 15;
const GUARD_SAMPLES: f32 = 18.0;

pub struct WindowedSincFirCore {
    /// `(PHASES + 1) * TAPS` kernel weights, row-major by phase. The extra
    /// row holds the frac = 1.0 kernel so row blending never wraps.
    table: Vec<f32>,
    buffers: [Vec<f32>; MAX_CHANNELS],
    mask: usize,
    write_pos: [usize; MAX_CHANNELS],
    smoothed_delay: [f32; MAX_CHANNELS],
    primed: [bool; MAX_CHANNELS],
    max_delay: f32,
}

impl WindowedSincFirCore {
    pub fn new() -> Self {
        Self {
            table: Vec::new(),
            buffers: [Vec::new(), Vec::new()],
            mask: 0,
            write_pos: [0; MAX_CHANNELS],
            smoothed_delay: [0.0; MAX_CHANNELS],
            primed: [false; MAX_CHANNELS],
            max_delay: 0.0,
        }
    }

    #[inline]
    fn tap(&self, channel: usize, delay: usize) -> f32 {
        self.buffers[channel][self.write_pos[channel].wrapping_sub(delay) & self.mask]
    }

    fn build_table() -> Vec<f32> {
        let mut table = vec![0.0f32; (PHASES + 1) * TAPS];
        for phase in 0..=PHASES {
            let frac = phase as f32 / PHASES as f32;
            let row = &mut table[phase * TAPS..(phase + 1) * TAPS];
            let mut sum = 0.0f32;
            for (k, weight) in row.iter_mut().enumerate() {
                let x = k as f32 - HALF_SPAN as f32 - frac;
                let sinc = if x.abs() < 1e-6 {
                    1.0
                } else {
                    let px = std::f32::consts::PI * x;
                    px.sin() / px
                };
                // Blackman window over the +-16 sample span.
                let u = (x + (HALF_SPAN + 1) as f32) / TAPS as f32;
                let window = 0.42 - 0.5 * (std::f32::consts::TAU * u).cos()
                    + 0.08 * (2.0 * std::f32::consts::TAU * u).cos();
                *weight = sinc * window.max(0.0);
                sum += *weight;
            }
            // Normalize each row to unity DC gain so the sweep never pumps.
            for weight in row.iter_mut() {
                *weight /= sum;
            }
        }
        table
    }

    #[inline]
    fn read(&self, channel: usize, delay: f32) -> f32 {
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let position = frac * PHASES as f32;
        let row = position as usize;
        let blend = position - row as f32;

        let row_a = &self.table[row * TAPS..(row + 1) * TAPS];
        let row_b = &self.table[(row + 1) * TAPS..(row + 2) * TAPS];
        let mut acc = 0.0f32;
        for k in 0..TAPS {
            let weight = row_a[k] + (row_b[k] - row_a[k]) * blend;
            acc += weight * self.tap(channel, whole + k - HALF_SPAN);
        }
        acc
    }
}

impl DelayCore for WindowedSincFirCore {
    fn prepare(&mut self, spec: &ProcessSpec) {
        if self.table.is_empty() {
            self.table = Self::build_table();
        }
        self.max_delay = worst_case_delay_samples(spec);
        let size =
            (self.max_delay.ceil() as usize + GUARD_SAMPLES as usize + TAPS).next_power_of_two();
        for buffer in &mut self.buffers {
            if buffer.len() != size {
                *buffer = vec![0.0; size];
            } else {
                buffer.fill(0.0);
            }
        }
        self.mask = size - 1;
        self.write_pos = [0; MAX_CHANNELS];
        self.primed = [false; MAX_CHANNELS];
    }

    fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
        self.write_pos = [0; MAX_CHANNELS];
        self.primed = [false; MAX_CHANNELS];
    }

    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32) {
        let channel = channel.min(MAX_CHANNELS - 1);
        let lfo = ctx.lfo[channel];
        let samples_per_ms = ctx.sample_rate / 1_000.0;
        let depth_ms = ctx.mod_depth_ms();
        let smooth = one_pole::smoothing_coeff(
            ctx.tuning.sinc_smooth_ms.max(0.1) / 1_000.0,
            ctx.sample_rate,
        );

        for (lfo_value, sample) in lfo.iter().zip(block.iter_mut()) {
            let delay_ms = centre_delay_ms + lfo_value * depth_ms;
            let target = (delay_ms * samples_per_ms).clamp(GUARD_SAMPLES, self.max_delay);
            if !self.primed[channel] {
                self.smoothed_delay[channel] = target;
                self.primed[channel] = true;
            }
            self.smoothed_delay[channel] += smooth * (target - self.smoothed_delay[channel]);
            let delay = self.smoothed_delay[channel].clamp(GUARD_SAMPLES, self.max_delay);

            let wet = self.read(channel, delay);
            self.buffers[channel][self.write_pos[channel]] = *sample;
            self.write_pos[channel] = (self.write_pos[channel] + 1) & self.mask;
            *sample = wet;
        }
    }

    fn guard_samples(&self) -> f32 {
        GUARD_SAMPLES
    }

    fn max_delay_samples(&self) -> f32 {
        self.max_delay
    }
}

impl Default for WindowedSincFirCore {
    fn default() -> Self {
        Self::new()
    }
}
