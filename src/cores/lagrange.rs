//! Lagrange fractional-delay cores.
//!
//! Same read/modulate/write loop as the linear core, with maximally flat
//! polynomial kernels. The 3rd-order variant spans four samples, the
//! 5th-order six; both keep the top octave noticeably cleaner than linear
//! interpolation while the delay sweeps.

use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::DelayLine;
use crate::{ProcessSpec, MAX_CHANNELS};

pub struct Lagrange3Core {
    lines: [DelayLine; MAX_CHANNELS],
    max_delay: f32,
}

impl Lagrange3Core {
    const GUARD: f32 = 3.0;

    pub fn new() -> Self {
        Self {
            lines: [DelayLine::new(), DelayLine::new()],
            max_delay: 0.0,
        }
    }
}

impl DelayCore for Lagrange3Core {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        let min_size = self.max_delay.ceil() as usize + Self::GUARD as usize + 4;
        for line in &mut self.lines {
            line.prepare(min_size);
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }

    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32) {
        let channel = channel.min(MAX_CHANNELS - 1);
        let line = &mut self.lines[channel];
        let lfo = ctx.lfo[channel];
        let samples_per_ms = ctx.sample_rate / 1_000.0;
        let depth_ms = ctx.mod_depth_ms();

        for (lfo_value, sample) in lfo.iter().zip(block.iter_mut()) {
            let delay_ms = centre_delay_ms + lfo_value * depth_ms;
            let delay = (delay_ms * samples_per_ms).clamp(Self::GUARD, self.max_delay);
            let wet = line.read_lagrange3(delay);
            line.write(*sample);
            *sample = wet;
        }
    }

    fn guard_samples(&self) -> f32 {
        Self::GUARD
    }

    fn max_delay_samples(&self) -> f32 {
        self.max_delay
    }
}

impl Default for Lagrange3Core {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Lagrange5Core {
    // Managed inline rather than through the delay-line primitive so the
    // six-tap gather stays in one place with its own wraparound mask.
    buffers: [Vec<f32>; MAX_CHANNELS],
    mask: usize,
    write_pos: [usize; MAX_CHANNELS],
    max_delay: f32,
}

impl Lagrange5Core {
    const GUARD: f32 = 4.0;

    pub fn new() -> Self {
        Self {
            buffers: [Vec::new(), Vec::new()],
            mask: 0,
            write_pos: [0; MAX_CHANNELS],
            max_delay: 0.0,
        }
    }

    #[inline]
    fn tap(&self, channel: usize, delay: usize) -> f32 {
        self.buffers[channel][self.write_pos[channel].wrapping_sub(delay) & self.mask]
    }
}

impl DelayCore for Lagrange5Core {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        let size = (self.max_delay.ceil() as usize + Self::GUARD as usize + 6).next_power_of_two();
        for buffer in &mut self.buffers {
            if buffer.len() != size {
                *buffer = vec![0.0; size];
            } else {
                buffer.fill(0.0);
            }
        }
        self.mask = size - 1;
        self.write_pos = [0; MAX_CHANNELS];
    }

    fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
        self.write_pos = [0; MAX_CHANNELS];
    }

    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32) {
        let channel = channel.min(MAX_CHANNELS - 1);
        let lfo = ctx.lfo[channel];
        let samples_per_ms = ctx.sample_rate / 1_000.0;
        let depth_ms = ctx.mod_depth_ms();

        for (lfo_value, sample) in lfo.iter().zip(block.iter_mut()) {
            let delay_ms = centre_delay_ms + lfo_value * depth_ms;
            let delay = (delay_ms * samples_per_ms).clamp(Self::GUARD, self.max_delay);
            let whole = delay as usize;
            let frac = delay - whole as f32;
            let window = [
                self.tap(channel, whole - 2),
                self.tap(channel, whole - 1),
                self.tap(channel, whole),
                self.tap(channel, whole + 1),
                self.tap(channel, whole + 2),
                self.tap(channel, whole + 3),
            ];
            let wet = crate::dsp::interp::lagrange5(&window, frac);

            self.buffers[channel][self.write_pos[channel]] = *sample;
            self.write_pos[channel] = (self.write_pos[channel] + 1) & self.mask;
            *sample = wet;
        }
    }

    fn guard_samples(&self) -> f32 {
        Self::GUARD
    }

    fn max_delay_samples(&self) -> f32 {
        self.max_delay
    }
}

impl Default for Lagrange5Core {
    fn default() -> Self {
        Self::new()
    }
}
