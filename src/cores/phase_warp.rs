//! Nonlinearly warped LFO phase driving a cubic read tap.
//!
//! The controller's phase is bent through `phi + a*sin(k*phi + b*sin(phi))`
//! before it reaches the sine, so the sweep lingers near the turnaround
//! points and snaps through the middle. Color pushes both the warp amount
//! and its inner feedback, morphing a plain triangle-ish sweep into a
//! lopsided, vocal one.

use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::{one_pole, DelayLine};
use crate::{ProcessSpec, MAX_CHANNELS};

const GUARD_SAMPLES: f32 = 3.0;

pub struct PhaseWarpedCore {
    lines: [DelayLine; MAX_CHANNELS],
    smoothed_delay: [f32; MAX_CHANNELS],
    primed: [bool; MAX_CHANNELS],
    max_delay: f32,
}

impl PhaseWarpedCore {
    pub fn new() -> Self {
        Self {
            lines: [DelayLine::new(), DelayLine::new()],
            smoothed_delay: [0.0; MAX_CHANNELS],
            primed: [false; MAX_CHANNELS],
            max_delay: 0.0,
        }
    }
}

impl DelayCore for PhaseWarpedCore {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        let min_size = self.max_delay.ceil() as usize + GUARD_SAMPLES as usize + 4;
        for line in &mut self.lines {
            line.prepare(min_size);
        }
        self.smoothed_delay = [0.0; MAX_CHANNELS];
        self.primed = [false; MAX_CHANNELS];
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.smoothed_delay = [0.0; MAX_CHANNELS];
        self.primed = [false; MAX_CHANNELS];
    }

    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32) {
        let channel = channel.min(MAX_CHANNELS - 1);
        let line = &mut self.lines[channel];
        let samples_per_ms = ctx.sample_rate / 1_000.0;
        let depth_ms = ctx.depth * ctx.mod_depth_ms();
        let tuning = ctx.tuning;

        let amount = tuning.warp_amount * (0.2 + 0.8 * ctx.color);
        let feedback = tuning.warp_feedback * ctx.color;
        let ratio = tuning.warp_ratio;
        let smooth = one_pole::smoothing_coeff(
            tuning.delay_smooth_ms.max(0.1) / 1_000.0,
            ctx.sample_rate,
        );

        let mut phase = ctx.lfo_phase + ctx.channel_phase(channel);
        for sample in block.iter_mut() {
            let warped = phase + amount * (ratio * phase + feedback * phase.sin()).sin();
            let delay_ms = centre_delay_ms + warped.sin() * depth_ms;
            let target = (delay_ms * samples_per_ms).clamp(GUARD_SAMPLES, self.max_delay);
            if !self.primed[channel] {
                self.smoothed_delay[channel] = target;
                self.primed[channel] = true;
            }
            self.smoothed_delay[channel] += smooth * (target - self.smoothed_delay[channel]);
            let delay = self.smoothed_delay[channel].clamp(GUARD_SAMPLES, self.max_delay);

            let wet = line.read_catmull_rom(delay);
            line.write(*sample);
            *sample = wet;

            phase += ctx.lfo_phase_inc;
        }
    }

    fn guard_samples(&self) -> f32 {
        GUARD_SAMPLES
    }

    fn max_delay_samples(&self) -> f32 {
        self.max_delay
    }
}

impl Default for PhaseWarpedCore {
    fn default() -> Self {
        Self::new()
    }
}
