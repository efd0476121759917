use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::DelayLine;
use crate::{ProcessSpec, MAX_CHANNELS};

const GUARD_SAMPLES: f32 = 2.0;

/// The cheapest core: one linear-interpolated tap per channel.
pub struct LinearCore {
    lines: [DelayLine; MAX_CHANNELS],
    max_delay: f32,
}

impl LinearCore {
    pub fn new() -> Self {
        Self {
            lines: [DelayLine::new(), DelayLine::new()],
            max_delay: 0.0,
        }
    }
}

impl DelayCore for LinearCore {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        let min_size = self.max_delay.ceil() as usize + GUARD_SAMPLES as usize + 4;
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
            let delay = (delay_ms * samples_per_ms).clamp(GUARD_SAMPLES, self.max_delay);
            let wet = line.read_linear(delay);
            line.write(*sample);
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

impl Default for LinearCore {
    fn default() -> Self {
        Self::new()
    }
}
