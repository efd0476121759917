use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::interp;
use crate::{ProcessSpec, MAX_CHANNELS};

const GUARD_SAMPLES: f32 = 3.0;

/// Catmull-Rom fractional read over a self-managed masked ring.
///
/// The high-quality partner of the linear core: same single-tap topology,
/// four-point cubic read.
pub struct CubicCore {
    buffers: [Vec<f32>; MAX_CHANNELS],
    mask: usize,
    write_pos: [usize; MAX_CHANNELS],
    max_delay: f32,
}

impl CubicCore {
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

impl DelayCore for CubicCore {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        let size =
            (self.max_delay.ceil() as usize + GUARD_SAMPLES as usize + 4).next_power_of_two();
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
            let delay = (delay_ms * samples_per_ms).clamp(GUARD_SAMPLES, self.max_delay);
            let whole = delay as usize;
            let frac = delay - whole as f32;
            let wet = interp::catmull_rom(
                self.tap(channel, whole - 1),
                self.tap(channel, whole),
                self.tap(channel, whole + 1),
                self.tap(channel, whole + 2),
                frac,
            );

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

impl Default for CubicCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cores::test_util::{quiet_ctx, SAMPLE_RATE};
    use crate::tuning::FamilyTuning;

    #[test]
    fn test_impulse_lands_at_centre_delay() {
        let mut core = CubicCore::new();
        core.prepare(&ProcessSpec::default());

        let tuning = FamilyTuning::base();
        let lfo = vec![0.0; 1024];
        let mut block = vec![0.0; 1024];
        block[0] = 1.0;
        core.process(&quiet_ctx(&lfo, &tuning), 0, &mut block, 10.0);

        let expected = (10.0 * SAMPLE_RATE / 1_000.0) as usize;
        let peak = block
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak.abs_diff(expected) <= 1);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut core = CubicCore::new();
        core.prepare(&ProcessSpec::default());

        let tuning = FamilyTuning::base();
        let lfo = vec![0.0; 512];
        let mut left = vec![0.5; 512];
        core.process(&quiet_ctx(&lfo, &tuning), 0, &mut left, 5.0);

        // Nothing was ever written on the right channel.
        let mut right = vec![0.0; 512];
        core.process(&quiet_ctx(&lfo, &tuning), 1, &mut right, 5.0);
        assert!(right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_modulated_sweep_is_finite() {
        let mut core = CubicCore::new();
        core.prepare(&ProcessSpec::default());

        let tuning = FamilyTuning::base();
        let lfo: Vec<f32> = (0..512).map(|i| (i as f32 * 0.02).sin()).collect();
        let mut block: Vec<f32> = (0..512).map(|i| (i as f32 * 0.4).sin() * 0.8).collect();
        for _ in 0..50 {
            core.process(&quiet_ctx(&lfo, &tuning), 0, &mut block, 20.0);
        }
        assert!(block.iter().all(|s| s.is_finite()));
    }
}
