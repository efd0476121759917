use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::DelayLine;
use crate::{ProcessSpec, MAX_CHANNELS};

const GUARD_SAMPLES: f32 = 2.0;

/// Twin linear taps over two parallel lines per channel.
///
/// Tap A follows the main LFO as usual; tap B sits slightly long of the
/// centre and moves against the LFO with its own depth. Color widens the
/// detune, deepens tap B's counter-motion, and raises its share of the mix,
/// so the control sweeps from a single voice to a dense two-voice ensemble.
/// Both lines take the same write every step, so the taps always agree on
/// input history.
pub struct LinearEnsembleCore {
    lines_a: [DelayLine; MAX_CHANNELS],
    lines_b: [DelayLine; MAX_CHANNELS],
    max_delay: f32,
}

impl LinearEnsembleCore {
    pub fn new() -> Self {
        Self {
            lines_a: [DelayLine::new(), DelayLine::new()],
            lines_b: [DelayLine::new(), DelayLine::new()],
            max_delay: 0.0,
        }
    }
}

impl DelayCore for LinearEnsembleCore {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        let min_size = self.max_delay.ceil() as usize + GUARD_SAMPLES as usize + 4;
        for line in self.lines_a.iter_mut().chain(self.lines_b.iter_mut()) {
            line.prepare(min_size);
        }
    }

    fn reset(&mut self) {
        for line in self.lines_a.iter_mut().chain(self.lines_b.iter_mut()) {
            line.reset();
        }
    }

    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32) {
        let channel = channel.min(MAX_CHANNELS - 1);
        let line_a = &mut self.lines_a[channel];
        let line_b = &mut self.lines_b[channel];
        let lfo = ctx.lfo[channel];
        let samples_per_ms = ctx.sample_rate / 1_000.0;
        let depth_ms = ctx.mod_depth_ms();

        let tuning = ctx.tuning;
        let spread = tuning.ensemble_detune * (0.25 + 0.75 * ctx.color);
        let b_depth = tuning.ensemble_depth_scale * (0.4 + 0.6 * ctx.color);
        let b_mix = (tuning.ensemble_blend_max * ctx.color).clamp(0.0, 0.5);

        for (lfo_value, sample) in lfo.iter().zip(block.iter_mut()) {
            let delay_a_ms = centre_delay_ms + lfo_value * depth_ms;
            let delay_b_ms = centre_delay_ms * (1.0 + spread) - lfo_value * depth_ms * b_depth;

            let delay_a =
                (delay_a_ms * samples_per_ms).clamp(GUARD_SAMPLES, self.max_delay);
            let delay_b =
                (delay_b_ms * samples_per_ms).clamp(GUARD_SAMPLES, self.max_delay);

            let tap_a = line_a.read_linear(delay_a);
            let tap_b = line_b.read_linear(delay_b);
            line_a.write(*sample);
            line_b.write(*sample);
            *sample = (1.0 - b_mix) * tap_a + b_mix * tap_b;
        }
    }

    fn guard_samples(&self) -> f32 {
        GUARD_SAMPLES
    }

    fn max_delay_samples(&self) -> f32 {
        self.max_delay
    }
}

impl Default for LinearEnsembleCore {
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
    fn test_impulse_produces_two_taps() {
        let mut core = LinearEnsembleCore::new();
        core.prepare(&ProcessSpec::default());

        let tuning = FamilyTuning::base();
        let lfo = vec![0.0; 2048];
        let mut block = vec![0.0; 2048];
        block[0] = 1.0;
        let mut ctx = quiet_ctx(&lfo, &tuning);
        ctx.color = 1.0;
        core.process(&ctx, 0, &mut block, 20.0);

        // Count distinct arrivals above a small floor. Full color separates
        // the detuned tap far enough from the main one to resolve both.
        let hits = block.iter().filter(|s| s.abs() > 0.05).count();
        assert!(hits >= 2, "expected both taps to land, saw {} hits", hits);
    }

    #[test]
    fn test_zero_color_collapses_to_single_voice() {
        let mut core = LinearEnsembleCore::new();
        core.prepare(&ProcessSpec::default());

        let tuning = FamilyTuning::base();
        let lfo = vec![0.0; 1024];
        let mut block = vec![0.0; 1024];
        block[0] = 1.0;
        let mut ctx = quiet_ctx(&lfo, &tuning);
        ctx.color = 0.0;
        core.process(&ctx, 0, &mut block, 10.0);

        // With b_mix at zero the second tap contributes nothing.
        let expected = (10.0 * SAMPLE_RATE / 1_000.0) as usize;
        let peak = block
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak.abs_diff(expected) <= 1);
        assert!((block[peak] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_blend_preserves_overall_level() {
        let mut core = LinearEnsembleCore::new();
        core.prepare(&ProcessSpec::default());

        let tuning = FamilyTuning::base();
        let lfo = vec![0.0; 4096];
        let mut block: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.21).sin() * 0.5).collect();
        let input_rms: f32 =
            (block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32).sqrt();

        let mut ctx = quiet_ctx(&lfo, &tuning);
        ctx.color = 0.8;
        core.process(&ctx, 0, &mut block, 15.0);

        let tail = &block[1024..];
        let output_rms: f32 =
            (tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32).sqrt();
        assert!(
            (output_rms - input_rms).abs() / input_rms < 0.35,
            "level drifted: in {} out {}",
            input_rms,
            output_rms
        );
    }
}
