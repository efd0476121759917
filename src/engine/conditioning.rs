//! Input conditioning ahead of the delay cores.
//!
//! Two jobs: a fixed high-pass strips sub-bass that modulates poorly, and
//! an adaptive pre-emphasis lifts the top end when the input runs quiet.
//! The lift is inversely proportional to a tracked RMS level, so soft
//! material keeps enough high-frequency content for the modulation to stay
//! audible while loud material passes through nearly untouched.

use crate::dsp::one_pole::{self, OnePoleHighpass};
use crate::tuning::FamilyTuning;
use crate::MAX_CHANNELS;

pub struct InputConditioner {
    highpass: [OnePoleHighpass; MAX_CHANNELS],
    emphasis: [OnePoleHighpass; MAX_CHANNELS],
    /// Tracked mean square of the conditioned input, all channels pooled.
    mean_square: f32,
}

impl InputConditioner {
    pub fn new() -> Self {
        Self {
            highpass: [OnePoleHighpass::new(), OnePoleHighpass::new()],
            emphasis: [OnePoleHighpass::new(), OnePoleHighpass::new()],
            mean_square: 0.0,
        }
    }

    pub fn reset(&mut self) {
        for filter in self.highpass.iter_mut().chain(self.emphasis.iter_mut()) {
            filter.reset();
        }
        self.mean_square = 0.0;
    }

    /// Current tracked RMS level.
    pub fn rms(&self) -> f32 {
        self.mean_square.sqrt()
    }

    /// Condition one channel in place.
    pub fn process(
        &mut self,
        channel: usize,
        block: &mut [f32],
        tuning: &FamilyTuning,
        sample_rate: f32,
    ) {
        let channel = channel.min(MAX_CHANNELS - 1);
        self.highpass[channel].set_cutoff(tuning.input_hp_hz, sample_rate);
        self.emphasis[channel].set_cutoff(tuning.emphasis_hz, sample_rate);

        let rms_coeff =
            one_pole::smoothing_coeff(tuning.rms_time_ms.max(1.0) / 1_000.0, sample_rate);
        let reference = tuning.emphasis_rms_ref.max(1e-3);

        let highpass = &mut self.highpass[channel];
        let emphasis = &mut self.emphasis[channel];
        for sample in block.iter_mut() {
            let cleaned = highpass.process(*sample);
            self.mean_square += rms_coeff * (cleaned * cleaned - self.mean_square);

            let quietness = (1.0 - self.mean_square.sqrt() / reference).clamp(0.0, 1.0);
            let lift = tuning.emphasis_max * quietness;
            *sample = cleaned + lift * emphasis.process(cleaned);
        }
    }
}

impl Default for InputConditioner {
    fn default() -> Self {
        Self::new()
    }
}
