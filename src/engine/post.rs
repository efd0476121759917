//! Wet-path character shaping and the output stage.
//!
//! Three of the five families color their wet signal after the core: Silk
//! gets a presence lift ("focus"), Ensemble gets a low-mid thickener
//! ("bloom"), and Vintage treats the color control as post-chorus drive.
//! The output stage is family-agnostic: a mid/side width rebalance and a
//! soft-knee-less feed-forward compressor keep the summed result polite.

use crate::dsp::one_pole::{self, OnePoleHighpass, OnePoleLowpass};
use crate::dsp::saturate;
use crate::tuning::FamilyTuning;
use crate::MAX_CHANNELS;

/// Families with a dedicated wet treatment.
const FAMILY_SILK: usize = 0;
const FAMILY_ENSEMBLE: usize = 1;
const FAMILY_VINTAGE: usize = 3;

pub struct WetPost {
    bloom: [OnePoleLowpass; MAX_CHANNELS],
    focus: [OnePoleHighpass; MAX_CHANNELS],
}

impl WetPost {
    pub fn new() -> Self {
        Self {
            bloom: [OnePoleLowpass::new(), OnePoleLowpass::new()],
            focus: [OnePoleHighpass::new(), OnePoleHighpass::new()],
        }
    }

    pub fn reset(&mut self) {
        for filter in self.bloom.iter_mut() {
            filter.reset();
        }
        for filter in self.focus.iter_mut() {
            filter.reset();
        }
    }

    /// Shape one wet channel in place according to the family character.
    pub fn process(
        &mut self,
        channel: usize,
        block: &mut [f32],
        family: usize,
        color: f32,
        tuning: &FamilyTuning,
        sample_rate: f32,
    ) {
        let channel = channel.min(MAX_CHANNELS - 1);
        match family {
            FAMILY_SILK => {
                let filter = &mut self.focus[channel];
                filter.set_cutoff(tuning.focus_hz, sample_rate);
                let amount = tuning.focus_amount * (0.5 + 0.5 * color);
                for sample in block.iter_mut() {
                    *sample += amount * filter.process(*sample);
                }
            }
            FAMILY_ENSEMBLE => {
                let filter = &mut self.bloom[channel];
                filter.set_cutoff(tuning.bloom_hz, sample_rate);
                let amount = tuning.bloom_amount * (0.5 + 0.5 * color);
                for sample in block.iter_mut() {
                    *sample += amount * filter.process(*sample);
                }
            }
            FAMILY_VINTAGE => {
                let drive = 1.0 + tuning.post_drive * color;
                saturate::tanh_drive_buffer(block, drive);
            }
            _ => {}
        }
    }
}

impl Default for WetPost {
    fn default() -> Self {
        Self::new()
    }
}

/// Mid/side rebalance. `width` 0 collapses to mono, 1 passes through, 2
/// doubles the side signal.
pub fn apply_width(left: &mut [f32], right: &mut [f32], width: f32) {
    let width = width.clamp(0.0, 2.0);
    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let mid = 0.5 * (*l + *r);
        let side = 0.5 * (*l - *r) * width;
        *l = mid + side;
        *r = mid - side;
    }
}

/// Feed-forward peak compressor over the channel maximum.
pub struct Compressor {
    envelope: f32,
}

impl Compressor {
    pub fn new() -> Self {
        Self { envelope: 0.0 }
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    #[inline]
    fn gain_for(&mut self, level: f32, tuning: &FamilyTuning, attack: f32, release: f32) -> f32 {
        let coeff = if level > self.envelope { attack } else { release };
        self.envelope += coeff * (level - self.envelope);

        let threshold = tuning.comp_threshold.max(1e-3);
        let gain = if self.envelope > threshold {
            let compressed =
                threshold + (self.envelope - threshold) / tuning.comp_ratio.max(1.0);
            compressed / self.envelope
        } else {
            1.0
        };
        gain * tuning.comp_makeup
    }

    pub fn process_stereo(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        tuning: &FamilyTuning,
        sample_rate: f32,
    ) {
        let attack =
            one_pole::smoothing_coeff(tuning.comp_attack_ms.max(0.1) / 1_000.0, sample_rate);
        let release =
            one_pole::smoothing_coeff(tuning.comp_release_ms.max(1.0) / 1_000.0, sample_rate);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let gain = self.gain_for(l.abs().max(r.abs()), tuning, attack, release);
            *l *= gain;
            *r *= gain;
        }
    }

    pub fn process_mono(&mut self, block: &mut [f32], tuning: &FamilyTuning, sample_rate: f32) {
        let attack =
            one_pole::smoothing_coeff(tuning.comp_attack_ms.max(0.1) / 1_000.0, sample_rate);
        let release =
            one_pole::smoothing_coeff(tuning.comp_release_ms.max(1.0) / 1_000.0, sample_rate);
        for sample in block.iter_mut() {
            let gain = self.gain_for(sample.abs(), tuning, attack, release);
            *sample *= gain;
        }
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}
