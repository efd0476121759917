//! Varispeed tape emulation.
//!
//! Instead of moving a read tap directly, the modulators bend the playback
//! speed ratio and a leaky integrator turns that speed error into a delay
//! offset, the way a real transport drifts around its nominal spacing. Wow
//! and flutter oscillators run on top of the main LFO, the record head
//! saturates, and a smoothed tone filter stands in for head-bump losses.

use std::f32::consts::TAU;

use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::one_pole::OnePoleLowpass;
use crate::dsp::{saturate, DelayLine};
use crate::{ProcessSpec, MAX_CHANNELS};

const GUARD_SAMPLES: f32 = 4.0;

struct TapeChannel {
    line: DelayLine,
    /// Accumulated delay deviation from the speed error, in samples.
    offset: f32,
    wow_phase: f32,
    flutter_phase: f32,
    tone: OnePoleLowpass,
    tone_cutoff: f32,
}

impl TapeChannel {
    fn new() -> Self {
        Self {
            line: DelayLine::new(),
            offset: 0.0,
            wow_phase: 0.0,
            flutter_phase: 0.0,
            tone: OnePoleLowpass::new(),
            tone_cutoff: 0.0,
        }
    }

    fn reset(&mut self) {
        self.line.reset();
        self.offset = 0.0;
        self.wow_phase = 0.0;
        self.flutter_phase = 0.0;
        self.tone.reset();
        self.tone_cutoff = 0.0;
    }
}

pub struct TapeCore {
    channels: [TapeChannel; MAX_CHANNELS],
    max_delay: f32,
}

impl TapeCore {
    pub fn new() -> Self {
        Self {
            channels: [TapeChannel::new(), TapeChannel::new()],
            max_delay: 0.0,
        }
    }
}

impl DelayCore for TapeCore {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        let min_size = self.max_delay.ceil() as usize + GUARD_SAMPLES as usize + 4;
        for channel in &mut self.channels {
            channel.line.prepare(min_size);
            channel.offset = 0.0;
            channel.wow_phase = 0.0;
            channel.flutter_phase = 0.0;
            channel.tone.reset();
            channel.tone_cutoff = 0.0;
        }
    }

    fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32) {
        let channel_index = channel.min(MAX_CHANNELS - 1);
        let state = &mut self.channels[channel_index];
        let lfo = ctx.lfo[channel_index];
        let tuning = ctx.tuning;
        let samples_per_ms = ctx.sample_rate / 1_000.0;
        let centre_samples = centre_delay_ms * samples_per_ms;

        let wow_inc = TAU * tuning.tape_wow_rate_hz / ctx.sample_rate;
        let flutter_inc = TAU * tuning.tape_flutter_rate_hz / ctx.sample_rate;

        // Tone tracks color at control rate; the cutoff itself is smoothed
        // so a color jump cannot click.
        let target_cutoff = tuning.tape_tone_max_hz
            - (tuning.tape_tone_max_hz - tuning.tape_tone_min_hz) * ctx.color;
        if state.tone_cutoff == 0.0 {
            state.tone_cutoff = target_cutoff;
        }
        let smooth_time = tuning.tape_tone_smooth_ms.max(1.0) / 1_000.0;
        let block_coeff =
            1.0 - (-(block.len() as f32) / (smooth_time * ctx.sample_rate)).exp();
        state.tone_cutoff += block_coeff * (target_cutoff - state.tone_cutoff);
        state.tone.set_cutoff(state.tone_cutoff, ctx.sample_rate);

        for (lfo_value, sample) in lfo.iter().zip(block.iter_mut()) {
            let wow = state.wow_phase.sin() * tuning.tape_wow_depth;
            state.wow_phase += wow_inc;
            if state.wow_phase >= TAU {
                state.wow_phase -= TAU;
            }
            let flutter = state.flutter_phase.sin() * tuning.tape_flutter_depth;
            state.flutter_phase += flutter_inc;
            if state.flutter_phase >= TAU {
                state.flutter_phase -= TAU;
            }

            let ratio = 1.0 + lfo_value * tuning.tape_depth_scale + wow + flutter;

            // Speed error integrates into spacing; the leak re-centres it
            // and the clamp-writeback stops runaway accumulation.
            state.offset += (ratio - 1.0) - state.offset * tuning.tape_leak;
            let delay = (centre_samples - state.offset).clamp(GUARD_SAMPLES, self.max_delay);
            state.offset = centre_samples - delay;

            let wet = state.line.read_hermite(delay, tuning.tape_tension);
            state
                .line
                .write(saturate::tanh_drive(*sample, tuning.tape_drive));
            *sample = state.tone.process(wet);
        }
    }

    fn guard_samples(&self) -> f32 {
        GUARD_SAMPLES
    }

    fn max_delay_samples(&self) -> f32 {
        self.max_delay
    }
}

impl Default for TapeCore {
    fn default() -> Self {
        Self::new()
    }
}
