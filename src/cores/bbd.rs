//! Clocked shift-register emulation of an analog bucket-brigade device.
//!
//! The register holds `bbd_stages` buckets and is clocked so that the
//! charge takes `stages / (2 * clock)` seconds to travel end to end, the
//! defining relation of a real BBD chip. The requested delay therefore sets
//! the clock, not a read position: short delays clock fast and sound clean,
//! long delays clock slow and pull the anti-alias cutoff down with them.
//! Two one-pole sections on each side of the register stand in for the
//! chip's input band-limit and output reconstruction filters.

use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::one_pole::OnePoleLowpass;
use crate::{ProcessSpec, MAX_CHANNELS, MIN_TIME};

const MAX_STAGES: usize = 4_096;
const GUARD_SAMPLES: f32 = 1.0;

struct BucketChannel {
    register: Vec<f32>,
    head: usize,
    /// Fractional position between output ticks, in [0, 1).
    phase: f32,
    held_prev: f32,
    held_next: f32,
    anti_alias: [OnePoleLowpass; 2],
    reconstruct: [OnePoleLowpass; 2],
    cached_clock: f32,
}

impl BucketChannel {
    fn new() -> Self {
        Self {
            register: Vec::new(),
            head: 0,
            phase: 0.0,
            held_prev: 0.0,
            held_next: 0.0,
            anti_alias: [OnePoleLowpass::new(), OnePoleLowpass::new()],
            reconstruct: [OnePoleLowpass::new(), OnePoleLowpass::new()],
            cached_clock: 0.0,
        }
    }

    fn reset(&mut self) {
        self.register.fill(0.0);
        self.head = 0;
        self.phase = 0.0;
        self.held_prev = 0.0;
        self.held_next = 0.0;
        for filter in self.anti_alias.iter_mut().chain(self.reconstruct.iter_mut()) {
            filter.reset();
        }
        self.cached_clock = 0.0;
    }
}

pub struct BucketBrigadeCore {
    channels: [BucketChannel; MAX_CHANNELS],
    max_delay: f32,
}

impl BucketBrigadeCore {
    pub fn new() -> Self {
        Self {
            channels: [BucketChannel::new(), BucketChannel::new()],
            max_delay: 0.0,
        }
    }
}

impl DelayCore for BucketBrigadeCore {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        for channel in &mut self.channels {
            if channel.register.len() != MAX_STAGES {
                channel.register = vec![0.0; MAX_STAGES];
            }
            channel.reset();
        }
    }

    fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32) {
        let channel = channel.min(MAX_CHANNELS - 1);
        let state = &mut self.channels[channel];
        let lfo = ctx.lfo[channel];
        let depth_ms = ctx.mod_depth_ms();
        let tuning = ctx.tuning;

        let stages = (tuning.bbd_stages as usize).clamp(32, MAX_STAGES);
        let bandwidth = tuning.bbd_bandwidth_ratio * (1.0 - tuning.bbd_color_darken * ctx.color);
        state.head %= stages;

        for (lfo_value, sample) in lfo.iter().zip(block.iter_mut()) {
            let delay_s = ((centre_delay_ms + lfo_value * depth_ms) / 1_000.0).max(MIN_TIME);
            let clock = (stages as f32 / (2.0 * delay_s))
                .clamp(tuning.bbd_clock_min_hz, tuning.bbd_clock_max_hz);

            // The filters track the clock, but retuning four one-poles per
            // sample is wasteful when the sweep barely moves them.
            if (clock - state.cached_clock).abs() > state.cached_clock * 0.01 {
                let cutoff = clock * bandwidth;
                for filter in state
                    .anti_alias
                    .iter_mut()
                    .chain(state.reconstruct.iter_mut())
                {
                    filter.set_cutoff(cutoff, ctx.sample_rate);
                }
                state.cached_clock = clock;
            }

            let mut band_limited = *sample;
            for filter in &mut state.anti_alias {
                band_limited = filter.process(band_limited);
            }

            // Two register shifts per clock cycle, so the transit time of
            // `stages` buckets is stages / (2 * clock) seconds.
            state.phase += 2.0 * clock / ctx.sample_rate;
            while state.phase >= 1.0 {
                state.phase -= 1.0;
                state.held_prev = state.held_next;
                state.held_next = state.register[state.head];
                state.register[state.head] = band_limited;
                state.head = (state.head + 1) % stages;
            }

            let held = state.held_prev + (state.held_next - state.held_prev) * state.phase;
            let mut wet = held;
            for filter in &mut state.reconstruct {
                wet = filter.process(wet);
            }
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

impl Default for BucketBrigadeCore {
    fn default() -> Self {
        Self::new()
    }
}
