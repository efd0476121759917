//! Dual elliptical-orbit taps projected on slowly rotating axes.
//!
//! Each tap's modulator is a point riding an ellipse, `(sin(phi),
//! (1 - e) * cos(phi))`, projected onto an axis that itself rotates far
//! below the LFO rate. The projection sweeps between the ellipse's long
//! and short diameters, so the excursion swells and recedes over tens of
//! seconds instead of repeating every LFO cycle. The right channel projects
//! onto an axis a quarter turn ahead, which decorrelates the sides without
//! a second oscillator.

use std::f32::consts::{FRAC_PI_2, TAU};

use crate::cores::{worst_case_delay_samples, CoreCtx, DelayCore};
use crate::dsp::DelayLine;
use crate::{ProcessSpec, MAX_CHANNELS};

const GUARD_SAMPLES: f32 = 3.0;
const TAP_A_LEVEL: f32 = 0.6;
const TAP_B_LEVEL: f32 = 0.4;
/// Tap B counter-rotates at an irrational-ish ratio so the two projections
/// never phase-lock.
const TAP_B_RATE_RATIO: f32 = -0.618;

pub struct OrbitCore {
    lines: [DelayLine; MAX_CHANNELS],
    theta_a: [f32; MAX_CHANNELS],
    theta_b: [f32; MAX_CHANNELS],
    max_delay: f32,
}

impl OrbitCore {
    pub fn new() -> Self {
        Self {
            lines: [DelayLine::new(), DelayLine::new()],
            theta_a: [0.0; MAX_CHANNELS],
            theta_b: [0.0; MAX_CHANNELS],
            max_delay: 0.0,
        }
    }

    #[inline]
    fn project(phase: f32, eccentricity: f32, axis: f32) -> f32 {
        phase.sin() * axis.cos() + (1.0 - eccentricity) * phase.cos() * axis.sin()
    }
}

impl DelayCore for OrbitCore {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_delay = worst_case_delay_samples(spec);
        let min_size = self.max_delay.ceil() as usize + GUARD_SAMPLES as usize + 4;
        for line in &mut self.lines {
            line.prepare(min_size);
        }
        self.theta_a = [0.0; MAX_CHANNELS];
        self.theta_b = [0.0; MAX_CHANNELS];
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.theta_a = [0.0; MAX_CHANNELS];
        self.theta_b = [0.0; MAX_CHANNELS];
    }

    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32) {
        let channel = channel.min(MAX_CHANNELS - 1);
        let line = &mut self.lines[channel];
        let samples_per_ms = ctx.sample_rate / 1_000.0;
        let depth_ms = ctx.depth * ctx.mod_depth_ms();
        let tuning = ctx.tuning;

        let ecc_a = tuning.orbit_ecc * ctx.color;
        let ecc_b = tuning.orbit_ecc * (1.0 - 0.5 * ctx.color);
        let rot_hz = tuning.orbit_rot_min_hz
            + (tuning.orbit_rot_max_hz - tuning.orbit_rot_min_hz) * ctx.color;
        let theta_inc = TAU * rot_hz / ctx.sample_rate;
        let axis_offset = if channel == 1 { FRAC_PI_2 } else { 0.0 };

        let mut phase = ctx.lfo_phase + ctx.channel_phase(channel);
        for sample in block.iter_mut() {
            let mod_a = Self::project(phase, ecc_a, self.theta_a[channel] + axis_offset);
            let mod_b = Self::project(phase, ecc_b, self.theta_b[channel] + axis_offset);

            let delay_a = ((centre_delay_ms + mod_a * depth_ms) * samples_per_ms)
                .clamp(GUARD_SAMPLES, self.max_delay);
            let delay_b = ((centre_delay_ms + mod_b * depth_ms) * samples_per_ms)
                .clamp(GUARD_SAMPLES, self.max_delay);

            let wet_a = line.read_catmull_rom(delay_a);
            let wet_b = line.read_catmull_rom(delay_b);
            line.write(*sample);
            *sample = TAP_A_LEVEL * wet_a + TAP_B_LEVEL * wet_b;

            phase += ctx.lfo_phase_inc;
            self.theta_a[channel] = (self.theta_a[channel] + theta_inc) % TAU;
            self.theta_b[channel] =
                (self.theta_b[channel] + theta_inc * TAP_B_RATE_RATIO).rem_euclid(TAU);
        }
    }

    fn guard_samples(&self) -> f32 {
        GUARD_SAMPLES
    }

    fn max_delay_samples(&self) -> f32 {
        self.max_delay
    }
}

impl Default for OrbitCore {
    fn default() -> Self {
        Self::new()
    }
}
