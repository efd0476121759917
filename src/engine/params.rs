//! Control-surface parameters and the smoothers that tame them.
//!
//! Writers set plain scalars through [`SharedParams`]; each field is an
//! independent atomic so the control thread never locks. The audio thread
//! copies everything into a [`ParamSnapshot`] once per block and feeds the
//! raw targets through the smoothing types below, so per-sample code only
//! ever sees continuous trajectories.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::dsp::one_pole;
use crate::MAX_CENTRE_DELAY_MS;

pub const MIN_RATE_HZ: f32 = 0.01;
pub const MAX_RATE_HZ: f32 = 20.0;
pub const MIN_CENTRE_DELAY_MS: f32 = 1.0;
pub const MAX_WIDTH: f32 = 2.0;
pub const MAX_OFFSET_DEGREES: f32 = 180.0;
pub const FAMILY_COUNT: usize = 5;

/// Plain value-copy of every control, taken once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub rate_hz: f32,
    pub depth: f32,
    pub offset_degrees: f32,
    pub width: f32,
    pub color: f32,
    pub mix: f32,
    pub centre_delay_ms: f32,
    pub family: usize,
    pub high_quality: bool,
}

struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Lock-free parameter store shared between the control and audio threads.
///
/// Every setter clamps into its documented range, so the audio side never
/// needs to defend against a wild value.
pub struct SharedParams {
    rate_hz: AtomicF32,
    depth: AtomicF32,
    offset_degrees: AtomicF32,
    width: AtomicF32,
    color: AtomicF32,
    mix: AtomicF32,
    centre_delay_ms: AtomicF32,
    family: AtomicU32,
    high_quality: AtomicBool,
}

impl SharedParams {
    pub fn new() -> Self {
        Self {
            rate_hz: AtomicF32::new(0.5),
            depth: AtomicF32::new(0.5),
            offset_degrees: AtomicF32::new(90.0),
            width: AtomicF32::new(1.0),
            color: AtomicF32::new(0.5),
            mix: AtomicF32::new(0.5),
            centre_delay_ms: AtomicF32::new(15.0),
            family: AtomicU32::new(0),
            high_quality: AtomicBool::new(false),
        }
    }

    pub fn set_rate_hz(&self, rate: f32) {
        self.rate_hz.set(rate.clamp(MIN_RATE_HZ, MAX_RATE_HZ));
    }

    pub fn set_depth(&self, depth: f32) {
        self.depth.set(depth.clamp(0.0, 1.0));
    }

    pub fn set_offset_degrees(&self, degrees: f32) {
        self.offset_degrees.set(degrees.clamp(0.0, MAX_OFFSET_DEGREES));
    }

    pub fn set_width(&self, width: f32) {
        self.width.set(width.clamp(0.0, MAX_WIDTH));
    }

    pub fn set_color(&self, color: f32) {
        self.color.set(color.clamp(0.0, 1.0));
    }

    pub fn set_mix(&self, mix: f32) {
        self.mix.set(mix.clamp(0.0, 1.0));
    }

    pub fn set_centre_delay_ms(&self, ms: f32) {
        self.centre_delay_ms
            .set(ms.clamp(MIN_CENTRE_DELAY_MS, MAX_CENTRE_DELAY_MS));
    }

    pub fn set_family(&self, family: usize) {
        self.family
            .store(family.min(FAMILY_COUNT - 1) as u32, Ordering::Relaxed);
    }

    pub fn set_high_quality(&self, on: bool) {
        self.high_quality.store(on, Ordering::Relaxed);
    }

    pub fn load(&self) -> ParamSnapshot {
        ParamSnapshot {
            rate_hz: self.rate_hz.get(),
            depth: self.depth.get(),
            offset_degrees: self.offset_degrees.get(),
            width: self.width.get(),
            color: self.color.get(),
            mix: self.mix.get(),
            centre_delay_ms: self.centre_delay_ms.get(),
            family: self.family.load(Ordering::Relaxed) as usize,
            high_quality: self.high_quality.load(Ordering::Relaxed),
        }
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample-rate linear ramp toward a target.
#[derive(Debug, Clone, Copy)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    step: f32,
}

impl LinearRamp {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
        }
    }

    /// Jump immediately, abandoning any ramp in flight.
    pub fn snap(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
    }

    /// Head for `target` over `samples` steps.
    pub fn retarget(&mut self, target: f32, samples: usize) {
        self.target = target;
        if samples == 0 {
            self.current = target;
            self.step = 0.0;
        } else {
            self.step = (target - self.current) / samples as f32;
        }
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.step != 0.0 {
            self.current += self.step;
            let overshot = (self.step > 0.0 && self.current >= self.target)
                || (self.step < 0.0 && self.current <= self.target);
            if overshot {
                self.current = self.target;
                self.step = 0.0;
            }
        }
        self.current
    }

    pub fn value(&self) -> f32 {
        self.current
    }
}

/// Block-rate exponential smoother.
#[derive(Debug, Clone, Copy)]
pub struct Smoothed {
    value: f32,
    coeff: f32,
}

impl Smoothed {
    pub fn new(value: f32) -> Self {
        Self { value, coeff: 1.0 }
    }

    /// Configure for a `time_s` settle when ticked every `block_len` samples.
    pub fn set_block_time(&mut self, time_s: f32, sample_rate: f32, block_len: usize) {
        self.coeff =
            one_pole::smoothing_coeff(time_s, sample_rate / block_len.max(1) as f32);
    }

    pub fn snap(&mut self, value: f32) {
        self.value = value;
    }

    #[inline]
    pub fn tick(&mut self, target: f32) -> f32 {
        self.value += self.coeff * (target - self.value);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Hard slew limit for the depth control.
///
/// Depth feeds the modulation excursion directly, so a fast automation jump
/// would drag every read tap across the buffer in one block and sound like
/// a pitch chirp. The limiter caps traversal to full scale per
/// [`Self::FULL_SCALE_SECONDS`] seconds; a one-pole after it rounds off the
/// corners.
#[derive(Debug, Clone, Copy)]
pub struct DepthLimiter {
    value: f32,
}

impl DepthLimiter {
    pub const FULL_SCALE_SECONDS: f32 = 0.125;

    pub fn new(value: f32) -> Self {
        Self { value }
    }

    pub fn snap(&mut self, value: f32) {
        self.value = value;
    }

    pub fn tick(&mut self, target: f32, block_len: usize, sample_rate: f32) -> f32 {
        let max_step = block_len as f32 / (Self::FULL_SCALE_SECONDS * sample_rate);
        let delta = (target - self.value).clamp(-max_step, max_step);
        self.value += delta;
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_clamp_into_documented_ranges() {
        let params = SharedParams::new();
        params.set_rate_hz(500.0);
        params.set_depth(-1.0);
        params.set_offset_degrees(270.0);
        params.set_width(9.0);
        params.set_centre_delay_ms(0.0);
        params.set_family(12);

        let snap = params.load();
        assert_eq!(snap.rate_hz, MAX_RATE_HZ);
        assert_eq!(snap.depth, 0.0);
        assert_eq!(snap.offset_degrees, MAX_OFFSET_DEGREES);
        assert_eq!(snap.width, MAX_WIDTH);
        assert_eq!(snap.centre_delay_ms, MIN_CENTRE_DELAY_MS);
        assert_eq!(snap.family, FAMILY_COUNT - 1);
    }

    #[test]
    fn test_linear_ramp_reaches_target_exactly() {
        let mut ramp = LinearRamp::new(0.0);
        ramp.retarget(1.0, 10);
        let mut last = 0.0;
        for _ in 0..10 {
            last = ramp.next();
        }
        assert_eq!(last, 1.0);
        // Further ticks hold the target.
        assert_eq!(ramp.next(), 1.0);
    }

    #[test]
    fn test_linear_ramp_never_overshoots() {
        let mut ramp = LinearRamp::new(1.0);
        ramp.retarget(0.25, 7);
        for _ in 0..20 {
            let value = ramp.next();
            assert!(value >= 0.25 - 1e-6);
        }
        assert_eq!(ramp.value(), 0.25);
    }

    #[test]
    fn test_depth_limiter_caps_slew() {
        let mut limiter = DepthLimiter::new(0.0);
        // A full-scale jump in one 512-sample block at 48 kHz must be cut
        // down to the configured traversal rate.
        let after_one_block = limiter.tick(1.0, 512, 48_000.0);
        let expected = 512.0 / (DepthLimiter::FULL_SCALE_SECONDS * 48_000.0);
        assert!((after_one_block - expected).abs() < 1e-6);

        // Repeated blocks eventually arrive.
        for _ in 0..200 {
            limiter.tick(1.0, 512, 48_000.0);
        }
        assert!((limiter.value() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_smoothed_converges_at_block_rate() {
        let mut smooth = Smoothed::new(0.0);
        smooth.set_block_time(0.05, 48_000.0, 512);
        let mut value = 0.0;
        for _ in 0..100 {
            value = smooth.tick(1.0);
        }
        assert!((value - 1.0).abs() < 1e-3);
    }
}
