use std::f32::consts::TAU;

use crate::MIN_TIME;

/// Feedback coefficient for a one-pole lowpass at `cutoff_hz`.
///
/// Derived from the impulse-invariant mapping `1 - e^(-2*pi*fc/fs)`, which
/// stays stable for any cutoff below Nyquist.
#[inline]
pub fn lowpass_coeff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let cutoff = cutoff_hz.clamp(1.0, sample_rate * 0.45);
    1.0 - (-TAU * cutoff / sample_rate).exp()
}

/// Feedback coefficient that settles over roughly `time_s` seconds.
#[inline]
pub fn smoothing_coeff(time_s: f32, sample_rate: f32) -> f32 {
    1.0 - (-1.0 / (time_s.max(MIN_TIME) * sample_rate)).exp()
}

/// Single-pole lowpass. The workhorse smoother and tone filter.
#[derive(Debug, Clone, Copy)]
pub struct OnePoleLowpass {
    coeff: f32,
    state: f32,
}

impl OnePoleLowpass {
    pub fn new() -> Self {
        Self {
            coeff: 1.0,
            state: 0.0,
        }
    }

    pub fn with_cutoff(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            coeff: lowpass_coeff(cutoff_hz, sample_rate),
            state: 0.0,
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        self.coeff = lowpass_coeff(cutoff_hz, sample_rate);
    }

    pub fn set_coeff(&mut self, coeff: f32) {
        self.coeff = coeff.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state += self.coeff * (input - self.state);
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    pub fn state(&self) -> f32 {
        self.state
    }
}

impl Default for OnePoleLowpass {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-pole highpass built as the lowpass complement.
#[derive(Debug, Clone, Copy)]
pub struct OnePoleHighpass {
    lowpass: OnePoleLowpass,
}

impl OnePoleHighpass {
    pub fn new() -> Self {
        Self {
            lowpass: OnePoleLowpass::new(),
        }
    }

    pub fn with_cutoff(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            lowpass: OnePoleLowpass::with_cutoff(cutoff_hz, sample_rate),
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        self.lowpass.set_cutoff(cutoff_hz, sample_rate);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        input - self.lowpass.process(input)
    }

    pub fn reset(&mut self) {
        self.lowpass.reset();
    }
}

impl Default for OnePoleHighpass {
    fn default() -> Self {
        Self::new()
    }
}
