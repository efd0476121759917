/*
5th-Order Butterworth Lowpass Designer
======================================

Closed-form digital coefficients for a cascaded analog-prototype lowpass:
one real-pole first-order section followed by two complex-pole biquads.

The Butterworth poles of odd order N sit on the unit circle of the s-plane
at angles that are known analytically. For N = 5 the conjugate pairs sit at
pi/10 and 3*pi/10 off the imaginary axis, plus a single real pole at -1.
Each pair collapses to a normalized section

    H(s) = 1 / (s^2 + d*s + 1),   d = 2*sin(angle)

and the real pole to H(s) = 1 / (s + 1). The bilinear transform with
cotangent prewarping (k = 1 / tan(pi * fc / fs)) maps each section to its
digital counterpart without iteration, so the design is deterministic for
any valid cutoff.
*/

/// Coefficients for `y[n] = b0*x[n] + b1*x[n-1] - a1*y[n-1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub a1: f32,
}

/// Coefficients for a normalized (a0 = 1) biquad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

/// Complete section set for the 5th-order cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Butterworth5Design {
    pub first_order: FirstOrderCoeffs,
    pub biquads: [BiquadCoeffs; 2],
}

// d = 2*sin(angle) for the two conjugate pole pairs of a 5th-order prototype.
const SECTION_DAMPING: [f32; 2] = [0.618_034, 1.618_034];

const MIN_CUTOFF_HZ: f32 = 10.0;

/// Design the cascade for `cutoff_hz` at `sample_rate`.
///
/// The cutoff is clamped into a physically sane range before the prewarp so
/// the tangent never blows up near Nyquist.
pub fn design_lowpass(cutoff_hz: f32, sample_rate: f32) -> Butterworth5Design {
    let cutoff = cutoff_hz.clamp(MIN_CUTOFF_HZ, sample_rate * 0.45);
    let k = 1.0 / (std::f32::consts::PI * cutoff / sample_rate).tan();

    let norm = 1.0 / (k + 1.0);
    let first_order = FirstOrderCoeffs {
        b0: norm,
        b1: norm,
        a1: (1.0 - k) * norm,
    };

    let k2 = k * k;
    let mut biquads = [BiquadCoeffs {
        b0: 0.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    }; 2];
    for (section, &damping) in biquads.iter_mut().zip(SECTION_DAMPING.iter()) {
        let norm = 1.0 / (k2 + damping * k + 1.0);
        *section = BiquadCoeffs {
            b0: norm,
            b1: 2.0 * norm,
            b2: norm,
            a1: 2.0 * (1.0 - k2) * norm,
            a2: (k2 - damping * k + 1.0) * norm,
        };
    }

    Butterworth5Design {
        first_order,
        biquads,
    }
}

/// Runtime state for a first-order section (transposed direct form II).
#[derive(Debug, Clone, Copy)]
pub struct FirstOrderSection {
    coeffs: FirstOrderCoeffs,
    z1: f32,
}

impl FirstOrderSection {
    pub fn new(coeffs: FirstOrderCoeffs) -> Self {
        Self { coeffs, z1: 0.0 }
    }

    pub fn set_coeffs(&mut self, coeffs: FirstOrderCoeffs) {
        self.coeffs = coeffs;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.coeffs.b0 * input + self.z1;
        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output;
        output
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
    }
}

/// Runtime state for a biquad section (transposed direct form II).
#[derive(Debug, Clone, Copy)]
pub struct BiquadSection {
    coeffs: BiquadCoeffs,
    z1: f32,
    z2: f32,
}

impl BiquadSection {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.coeffs.b0 * input + self.z1;
        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// The full cascade as a ready-to-run filter.
#[derive(Debug, Clone, Copy)]
pub struct Butterworth5Lowpass {
    first: FirstOrderSection,
    second: BiquadSection,
    third: BiquadSection,
}

impl Butterworth5Lowpass {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let design = design_lowpass(cutoff_hz, sample_rate);
        Self {
            first: FirstOrderSection::new(design.first_order),
            second: BiquadSection::new(design.biquads[0]),
            third: BiquadSection::new(design.biquads[1]),
        }
    }

    pub fn set_design(&mut self, design: &Butterworth5Design) {
        self.first.set_coeffs(design.first_order);
        self.second.set_coeffs(design.biquads[0]);
        self.third.set_coeffs(design.biquads[1]);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.third
            .process(self.second.process(self.first.process(input)))
    }

    pub fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
        self.third.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn response_magnitude(cutoff: f32, freq: f32) -> f32 {
        // Drive the cascade with a sine and measure steady-state peak.
        let mut filter = Butterworth5Lowpass::new(cutoff, SAMPLE_RATE);
        let samples = (SAMPLE_RATE * 0.5) as usize;
        let mut peak = 0.0f32;
        for n in 0..samples {
            let phase = std::f32::consts::TAU * freq * n as f32 / SAMPLE_RATE;
            let out = filter.process(phase.sin());
            // Skip the transient before measuring.
            if n > samples / 2 {
                peak = peak.max(out.abs());
            }
        }
        peak
    }

    #[test]
    fn test_unity_gain_at_dc() {
        let design = design_lowpass(1_000.0, SAMPLE_RATE);
        // Sum of b over 1 + sum of a must be 1 for each section at z = 1.
        let fo = design.first_order;
        let dc = (fo.b0 + fo.b1) / (1.0 + fo.a1);
        assert!((dc - 1.0).abs() < 1e-4, "first-order DC gain {}", dc);

        for bq in &design.biquads {
            let dc = (bq.b0 + bq.b1 + bq.b2) / (1.0 + bq.a1 + bq.a2);
            assert!((dc - 1.0).abs() < 1e-4, "biquad DC gain {}", dc);
        }
    }

    #[test]
    fn test_passband_is_flat_and_stopband_rolls_off() {
        let pass = response_magnitude(2_000.0, 200.0);
        assert!((pass - 1.0).abs() < 0.05, "passband gain {}", pass);

        // 5th order = -30 dB/octave; one octave above cutoff must be well
        // below the -3 dB point.
        let stop = response_magnitude(2_000.0, 4_000.0);
        assert!(stop < 0.05, "stopband gain {}", stop);
    }

    #[test]
    fn test_cutoff_attenuation_is_three_db() {
        let at_cutoff = response_magnitude(2_000.0, 2_000.0);
        let expected = 1.0 / 2.0f32.sqrt();
        assert!(
            (at_cutoff - expected).abs() < 0.05,
            "cutoff gain {} expected {}",
            at_cutoff,
            expected
        );
    }

    #[test]
    fn test_extreme_cutoffs_stay_finite() {
        for cutoff in [0.0, 1.0, 30_000.0, 1e9] {
            let design = design_lowpass(cutoff, SAMPLE_RATE);
            let mut filter = Butterworth5Lowpass::new(cutoff, SAMPLE_RATE);
            filter.set_design(&design);
            for n in 0..1_000 {
                let out = filter.process(((n % 7) as f32 - 3.0) * 0.3);
                assert!(out.is_finite());
            }
        }
    }
}
