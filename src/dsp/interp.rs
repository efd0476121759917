/*
Fractional-Delay Interpolation Kernels
======================================

Reading a delay line at a non-integer position requires estimating the
signal value between two stored samples. Each kernel here trades CPU cost
against high-frequency fidelity:

  linear        2 points   cheap, darkens the top octave under modulation
  catmull_rom   4 points   the classic cubic; good default for chorus taps
  hermite       4 points   cubic with a tension control over the tangents
  lagrange3     4 points   maximally flat passband, slightly brighter
  lagrange5     6 points   near-transparent, roughly twice the math

Convention: every kernel interpolates between the two middle points of its
window with `t` in [0, 1). Point order is oldest-sample-last when gathered
from a delay line (index 0 is the newest tap).
*/

#[inline]
pub fn linear(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Catmull-Rom cubic through `x0`..`x1` with neighbours `xm1` and `x2`.
#[inline]
pub fn catmull_rom(xm1: f32, x0: f32, x1: f32, x2: f32, t: f32) -> f32 {
    let c0 = x0;
    let c1 = 0.5 * (x1 - xm1);
    let c2 = xm1 - 2.5 * x0 + 2.0 * x1 - 0.5 * x2;
    let c3 = 0.5 * (x2 - xm1) + 1.5 * (x0 - x1);
    ((c3 * t + c2) * t + c1) * t + c0
}

/// Cardinal cubic Hermite with tangent tension.
///
/// `tension` = 0 reproduces Catmull-Rom; positive values slacken the
/// tangents toward a duller, tape-like response.
#[inline]
pub fn hermite(xm1: f32, x0: f32, x1: f32, x2: f32, t: f32, tension: f32) -> f32 {
    let scale = (1.0 - tension) * 0.5;
    let m0 = scale * (x1 - xm1);
    let m1 = scale * (x2 - x0);
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * t3 - 3.0 * t2 + 1.0) * x0
        + (t3 - 2.0 * t2 + t) * m0
        + (-2.0 * t3 + 3.0 * t2) * x1
        + (t3 - t2) * m1
}

/// 3rd-order Lagrange over four points, evaluated between `x[1]` and `x[2]`.
#[inline]
pub fn lagrange3(x: &[f32; 4], t: f32) -> f32 {
    let p = 1.0 + t;
    let d0 = p - 1.0;
    let d1 = p - 2.0;
    let d2 = p - 3.0;
    let w0 = -(d0 * d1 * d2) / 6.0;
    let w1 = (p * d1 * d2) * 0.5;
    let w2 = -(p * d0 * d2) * 0.5;
    let w3 = (p * d0 * d1) / 6.0;
    w0 * x[0] + w1 * x[1] + w2 * x[2] + w3 * x[3]
}

// Product of (k - j) for j != k over the six sample positions.
const LAGRANGE5_DENOM: [f32; 6] = [-120.0, 24.0, -12.0, 12.0, -24.0, 120.0];

/// 5th-order Lagrange over six points, evaluated between `x[2]` and `x[3]`.
#[inline]
pub fn lagrange5(x: &[f32; 6], t: f32) -> f32 {
    let p = 2.0 + t;
    let d = [p, p - 1.0, p - 2.0, p - 3.0, p - 4.0, p - 5.0];
    let mut out = 0.0;
    for k in 0..6 {
        let mut num = 1.0;
        for (j, dj) in d.iter().enumerate() {
            if j != k {
                num *= dj;
            }
        }
        out += x[k] * num / LAGRANGE5_DENOM[k];
    }
    out
}
