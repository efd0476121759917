//! Soft saturation used on the tape write head and the post-chorus drive.
//!
//! The curve is odd-symmetric so it adds only odd harmonics and never
//! introduces a DC component on a symmetric input.

/// Hyperbolic-tangent drive, normalized so a full-scale input stays at
/// full scale regardless of the drive amount.
#[inline]
pub fn tanh_drive(sample: f32, drive: f32) -> f32 {
    let drive = drive.max(1e-3);
    (sample * drive).tanh() / drive.tanh()
}

/// Apply `tanh_drive` to a whole buffer in place.
pub fn tanh_drive_buffer(buffer: &mut [f32], drive: f32) {
    let drive = drive.max(1e-3);
    let norm = 1.0 / drive.tanh();
    for sample in buffer.iter_mut() {
        *sample = (*sample * drive).tanh() * norm;
    }
}
