//! The ten delay/modulation algorithms and their shared contract.
//!
//! Every core owns its own per-channel sample storage and implements
//! [`DelayCore`]. Cores never see the controller's internals; the per-block
//! [`CoreCtx`] hands them exactly the read-only state they need (rendered
//! LFO buffers, smoothed color/depth, the tuning snapshot). All ten cores
//! are pre-built inside [`CoreBank`] at engine construction so switching
//! never allocates on the audio thread.

/// Clocked shift-register emulation of an analog bucket-brigade device.
pub mod bbd;
/// Catmull-Rom fractional read over a self-managed masked ring.
pub mod cubic;
/// Twin linear taps shaped by the color control for a dense ensemble.
pub mod ensemble;
/// 3rd- and 5th-order Lagrange fractional reads.
pub mod lagrange;
/// Plain linear-interpolated fractional read.
pub mod linear;
/// Dual elliptical-orbit taps projected on slowly rotating axes.
pub mod orbit;
/// Nonlinearly warped LFO phase driving a cubic read tap.
pub mod phase_warp;
/// Polyphase windowed-sinc FIR fractional read.
pub mod sinc;
/// Varispeed tape emulation with wow, flutter, and tone shaping.
pub mod tape;

pub use bbd::BucketBrigadeCore;
pub use cubic::CubicCore;
pub use ensemble::LinearEnsembleCore;
pub use lagrange::{Lagrange3Core, Lagrange5Core};
pub use linear::LinearCore;
pub use orbit::OrbitCore;
pub use phase_warp::PhaseWarpedCore;
pub use sinc::WindowedSincFirCore;
pub use tape::TapeCore;

use crate::tuning::FamilyTuning;
use crate::{ProcessSpec, MAX_CENTRE_DELAY_MS, MAX_MOD_DEPTH_MS};

/// Read-only per-block context handed to a core's `process`.
///
/// `lfo` holds one depth-scaled buffer per channel in [-1, 1]. Cores that
/// derive their own modulators (tape wow, phase warp, orbit) start from
/// `lfo_phase`/`lfo_phase_inc` instead so their motion stays locked to the
/// controller's rate without duplicating oscillator state.
pub struct CoreCtx<'a> {
    pub sample_rate: f32,
    pub lfo: [&'a [f32]; 2],
    /// Main LFO phase at the first sample of the block, radians.
    pub lfo_phase: f32,
    pub lfo_phase_inc: f32,
    /// Right-channel phase offset, radians.
    pub phase_offset: f32,
    /// Smoothed, rate-limited depth in [0, 1].
    pub depth: f32,
    /// Smoothed color in [0, 1].
    pub color: f32,
    pub tuning: &'a FamilyTuning,
}

impl CoreCtx<'_> {
    /// Phase offset to apply for `channel` when a core runs its own modulator.
    #[inline]
    pub fn channel_phase(&self, channel: usize) -> f32 {
        if channel == 1 {
            self.phase_offset
        } else {
            0.0
        }
    }

    /// Modulation excursion in milliseconds at full depth.
    #[inline]
    pub fn mod_depth_ms(&self) -> f32 {
        self.tuning.mod_depth_ms.min(MAX_MOD_DEPTH_MS)
    }
}

/// Capability contract every delay core implements.
///
/// `process` runs one channel of one block, 100% wet, reading modulation
/// for that channel from the context. Callers clamp the centre delay, but
/// cores still clamp the final per-sample delay into
/// `[guard_samples, max_delay_samples]` as the last line of defence.
pub trait DelayCore: Send {
    /// Allocate/resize internal buffers for `spec`. May allocate.
    fn prepare(&mut self, spec: &ProcessSpec);
    /// Zero sample memory and re-init modulation state. Never allocates.
    fn reset(&mut self);
    fn process(&mut self, ctx: &CoreCtx, channel: usize, block: &mut [f32], centre_delay_ms: f32);
    /// Safety margin an interpolation kernel needs around the read position.
    fn guard_samples(&self) -> f32;
    /// Largest usable delay after `prepare`.
    fn max_delay_samples(&self) -> f32;
}

/// Worst-case modulated delay in samples: widest centre plus the widest
/// excursion any tuning profile may request. Ring buffers are sized from
/// this so no runtime parameter change can outgrow them.
pub(crate) fn worst_case_delay_samples(spec: &ProcessSpec) -> f32 {
    ((MAX_CENTRE_DELAY_MS + MAX_MOD_DEPTH_MS) as f64 * spec.sample_rate / 1_000.0) as f32
}

/// Identifies one of the ten cores. Discriminants index [`CoreBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreKind {
    Linear,
    LinearEnsemble,
    Cubic,
    WindowedSincFir,
    Lagrange3,
    Lagrange5,
    BucketBrigade,
    Tape,
    PhaseWarped,
    Orbit,
}

impl CoreKind {
    pub const COUNT: usize = 10;

    pub const ALL: [CoreKind; Self::COUNT] = [
        CoreKind::Linear,
        CoreKind::LinearEnsemble,
        CoreKind::Cubic,
        CoreKind::WindowedSincFir,
        CoreKind::Lagrange3,
        CoreKind::Lagrange5,
        CoreKind::BucketBrigade,
        CoreKind::Tape,
        CoreKind::PhaseWarped,
        CoreKind::Orbit,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The core a (family, quality) selection maps to.
    pub fn from_selection(family: usize, high_quality: bool) -> Self {
        match (family.min(4), high_quality) {
            (0, false) => CoreKind::Linear,
            (0, true) => CoreKind::Cubic,
            (1, false) => CoreKind::LinearEnsemble,
            (1, true) => CoreKind::WindowedSincFir,
            (2, false) => CoreKind::BucketBrigade,
            (2, true) => CoreKind::Tape,
            (3, false) => CoreKind::Lagrange3,
            (3, true) => CoreKind::Lagrange5,
            (_, false) => CoreKind::PhaseWarped,
            (_, true) => CoreKind::Orbit,
        }
    }

    /// Inverse of [`from_selection`](Self::from_selection).
    pub fn selection(self) -> (usize, bool) {
        match self {
            CoreKind::Linear => (0, false),
            CoreKind::Cubic => (0, true),
            CoreKind::LinearEnsemble => (1, false),
            CoreKind::WindowedSincFir => (1, true),
            CoreKind::BucketBrigade => (2, false),
            CoreKind::Tape => (2, true),
            CoreKind::Lagrange3 => (3, false),
            CoreKind::Lagrange5 => (3, true),
            CoreKind::PhaseWarped => (4, false),
            CoreKind::Orbit => (4, true),
        }
    }
}

/// All ten cores, pre-built and indexed by [`CoreKind`].
pub struct CoreBank {
    cores: [Box<dyn DelayCore>; CoreKind::COUNT],
}

impl CoreBank {
    pub fn new() -> Self {
        let cores: [Box<dyn DelayCore>; CoreKind::COUNT] = [
            Box::new(LinearCore::new()),
            Box::new(LinearEnsembleCore::new()),
            Box::new(CubicCore::new()),
            Box::new(WindowedSincFirCore::new()),
            Box::new(Lagrange3Core::new()),
            Box::new(Lagrange5Core::new()),
            Box::new(BucketBrigadeCore::new()),
            Box::new(TapeCore::new()),
            Box::new(PhaseWarpedCore::new()),
            Box::new(OrbitCore::new()),
        ];
        Self { cores }
    }

    pub fn prepare(&mut self, spec: &ProcessSpec) {
        for core in self.cores.iter_mut() {
            core.prepare(spec);
        }
    }

    pub fn reset(&mut self) {
        for core in self.cores.iter_mut() {
            core.reset();
        }
    }

    #[inline]
    pub fn get_mut(&mut self, kind: CoreKind) -> &mut dyn DelayCore {
        self.cores[kind.index()].as_mut()
    }

    /// Mutable access to two distinct cores at once, for crossfading.
    pub fn pair_mut(
        &mut self,
        first: CoreKind,
        second: CoreKind,
    ) -> (&mut dyn DelayCore, &mut dyn DelayCore) {
        let (a, b) = (first.index(), second.index());
        debug_assert_ne!(a, b, "crossfade requires two distinct cores");
        if a < b {
            let (low, high) = self.cores.split_at_mut(b);
            (low[a].as_mut(), high[0].as_mut())
        } else {
            let (low, high) = self.cores.split_at_mut(a);
            (high[0].as_mut(), low[b].as_mut())
        }
    }
}

impl Default for CoreBank {
    fn default() -> Self {
        Self::new()
    }
}
