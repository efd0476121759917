//! Block-rate controller that drives the core bank.
//!
//! The audio thread owns a [`ChorusEngine`]; everything else talks to it
//! through a cloneable [`ChorusHandle`] backed by atomics, or by pushing
//! [`ControlMessage`]s down a queue the engine drains at block boundaries.
//! Per block the engine snapshots the controls, ticks the smoothers,
//! renders the quadrature LFO, conditions the input, dispatches the active
//! core (plus a warming or fading partner when a switch is in flight),
//! shapes the wet signal, ramps the dry/wet mix per sample, and finishes
//! with the width and compressor stage. `process` never allocates; every
//! buffer is sized in `prepare`.

/// Input high-pass and quiet-signal pre-emphasis.
pub mod conditioning;
/// Warm-up and equal-power blend state machine for core switching.
pub mod crossfade;
/// Quadrature low-frequency oscillator.
pub mod lfo;
/// Control messages and the queue abstraction that carries them.
pub mod message;
/// Shared atomic parameters and smoothing primitives.
pub mod params;
/// Family wet coloring, stereo width, and the output compressor.
pub mod post;

pub use message::{ControlMessage, MessageReceiver};
pub use params::{ParamSnapshot, SharedParams};

use std::sync::Arc;

use crate::cores::{CoreBank, CoreCtx, CoreKind};
use crate::tuning::{SharedTuning, TuningPatch};
use crate::{ProcessSpec, MAX_CHANNELS};

use conditioning::InputConditioner;
use crossfade::{duck_gain, equal_power_gains, CoreSwitcher, SwitchActivity};
use lfo::QuadratureLfo;
use params::{DepthLimiter, LinearRamp, Smoothed};
use post::{apply_width, Compressor, WetPost};

/// Settle time for the rate, centre, color, and width smoothers.
const CONTROL_SMOOTH_S: f32 = 0.05;
/// Settle time for the depth smoother that follows the slew limiter.
const DEPTH_SMOOTH_S: f32 = 0.02;

/// Control-side view of a running engine. Cheap to clone; every method is
/// safe to call from any thread while the audio thread is processing.
#[derive(Clone)]
pub struct ChorusHandle {
    params: Arc<SharedParams>,
    tuning: Arc<SharedTuning>,
}

impl ChorusHandle {
    pub fn set_rate_hz(&self, rate: f32) {
        self.params.set_rate_hz(rate);
    }

    pub fn set_depth(&self, depth: f32) {
        self.params.set_depth(depth);
    }

    pub fn set_offset_degrees(&self, degrees: f32) {
        self.params.set_offset_degrees(degrees);
    }

    pub fn set_width(&self, width: f32) {
        self.params.set_width(width);
    }

    pub fn set_color(&self, color: f32) {
        self.params.set_color(color);
    }

    pub fn set_mix(&self, mix: f32) {
        self.params.set_mix(mix);
    }

    pub fn set_centre_delay_ms(&self, ms: f32) {
        self.params.set_centre_delay_ms(ms);
    }

    pub fn set_family(&self, family: usize) {
        self.params.set_family(family);
    }

    pub fn set_high_quality(&self, on: bool) {
        self.params.set_high_quality(on);
    }

    /// Overlay a sparse tuning patch onto one (family, quality) profile.
    pub fn apply_tuning_patch(&self, family: usize, high_quality: bool, patch: &TuningPatch) {
        self.tuning.apply_patch(family, high_quality, patch);
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        self.params.load()
    }
}

fn apply_message(params: &SharedParams, message: ControlMessage) {
    match message {
        ControlMessage::SetRate(rate) => params.set_rate_hz(rate),
        ControlMessage::SetDepth(depth) => params.set_depth(depth),
        ControlMessage::SetOffsetDegrees(degrees) => params.set_offset_degrees(degrees),
        ControlMessage::SetWidth(width) => params.set_width(width),
        ControlMessage::SetColor(color) => params.set_color(color),
        ControlMessage::SetMix(mix) => params.set_mix(mix),
        ControlMessage::SetCentreDelayMs(ms) => params.set_centre_delay_ms(ms),
        ControlMessage::SetFamily(family) => params.set_family(family),
        ControlMessage::SetHighQuality(on) => params.set_high_quality(on),
        ControlMessage::Reset => {}
    }
}

/// The audio-thread side of the effect.
pub struct ChorusEngine {
    spec: ProcessSpec,
    sample_rate: f32,
    params: Arc<SharedParams>,
    tuning: Arc<SharedTuning>,
    bank: CoreBank,
    switcher: CoreSwitcher,
    lfo: QuadratureLfo,
    conditioner: InputConditioner,
    wet_post: WetPost,
    compressor: Compressor,
    rate: Smoothed,
    centre: Smoothed,
    color: Smoothed,
    width: Smoothed,
    depth_limiter: DepthLimiter,
    depth: Smoothed,
    mix: LinearRamp,
    dry: [Vec<f32>; MAX_CHANNELS],
    wet: [Vec<f32>; MAX_CHANNELS],
    incoming: [Vec<f32>; MAX_CHANNELS],
}

impl ChorusEngine {
    pub fn new(spec: ProcessSpec) -> (Self, ChorusHandle) {
        let params = Arc::new(SharedParams::new());
        let tuning = Arc::new(SharedTuning::new());
        let snapshot = params.load();

        let mut rate = Smoothed::new(snapshot.rate_hz);
        rate.snap(snapshot.rate_hz);
        let mut centre = Smoothed::new(snapshot.centre_delay_ms);
        centre.snap(snapshot.centre_delay_ms);
        let mut color = Smoothed::new(snapshot.color);
        color.snap(snapshot.color);
        let mut width = Smoothed::new(snapshot.width);
        width.snap(snapshot.width);
        let mut depth = Smoothed::new(snapshot.depth);
        depth.snap(snapshot.depth);

        let initial = CoreKind::from_selection(snapshot.family, snapshot.high_quality);
        let mut engine = Self {
            spec,
            sample_rate: spec.sample_rate as f32,
            params: Arc::clone(&params),
            tuning: Arc::clone(&tuning),
            bank: CoreBank::new(),
            switcher: CoreSwitcher::new(initial),
            lfo: QuadratureLfo::new(),
            conditioner: InputConditioner::new(),
            wet_post: WetPost::new(),
            compressor: Compressor::new(),
            rate,
            centre,
            color,
            width,
            depth_limiter: DepthLimiter::new(snapshot.depth),
            depth,
            mix: LinearRamp::new(snapshot.mix),
            dry: [Vec::new(), Vec::new()],
            wet: [Vec::new(), Vec::new()],
            incoming: [Vec::new(), Vec::new()],
        };
        engine.prepare(&spec);

        let handle = ChorusHandle { params, tuning };
        (engine, handle)
    }

    pub fn handle(&self) -> ChorusHandle {
        ChorusHandle {
            params: Arc::clone(&self.params),
            tuning: Arc::clone(&self.tuning),
        }
    }

    pub fn spec(&self) -> ProcessSpec {
        self.spec
    }

    /// The core currently authoritative for the wet signal.
    pub fn active_core(&self) -> CoreKind {
        self.switcher.active()
    }

    /// Resize every internal buffer for `spec` and reset. May allocate.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.spec = *spec;
        self.sample_rate = spec.sample_rate as f32;
        self.bank.prepare(spec);
        self.lfo.prepare(spec);
        for buffer in self
            .dry
            .iter_mut()
            .chain(self.wet.iter_mut())
            .chain(self.incoming.iter_mut())
        {
            buffer.resize(spec.max_block_size, 0.0);
        }
        self.reset();
    }

    /// Clear all audio state without touching the shared parameters.
    pub fn reset(&mut self) {
        self.bank.reset();
        self.lfo.reset();
        self.conditioner.reset();
        self.wet_post.reset();
        self.compressor.reset();

        let snapshot = self.params.load();
        self.rate.snap(snapshot.rate_hz);
        self.centre.snap(snapshot.centre_delay_ms);
        self.color.snap(snapshot.color);
        self.width.snap(snapshot.width);
        self.depth_limiter.snap(snapshot.depth);
        self.depth.snap(snapshot.depth);
        self.mix.snap(snapshot.mix);

        for buffer in self
            .dry
            .iter_mut()
            .chain(self.wet.iter_mut())
            .chain(self.incoming.iter_mut())
        {
            buffer.fill(0.0);
        }

        let active = CoreKind::from_selection(snapshot.family, snapshot.high_quality);
        self.switcher = CoreSwitcher::new(active);
    }

    /// Apply every queued control message. `Reset` clears audio state on
    /// the spot; everything else lands in the shared parameter store.
    pub fn drain_messages<R: MessageReceiver>(&mut self, rx: &mut R) {
        while let Some(message) = rx.pop() {
            if message == ControlMessage::Reset {
                self.reset();
            } else {
                apply_message(&self.params, message);
            }
        }
    }

    /// Process in place. `channels` may hold one or two buffers; anything
    /// beyond the second is passed through untouched. Blocks longer than
    /// the prepared maximum are split internally.
    pub fn process(&mut self, channels: &mut [&mut [f32]]) {
        let max = self.spec.max_block_size;
        match channels {
            [] => {}
            [mono] => {
                let mut offset = 0;
                while offset < mono.len() {
                    let len = (mono.len() - offset).min(max);
                    self.process_block(&mut mono[offset..offset + len], None);
                    offset += len;
                }
            }
            [left, right, ..] => {
                let frames = left.len().min(right.len());
                let mut offset = 0;
                while offset < frames {
                    let len = (frames - offset).min(max);
                    let (l, r) = (
                        &mut left[offset..offset + len],
                        &mut right[offset..offset + len],
                    );
                    self.process_block(l, Some(r));
                    offset += len;
                }
            }
        }
    }

    fn process_block(&mut self, left: &mut [f32], mut right: Option<&mut [f32]>) {
        let len = left.len();
        if len == 0 {
            return;
        }

        let snapshot = self.params.load();
        let tuning = self.tuning.load(snapshot.family, snapshot.high_quality);
        let sample_rate = self.sample_rate;

        self.rate.set_block_time(CONTROL_SMOOTH_S, sample_rate, len);
        self.color.set_block_time(CONTROL_SMOOTH_S, sample_rate, len);
        self.width.set_block_time(CONTROL_SMOOTH_S, sample_rate, len);
        self.centre
            .set_block_time(tuning.delay_smooth_ms / 1_000.0, sample_rate, len);
        self.depth.set_block_time(DEPTH_SMOOTH_S, sample_rate, len);

        let rate = self.rate.tick(snapshot.rate_hz);
        let centre_ms = self.centre.tick(snapshot.centre_delay_ms);
        let color = self.color.tick(snapshot.color);
        let width = self.width.tick(snapshot.width);
        let limited = self.depth_limiter.tick(snapshot.depth, len, sample_rate);
        let depth = self.depth.tick(limited);
        self.mix.retarget(snapshot.mix, len);

        let desired = CoreKind::from_selection(snapshot.family, snapshot.high_quality);
        if let Some(started) = self.switcher.request(desired, &tuning, sample_rate) {
            self.bank.get_mut(started).reset();
        }

        self.lfo.set_rate(rate, sample_rate);
        self.lfo
            .render(len, depth, snapshot.offset_degrees.to_radians());

        let stereo = right.is_some();
        self.dry[0][..len].copy_from_slice(left);
        if let Some(r) = right.as_deref() {
            self.dry[1][..len].copy_from_slice(r);
        }

        self.wet[0][..len].copy_from_slice(left);
        self.conditioner.process(0, &mut self.wet[0][..len], &tuning, sample_rate);
        if let Some(r) = right.as_deref() {
            self.wet[1][..len].copy_from_slice(r);
            self.conditioner.process(1, &mut self.wet[1][..len], &tuning, sample_rate);
        }

        let channel_count = if stereo { 2 } else { 1 };
        let ctx = CoreCtx {
            sample_rate,
            lfo: [self.lfo.left(len), self.lfo.right(len)],
            lfo_phase: self.lfo.block_start_phase(),
            lfo_phase_inc: self.lfo.phase_inc(),
            phase_offset: self.lfo.offset_rad(),
            depth,
            color,
            tuning: &tuning,
        };

        match self.switcher.activity() {
            SwitchActivity::Stable { active } => {
                let core = self.bank.get_mut(active);
                for channel in 0..channel_count {
                    core.process(&ctx, channel, &mut self.wet[channel][..len], centre_ms);
                }
            }
            SwitchActivity::WarmingUp { active, pending } => {
                let (active_core, pending_core) = self.bank.pair_mut(active, pending);
                for channel in 0..channel_count {
                    // Prime the pending core on the conditioned input and
                    // throw its output away.
                    self.incoming[channel][..len].copy_from_slice(&self.wet[channel][..len]);
                    pending_core.process(
                        &ctx,
                        channel,
                        &mut self.incoming[channel][..len],
                        centre_ms,
                    );
                    active_core.process(&ctx, channel, &mut self.wet[channel][..len], centre_ms);
                }
            }
            SwitchActivity::Crossfading { outgoing, incoming } => {
                let (outgoing_core, incoming_core) = self.bank.pair_mut(outgoing, incoming);
                for channel in 0..channel_count {
                    self.incoming[channel][..len].copy_from_slice(&self.wet[channel][..len]);
                    incoming_core.process(
                        &ctx,
                        channel,
                        &mut self.incoming[channel][..len],
                        centre_ms,
                    );
                    outgoing_core.process(&ctx, channel, &mut self.wet[channel][..len], centre_ms);
                }
                for channel in 0..channel_count {
                    let (wet, incoming) = (&mut self.wet[channel], &self.incoming[channel]);
                    for i in 0..len {
                        let progress = self.switcher.fade_progress(i);
                        let (gain_out, gain_in) = equal_power_gains(progress, tuning.fade_bias);
                        let duck = duck_gain(progress, tuning.duck_depth, tuning.duck_width);
                        wet[i] = duck * (gain_out * wet[i] + gain_in * incoming[i]);
                    }
                }
            }
        }

        if let Some(started) = self.switcher.advance(len, &tuning, sample_rate) {
            self.bank.get_mut(started).reset();
        }

        for channel in 0..channel_count {
            self.wet_post.process(
                channel,
                &mut self.wet[channel][..len],
                snapshot.family,
                color,
                &tuning,
                sample_rate,
            );
        }

        for i in 0..len {
            let mix = self.mix.next();
            left[i] = self.dry[0][i] + mix * (self.wet[0][i] - self.dry[0][i]);
            if let Some(r) = right.as_deref_mut() {
                r[i] = self.dry[1][i] + mix * (self.wet[1][i] - self.dry[1][i]);
            }
        }

        if let Some(r) = right {
            apply_width(left, r, width);
            self.compressor.process_stereo(left, r, &tuning, sample_rate);
        } else {
            self.compressor.process_mono(left, &tuning, sample_rate);
        }
    }
}
