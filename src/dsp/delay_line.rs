use crate::dsp::interp;

/// Ring buffer with fractional-delay reads.
///
/// Capacity is always a power of two so wraparound is a mask instead of a
/// branch or a modulo. A delay of `d` samples reads the sample written `d`
/// writes ago; reads are expected to happen before the write for the
/// current step, so `tap(1)` is the most recent stored sample.
pub struct DelayLine {
    buffer: Vec<f32>,
    mask: usize,
    write_pos: usize,
}

impl DelayLine {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            mask: 0,
            write_pos: 0,
        }
    }

    /// Resize to hold at least `min_samples`, rounded up to a power of two.
    /// Clears the stored signal. May allocate; call from `prepare` only.
    pub fn prepare(&mut self, min_samples: usize) {
        let size = min_samples.max(4).next_power_of_two();
        if self.buffer.len() != size {
            self.buffer = vec![0.0; size];
        } else {
            self.buffer.fill(0.0);
        }
        self.mask = size - 1;
        self.write_pos = 0;
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) & self.mask;
    }

    /// Sample written `delay` steps ago (1 = most recent).
    #[inline]
    pub fn tap(&self, delay: usize) -> f32 {
        self.buffer[self.write_pos.wrapping_sub(delay) & self.mask]
    }

    #[inline]
    pub fn read_linear(&self, delay: f32) -> f32 {
        let delay = delay.max(1.0);
        let whole = delay as usize;
        let frac = delay - whole as f32;
        interp::linear(self.tap(whole), self.tap(whole + 1), frac)
    }

    #[inline]
    pub fn read_catmull_rom(&self, delay: f32) -> f32 {
        let delay = delay.max(2.0);
        let whole = delay as usize;
        let frac = delay - whole as f32;
        interp::catmull_rom(
            self.tap(whole - 1),
            self.tap(whole),
            self.tap(whole + 1),
            self.tap(whole + 2),
            frac,
        )
    }

    #[inline]
    pub fn read_hermite(&self, delay: f32, tension: f32) -> f32 {
        let delay = delay.max(2.0);
        let whole = delay as usize;
        let frac = delay - whole as f32;
        interp::hermite(
            self.tap(whole - 1),
            self.tap(whole),
            self.tap(whole + 1),
            self.tap(whole + 2),
            frac,
            tension,
        )
    }

    #[inline]
    pub fn read_lagrange3(&self, delay: f32) -> f32 {
        let delay = delay.max(2.0);
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let window = [
            self.tap(whole - 1),
            self.tap(whole),
            self.tap(whole + 1),
            self.tap(whole + 2),
        ];
        interp::lagrange3(&window, frac)
    }

    #[inline]
    pub fn read_lagrange5(&self, delay: f32) -> f32 {
        let delay = delay.max(3.0);
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let window = [
            self.tap(whole - 2),
            self.tap(whole - 1),
            self.tap(whole),
            self.tap(whole + 1),
            self.tap(whole + 2),
            self.tap(whole + 3),
        ];
        interp::lagrange5(&window, frac)
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}
