//! Modulation routing.
//!
//! A fixed pair of [`Modulator`] slots is rendered at the processing sample
//! rate and crossfaded into one control signal per channel. Summation order
//! is the fixed slot order, so results are reproducible for a given
//! parameter trajectory. Granularity is per-sample: the crossfade and width
//! inputs are audio-rate control buffers produced by the engine's smoothers.

use crate::modulator::{ModShape, Modulator};

/// Number of simultaneously active modulator slots.
pub const NUM_MODULATORS: usize = 2;

/// Owns the modulator slots and routes their output to the vibrato depth
/// destination.
pub struct ModulationSystem {
    modulators: [Modulator; NUM_MODULATORS],
    // raw per-slot stereo renderings
    scratch_l: [Vec<f32>; NUM_MODULATORS],
    scratch_r: [Vec<f32>; NUM_MODULATORS],
    // routed per-channel output
    out: [Vec<f32>; 2],
}

impl ModulationSystem {
    pub fn new() -> Self {
        Self {
            modulators: [
                Modulator::new(ModShape::Sine, 2.0, 0x5EED_0001),
                Modulator::new(ModShape::RandomHold, 0.25, 0x5EED_0002),
            ],
            scratch_l: [Vec::new(), Vec::new()],
            scratch_r: [Vec::new(), Vec::new()],
            out: [Vec::new(), Vec::new()],
        }
    }

    /// Sizes scratch buffers and retunes the slots for the processing
    /// (possibly oversampled) rate. May allocate; not called from `process`.
    pub fn prepare(&mut self, sample_rate: f32, max_frames: usize) {
        for m in self.modulators.iter_mut() {
            m.set_sample_rate(sample_rate);
        }
        for s in self.scratch_l.iter_mut().chain(self.scratch_r.iter_mut()) {
            s.clear();
            s.resize(max_frames, 0.0);
        }
        for o in self.out.iter_mut() {
            o.clear();
            o.resize(max_frames, 0.0);
        }
    }

    pub fn reset(&mut self) {
        for m in self.modulators.iter_mut() {
            m.reset();
        }
    }

    pub fn set_shape(&mut self, slot: usize, shape: ModShape) {
        if let Some(m) = self.modulators.get_mut(slot) {
            m.set_shape(shape);
        }
    }

    pub fn set_rate(&mut self, slot: usize, rate_hz: f32) {
        if let Some(m) = self.modulators.get_mut(slot) {
            m.set_rate(rate_hz);
        }
    }

    pub fn set_envelope_times(&mut self, attack_secs: f32, release_secs: f32) {
        for m in self.modulators.iter_mut() {
            m.set_envelope_times(attack_secs, release_secs);
        }
    }

    /// Advance all slots and route them.
    ///
    /// `input` feeds the envelope follower shape, `mod_mix` crossfades slot 0
    /// toward slot 1, `width` spreads the right channel toward its
    /// decorrelated sibling. All buffers must hold `frames` samples.
    pub fn process(&mut self, input: &[f32], mod_mix: &[f32], width: &[f32], frames: usize) {
        debug_assert!(frames <= self.out[0].len());
        let frames = frames.min(self.out[0].len());

        for (slot, m) in self.modulators.iter_mut().enumerate() {
            m.advance(
                &input[..frames],
                &mut self.scratch_l[slot][..frames],
                &mut self.scratch_r[slot][..frames],
            );
        }

        for i in 0..frames {
            // fixed slot order: 0 then 1
            let a_l = self.scratch_l[0][i];
            let b_l = self.scratch_l[1][i];
            let a_r = self.scratch_r[0][i];
            let b_r = self.scratch_r[1][i];

            let mm = mod_mix[i];
            let left = a_l + mm * (b_l - a_l);
            let right_raw = a_r + mm * (b_r - a_r);
            let right = left + width[i] * (right_raw - left);

            self.out[0][i] = left.clamp(-1.0, 1.0);
            self.out[1][i] = right.clamp(-1.0, 1.0);
        }
    }

    /// Routed control signal for a channel. Mono callers read channel 0.
    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        &self.out[ch.min(1)]
    }
}

impl Default for ModulationSystem {
    fn default() -> Self {
        Self::new()
    }
}
