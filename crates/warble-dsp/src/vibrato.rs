//! The vibrato wet path: a per-channel delay line whose read position is
//! driven by the modulation signal.
//!
//! Per sample: write the input, compute
//! `delay = base + (base - min) * depth * mod`, read at the fractional
//! position behind the write head, advance. The requested delay is clamped
//! inside the delay line, so a pathological control trajectory can never
//! read unwritten memory.

use crate::delay::{FractionalDelayLine, KERNEL_HALF_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Prepared,
}

pub struct VibratoProcessor {
    lines: Vec<FractionalDelayLine>,
    max_base_delay: f32,
    state: State,
}

impl VibratoProcessor {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            max_base_delay: 0.0,
            state: State::Uninitialized,
        }
    }

    /// Sizes one delay line per channel for the current processing rate.
    ///
    /// `max_base_delay` is the largest center delay (in samples at the
    /// processing rate) the control plane can request; full-depth modulation
    /// swings the read head between roughly zero and twice that, which fixes
    /// the capacity. May allocate; not called from the audio path.
    pub fn prepare(&mut self, channels: usize, max_base_delay: f32) {
        let capacity = (2.0 * max_base_delay).ceil() as usize + 2 * KERNEL_HALF_WIDTH;
        self.lines = (0..channels).map(|_| FractionalDelayLine::new(capacity)).collect();
        self.max_base_delay = max_base_delay;
        self.state = State::Prepared;
    }

    pub fn reset(&mut self) {
        for line in self.lines.iter_mut() {
            line.clear();
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.state == State::Prepared
    }

    pub fn channels(&self) -> usize {
        self.lines.len()
    }

    /// Process one channel in place.
    ///
    /// `mods` is the routed modulation signal in -1..1, `depth` and `base`
    /// are per-sample smoothed control buffers (depth in 0..1, base in
    /// samples at the processing rate). All buffers hold `samples.len()`
    /// values.
    pub fn process_channel(&mut self, ch: usize, samples: &mut [f32], mods: &[f32], depth: &[f32], base: &[f32]) {
        let Some(line) = self.lines.get_mut(ch) else {
            return;
        };

        let min_delay = KERNEL_HALF_WIDTH as f32;
        for i in 0..samples.len() {
            let center = base[i];
            let span = (center - min_delay).max(0.0);
            let delay = center + span * depth[i] * mods[i];
            samples[i] = line.read_write(samples[i], delay);
        }
    }
}

impl Default for VibratoProcessor {
    fn default() -> Self {
        Self::new()
    }
}
