//! Modulation sources.
//!
//! A [`Modulator`] is a phase-accumulator signal generator producing a
//! normalized control signal at the processing sample rate. The shape set is
//! a closed enum; selection is a tag match, not dynamic dispatch. All
//! randomness comes from a deterministic xorshift state, so a given
//! parameter trajectory always produces the same control signal.

use std::f32::consts::TAU;

/// Waveform of a modulator slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModShape {
    /// Bipolar sine, -1..1.
    #[default]
    Sine,
    /// Bipolar triangle, -1..1.
    Triangle,
    /// Sample-and-hold random value per cycle, -1..1.
    RandomHold,
    /// Linear ramp between successive random values, -1..1.
    RandomSmooth,
    /// Envelope follower on the input amplitude, 0..1.
    EnvFollow,
}

impl ModShape {
    pub fn all() -> &'static [ModShape] {
        &[
            ModShape::Sine,
            ModShape::Triangle,
            ModShape::RandomHold,
            ModShape::RandomSmooth,
            ModShape::EnvFollow,
        ]
    }

    /// Stepped parameter value → shape; out-of-range indices clamp to the
    /// last shape.
    pub fn from_index(index: usize) -> ModShape {
        let all = Self::all();
        all[index.min(all.len() - 1)]
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModShape::Sine => "Sine",
            ModShape::Triangle => "Triangle",
            ModShape::RandomHold => "Random",
            ModShape::RandomSmooth => "Random (Smooth)",
            ModShape::EnvFollow => "Envelope",
        }
    }

    /// Evaluate a phase-driven shape. `EnvFollow` is stateful and handled by
    /// the [`Modulator`] itself.
    #[inline]
    fn evaluate(&self, phase: f32) -> f32 {
        match self {
            ModShape::Sine => (phase * TAU).sin(),
            ModShape::Triangle => {
                let p = phase * 4.0;
                if p < 1.0 {
                    p
                } else if p < 3.0 {
                    2.0 - p
                } else {
                    p - 4.0
                }
            }
            ModShape::RandomHold | ModShape::RandomSmooth | ModShape::EnvFollow => 0.0,
        }
    }
}

/// Deterministic xorshift32 sample-and-hold state.
#[derive(Debug, Clone)]
struct RandomState {
    current: f32,
    previous: f32,
    last_phase: f32,
    seed: u32,
}

impl RandomState {
    fn new(seed: u32) -> Self {
        Self {
            current: 0.0,
            previous: 0.0,
            last_phase: 0.0,
            seed: seed.max(1),
        }
    }

    fn next(&mut self) -> f32 {
        self.seed ^= self.seed << 13;
        self.seed ^= self.seed >> 17;
        self.seed ^= self.seed << 5;
        (self.seed as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Draw a new value whenever the phase wraps.
    fn update_for_phase(&mut self, phase: f32) {
        if phase < self.last_phase - 0.5 {
            self.previous = self.current;
            self.current = self.next();
        }
        self.last_phase = phase;
    }

    fn held(&self) -> f32 {
        self.current
    }

    fn smoothed(&self, phase: f32) -> f32 {
        self.previous + (self.current - self.previous) * phase
    }
}

/// One modulation slot: shape + phase accumulator + follower state.
///
/// Output is stereo: channel 0 is the primary signal, channel 1 a
/// decorrelated sibling (quadrature phase for oscillator shapes, an
/// independent random stream for the random shapes, identical for the
/// envelope follower). The router blends between them by the width amount.
#[derive(Debug, Clone)]
pub struct Modulator {
    shape: ModShape,
    rate_hz: f32,
    phase: f32,
    sample_rate: f32,
    random: RandomState,
    random_r: RandomState,
    envelope: f32,
    attack_secs: f32,
    release_secs: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

/// Phase offset of the right-channel oscillator tap.
const QUADRATURE: f32 = 0.25;

impl Modulator {
    pub fn new(shape: ModShape, rate_hz: f32, seed: u32) -> Self {
        let sample_rate = 48000.0;
        let attack_secs = 0.010;
        let release_secs = 0.150;
        Self {
            shape,
            rate_hz: rate_hz.max(0.0),
            phase: 0.0,
            sample_rate,
            random: RandomState::new(seed),
            random_r: RandomState::new(seed.wrapping_mul(0x9E37_79B9) | 1),
            envelope: 0.0,
            attack_secs,
            release_secs,
            attack_coeff: time_to_coeff(attack_secs, sample_rate),
            release_coeff: time_to_coeff(release_secs, sample_rate),
        }
    }

    pub fn shape(&self) -> ModShape {
        self.shape
    }

    /// Changing shape keeps phase and follower state; the slot stays
    /// continuous across the switch.
    pub fn set_shape(&mut self, shape: ModShape) {
        self.shape = shape;
    }

    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz.clamp(0.0, self.sample_rate * 0.5);
    }

    pub fn rate(&self) -> f32 {
        self.rate_hz
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.attack_coeff = time_to_coeff(self.attack_secs, sample_rate);
        self.release_coeff = time_to_coeff(self.release_secs, sample_rate);
    }

    pub fn set_envelope_times(&mut self, attack_secs: f32, release_secs: f32) {
        self.attack_secs = attack_secs.max(0.0);
        self.release_secs = release_secs.max(0.0);
        self.attack_coeff = time_to_coeff(self.attack_secs, self.sample_rate);
        self.release_coeff = time_to_coeff(self.release_secs, self.sample_rate);
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.envelope = 0.0;
        self.random = RandomState::new(self.random.seed);
        self.random_r = RandomState::new(self.random_r.seed);
    }

    /// Advance one sample. `input` feeds the envelope follower; the other
    /// shapes ignore it.
    #[inline]
    pub fn tick(&mut self, input: f32) -> (f32, f32) {
        let out = match self.shape {
            ModShape::RandomHold => {
                self.random.update_for_phase(self.phase);
                self.random_r.update_for_phase(self.phase);
                (self.random.held(), self.random_r.held())
            }
            ModShape::RandomSmooth => {
                self.random.update_for_phase(self.phase);
                self.random_r.update_for_phase(self.phase);
                (
                    self.random.smoothed(self.phase),
                    self.random_r.smoothed(self.phase),
                )
            }
            ModShape::EnvFollow => {
                let level = input.abs();
                let coeff = if level > self.envelope {
                    self.attack_coeff
                } else {
                    self.release_coeff
                };
                self.envelope = coeff * self.envelope + (1.0 - coeff) * level;
                let v = self.envelope.clamp(0.0, 1.0);
                (v, v)
            }
            shape => (
                shape.evaluate(self.phase),
                shape.evaluate((self.phase + QUADRATURE) % 1.0),
            ),
        };

        self.phase += self.rate_hz / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }

    /// Render a block into per-channel control buffers.
    #[inline]
    pub fn advance(&mut self, input: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        for i in 0..input.len() {
            let (l, r) = self.tick(input[i]);
            out_l[i] = l;
            out_r[i] = r;
        }
    }
}

#[inline]
fn time_to_coeff(time_secs: f32, sample_rate: f32) -> f32 {
    if time_secs <= 0.0 {
        0.0
    } else {
        (-1.0 / (time_secs * sample_rate)).exp()
    }
}
