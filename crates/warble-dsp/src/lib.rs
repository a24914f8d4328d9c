//! RT-safe DSP building blocks for the Warble vibrato engine: modulation
//! sources and routing, fractional delay, oversampling, mid/side encoding
//! and latency-aligned dry/wet blending.
//!
//! Every type here allocates only in its `prepare` call; the per-block
//! processing paths are allocation-free and never panic.

mod error;
pub use error::{Error, Result};

mod delay;
pub use delay::{AlignDelay, FractionalDelayLine, KERNEL_HALF_WIDTH};

mod modulator;
pub use modulator::{ModShape, Modulator};

mod modmatrix;
pub use modmatrix::{ModulationSystem, NUM_MODULATORS};

mod vibrato;
pub use vibrato::VibratoProcessor;

mod oversampling;
pub use oversampling::Oversampler;

mod midside;
pub use midside::{decode, encode, StereoMode};

mod drywet;
pub use drywet::DryWetProcessor;
