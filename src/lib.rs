//! # Warble - Real-time Vibrato Engine
//!
//! A continuously modulated vibrato: the input is read back through a
//! per-channel fractional delay line whose delay is driven by a pair of
//! modulation sources, with anti-aliasing oversampling around the modulated
//! read, optional mid/side stereo processing and a latency-aligned dry/wet
//! blend.
//!
//! ## Architecture
//!
//! - **warble-core** - runtime kernel: lock-free parameter targets, one-pole
//!   smoothing, patch state, visualization snapshot slot
//! - **warble-dsp** - DSP blocks: modulators and routing, fractional delay,
//!   oversampler, mid/side encoder, dry/wet processor
//! - **warble** (this crate) - [`WarbleEngine`], the host-facing facade
//!
//! ## Quick start
//!
//! ```
//! use warble::{ParamId, WarbleEngine};
//!
//! let mut engine = WarbleEngine::builder().oversampling(2).build().unwrap();
//! engine.prepare(48000.0, 512, 2).unwrap();
//!
//! // control thread: write targets, consumed at the next block boundary
//! let params = engine.params();
//! params.set(ParamId::Depth, 0.5);
//! params.set(ParamId::Rate0, 5.0);
//!
//! // audio thread: one call per block, allocation-free
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! let mut buffers: [&mut [f32]; 2] = [&mut left, &mut right];
//! engine.process(&mut buffers);
//! ```
//!
//! ## Threading
//!
//! [`WarbleEngine::process`] runs on the real-time audio thread and never
//! allocates, blocks or panics. [`ParamHandle`] is the control-thread
//! surface: scalar targets are atomic stores, whole patches are published
//! through a swap slot and applied coherently at the next block start.
//! `prepare` may allocate and must not race `process` (host guarantee).

/// Re-export of warble-core for direct access.
pub use warble_core as core;

/// Re-export of warble-dsp for direct access.
pub use warble_dsp as dsp;

pub use warble_core::{
    Error, ParamId, ParameterRange, ParameterScale, PatchState, Result, SmoothedValue,
    VizSnapshot, VizState,
};

pub use warble_dsp::{ModShape, StereoMode, NUM_MODULATORS};

mod engine;
pub use engine::{ParamHandle, WarbleEngine};

mod builder;
pub use builder::WarbleEngineBuilder;
