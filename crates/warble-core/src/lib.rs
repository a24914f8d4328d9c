//! Runtime kernel for the Warble vibrato engine.
//!
//! Everything in this crate is either lock-free or only touched outside the
//! audio callback:
//!
//! - [`AtomicFloat`] / [`AtomicFlag`]: cross-thread parameter targets
//! - [`SmoothedValue`]: one-pole per-sample smoothing of those targets
//! - [`ParamId`] / [`ParameterRange`] / [`PatchState`]: the parameter surface
//!   and its serializable snapshot
//! - [`VizState`]: single-writer slot the audio thread publishes
//!   visualization values into

pub mod error;
pub use error::{Error, Result};

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat};

pub mod smooth;
pub use smooth::SmoothedValue;

pub mod parameter;
pub use parameter::{ParamId, Params, ParameterRange, ParameterScale, PatchState};

pub mod snapshot;
pub use snapshot::{VizSnapshot, VizState};
