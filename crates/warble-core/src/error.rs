//! Error types for warble-core.

use thiserror::Error;

/// Error type for configuration-time failures.
///
/// The audio path never returns these; numerical edge cases inside the
/// callback are recovered locally by clamping.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid sample rate: {0} Hz. Must be between 8000 and 384000")]
    InvalidSampleRate(f64),

    #[error("Unsupported channel layout: {0} channels. Only mono and stereo are supported")]
    UnsupportedChannelLayout(usize),

    #[error("Invalid block size: {0}. Must be at least 1 frame")]
    InvalidBlockSize(usize),

    #[error("Invalid oversampling factor: {0}. Must be 1, 2 or 4")]
    InvalidOversamplingFactor(usize),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
