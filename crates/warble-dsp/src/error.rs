//! Error types for warble-dsp.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(usize),

    #[error("Invalid oversampling factor: {0}. Must be 1, 2 or 4")]
    InvalidFactor(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
