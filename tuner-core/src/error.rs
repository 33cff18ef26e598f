//! # Error Types
//!
//! Structural failures of the core. Musical edge cases (silence, noise)
//! are not errors: they surface as `PitchEstimate::NoPitch`.

use thiserror::Error;

/// Why a block of samples was rejected before estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidBufferReason {
    /// Fewer than two samples, so no lag can be evaluated.
    TooShort { len: usize },
    /// The correlation window is half the buffer, so the length must be even.
    OddLength { len: usize },
    /// A NaN or infinite sample at the given position.
    NonFinite { index: usize },
}

impl std::fmt::Display for InvalidBufferReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "buffer of {len} samples is shorter than 2"),
            Self::OddLength { len } => write!(f, "buffer length {len} is not even"),
            Self::NonFinite { index } => write!(f, "sample {index} is not finite"),
        }
    }
}

/// Errors returned by the pitch estimation pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitchError {
    #[error("invalid buffer: {0}")]
    InvalidBuffer(InvalidBufferReason),

    #[error("sample rate must be positive")]
    InvalidSampleRate,
}

/// Errors returned when a configuration fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("buffer size {0} must be a non-zero even number")]
    BufferSize(usize),

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
}
