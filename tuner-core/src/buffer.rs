//! # Signal Buffer Module
//!
//! A fixed window of time-domain samples handed over by the capture
//! source once per cycle. Validation happens here, once, so the
//! estimator can assume a well-formed block.

use crate::error::{InvalidBufferReason, PitchError};

/// A validated, immutable block of audio samples.
///
/// Invariants: at least two samples, even length, every sample finite.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBuffer {
    samples: Vec<f32>,
}

impl SignalBuffer {
    /// Takes ownership of `samples` after checking the buffer invariants.
    pub fn new(samples: Vec<f32>) -> Result<Self, PitchError> {
        validate(&samples)?;
        Ok(Self { samples })
    }

    /// Copies `samples` into a new buffer.
    pub fn from_slice(samples: &[f32]) -> Result<Self, PitchError> {
        validate(samples)?;
        Ok(Self {
            samples: samples.to_vec(),
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a validated buffer; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Root-mean-square amplitude over the whole buffer.
    pub fn rms(&self) -> f32 {
        rms(&self.samples)
    }
}

/// Root-mean-square amplitude of `samples`, 0.0 for an empty slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

fn validate(samples: &[f32]) -> Result<(), PitchError> {
    let len = samples.len();
    if len < 2 {
        return Err(PitchError::InvalidBuffer(InvalidBufferReason::TooShort { len }));
    }
    if len % 2 != 0 {
        return Err(PitchError::InvalidBuffer(InvalidBufferReason::OddLength { len }));
    }
    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(PitchError::InvalidBuffer(InvalidBufferReason::NonFinite { index }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_single_sample_buffers() {
        assert_eq!(
            SignalBuffer::new(vec![]),
            Err(PitchError::InvalidBuffer(InvalidBufferReason::TooShort { len: 0 }))
        );
        assert_eq!(
            SignalBuffer::from_slice(&[0.5]),
            Err(PitchError::InvalidBuffer(InvalidBufferReason::TooShort { len: 1 }))
        );
    }

    #[test]
    fn rejects_odd_length() {
        let err = SignalBuffer::new(vec![0.0; 7]).unwrap_err();
        assert_eq!(err, PitchError::InvalidBuffer(InvalidBufferReason::OddLength { len: 7 }));
    }

    #[test]
    fn rejects_non_finite_samples() {
        let mut samples = vec![0.1; 8];
        samples[5] = f32::NAN;
        let err = SignalBuffer::new(samples).unwrap_err();
        assert_eq!(err, PitchError::InvalidBuffer(InvalidBufferReason::NonFinite { index: 5 }));

        let mut samples = vec![0.1; 8];
        samples[2] = f32::INFINITY;
        assert!(SignalBuffer::new(samples).is_err());
    }

    #[test]
    fn rms_of_constant_signal_is_its_magnitude() {
        let buffer = SignalBuffer::new(vec![-0.5; 16]).unwrap();
        assert!((buffer.rms() - 0.5).abs() < 1e-6);
        assert_eq!(buffer.len(), 16);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn rms_of_empty_slice_is_zero() {
        assert_eq!(rms(&[]), 0.0);
    }
}
