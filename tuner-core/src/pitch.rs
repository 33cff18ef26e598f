//! # Pitch Detection Module
//!
//! Time-domain autocorrelation pitch estimation for a single window of
//! audio. The scan is greedy: it stops at the first correlation peak
//! above the threshold instead of searching for the global best lag,
//! which keeps latency low at the cost of occasional octave errors on
//! harmonically rich input.
//!
//! ## Features
//! - RMS energy gate to reject silence and faint noise
//! - Normalized autocorrelation over the first half of the window
//! - Early exit at the first falling peak above the threshold

use crate::buffer::SignalBuffer;
use crate::config::TunerConfig;
use crate::error::PitchError;

/// RMS below which a window is treated as silence.
pub const SILENCE_THRESHOLD: f32 = 0.01;

/// Normalized correlation a lag must exceed to be considered periodic.
pub const CORRELATION_THRESHOLD: f32 = 0.9;

/// Why no frequency was produced for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoPitchReason {
    /// RMS below the silence threshold.
    Silent,
    /// The scan finished without a qualifying correlation peak.
    NoPeriodicity,
}

/// Outcome of a single estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchEstimate {
    NoPitch(NoPitchReason),
    /// Estimated fundamental in Hz.
    Frequency(f32),
}

impl PitchEstimate {
    pub fn frequency(&self) -> Option<f32> {
        match *self {
            PitchEstimate::Frequency(hz) => Some(hz),
            PitchEstimate::NoPitch(_) => None,
        }
    }
}

/// Autocorrelation pitch estimator.
///
/// Holds only thresholds, so a single instance can be reused for every
/// window of a session and estimating the same window twice always gives
/// the same answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimator {
    pub silence_threshold: f32,
    pub correlation_threshold: f32,
}

impl Default for PitchEstimator {
    fn default() -> Self {
        Self {
            silence_threshold: SILENCE_THRESHOLD,
            correlation_threshold: CORRELATION_THRESHOLD,
        }
    }
}

impl PitchEstimator {
    pub fn from_config(config: &TunerConfig) -> Self {
        Self {
            silence_threshold: config.silence_threshold,
            correlation_threshold: config.correlation_threshold,
        }
    }

    /// Estimates the fundamental frequency of `buffer`.
    ///
    /// # Arguments
    /// * `buffer` - Validated window of samples
    /// * `sample_rate` - Sample rate in Hz, must be positive
    ///
    /// # Returns
    /// * `Frequency(hz)` - `sample_rate / lag` for the first falling peak
    /// * `NoPitch(Silent)` - RMS below the silence threshold
    /// * `NoPitch(NoPeriodicity)` - no qualifying peak (or a zero sample rate)
    pub fn estimate(&self, buffer: &SignalBuffer, sample_rate: u32) -> PitchEstimate {
        if sample_rate == 0 {
            return PitchEstimate::NoPitch(NoPitchReason::NoPeriodicity);
        }

        // --- Energy gate ---
        if buffer.rms() < self.silence_threshold {
            return PitchEstimate::NoPitch(NoPitchReason::Silent);
        }

        match find_first_peak_lag(buffer.samples(), self.correlation_threshold as f64) {
            // A peak at lag zero would mean an infinite frequency.
            Some(0) | None => PitchEstimate::NoPitch(NoPitchReason::NoPeriodicity),
            Some(lag) => PitchEstimate::Frequency(sample_rate as f32 / lag as f32),
        }
    }

    /// Validates raw samples and estimates their pitch.
    ///
    /// Fails fast on structurally invalid input instead of guessing.
    pub fn estimate_samples(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<PitchEstimate, PitchError> {
        if sample_rate == 0 {
            return Err(PitchError::InvalidSampleRate);
        }
        let buffer = SignalBuffer::from_slice(samples)?;
        Ok(self.estimate(&buffer, sample_rate))
    }
}

/// Normalized correlation of the first half of `signal` with itself
/// shifted by `lag`.
pub fn correlation(signal: &[f32], lag: usize) -> f64 {
    let half = signal.len() / 2;
    let sum: f64 = signal[..half]
        .iter()
        .zip(&signal[lag..lag + half])
        .map(|(&a, &b)| a as f64 * b as f64)
        .sum();
    sum / half as f64
}

/// Scans lags `0..len/2` and returns the lag of the first correlation
/// peak above `threshold`.
///
/// A lag becomes the candidate while correlation is above the threshold
/// and still rising; the first lag that breaks that run ends the scan.
/// The previous correlation starts at 1.0, so lag zero only qualifies
/// when its correlation exceeds 1.
fn find_first_peak_lag(signal: &[f32], threshold: f64) -> Option<usize> {
    let mut best_lag = None;
    let mut last_correlation = 1.0;

    for lag in 0..signal.len() / 2 {
        let current = correlation(signal, lag);
        if current > threshold && current > last_correlation {
            best_lag = Some(lag);
        } else if best_lag.is_some() {
            return best_lag;
        }
        last_correlation = current;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 44_100;
    const SIZE: usize = 2048;
    // The 0.9 threshold is absolute, so a sine needs amplitude above ~1.35
    // to register while staying below the lag-zero guard at ~1.41.
    const HOT_AMPLITUDE: f32 = 1.38;

    fn sine(freq: f32, amplitude: f32) -> Vec<f32> {
        (0..SIZE)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    /// Deterministic white noise in [-amplitude, amplitude].
    fn noise(amplitude: f32) -> Vec<f32> {
        let mut state: u32 = 0x2545_f491;
        (0..SIZE)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32 * 2.0 - 1.0) * amplitude
            })
            .collect()
    }

    fn estimate(samples: Vec<f32>) -> PitchEstimate {
        let buffer = SignalBuffer::new(samples).unwrap();
        PitchEstimator::default().estimate(&buffer, SAMPLE_RATE)
    }

    #[test]
    fn silence_has_no_pitch() {
        assert_eq!(
            estimate(vec![0.0; SIZE]),
            PitchEstimate::NoPitch(NoPitchReason::Silent)
        );
    }

    #[test]
    fn faint_sine_is_gated() {
        assert_eq!(
            estimate(sine(440.0, 0.005)),
            PitchEstimate::NoPitch(NoPitchReason::Silent)
        );
    }

    #[test]
    fn noise_has_no_periodicity() {
        assert_eq!(
            estimate(noise(0.5)),
            PitchEstimate::NoPitch(NoPitchReason::NoPeriodicity)
        );
    }

    #[test]
    fn quiet_sine_never_crosses_threshold() {
        // Peak correlation of a unit sine is 0.5, below the 0.9 threshold.
        assert_eq!(
            estimate(sine(440.0, 1.0)),
            PitchEstimate::NoPitch(NoPitchReason::NoPeriodicity)
        );
    }

    #[test]
    fn detects_sine_frequencies_within_one_lag() {
        let tolerance = SAMPLE_RATE as f32 / SIZE as f32;
        for freq in [294.0, 392.0, 440.0] {
            let hz = estimate(sine(freq, HOT_AMPLITUDE))
                .frequency()
                .unwrap_or_else(|| panic!("no pitch for {freq} Hz"));
            assert!(
                (hz - freq).abs() <= tolerance,
                "expected ~{freq} Hz, got {hz} Hz"
            );
        }
    }

    #[test]
    fn lag_zero_peak_does_not_divide_by_zero() {
        // Correlation of a hot DC signal is 2.25 at every lag, so lag zero
        // is the only candidate.
        assert_eq!(
            estimate(vec![1.5; SIZE]),
            PitchEstimate::NoPitch(NoPitchReason::NoPeriodicity)
        );
    }

    #[test]
    fn estimation_is_repeatable() {
        let buffer = SignalBuffer::new(sine(440.0, HOT_AMPLITUDE)).unwrap();
        let estimator = PitchEstimator::default();
        assert_eq!(
            estimator.estimate(&buffer, SAMPLE_RATE),
            estimator.estimate(&buffer, SAMPLE_RATE)
        );
    }

    #[test]
    fn raw_samples_are_validated() {
        let estimator = PitchEstimator::default();
        assert!(matches!(
            estimator.estimate_samples(&[], SAMPLE_RATE),
            Err(PitchError::InvalidBuffer(_))
        ));
        assert!(matches!(
            estimator.estimate_samples(&[0.3], SAMPLE_RATE),
            Err(PitchError::InvalidBuffer(_))
        ));
        assert_eq!(
            estimator.estimate_samples(&[0.0; 4], 0),
            Err(PitchError::InvalidSampleRate)
        );
        assert_eq!(
            estimator.estimate_samples(&[0.0; 4], SAMPLE_RATE),
            Ok(PitchEstimate::NoPitch(NoPitchReason::Silent))
        );
    }

    #[test]
    fn two_sample_buffer_is_handled() {
        assert_eq!(
            estimate(vec![0.5, -0.5]),
            PitchEstimate::NoPitch(NoPitchReason::NoPeriodicity)
        );
    }

    #[test]
    fn correlation_at_lag_zero_is_mean_power_of_first_half() {
        let signal = [1.0, -1.0, 0.0, 0.0];
        assert!((correlation(&signal, 0) - 1.0).abs() < 1e-12);
        assert!((correlation(&signal, 1) - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn lower_threshold_from_config_accepts_unit_sine() {
        let config = TunerConfig {
            correlation_threshold: 0.45,
            ..TunerConfig::default()
        };
        let buffer = SignalBuffer::new(sine(440.0, 1.0)).unwrap();
        let hz = PitchEstimator::from_config(&config)
            .estimate(&buffer, SAMPLE_RATE)
            .frequency()
            .unwrap();
        assert!((hz - 440.0).abs() < 10.0, "got {hz} Hz");
    }
}
