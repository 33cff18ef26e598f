//! # Session Module
//!
//! The per-tick tuning loop. A `Session` owns everything one open audio
//! session needs (capture source, estimator, tuning mode) so no global
//! state is involved; an external driver calls [`Session::tick`] once
//! per frame and nothing here schedules itself.

use crate::buffer::SignalBuffer;
use crate::pitch::{NoPitchReason, PitchEstimate, PitchEstimator};
use crate::tuning::{self, TuningMode};
use crate::TuningResult;

/// Supplies fixed-length sample windows for an open audio session.
pub trait CaptureSource {
    /// Sample rate in Hz, constant for the lifetime of the session.
    fn sample_rate(&self) -> u32;

    /// The newest complete window, or `None` if nothing arrived since
    /// the last call.
    fn next_buffer(&mut self) -> Option<SignalBuffer>;
}

/// Receives results worth displaying.
pub trait PresentationSink {
    fn present(&mut self, result: &TuningResult);
}

impl<F: FnMut(&TuningResult)> PresentationSink for F {
    fn present(&mut self, result: &TuningResult) {
        self(result)
    }
}

/// What happened during a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// A pitch was found and handed to the sink.
    Tuned(TuningResult),
    /// A window was analysed but held no usable pitch.
    NoPitch(NoPitchReason),
    /// The capture source had no new window.
    NoBuffer,
}

/// Runs one window through estimation and note mapping.
pub fn analyze(
    buffer: &SignalBuffer,
    sample_rate: u32,
    estimator: &PitchEstimator,
    mode: &TuningMode,
) -> Result<TuningResult, NoPitchReason> {
    match estimator.estimate(buffer, sample_rate) {
        PitchEstimate::Frequency(frequency_hz) => {
            let note = mode.target_for(frequency_hz);
            Ok(TuningResult {
                note,
                frequency_hz,
                detune_cents: tuning::detune(frequency_hz, note),
            })
        }
        PitchEstimate::NoPitch(reason) => Err(reason),
    }
}

/// State of one open tuning session.
#[derive(Debug)]
pub struct Session<S> {
    source: S,
    estimator: PitchEstimator,
    mode: TuningMode,
}

impl<S: CaptureSource> Session<S> {
    pub fn new(source: S, estimator: PitchEstimator) -> Self {
        Self {
            source,
            estimator,
            mode: TuningMode::Auto,
        }
    }

    pub fn mode(&self) -> TuningMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TuningMode) {
        self.mode = mode;
    }

    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Pulls a window, estimates its pitch and presents the result.
    ///
    /// The sink is only invoked for `Tuned`; on every other outcome the
    /// previously presented values are left alone.
    pub fn tick<P: PresentationSink>(&mut self, sink: &mut P) -> TickOutcome {
        let Some(buffer) = self.source.next_buffer() else {
            return TickOutcome::NoBuffer;
        };

        match analyze(&buffer, self.source.sample_rate(), &self.estimator, &self.mode) {
            Ok(result) => {
                log::trace!(
                    "[TICK] {} at {:.2} Hz ({} cents)",
                    result.note.name,
                    result.frequency_hz,
                    result.detune_cents
                );
                sink.present(&result);
                TickOutcome::Tuned(result)
            }
            Err(reason) => {
                log::trace!("[TICK] No pitch: {:?}", reason);
                TickOutcome::NoPitch(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 44_100;

    struct QueueSource(VecDeque<SignalBuffer>);

    impl CaptureSource for QueueSource {
        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }

        fn next_buffer(&mut self) -> Option<SignalBuffer> {
            self.0.pop_front()
        }
    }

    fn sine(freq: f32) -> SignalBuffer {
        let samples = (0..2048)
            .map(|i| 1.38 * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        SignalBuffer::new(samples).unwrap()
    }

    fn session(buffers: Vec<SignalBuffer>) -> Session<QueueSource> {
        Session::new(QueueSource(buffers.into()), PitchEstimator::default())
    }

    #[test]
    fn sink_only_sees_tuned_ticks() {
        let silence = SignalBuffer::new(vec![0.0; 2048]).unwrap();
        let mut session = session(vec![sine(440.0), silence]);
        let mut presented = Vec::new();
        let mut sink = |r: &TuningResult| presented.push(*r);

        let first = session.tick(&mut sink);
        let second = session.tick(&mut sink);
        let third = session.tick(&mut sink);

        assert!(matches!(first, TickOutcome::Tuned(r) if r.note.name == "A"));
        assert_eq!(second, TickOutcome::NoPitch(NoPitchReason::Silent));
        assert_eq!(third, TickOutcome::NoBuffer);
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].note.name, "A");
    }

    #[test]
    fn manual_mode_measures_against_chosen_note() {
        let mut session = session(vec![sine(440.0)]);
        let g = tuning::note_by_name("G").unwrap();
        session.set_mode(TuningMode::Manual(g));

        let TickOutcome::Tuned(result) = session.tick(&mut |_: &TuningResult| {}) else {
            panic!("expected a pitch");
        };
        assert_eq!(result.note.name, "G");
        // A is two semitones above G.
        assert!((result.detune_cents - 200).abs() <= 10, "{}", result.detune_cents);
    }

    #[test]
    fn analyze_reports_no_pitch_reason() {
        let noise_free_dc = SignalBuffer::new(vec![0.001; 2048]).unwrap();
        assert_eq!(
            analyze(&noise_free_dc, SAMPLE_RATE, &PitchEstimator::default(), &TuningMode::Auto),
            Err(NoPitchReason::Silent)
        );
    }
}
