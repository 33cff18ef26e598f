// tuner-core/src/lib.rs

//! The core logic for the chromatic tuner.
//! This crate is responsible for audio capture, pitch detection,
//! and note mapping. It is completely headless
//! and contains no GUI code.

pub mod audio;
pub mod buffer;
pub mod config;
pub mod error;
pub mod pitch;
pub mod session;
pub mod tuning;

pub use buffer::SignalBuffer;
pub use config::TunerConfig;
pub use error::{ConfigError, InvalidBufferReason, PitchError};
pub use pitch::{NoPitchReason, PitchEstimate, PitchEstimator};
pub use session::{CaptureSource, PresentationSink, Session, TickOutcome};
pub use tuning::{NoteEntry, TuningMode};

/// Represents the result of a single tuning cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningResult {
    /// The note the frequency was compared against.
    pub note: &'static NoteEntry,
    /// The detected frequency in Hz.
    pub frequency_hz: f32,
    /// The deviation from the note in whole cents.
    pub detune_cents: i32,
}

impl TuningResult {
    /// Horizontal displacement of the tuning indicator from its centre.
    pub fn indicator_offset(&self, px_per_cent: f32) -> f32 {
        self.detune_cents as f32 * px_per_cent
    }

    pub fn frequency_label(&self) -> String {
        format!("Frequency: {:.2} Hz", self.frequency_hz)
    }

    pub fn detune_label(&self) -> String {
        format!("Detune: {} cents", self.detune_cents)
    }
}
