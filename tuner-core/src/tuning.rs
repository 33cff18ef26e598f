//! # Musical Tuning Module
//!
//! Maps a detected frequency onto the fixed 12-note equal-tempered table
//! (C4 to B4) and measures the deviation in cents.
//!
//! ## Features
//! - Constant note table, shared read-only across sessions
//! - Closest-note lookup with lower-note preference on exact ties
//! - Cent deviation rounded to the nearest whole cent
//! - Manual target selection by note name

/// Represents a single reference note with its name and frequency.
#[derive(Debug, PartialEq)]
pub struct NoteEntry {
    /// Note name (e.g., "A", "C#")
    pub name: &'static str,
    /// Reference frequency in Hz
    pub frequency: f32,
}

/// One octave of reference notes, sorted by frequency.
pub static NOTE_TABLE: [NoteEntry; 12] = [
    NoteEntry { name: "C", frequency: 261.63 },
    NoteEntry { name: "C#", frequency: 277.18 },
    NoteEntry { name: "D", frequency: 293.66 },
    NoteEntry { name: "D#", frequency: 311.13 },
    NoteEntry { name: "E", frequency: 329.63 },
    NoteEntry { name: "F", frequency: 349.23 },
    NoteEntry { name: "F#", frequency: 369.99 },
    NoteEntry { name: "G", frequency: 392.00 },
    NoteEntry { name: "G#", frequency: 415.30 },
    NoteEntry { name: "A", frequency: 440.00 },
    NoteEntry { name: "A#", frequency: 466.16 },
    NoteEntry { name: "B", frequency: 493.88 },
];

/// Which note the detune is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TuningMode {
    /// Follow the closest note to whatever is played.
    #[default]
    Auto,
    /// Always compare against a chosen note.
    Manual(&'static NoteEntry),
}

impl TuningMode {
    /// Resolves the note a frequency should be compared against.
    pub fn target_for(&self, freq: f32) -> &'static NoteEntry {
        match *self {
            TuningMode::Auto => closest_note(freq),
            TuningMode::Manual(note) => note,
        }
    }
}

/// Finds the table entry closest to `freq`.
///
/// Later entries only win on a strictly smaller distance, so an exact
/// tie keeps the lower note. Frequencies outside the octave map to the
/// nearest edge (C or B).
pub fn closest_note(freq: f32) -> &'static NoteEntry {
    closest_in(&NOTE_TABLE[0], &NOTE_TABLE[1..], freq)
}

fn closest_in<'a>(first: &'a NoteEntry, rest: &'a [NoteEntry], freq: f32) -> &'a NoteEntry {
    rest.iter().fold(first, |closest, note| {
        if (note.frequency - freq).abs() < (closest.frequency - freq).abs() {
            note
        } else {
            closest
        }
    })
}

/// Looks a note up by name ("A", "C#", ...).
pub fn note_by_name(name: &str) -> Option<&'static NoteEntry> {
    NOTE_TABLE.iter().find(|note| note.name == name)
}

/// Calculates the deviation of `freq` from `note` in whole cents.
///
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values are sharp, negative values are flat
///
/// Halfway values round away from zero.
pub fn detune(freq: f32, note: &NoteEntry) -> i32 {
    (1200.0 * (freq as f64 / note.frequency as f64).log2()).round() as i32
}
