// Error types for melody generation and MIDI output.
//
// The core generator only fails on bad input (unknown mood, zero tempo, an
// unusable config) or on a broken table invariant. Writing the track adds the
// I/O failures of the output file. Nothing here is retried: every error is
// returned straight to the caller of `Melody::generate` / `write_file`.

use thiserror::Error;

/// Result type alias for melody operations.
pub type Result<T> = std::result::Result<T, MelodyError>;

/// Errors that can occur while generating or writing a melody.
#[derive(Debug, Error)]
pub enum MelodyError {
    /// Mood text that is not one of sad / energetic / creepy.
    #[error("unknown mood '{0}' (expected sad, energetic or creepy)")]
    InvalidMood(String),

    /// A chart lookup outside rows 0-14 or degrees 0-6. The built-in tables
    /// never produce one, so seeing this means the table data is broken.
    #[error("chart index out of range: key {key_index}, degree {degree}")]
    IndexOutOfRange { key_index: usize, degree: usize },

    /// Expansion produced no pitches, so there is nothing to write except
    /// the silent tail.
    #[error("melody has no notes to emit")]
    EmptyEventSequence,

    /// Tempo of zero beats per minute.
    #[error("tempo must be a positive number of beats per minute, got {0}")]
    InvalidTempo(u32),

    /// Config values that fail validation.
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    /// Config JSON that does not parse.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// IO error while writing the output file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
