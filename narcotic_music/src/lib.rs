// Narcotic Melodies
//
// Procedural melody generator. A mood (sad, energetic, creepy) picks a short
// progression template; the template is replayed several times while the
// key walks a circle-of-fifths chain and flips between major and minor. The
// resulting pitches get a light, random half-beat push for a humanized feel
// and are written out as a single-track Standard MIDI File.
//
// Architecture:
// - chart.rs: Major/minor key charts, modulation adjacency, `chart`/`next_key`
// - mood.rs: Mood enum and its progression template pools
// - melody.rs: Parameter draws, pitch expansion, the `Melody` entity
// - timing.rs: Note events, half-beat humanization, silent closing tail
// - beats.rs: Exact half-beat time type
// - midi.rs: `TrackWriter` boundary and the midly-backed SMF writer
// - config.rs: `GeneratorConfig`, every tunable number in one place
// - error.rs: `MelodyError` and the crate `Result` alias
//
// The generator is deterministic given a seed: all randomness comes from a
// caller-supplied `narcotic_prng::PhraseRng`.

pub mod beats;
pub mod chart;
pub mod config;
pub mod error;
pub mod melody;
pub mod midi;
pub mod mood;
pub mod timing;

pub use error::{MelodyError, Result};
