// Event timing: turns a pitch sequence into timed note events.
//
// Pitch `i` starts on beat `i` and lasts one beat. Each note draws one of
// `delay_outcomes` equally likely outcomes; hitting `delay_outcome` pushes
// that note half a beat early, which gives the phrase a loose, syncopated
// feel. The first note is never pushed. The push only moves that one note:
// the next note still starts on its own integer beat.
//
// A silent, two-beat note is appended at the last note's beat so players
// don't cut the track off the moment the final note is released. The tail
// always sits on the last note's integer beat, even when that note was
// pushed early, so it never starts before the final note's slot.

use crate::beats::Beats;
use crate::config::GeneratorConfig;
use crate::error::{MelodyError, Result};
use narcotic_prng::PhraseRng;
use serde::{Deserialize, Serialize};

/// One note handed to the track writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch (0-127).
    pub pitch: u8,
    pub start: Beats,
    pub duration: Beats,
    /// 0 for the silent tail.
    pub velocity: u8,
}

impl NoteEvent {
    pub fn end(&self) -> Beats {
        self.start + self.duration
    }
}

/// Schedule `pitches` with random half-beat pushes drawn from `rng`.
///
/// Draws exactly one value per pitch, in order, including the first.
pub fn humanize(
    pitches: &[u8],
    config: &GeneratorConfig,
    rng: &mut PhraseRng,
) -> Result<Vec<NoteEvent>> {
    schedule_events(pitches, config, |_| {
        rng.range_usize(0, config.delay_outcomes) == config.delay_outcome
    })
}

/// Schedule `pitches`, asking `is_delayed(i)` whether note `i` is pushed
/// early. `is_delayed` is called once per pitch in order; its answer for
/// index 0 is ignored.
///
/// The last element of the result is always the silent tail.
pub fn schedule_events(
    pitches: &[u8],
    config: &GeneratorConfig,
    mut is_delayed: impl FnMut(usize) -> bool,
) -> Result<Vec<NoteEvent>> {
    if pitches.is_empty() {
        return Err(MelodyError::EmptyEventSequence);
    }

    let one_beat = Beats::whole(1);
    let mut events = Vec::with_capacity(pitches.len() + 1);
    let mut last_beat = Beats::ZERO;

    for (i, &pitch) in pitches.iter().enumerate() {
        let beat = Beats::whole(i as u32);
        let start = match (is_delayed(i), beat.half_beat_earlier()) {
            (true, Some(pushed)) => pushed,
            _ => beat,
        };
        events.push(NoteEvent {
            pitch,
            start,
            duration: one_beat,
            velocity: config.velocity,
        });
        last_beat = beat;
    }

    events.push(NoteEvent {
        pitch: config.tail_pitch,
        start: last_beat,
        duration: Beats::whole(config.tail_duration_beats),
        velocity: 0,
    });

    Ok(events)
}
