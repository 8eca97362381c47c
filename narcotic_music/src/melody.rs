// Melody generation: parameter draws and pitch-sequence expansion.
//
// A melody is one progression template replayed `repetitions + 1` times.
// The template never changes; after each pass the key modulates (see
// `chart::next_key`) and the mode flips, so the same degree pattern walks
// through a chain of related keys. That drift is the whole "chord
// progression".
//
// Random draws happen in a fixed order so a seed reproduces a melody
// exactly: repetitions, instrument, octave, starting key, template, then one
// humanization draw per note (in timing.rs).
//
// `Melody::generate` is the full pipeline. `Melody::from_params` skips the
// parameter draws, for callers that want to pin them.

use crate::chart::{self, KEY_COUNT, Mode};
use crate::config::{GeneratorConfig, MAX_REPETITIONS};
use crate::error::{MelodyError, Result};
use crate::mood::Mood;
use crate::timing::{self, NoteEvent};
use log::debug;
use narcotic_prng::PhraseRng;
use serde::Serialize;

/// The randomly drawn shape of one melody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MelodyParams {
    /// The template plays `repetitions + 1` times.
    pub repetitions: usize,
    /// General MIDI program number.
    pub instrument: u8,
    pub octave: u8,
    /// Row in the key chart for the first pass (0-14).
    pub starting_key: usize,
    /// Scale degrees replayed on every pass.
    pub template: Vec<usize>,
}

impl MelodyParams {
    /// Draw every parameter for `mood` from `rng`.
    pub fn draw(mood: Mood, config: &GeneratorConfig, rng: &mut PhraseRng) -> Self {
        let repetitions = rng.range_usize_inclusive(config.repetitions_min, config.repetitions_max);
        let instrument = rng.range_u8_inclusive(0, config.instrument_max);
        let octave = rng.range_u8_inclusive(config.octave_min, config.octave_max);
        let starting_key = rng.range_usize(0, KEY_COUNT);
        let template = rng
            .choose(mood.templates())
            .map(|t| t.to_vec())
            .unwrap_or_default();

        debug!(
            "drew {mood} params: repetitions={repetitions} instrument={instrument} \
             octave={octave} starting_key={starting_key} template={template:?}"
        );

        MelodyParams {
            repetitions,
            instrument,
            octave,
            starting_key,
            template,
        }
    }

    /// Number of pitches expansion will produce.
    pub fn pitch_count(&self) -> usize {
        (self.repetitions + 1) * self.template.len()
    }

    /// Check pinned parameters against MIDI limits. Pitch range is checked
    /// during expansion, where the chart offsets are known.
    pub fn validate(&self) -> Result<()> {
        if self.instrument > 127 {
            return Err(MelodyError::InvalidConfig(format!(
                "instrument {} exceeds 127",
                self.instrument
            )));
        }
        if self.repetitions > MAX_REPETITIONS {
            return Err(MelodyError::InvalidConfig(format!(
                "repetitions {} exceeds {MAX_REPETITIONS}",
                self.repetitions
            )));
        }
        Ok(())
    }
}

/// Expand the template into absolute MIDI pitches, modulating after each pass.
pub fn expand_pitches(initial_mode: Mode, params: &MelodyParams) -> Result<Vec<u8>> {
    let shift = 12 * i16::from(params.octave);
    let mut pitches = Vec::with_capacity(params.pitch_count());
    let mut mode = initial_mode;
    let mut key = params.starting_key;

    for pass in 0..=params.repetitions {
        for &degree in &params.template {
            let pitch = i16::from(chart::chart(mode, key, degree)?) + shift;
            if !(0..=127).contains(&pitch) {
                return Err(MelodyError::InvalidConfig(format!(
                    "octave {} puts pitch {pitch} outside 0-127",
                    params.octave
                )));
            }
            pitches.push(pitch as u8);
        }
        let (next_mode, next_key) = chart::next_key(mode, key);
        debug!("pass {pass}: {mode:?} {key} -> {next_mode:?} {next_key}");
        mode = next_mode;
        key = next_key;
    }

    Ok(pitches)
}

/// A generated melody. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Melody {
    mood: Mood,
    tempo: u32,
    params: MelodyParams,
    pitches: Vec<u8>,
    events: Vec<NoteEvent>,
}

impl Melody {
    /// Run the full pipeline: draw parameters, expand, humanize.
    pub fn generate(
        mood: Mood,
        tempo: u32,
        config: &GeneratorConfig,
        rng: &mut PhraseRng,
    ) -> Result<Self> {
        check_inputs(tempo, config)?;
        let params = MelodyParams::draw(mood, config, rng);
        let pitches = expand_pitches(mood.initial_mode(), &params)?;
        let events = timing::humanize(&pitches, config, rng)?;
        Ok(Melody {
            mood,
            tempo,
            params,
            pitches,
            events,
        })
    }

    /// Build a melody from fixed parameters. `is_delayed` decides the
    /// half-beat pushes, as in `timing::schedule_events`.
    pub fn from_params(
        mood: Mood,
        tempo: u32,
        params: MelodyParams,
        config: &GeneratorConfig,
        is_delayed: impl FnMut(usize) -> bool,
    ) -> Result<Self> {
        check_inputs(tempo, config)?;
        params.validate()?;
        let pitches = expand_pitches(mood.initial_mode(), &params)?;
        let events = timing::schedule_events(&pitches, config, is_delayed)?;
        Ok(Melody {
            mood,
            tempo,
            params,
            pitches,
            events,
        })
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    /// Beats per minute, passed through to the track.
    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn params(&self) -> &MelodyParams {
        &self.params
    }

    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    /// Every event in output order. The last one is the silent tail.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// The sounding notes, without the tail.
    pub fn notes(&self) -> &[NoteEvent] {
        &self.events[..self.events.len() - 1]
    }

    pub fn tail(&self) -> &NoteEvent {
        &self.events[self.events.len() - 1]
    }

    /// Human-readable starting key, e.g. "F# minor".
    pub fn starting_key_name(&self) -> String {
        let mode = self.mood.initial_mode();
        let name = chart::key_name(mode, self.params.starting_key).unwrap_or("?");
        match mode {
            Mode::Major => format!("{name} major"),
            Mode::Minor => format!("{name} minor"),
        }
    }
}

fn check_inputs(tempo: u32, config: &GeneratorConfig) -> Result<()> {
    if tempo == 0 {
        return Err(MelodyError::InvalidTempo(tempo));
    }
    config.validate()
}
