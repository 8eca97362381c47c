// Data-driven generator configuration.
//
// Every tunable number the generator uses lives in `GeneratorConfig`: the
// ranges the random parameters are drawn from, the humanization odds, the
// silent tail, and the MIDI resolution. `Default` gives the stock values;
// `from_json` loads overrides from a file (missing fields keep their default).
// `data/default_config.json` spells out the stock values as a starting point
// for `--config`.
// `validate` is called by both `from_json` and the generator so a bad config
// can never push a pitch or velocity outside MIDI's 0-127.

use crate::chart;
use crate::error::{MelodyError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound for `repetitions_max` and for pinned repetition counts.
pub const MAX_REPETITIONS: usize = 256;

/// Upper bound for `tail_duration_beats`.
pub const MAX_TAIL_BEATS: u32 = 64;

/// Tunable parameters for one melody generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Inclusive range for the repetition count. The template is played
    /// `repetitions + 1` times.
    pub repetitions_min: usize,
    pub repetitions_max: usize,
    /// Upper bound (inclusive) of the General MIDI program drawn per melody.
    pub instrument_max: u8,
    /// Inclusive octave range. Every pitch is shifted by `12 * octave`.
    pub octave_min: u8,
    pub octave_max: u8,
    /// Velocity of every sounding note.
    pub velocity: u8,
    /// Number of equally likely humanization outcomes drawn per note.
    pub delay_outcomes: usize,
    /// The outcome that pushes a note half a beat early.
    pub delay_outcome: usize,
    /// Pitch of the silent closing note.
    pub tail_pitch: u8,
    /// Length of the silent closing note, in whole beats.
    pub tail_duration_beats: u32,
    /// MIDI resolution. Must be even so half-beats land on whole ticks.
    pub ticks_per_quarter: u16,
    /// MIDI channel for every event (0-15).
    pub channel: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            repetitions_min: 5,
            repetitions_max: 15,
            instrument_max: 104,
            octave_min: 4,
            octave_max: 7,
            velocity: 100,
            delay_outcomes: 3,
            delay_outcome: 1,
            tail_pitch: 1,
            tail_duration_beats: 2,
            ticks_per_quarter: 480,
            channel: 0,
        }
    }
}

impl GeneratorConfig {
    /// Parse a config from a JSON string and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GeneratorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and MIDI limits.
    pub fn validate(&self) -> Result<()> {
        if self.repetitions_min > self.repetitions_max {
            return Err(invalid(format!(
                "repetitions_min {} exceeds repetitions_max {}",
                self.repetitions_min, self.repetitions_max
            )));
        }
        if self.repetitions_max > MAX_REPETITIONS {
            return Err(invalid(format!(
                "repetitions_max {} exceeds {MAX_REPETITIONS}",
                self.repetitions_max
            )));
        }
        if self.tail_duration_beats > MAX_TAIL_BEATS {
            return Err(invalid(format!(
                "tail_duration_beats {} exceeds {MAX_TAIL_BEATS}",
                self.tail_duration_beats
            )));
        }
        if self.octave_min > self.octave_max {
            return Err(invalid(format!(
                "octave_min {} exceeds octave_max {}",
                self.octave_min, self.octave_max
            )));
        }
        let (lowest, highest) = self.pitch_bounds();
        if lowest < 0 || highest > 127 {
            return Err(invalid(format!(
                "octaves {}-{} put pitches at {lowest}..={highest}, outside 0-127",
                self.octave_min, self.octave_max
            )));
        }
        if self.instrument_max > 127 {
            return Err(invalid(format!("instrument_max {} exceeds 127", self.instrument_max)));
        }
        if self.velocity > 127 {
            return Err(invalid(format!("velocity {} exceeds 127", self.velocity)));
        }
        if self.tail_pitch > 127 {
            return Err(invalid(format!("tail_pitch {} exceeds 127", self.tail_pitch)));
        }
        if self.delay_outcome >= self.delay_outcomes {
            return Err(invalid(format!(
                "delay_outcome {} must be below delay_outcomes {}",
                self.delay_outcome, self.delay_outcomes
            )));
        }
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter % 2 != 0 {
            return Err(invalid(format!(
                "ticks_per_quarter {} must be a positive even number",
                self.ticks_per_quarter
            )));
        }
        // Keep the top bit clear: midly's SMF timing field is 15 bits.
        if self.ticks_per_quarter > 0x7fff {
            return Err(invalid(format!(
                "ticks_per_quarter {} exceeds 32767",
                self.ticks_per_quarter
            )));
        }
        if self.channel > 15 {
            return Err(invalid(format!("channel {} exceeds 15", self.channel)));
        }
        Ok(())
    }

    /// Lowest and highest pitch the charts can produce at the configured
    /// octave range.
    pub fn pitch_bounds(&self) -> (i32, i32) {
        let (lo, hi) = chart::offset_bounds();
        (
            i32::from(lo) + 12 * i32::from(self.octave_min),
            i32::from(hi) + 12 * i32::from(self.octave_max),
        )
    }
}

fn invalid(msg: String) -> MelodyError {
    MelodyError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GeneratorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.pitch_bounds(), (47, 96));
    }

    #[test]
    fn test_shipped_config_matches_default() {
        let json = include_str!("../data/default_config.json");
        assert_eq!(GeneratorConfig::from_json(json).unwrap(), GeneratorConfig::default());
    }

    #[test]
    fn test_from_json_partial_override() {
        let config = GeneratorConfig::from_json(r#"{ "velocity": 80, "octave_max": 5 }"#).unwrap();
        assert_eq!(config.velocity, 80);
        assert_eq!(config.octave_max, 5);
        assert_eq!(config.repetitions_min, 5);
    }

    #[test]
    fn test_roundtrip_json() {
        let config = GeneratorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(GeneratorConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            GeneratorConfig::from_json("{ not json"),
            Err(MelodyError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let config = GeneratorConfig {
            repetitions_min: 9,
            repetitions_max: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MelodyError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_pitches_outside_midi() {
        let config = GeneratorConfig {
            octave_max: 10,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MelodyError::InvalidConfig(_))));

        let config = GeneratorConfig {
            octave_min: 0,
            ..Default::default()
        };
        // -1 + 0 is below MIDI 0.
        assert!(matches!(config.validate(), Err(MelodyError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_oversized_lengths() {
        assert!(matches!(
            GeneratorConfig::from_json(r#"{ "tail_duration_beats": 3000000000 }"#),
            Err(MelodyError::InvalidConfig(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_json(r#"{ "repetitions_max": 1000000000 }"#),
            Err(MelodyError::InvalidConfig(_))
        ));

        let at_limit = GeneratorConfig {
            repetitions_max: MAX_REPETITIONS,
            tail_duration_beats: MAX_TAIL_BEATS,
            ..Default::default()
        };
        at_limit.validate().unwrap();
    }

    #[test]
    fn test_rejects_unreachable_delay_outcome() {
        let config = GeneratorConfig {
            delay_outcomes: 1,
            delay_outcome: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MelodyError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_odd_resolution() {
        let config = GeneratorConfig {
            ticks_per_quarter: 481,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MelodyError::InvalidConfig(_))));
    }
}
