// Moods and their progression templates.
//
// A mood picks the starting mode and a pool of progression templates. A
// template is a short list of scale degrees (0-6) that gets replayed once per
// repetition while the key drifts underneath it; its length (3-5 here) sets
// the phrase rhythm. The energetic pool lists `[3, 4, 3]` twice, which
// doubles its chance of being picked.

use crate::chart::Mode;
use crate::error::MelodyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One progression template: scale degrees indexed into a chart row.
pub type Template = &'static [usize];

const SAD_TEMPLATES: [Template; 6] = [
    &[0, 3, 4, 4],
    &[0, 5, 3, 4],
    &[0, 4, 5, 3],
    &[0, 0, 3, 5],
    &[0, 5, 1, 4],
    &[0, 5, 2, 3],
];

const ENERGETIC_TEMPLATES: [Template; 7] = [
    &[0, 2, 3, 5],
    &[0, 3, 4],
    &[3, 4, 3],
    &[0, 3, 0, 4],
    &[3, 4, 3],
    &[0, 2, 5, 3],
    &[0, 1, 2, 3, 4],
];

const CREEPY_TEMPLATES: [Template; 3] = [&[0, 5, 3, 5], &[3, 2, 3], &[5, 4, 6]];

/// Mood category requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Sad,
    Energetic,
    Creepy,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Sad, Mood::Energetic, Mood::Creepy];

    /// The mode the first repetition is read in.
    pub fn initial_mode(self) -> Mode {
        match self {
            Mood::Energetic => Mode::Major,
            Mood::Sad | Mood::Creepy => Mode::Minor,
        }
    }

    /// The template pool. Never empty.
    pub fn templates(self) -> &'static [Template] {
        match self {
            Mood::Sad => &SAD_TEMPLATES,
            Mood::Energetic => &ENERGETIC_TEMPLATES,
            Mood::Creepy => &CREEPY_TEMPLATES,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mood::Sad => "sad",
            Mood::Energetic => "energetic",
            Mood::Creepy => "creepy",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mood {
    type Err = MelodyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sad" => Ok(Mood::Sad),
            "energetic" => Ok(Mood::Energetic),
            "creepy" => Ok(Mood::Creepy),
            _ => Err(MelodyError::InvalidMood(s.to_string())),
        }
    }
}
