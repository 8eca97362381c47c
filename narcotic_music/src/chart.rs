// Harmonic model: key charts and the modulation rule.
//
// Each mode (major, minor) has a chart of 15 keys. A key's row lists the
// seven scale degrees as semitone offsets from pitch class 0 (C). Offsets may
// fall just outside 0..12 (e.g. -1 for a Cb, 12 for a B#); the generator adds
// `12 * octave` afterwards, so those land a semitone below or above the
// octave rather than wrapping. Rows 11-14 spell keys that already appear
// earlier (Cb = B, Db = C#, ...). The increment fallback below only ever
// lands on 0-11, so rows 12-14 are reached either as the starting key or
// through an explicit adjacency pair.
//
// Modulation walks a circle-of-fifths adjacency: position `p` in the major
// list corresponds to position `p` in the minor list, and every step flips
// the mode. Keys missing from the current mode's list step up by one key
// index (mod 12) instead.
//
// The tables are `const` data, never built or mutated at runtime. One minor
// row (12, D#) repeats a degree (`3, 3`); the charts are reproduced as-is.
//
// See `melody.rs` for the expansion loop that drives `chart` and `next_key`.

use crate::error::{MelodyError, Result};
use serde::{Deserialize, Serialize};

/// Number of keys in each chart.
pub const KEY_COUNT: usize = 15;

/// Number of scale degrees per key.
pub const DEGREE_COUNT: usize = 7;

/// Keys reachable through the `(key + 1) mod 12` fallback.
const FALLBACK_KEY_COUNT: usize = 12;

/// Major or minor. Selects the chart and flips on every modulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    /// The other mode.
    pub fn flipped(self) -> Mode {
        match self {
            Mode::Major => Mode::Minor,
            Mode::Minor => Mode::Major,
        }
    }

    fn table(self) -> &'static [[i8; DEGREE_COUNT]; KEY_COUNT] {
        match self {
            Mode::Major => &MAJOR_CHART,
            Mode::Minor => &MINOR_CHART,
        }
    }

    fn adjacency(self) -> &'static [usize; 12] {
        match self {
            Mode::Major => &MAJOR_ADJACENCY,
            Mode::Minor => &MINOR_ADJACENCY,
        }
    }
}

#[rustfmt::skip]
const MAJOR_CHART: [[i8; DEGREE_COUNT]; KEY_COUNT] = [
    [ 9, 11,  1,  2,  4,  6,  8], // A
    [11,  1,  3,  4,  6,  8, 10], // B
    [ 0,  2,  4,  5,  7,  9, 11], // C
    [ 2,  4,  6,  7,  9, 11,  1], // D
    [ 4,  6,  8,  9, 11,  1,  3], // E
    [ 5,  7,  9, 10,  0,  2,  4], // F
    [ 7,  9, 11,  0,  2,  4,  6], // G
    [ 1,  3,  5,  6,  8, 10, 12], // C#
    [ 6,  8, 10, 11,  1,  3,  5], // F#
    [ 8, 10,  0,  1,  3,  5,  7], // Ab
    [10,  0,  2,  3,  5,  7,  9], // Bb
    [-1,  1,  3,  4,  6,  8, 10], // Cb
    [ 1,  3,  5,  6,  8, 10,  0], // Db
    [ 3,  5,  7,  8, 10,  0,  2], // Eb
    [ 6,  8, 10, -1,  1,  3,  5], // Gb
];

#[rustfmt::skip]
const MINOR_CHART: [[i8; DEGREE_COUNT]; KEY_COUNT] = [
    [ 9, 11,  0,  2,  4,  5,  7], // A
    [11,  1,  2,  4,  6,  7,  9], // B
    [ 0,  2,  3,  5,  7,  8, 10], // C
    [ 2,  4,  5,  7,  9, 10,  0], // D
    [ 4,  6,  7,  9, 11,  0,  2], // E
    [ 5,  7,  8, 10,  0,  1,  3], // F
    [ 7,  9, 10,  0,  2,  3,  5], // G
    [ 1,  3,  4,  6,  8,  9, 11], // C#
    [ 6,  8,  9, 11,  1,  2,  4], // F#
    [ 8, 10, -1,  1,  3,  4,  6], // Ab
    [10,  0,  2,  3,  5,  7,  8], // Bb
    [-1,  1,  3,  4,  6,  8, 10], // Cb
    [ 3,  3,  6,  8, 10, 11,  1], // D#
    [ 3,  5,  6,  8, 10, -1,  1], // Eb
    [ 8, 10, 11,  1,  3,  4,  6], // G#
];

const MAJOR_KEY_NAMES: [&str; KEY_COUNT] = [
    "A", "B", "C", "D", "E", "F", "G", "C#", "F#", "Ab", "Bb", "Cb", "Db", "Eb", "Gb",
];

const MINOR_KEY_NAMES: [&str; KEY_COUNT] = [
    "A", "B", "C", "D", "E", "F", "G", "C#", "F#", "Ab", "Bb", "Cb", "D#", "Eb", "G#",
];

/// Circle-of-fifths pairing: `MAJOR_ADJACENCY[p]` <-> `MINOR_ADJACENCY[p]`.
const MAJOR_ADJACENCY: [usize; 12] = [2, 6, 3, 0, 4, 1, 8, 12, 9, 13, 10, 5];
const MINOR_ADJACENCY: [usize; 12] = [0, 4, 1, 8, 7, 14, 12, 10, 5, 2, 6, 3];

/// Semitone offset of `degree` in key `key_index` of `mode`.
pub fn chart(mode: Mode, key_index: usize, degree: usize) -> Result<i8> {
    mode.table()
        .get(key_index)
        .and_then(|row| row.get(degree))
        .copied()
        .ok_or(MelodyError::IndexOutOfRange { key_index, degree })
}

/// Modulate from `(mode, key_index)` to the next key. The mode always flips.
pub fn next_key(mode: Mode, key_index: usize) -> (Mode, usize) {
    let next_mode = mode.flipped();
    let next_index = match mode.adjacency().iter().position(|&k| k == key_index) {
        Some(p) => next_mode.adjacency()[p],
        None => (key_index + 1) % FALLBACK_KEY_COUNT,
    };
    (next_mode, next_index)
}

/// Display name of a key, e.g. "C#" or "Eb". `None` outside 0-14.
pub fn key_name(mode: Mode, key_index: usize) -> Option<&'static str> {
    let names = match mode {
        Mode::Major => &MAJOR_KEY_NAMES,
        Mode::Minor => &MINOR_KEY_NAMES,
    };
    names.get(key_index).copied()
}

/// Smallest and largest offsets across both charts.
pub fn offset_bounds() -> (i8, i8) {
    MAJOR_CHART
        .iter()
        .chain(MINOR_CHART.iter())
        .flatten()
        .fold((i8::MAX, i8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
