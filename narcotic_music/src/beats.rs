// Exact beat positions.
//
// Note starts can be pushed half a beat early, so times are stored as a
// count of half-beats rather than as floats. Conversion to MIDI ticks is a
// single integer multiply.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A time or duration in beats, held as a whole number of half-beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Beats(u32);

impl Beats {
    pub const ZERO: Beats = Beats(0);
    pub const HALF: Beats = Beats(1);

    /// `n` whole beats.
    pub fn whole(n: u32) -> Self {
        Beats(n * 2)
    }

    pub fn from_half_beats(halves: u32) -> Self {
        Beats(halves)
    }

    pub fn half_beats(self) -> u32 {
        self.0
    }

    /// `self - HALF`, or `None` at zero.
    pub fn half_beat_earlier(self) -> Option<Beats> {
        self.0.checked_sub(1).map(Beats)
    }

    /// MIDI ticks at `ticks_per_quarter` resolution (one beat = one quarter).
    pub fn to_ticks(self, ticks_per_quarter: u16) -> u32 {
        self.0 * u32::from(ticks_per_quarter) / 2
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl std::ops::Add for Beats {
    type Output = Beats;

    fn add(self, rhs: Beats) -> Beats {
        Beats(self.0 + rhs.0)
    }
}

impl fmt::Display for Beats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}
