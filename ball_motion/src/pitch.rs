//! Stroke measurement → MIDI pitch.

use crate::config::TrackerConfig;
use crate::error::PitchRangeWarning;
use crate::geometry::Position;

/// One measured stroke between two anchor points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeMeasurement {
    pub from:          Position,
    pub to:            Position,
    /// Length in pixels.
    pub distance:      f64,
    /// Length in physical units, floored.
    pub size_estimate: u32,
    /// Note after clamping into 0–127.
    pub note:          u8,
    /// Set when the raw pitch had to be clamped.
    pub clamped:       Option<PitchRangeWarning>,
}

impl StrokeMeasurement {
    /// Measure the segment `from → to`.
    pub fn measure(from: Position, to: Position, config: &TrackerConfig) -> Self {
        let distance      = from.distance(to);
        let size_estimate = (distance / config.pixels_per_unit).floor() as u32;
        let (note, clamped) = clamp_note(config.pitch.raw_note(distance));
        StrokeMeasurement { from, to, distance, size_estimate, note, clamped }
    }

    /// Whether the stroke is large enough to sound.
    pub fn passes_gate(&self, config: &TrackerConfig) -> bool {
        self.size_estimate >= config.min_size
    }
}

/// Clamp a raw note number into the MIDI range.
pub fn clamp_note(raw: i64) -> (u8, Option<PitchRangeWarning>) {
    let clamped = raw.clamp(0, 127) as u8;
    if clamped as i64 == raw {
        (clamped, None)
    } else {
        (clamped, Some(PitchRangeWarning { computed: raw, clamped }))
    }
}
