//! Tunable constants of the stroke tracker.
//!
//! Every field has a default, so an empty TOML table deserialises to the
//! standard tuning:
//!
//! | field | default |
//! |---|---|
//! | `distance_threshold` | 1 px |
//! | `sample_interval` | 4 frames |
//! | `angle_delta_threshold` | 0.3 rad |
//! | `pixels_per_unit` | 111 / 47 |
//! | `pitch` | 69 − (10/75)·d + 24 |
//! | `min_size` | 3 |
//! | `stable_samples` | 3 |
//!
//! `sample_interval` is limited to 1–1024 and `stable_samples` to 2–64.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted `sample_interval`.
pub const MAX_SAMPLE_INTERVAL: u32 = 1024;
/// Largest accepted `stable_samples`.
pub const MAX_STABLE_SAMPLES: usize = 64;

// ════════════════════════════════════════════════════════════════════════════
// PitchLine
// ════════════════════════════════════════════════════════════════════════════

/// Linear map from stroke length (pixels) to MIDI note number:
/// `reference − slope·distance + offset`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchLine {
    pub reference: f64,
    pub slope:     f64,
    pub offset:    f64,
}

impl Default for PitchLine {
    fn default() -> Self {
        PitchLine { reference: 69.0, slope: 10.0 / 75.0, offset: 24.0 }
    }
}

impl PitchLine {
    /// Unclamped, rounded note for a stroke of `distance` pixels.
    pub fn raw_note(&self, distance: f64) -> i64 {
        (self.reference - self.slope * distance + self.offset).round() as i64
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackerConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Displacement (px) above which a frame counts as movement.
    pub distance_threshold:    f64,
    /// Moving frames between stroke reductions.
    pub sample_interval:       u32,
    /// Minimum direction change (rad) that counts as a new stroke.
    pub angle_delta_threshold: f64,
    /// Pixels per physical unit, used for the size gate.
    pub pixels_per_unit:       f64,
    pub pitch:                 PitchLine,
    /// Strokes whose size estimate is below this emit nothing.
    pub min_size:              u32,
    /// Consecutive identical samples that confirm rest.
    pub stable_samples:        usize,
    /// Frame size; samples outside it are rejected when set.
    pub frame_width:           Option<u32>,
    pub frame_height:          Option<u32>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            distance_threshold:    1.0,
            sample_interval:       4,
            angle_delta_threshold: 0.3,
            pixels_per_unit:       111.0 / 47.0,
            pitch:                 PitchLine::default(),
            min_size:              3,
            stable_samples:        3,
            frame_width:           None,
            frame_height:          None,
        }
    }
}

impl TrackerConfig {
    /// Restrict accepted samples to a `width`×`height` frame.
    pub fn with_frame(mut self, width: u32, height: u32) -> Self {
        self.frame_width  = Some(width);
        self.frame_height = Some(height);
        self
    }

    /// Frame bounds, if both dimensions are configured.
    pub fn frame(&self) -> Option<(u32, u32)> {
        self.frame_width.zip(self.frame_height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SAMPLE_INTERVAL).contains(&self.sample_interval) {
            return Err(ConfigError::SampleInterval(self.sample_interval));
        }
        positive("pixels_per_unit", self.pixels_per_unit)?;
        finite("distance_threshold", self.distance_threshold)?;
        finite("angle_delta_threshold", self.angle_delta_threshold)?;
        finite("pitch.reference", self.pitch.reference)?;
        finite("pitch.slope", self.pitch.slope)?;
        finite("pitch.offset", self.pitch.offset)?;
        if !(2..=MAX_STABLE_SAMPLES).contains(&self.stable_samples) {
            return Err(ConfigError::StableSamples(self.stable_samples));
        }
        if self.frame_width.is_some() != self.frame_height.is_some() {
            return Err(ConfigError::PartialFrame);
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
