//! The per-object stroke state machine.
//!
//! ## Algorithm
//!
//! Each frame delivers one centroid (or nothing):
//!
//! * **Moving**: displacement from the last recorded position above
//!   `distance_threshold`.  The sample joins the stroke window; every
//!   `sample_interval` moving frames the window is reduced to its furthest
//!   pair of points, whose direction is the stroke angle.
//! * **Direction change**: a stroke angle differing from the previous one by
//!   at least `angle_delta_threshold`.  The current centroid becomes a new
//!   anchor in the flute window and each consecutive pair of anchors is
//!   measured and mapped to a note in the stroke slot.
//! * **Rest**: once notes have been produced the object is `Moving`; while
//!   it sits still the samples collect in the stopping window.  Three
//!   identical samples in a row confirm rest: the segment from the last
//!   direction-change anchor to the resting point is measured and sounds the
//!   closing note, and the object goes back to `Idle`.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::config::TrackerConfig;
use crate::error::{ConfigError, InvalidSampleError, PitchRangeWarning};
use crate::geometry::{furthest_pair, Position};
use crate::pitch::StrokeMeasurement;
use crate::slots::{NoteChange, NoteSlot, NoteSlots};

/// Anchors kept in the flute window between pushes.  A push briefly holds
/// one more before the oldest is evicted.
pub const FLUTE_ANCHORS: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// TrackerState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    /// `slowing` is set on every direction change and cleared by the first
    /// still frame, which fixes the start point of the closing stroke.
    Moving { slowing: bool },
}

impl TrackerState {
    pub fn is_moving(self) -> bool {
        matches!(self, TrackerState::Moving { .. })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Observation
// ════════════════════════════════════════════════════════════════════════════

/// Output of one [`MotionTracker::observe`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observation {
    /// Note changes, in the order they must be delivered.
    pub changes:  Vec<NoteChange>,
    /// Pitches clamped into the MIDI range during this frame.
    pub warnings: Vec<PitchRangeWarning>,
}

impl Observation {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.warnings.is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MotionTracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct MotionTracker {
    config:           TrackerConfig,
    state:            TrackerState,

    // ── stroke sampling ──────────────────────────────────────────────────
    last_position:    Option<Position>,
    stroke_window:    Vec<Position>,
    frame_counter:    u32,
    previous_angle:   Option<f64>,

    // ── anchors ──────────────────────────────────────────────────────────
    flute:            VecDeque<Position>,
    /// Centroid at the most recent direction change.
    slow_anchor:      Option<Position>,
    /// Start point of the closing stroke.
    closing_anchor:   Option<Position>,

    // ── rest detection ───────────────────────────────────────────────────
    stopping:         VecDeque<Position>,

    slots:            NoteSlots,
    last_measurement: Option<StrokeMeasurement>,
}

impl Default for MotionTracker {
    fn default() -> Self {
        MotionTracker::with_valid_config(TrackerConfig::default())
    }
}

impl MotionTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(MotionTracker::with_valid_config(config))
    }

    fn with_valid_config(config: TrackerConfig) -> Self {
        MotionTracker {
            state:            TrackerState::Idle,
            last_position:    None,
            stroke_window:    Vec::new(),
            frame_counter:    0,
            previous_angle:   None,
            flute:            VecDeque::with_capacity(FLUTE_ANCHORS + 1),
            slow_anchor:      None,
            closing_anchor:   None,
            stopping:         VecDeque::new(),
            slots:            NoteSlots::default(),
            last_measurement: None,
            config,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &TrackerConfig { &self.config }
    pub fn state(&self) -> TrackerState { self.state }
    pub fn previous_angle(&self) -> Option<f64> { self.previous_angle }
    pub fn last_position(&self) -> Option<Position> { self.last_position }
    pub fn flute_len(&self) -> usize { self.flute.len() }
    pub fn stopping_len(&self) -> usize { self.stopping.len() }

    /// Anchor points of the current stroke sequence, oldest first.
    pub fn flute_anchors(&self) -> impl Iterator<Item = Position> + '_ {
        self.flute.iter().copied()
    }

    /// The sounding note and the slot that holds it.
    pub fn sounding(&self) -> Option<(NoteSlot, u8)> {
        self.slots.sounding()
    }

    /// The most recent stroke measurement, whether or not it sounded.
    pub fn last_measurement(&self) -> Option<&StrokeMeasurement> {
        self.last_measurement.as_ref()
    }

    // ── per-frame update ──────────────────────────────────────────────────

    /// Feed one frame's centroid.  `None` means the object was not detected
    /// and leaves the tracker untouched.
    pub fn observe(&mut self, sample: Option<Position>) -> Result<Observation, InvalidSampleError> {
        let mut obs = Observation::default();
        let Some(center) = sample else {
            return Ok(obs);
        };
        self.check_sample(center)?;

        let distance = match self.last_position {
            Some(last) => last.distance(center),
            None       => self.config.distance_threshold + 1.0,
        };

        if distance > self.config.distance_threshold {
            self.advance_stroke(center, &mut obs);
        }
        if self.state.is_moving() {
            self.check_rest(center, distance, &mut obs);
        }
        Ok(obs)
    }

    /// Release any sounding note.  Used at shutdown.
    pub fn flush(&mut self) -> Vec<NoteChange> {
        let mut out = Vec::new();
        self.slots.flush(&mut out);
        out
    }

    fn check_sample(&self, p: Position) -> Result<(), InvalidSampleError> {
        if p.x < 0 || p.y < 0 {
            return Err(InvalidSampleError::Negative { x: p.x, y: p.y });
        }
        if let Some((width, height)) = self.config.frame() {
            if p.x as u32 >= width || p.y as u32 >= height {
                return Err(InvalidSampleError::OutOfFrame { x: p.x, y: p.y, width, height });
            }
        }
        Ok(())
    }

    fn advance_stroke(&mut self, center: Position, obs: &mut Observation) {
        self.stroke_window.push(center);
        self.last_position = Some(center);

        if self.frame_counter >= self.config.sample_interval {
            self.reduce_stroke(center, obs);
            self.frame_counter = 0;
        }
        self.frame_counter += 1;
    }

    fn reduce_stroke(&mut self, center: Position, obs: &mut Observation) {
        let samples = std::mem::take(&mut self.stroke_window);
        if samples.len() < 2 {
            return;
        }
        let Some((a, b)) = furthest_pair(&samples) else {
            return;
        };

        let angle = a.angle_to(b);
        trace!(samples = samples.len(), %a, %b, angle, "stroke reduced");

        if let Some(previous) = self.previous_angle {
            if (angle - previous).abs() >= self.config.angle_delta_threshold {
                debug!(%center, previous, angle, "direction change");
                self.on_direction_change(center, obs);
            }
        }
        self.previous_angle = Some(angle);
    }

    fn on_direction_change(&mut self, center: Position, obs: &mut Observation) {
        self.slots.silence(NoteSlot::Stroke, &mut obs.changes);

        self.flute.push_back(center);
        if self.flute.len() > FLUTE_ANCHORS {
            self.flute.pop_front();
        }

        let anchors: Vec<Position> = self.flute.iter().copied().collect();
        for pair in anchors.windows(2) {
            let m = StrokeMeasurement::measure(pair[0], pair[1], &self.config);
            self.sound_measurement(m, NoteSlot::Stroke, obs);
            self.state       = TrackerState::Moving { slowing: true };
            self.slow_anchor = Some(center);
        }
    }

    fn check_rest(&mut self, center: Position, distance: f64, obs: &mut Observation) {
        if (0.0..self.config.distance_threshold).contains(&distance) {
            if self.state == (TrackerState::Moving { slowing: true }) {
                self.closing_anchor = self.slow_anchor;
                self.state = TrackerState::Moving { slowing: false };
            }
            self.stopping.push_back(center);
            if self.stopping.len() > self.config.stable_samples {
                self.stopping.pop_front();
            }
        }

        let n = self.config.stable_samples;
        if self.stopping.len() >= n && self.stopping[self.stopping.len() - n] == center {
            self.finalize_rest(center, obs);
        }
    }

    fn finalize_rest(&mut self, center: Position, obs: &mut Observation) {
        self.stopping.clear();

        if let Some(anchor) = self.closing_anchor {
            let m = StrokeMeasurement::measure(anchor, center, &self.config);
            if m.passes_gate(&self.config) {
                self.flute.clear();
            }
            self.sound_measurement(m, NoteSlot::Closing, obs);
        }

        debug!(%center, "object at rest");
        self.state = TrackerState::Idle;
    }

    /// Sound `m` in `slot` if it passes the size gate.
    fn sound_measurement(&mut self, m: StrokeMeasurement, slot: NoteSlot, obs: &mut Observation) {
        self.last_measurement = Some(m);

        if !m.passes_gate(&self.config) {
            trace!(size = m.size_estimate, "stroke below size gate");
            return;
        }
        if let Some(w) = m.clamped {
            warn!(computed = w.computed, clamped = w.clamped, "pitch out of MIDI range");
            obs.warnings.push(w);
        }
        debug!(
            from = %m.from, to = %m.to, size = m.size_estimate, note = m.note, ?slot,
            "stroke sounded"
        );
        self.slots.sound(slot, m.note, &mut obs.changes);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
