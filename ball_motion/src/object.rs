//! A tracked object: identity, output channel and its own tracker.

use tracing::debug;

use crate::config::TrackerConfig;
use crate::error::{ConfigError, PitchRangeWarning, StepError};
use crate::geometry::Position;
use crate::pitch::StrokeMeasurement;
use crate::sink::{NoteEvent, NoteSink};
use crate::slots::NoteChange;
use crate::tracker::{MotionTracker, TrackerState};

/// Velocity used for every note unless overridden.
pub const DEFAULT_VELOCITY: u8 = 64;

/// Result of one successful [`TrackedObject::step`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Events delivered to the sink.
    pub events:   usize,
    /// Pitches clamped into the MIDI range this frame.
    pub warnings: Vec<PitchRangeWarning>,
}

#[derive(Clone, Debug)]
pub struct TrackedObject {
    label:    String,
    channel:  u8,
    velocity: u8,
    tracker:  MotionTracker,
}

impl TrackedObject {
    /// `channel` is masked to 0–15.
    pub fn new(label: &str, channel: u8, config: TrackerConfig) -> Result<Self, ConfigError> {
        Ok(TrackedObject {
            label:    label.to_string(),
            channel:  channel & 0x0F,
            velocity: DEFAULT_VELOCITY,
            tracker:  MotionTracker::new(config)?,
        })
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity.min(127);
        self
    }

    pub fn label(&self) -> &str { &self.label }
    pub fn channel(&self) -> u8 { self.channel }
    pub fn velocity(&self) -> u8 { self.velocity }
    pub fn state(&self) -> TrackerState { self.tracker.state() }
    pub fn tracker(&self) -> &MotionTracker { &self.tracker }

    pub fn last_measurement(&self) -> Option<&StrokeMeasurement> {
        self.tracker.last_measurement()
    }

    /// Advance one frame and deliver the resulting events to `sink`.
    ///
    /// Delivery stops at the first sink failure; the tracker has already
    /// moved on, so the caller decides whether to drop the rest of the frame
    /// or halt.
    pub fn step(
        &mut self,
        sample: Option<Position>,
        tick:   u32,
        sink:   &mut dyn NoteSink,
    ) -> Result<StepReport, StepError> {
        let obs = self.tracker.observe(sample)?;
        let events = self.deliver(&obs.changes, tick, sink)?;
        Ok(StepReport { events, warnings: obs.warnings })
    }

    /// Release whatever is sounding.
    pub fn flush(&mut self, tick: u32, sink: &mut dyn NoteSink) -> Result<usize, StepError> {
        let changes = self.tracker.flush();
        self.deliver(&changes, tick, sink)
    }

    fn deliver(
        &self,
        changes: &[NoteChange],
        tick:    u32,
        sink:    &mut dyn NoteSink,
    ) -> Result<usize, StepError> {
        for (delivered, change) in changes.iter().enumerate() {
            let event = self.event_for(change, tick);
            debug!(object = %self.label, ?event, "note");
            sink.deliver(&event)
                .map_err(|source| StepError::Sink { delivered, source })?;
        }
        Ok(changes.len())
    }

    fn event_for(&self, change: &NoteChange, tick: u32) -> NoteEvent {
        match *change {
            NoteChange::On  { note, .. } => NoteEvent::on(note, self.velocity, self.channel, tick),
            NoteChange::Off { note, .. } => NoteEvent::off(note, self.velocity, self.channel, tick),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::sink::NoteKind;

    fn path() -> Vec<Position> {
        [
            (0, 0), (25, 0), (50, 0), (75, 0), (100, 0),
            (110, 15), (120, 30), (130, 45), (140, 60),
            (150, 60), (160, 60), (170, 60), (180, 60),
        ]
        .into_iter()
        .map(Position::from)
        .collect()
    }

    struct Refusing;
    impl NoteSink for Refusing {
        fn deliver(&mut self, _event: &NoteEvent) -> Result<(), SinkError> {
            Err(SinkError::Instrument("port closed".into()))
        }
    }

    #[test]
    fn step_stamps_channel_velocity_and_tick() {
        let mut obj = TrackedObject::new("white", 2, TrackerConfig::default()).unwrap();
        let mut sink: Vec<NoteEvent> = Vec::new();
        for (i, pos) in path().into_iter().enumerate() {
            obj.step(Some(pos), i as u32, &mut sink).unwrap();
        }
        assert_eq!(sink, vec![NoteEvent::on(88, 64, 2, 12)]);

        obj.flush(40, &mut sink).unwrap();
        assert_eq!(sink[1], NoteEvent::off(88, 64, 2, 40));
        assert_eq!(sink[1].kind, NoteKind::Off);
    }

    #[test]
    fn sink_failure_is_reported_not_retried() {
        let mut obj = TrackedObject::new("red", 1, TrackerConfig::default()).unwrap();
        let mut sink: Vec<NoteEvent> = Vec::new();
        let pts = path();
        for pos in &pts[..12] {
            obj.step(Some(*pos), 0, &mut sink).unwrap();
        }
        let err = obj.step(Some(pts[12]), 0, &mut Refusing).unwrap_err();
        assert!(matches!(err, StepError::Sink { delivered: 0, .. }));
        // The tracker advanced anyway; the note is considered sounding.
        assert_eq!(obj.tracker().sounding().map(|(_, n)| n), Some(88));
    }

    #[test]
    fn invalid_sample_surfaces_as_step_error() {
        let mut obj = TrackedObject::new("yellow", 0, TrackerConfig::default()).unwrap();
        let mut sink: Vec<NoteEvent> = Vec::new();
        let err = obj.step(Some(Position::new(-3, 0)), 0, &mut sink).unwrap_err();
        assert!(matches!(err, StepError::InvalidSample(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn step_reports_clamped_pitch() {
        let mut obj = TrackedObject::new("white", 2, TrackerConfig::default()).unwrap();
        let mut sink: Vec<NoteEvent> = Vec::new();
        let mut pts = path();
        pts.truncate(9);
        pts.extend([(340, 60), (540, 60), (740, 60), (940, 60)].map(Position::from));

        let mut warnings = Vec::new();
        for (i, pos) in pts.into_iter().enumerate() {
            let report = obj.step(Some(pos), i as u32, &mut sink).unwrap();
            assert_eq!(report.events, report.warnings.len());
            warnings.extend(report.warnings);
        }
        assert_eq!(warnings, vec![PitchRangeWarning { computed: -14, clamped: 0 }]);
        assert_eq!(sink, vec![NoteEvent::on(0, 64, 2, 12)]);
    }

    #[test]
    fn channel_and_velocity_are_masked() {
        let obj = TrackedObject::new("x", 0x13, TrackerConfig::default())
            .unwrap()
            .with_velocity(200);
        assert_eq!(obj.channel(), 3);
        assert_eq!(obj.velocity(), 127);
    }
}
