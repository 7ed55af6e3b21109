//! Frame-by-frame orchestration across tracked objects.
//!
//! `Session` owns the [`TrackedObject`]s, the note sink and the cumulative
//! tick.  Objects are stepped independently: an error in one is logged and
//! never reaches the others.

use ball_motion::{
    NoteSink, PitchRangeWarning, StepError, StrokeMeasurement, TrackedObject, DEFAULT_VELOCITY,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{SessionConfig, SinkErrorPolicy};
use crate::source::Frame;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("tracker config: {0}")]
    Config(#[from] ball_motion::ConfigError),

    #[error("object {label:?} halted the session: {source}")]
    Halted {
        label: String,
        #[source]
        source: StepError,
    },

    #[error("{failures} object(s) or channel(s) could not be silenced at shutdown")]
    Shutdown { failures: usize },
}

/// What happened during one frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Events delivered to the sink.
    pub events: usize,
    /// Per-object failures, by label.
    pub errors: Vec<(String, StepError)>,
    /// Clamped pitches, by label.
    pub warnings: Vec<(String, PitchRangeWarning)>,
}

pub struct Session<S: NoteSink> {
    objects: Vec<TrackedObject>,
    sink:    S,
    policy:  SinkErrorPolicy,
    tick:    u32,
}

impl<S: NoteSink> Session<S> {
    pub fn new(cfg: &SessionConfig, sink: S) -> Result<Self, SessionError> {
        let objects = cfg.objects.iter()
            .map(|o| {
                TrackedObject::new(&o.label, o.channel, cfg.tracker.clone())
                    .map(|t| t.with_velocity(o.velocity))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Session { objects, sink, policy: cfg.on_sink_error, tick: 0 })
    }

    pub fn objects(&self) -> &[TrackedObject] { &self.objects }
    pub fn sink(&self) -> &S { &self.sink }
    pub fn sink_mut(&mut self) -> &mut S { &mut self.sink }
    pub fn into_sink(self) -> S { self.sink }

    /// Cumulative tick stamped on the next frame's events.
    pub fn tick(&self) -> u32 { self.tick }

    /// Each object's most recent stroke measurement, for overlays.
    pub fn measurements(&self) -> Vec<(&str, StrokeMeasurement)> {
        self.objects.iter()
            .filter_map(|o| o.last_measurement().map(|m| (o.label(), *m)))
            .collect()
    }

    /// Feed one frame to every object.
    pub fn step_frame(&mut self, frame: &Frame) -> Result<FrameReport, SessionError> {
        let mut report = FrameReport::default();
        let tick = self.tick;
        self.tick = self.tick.saturating_add(1);

        for obj in &mut self.objects {
            let sample = frame.get(obj.label());
            match obj.step(sample, tick, &mut self.sink) {
                Ok(step) => {
                    report.events += step.events;
                    report.warnings.extend(step.warnings.into_iter().map(|w| (obj.label().to_string(), w)));
                }
                Err(err) => {
                    if let StepError::Sink { delivered, .. } = &err {
                        report.events += delivered;
                        if self.policy == SinkErrorPolicy::Halt {
                            return Err(SessionError::Halted { label: obj.label().to_string(), source: err });
                        }
                    }
                    warn!(object = %obj.label(), frame = frame.index, error = %err, "object step failed");
                    report.errors.push((obj.label().to_string(), err));
                }
            }
        }
        Ok(report)
    }

    /// Release every note: first each object's own, then a sweep of
    /// notes 1–127 on every channel in use.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        let tick = self.tick;
        let mut failures = 0;

        for obj in &mut self.objects {
            if let Err(err) = obj.flush(tick, &mut self.sink) {
                warn!(object = %obj.label(), error = %err, "flush failed");
                failures += 1;
            }
        }

        let mut channels: Vec<u8> = self.objects.iter().map(TrackedObject::channel).collect();
        channels.sort_unstable();
        channels.dedup();
        for ch in channels {
            if let Err(err) = self.sink.all_notes_off(ch, DEFAULT_VELOCITY, tick) {
                warn!(channel = ch, error = %err, "all-notes-off failed");
                failures += 1;
            }
        }

        info!(tick, "session shut down");
        if failures == 0 { Ok(()) } else { Err(SessionError::Shutdown { failures }) }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
