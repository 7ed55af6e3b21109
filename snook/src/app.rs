//! The frame loop.
//!
//! `run` pulls frames from a [`CentroidSource`], steps the [`Session`], and
//! keeps the performance log on disk current.  The log is re-saved every
//! `log.autosave_every` frames and once more after the shutdown sweep, so an
//! interrupted session loses at most that many frames of recording.

use std::time::{Duration, Instant};

use ball_midi::{MidiError, MidiNoteSink};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::session::{Session, SessionError};
use crate::source::{CentroidSource, SourceError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("saving performance log: {0}")]
    Log(#[from] MidiError),
}

/// Totals printed when a run ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames:         u64,
    pub events:         usize,
    pub object_errors:  usize,
    pub pitch_warnings: usize,
    pub logged:         usize,
}

// ════════════════════════════════════════════════════════════════════════════
// run()
// ════════════════════════════════════════════════════════════════════════════

/// Drive `source` to exhaustion.  `pace` holds each frame to a minimum
/// duration; replay files otherwise run as fast as they parse.
///
/// The shutdown sweep and final save run even when a frame fails, and the
/// first error is returned after them.
pub fn run(
    cfg:    &SessionConfig,
    source: &mut dyn CentroidSource,
    sink:   MidiNoteSink,
    pace:   Option<Duration>,
) -> Result<RunSummary, AppError> {
    let mut session = Session::new(cfg, sink)?;
    let mut summary = RunSummary::default();
    info!(objects = session.objects().len(), output = session.sink().live_name(), "session started");

    let outcome = drive(cfg, source, &mut session, &mut summary, pace);

    let closed = session.shutdown();
    let saved  = save_log(&mut session);
    summary.logged = session.sink().log().map_or(0, |log| log.len());

    info!(frames = summary.frames, events = summary.events, logged = summary.logged, "session ended");
    outcome?;
    closed?;
    saved?;
    Ok(summary)
}

fn drive(
    cfg:     &SessionConfig,
    source:  &mut dyn CentroidSource,
    session: &mut Session<MidiNoteSink>,
    summary: &mut RunSummary,
    pace:    Option<Duration>,
) -> Result<(), AppError> {
    let autosave = cfg.log.autosave_every;

    loop {
        let started = Instant::now();
        let Some(frame) = source.next_frame()? else { break };

        let report = session.step_frame(&frame)?;
        summary.frames        += 1;
        summary.events        += report.events;
        summary.object_errors += report.errors.len();
        summary.pitch_warnings += report.warnings.len();
        source.overlay(&session.measurements());

        if autosave > 0 && summary.frames % autosave == 0 {
            if let Some(log) = session.sink_mut().log_mut() {
                if let Err(err) = log.save_if_dirty() {
                    warn!(error = %err, "autosave failed, will retry");
                }
            }
        }

        if let Some(min) = pace {
            let spent = started.elapsed();
            if spent < min {
                std::thread::sleep(min - spent);
            }
        }
    }
    Ok(())
}

/// The final save always writes, so a silent session still leaves a file.
fn save_log(session: &mut Session<MidiNoteSink>) -> Result<(), MidiError> {
    match session.sink_mut().log_mut() {
        Some(log) => log.save(),
        None      => Ok(()),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ReplaySource;
    use ball_midi::{NullOutput, PerformanceLog};

    const STROKE: &str = "
        0 white 0 0
        1 white 25 0
        2 white 50 0
        3 white 75 0
        4 white 100 0
        5 white 110 15
        6 white 120 30
        7 white 130 45
        8 white 140 60
        9 white 150 60
        10 white 160 60
        11 white 170 60
        12 white 180 60
    ";

    fn sink_logging_to(path: &std::path::Path, cfg: &SessionConfig) -> MidiNoteSink {
        MidiNoteSink::new(Box::new(NullOutput))
            .with_log(PerformanceLog::new(path), &cfg.recorded_channels())
    }

    #[test]
    fn replay_writes_the_recorded_channel() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.mid");
        let cfg  = SessionConfig::default();

        let mut src = ReplaySource::parse(STROKE).unwrap();
        let summary = run(&cfg, &mut src, sink_logging_to(&path, &cfg), None).unwrap();

        assert_eq!(summary.frames, 13);
        assert_eq!(summary.events, 1);
        assert_eq!(summary.object_errors, 0);
        // note-on during the stroke, note-off from the shutdown flush
        assert_eq!(summary.logged, 2);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
    }

    #[test]
    fn unrecorded_objects_leave_the_log_empty() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.mid");
        let cfg  = SessionConfig::default();

        let mut src = ReplaySource::parse(&STROKE.replace("white", "red")).unwrap();
        let summary = run(&cfg, &mut src, sink_logging_to(&path, &cfg), None).unwrap();

        assert_eq!(summary.events, 1);
        assert_eq!(summary.logged, 0);
        assert!(path.exists());
    }

    #[test]
    fn bad_samples_are_counted_not_fatal() {
        let cfg = SessionConfig::default();
        let mut src = ReplaySource::parse("0 red -5 3\n1 white 10 10\n").unwrap();
        let sink = MidiNoteSink::new(Box::new(NullOutput));
        let summary = run(&cfg, &mut src, sink, None).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.object_errors, 1);
    }

    #[test]
    fn clamped_pitches_are_counted() {
        let cfg = SessionConfig::default();
        let long = STROKE
            .replace("9 white 150 60", "9 white 340 60")
            .replace("10 white 160 60", "10 white 540 60")
            .replace("11 white 170 60", "11 white 740 60")
            .replace("12 white 180 60", "12 white 940 60");
        let mut src = ReplaySource::parse(&long).unwrap();
        let sink = MidiNoteSink::new(Box::new(NullOutput));
        let summary = run(&cfg, &mut src, sink, None).unwrap();
        assert_eq!(summary.events, 1);
        assert_eq!(summary.pitch_warnings, 1);
    }

    #[test]
    fn source_sees_each_frames_strokes() {
        struct Watching {
            inner:   ReplaySource,
            strokes: Vec<usize>,
            last:    Option<(String, ball_motion::StrokeMeasurement)>,
        }
        impl CentroidSource for Watching {
            fn next_frame(&mut self) -> Result<Option<crate::source::Frame>, SourceError> {
                self.inner.next_frame()
            }
            fn overlay(&mut self, strokes: &[(&str, ball_motion::StrokeMeasurement)]) {
                self.strokes.push(strokes.len());
                self.last = strokes.last().map(|(l, m)| (l.to_string(), *m));
            }
        }

        let cfg = SessionConfig::default();
        let mut src = Watching { inner: ReplaySource::parse(STROKE).unwrap(), strokes: Vec::new(), last: None };
        run(&cfg, &mut src, MidiNoteSink::new(Box::new(NullOutput)), None).unwrap();

        assert_eq!(src.strokes.len(), 13);
        assert_eq!(src.strokes[11], 0);
        assert_eq!(src.strokes[12], 1);
        let (label, m) = src.last.unwrap();
        assert_eq!(label, "white");
        assert_eq!(m.size_estimate, 16);
    }

    #[test]
    fn autosave_writes_before_shutdown() {
        struct Stalled(ReplaySource, std::path::PathBuf);
        impl CentroidSource for Stalled {
            fn next_frame(&mut self) -> Result<Option<crate::source::Frame>, SourceError> {
                match self.0.next_frame()? {
                    Some(f) => Ok(Some(f)),
                    None => {
                        // Already on disk before the final save.
                        assert!(self.1.exists());
                        Ok(None)
                    }
                }
            }
        }

        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.mid");
        let mut cfg = SessionConfig::default();
        cfg.log.autosave_every = 13;

        let mut src = Stalled(ReplaySource::parse(STROKE).unwrap(), path.clone());
        run(&cfg, &mut src, sink_logging_to(&path, &cfg), None).unwrap();
    }
}
