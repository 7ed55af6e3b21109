//! Error and warning types for the tracker.

use thiserror::Error;

/// A centroid the tracker refuses to analyse.
///
/// Raised before any state is touched, so a rejected sample leaves the
/// tracker exactly as it was.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InvalidSampleError {
    #[error("non-finite centroid ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("negative centroid ({x}, {y})")]
    Negative { x: i32, y: i32 },

    #[error("centroid ({x}, {y}) outside {width}x{height} frame")]
    OutOfFrame { x: i32, y: i32, width: u32, height: u32 },
}

/// A computed pitch fell outside 0–127 and was clamped.
///
/// Not an error: playback continues with the clamped note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("pitch {computed} out of MIDI range, clamped to {clamped}")]
pub struct PitchRangeWarning {
    pub computed: i64,
    pub clamped:  u8,
}

/// Rejected [`TrackerConfig`](crate::TrackerConfig) values.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample_interval must be within 1–1024, got {0}")]
    SampleInterval(u32),

    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("stable_samples must be within 2–64, got {0}")]
    StableSamples(usize),

    #[error("frame_width and frame_height must be given together")]
    PartialFrame,
}

/// Failure delivering a note event.  Never retried by the tracker.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("instrument output unreachable: {0}")]
    Instrument(String),

    #[error("performance log append failed: {0}")]
    Log(String),
}

/// Everything that can go wrong while stepping one tracked object.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("invalid sample: {0}")]
    InvalidSample(#[from] InvalidSampleError),

    #[error("note delivery failed after {delivered} event(s): {source}")]
    Sink {
        delivered: usize,
        #[source]
        source: SinkError,
    },
}
