//! # ball_motion
//!
//! Turns the centroid track of a colored ball into monophonic MIDI note
//! changes.  One [`TrackedObject`] per ball; objects share nothing and can be
//! stepped in any order.
//!
//! ## Motion → Note mapping
//!
//! | Motion | Result |
//! |---|---|
//! | First stroke direction | Remembered, silent |
//! | Direction change ≥ 0.3 rad | Anchor pushed; note for the last anchor-to-anchor stroke |
//! | Three still frames after notes | Closing note for the last anchor-to-rest stroke |
//! | Stroke smaller than 3 units | Nothing |
//!
//! Pitch falls linearly with stroke length: `round(69 − (10/75)·d + 24)`,
//! clamped to 0–127.
//!
//! ## Quick start
//!
//! ```rust
//! use ball_motion::{NoteEvent, Position, TrackedObject, TrackerConfig};
//!
//! let mut white = TrackedObject::new("white", 2, TrackerConfig::default()).unwrap();
//! let mut events: Vec<NoteEvent> = Vec::new();
//!
//! for tick in 0..40u32 {
//!     let centroid = Position::new(tick as i32 * 10, 100);
//!     white.step(Some(centroid), tick, &mut events).unwrap();
//! }
//! // A straight line never changes direction.
//! assert!(events.is_empty());
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod object;
pub mod pitch;
pub mod sink;
pub mod slots;
pub mod tracker;

pub use config::{PitchLine, TrackerConfig};
pub use error::{ConfigError, InvalidSampleError, PitchRangeWarning, SinkError, StepError};
pub use geometry::Position;
pub use object::{StepReport, TrackedObject, DEFAULT_VELOCITY};
pub use pitch::StrokeMeasurement;
pub use sink::{NoteEvent, NoteKind, NoteSink, SWEEP_NOTES};
pub use slots::{NoteChange, NoteSlot};
pub use tracker::{MotionTracker, Observation, TrackerState, FLUTE_ANCHORS};
