//! # ball_midi
//!
//! Note sinks for [`ball_motion`] events.
//!
//! * [`live`]: real-time output through `midir`, with a null fallback when
//!   no port is available.
//! * [`log`]: a single-track Standard MIDI File written with `midly`.
//! * [`MidiNoteSink`]: both at once: every event goes to the instrument,
//!   events on recorded channels are also appended to the log.
//!
//! ```rust,no_run
//! use ball_midi::{live, MidiNoteSink, PerformanceLog};
//!
//! let out  = live::open_live_output_or_null(Some("IAC"));
//! let sink = MidiNoteSink::new(out)
//!     .with_log(PerformanceLog::new("performance.mid"), &[2]);
//! # let _ = sink;
//! ```

pub mod error;
pub mod live;
pub mod log;
pub mod sink;

pub use error::MidiError;
pub use live::{LiveOutput, NullOutput};
pub use log::PerformanceLog;
pub use sink::MidiNoteSink;
