//! # snook
//!
//! Follows colored balls across a sequence of frames and plays their strokes
//! as MIDI notes.  Each ball is an independent [`ball_motion::TrackedObject`]
//! on its own channel; notes go to a live port and, for recorded balls, to a
//! Standard MIDI File.
//!
//! ## Sources
//!
//! * **Replay** (`--replay FILE`): centroids read from a text file, one
//!   detection per line.  See [`source::ReplaySource`].
//! * **Pointer** (default): a `minifb` window where the mouse plays the
//!   selected ball.  See [`pointer::PointerSource`].
//!
//! ### Pointer controls
//!
//! | Input | Action |
//! |---|---|
//! | Hold left button | Selected ball follows the cursor |
//! | `1`–`9` | Select ball by position in the config |
//! | `Q` / `Escape` | Stop the session |
//!
//! ## Shutdown
//!
//! When input ends every ball releases its note, notes 1–127 are switched off
//! on every channel in use, and the performance log is written one last time.

pub mod config;
pub mod source;
pub mod pointer;
pub mod session;
pub mod app;
