//! Centroid sources.
//!
//! The public interface is [`CentroidSource`], yielding one [`Frame`] per
//! video frame.  Consumers don't need to know whether centroids came from a
//! recorded file or the pointer simulator.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use ball_motion::{InvalidSampleError, Position, StrokeMeasurement};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Sample {
        line: usize,
        #[source]
        source: InvalidSampleError,
    },

    #[error("line {line}: frame {frame} comes after frame {previous}")]
    FrameOrder { line: usize, frame: u64, previous: u64 },

    #[error("window: {0}")]
    Window(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

/// Centroids detected in one frame, by object label.  A label with no entry
/// was not detected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub index:     u64,
    pub centroids: HashMap<String, Position>,
}

impl Frame {
    pub fn new(index: u64) -> Self {
        Frame { index, centroids: HashMap::new() }
    }

    pub fn with(mut self, label: &str, pos: Position) -> Self {
        self.centroids.insert(label.to_string(), pos);
        self
    }

    pub fn get(&self, label: &str) -> Option<Position> {
        self.centroids.get(label).copied()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CentroidSource
// ════════════════════════════════════════════════════════════════════════════

pub trait CentroidSource {
    /// The next frame, or `None` once input is exhausted.  May block until
    /// the frame is available.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// The latest stroke measured for each object, after every frame.
    /// Sources without a display ignore it.
    fn overlay(&mut self, _strokes: &[(&str, StrokeMeasurement)]) {}
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource
// ════════════════════════════════════════════════════════════════════════════

/// Replays centroids recorded in a text file.
///
/// One detection per line: `<frame> <label> <x> <y>`.  `<x> <y>` may be
/// replaced by `-` to record an explicit miss.  Blank lines and `#` comments
/// are ignored.  Frame numbers must not decrease and a label may appear once
/// per frame; missing frame numbers are replayed as frames with no
/// detections, generated as they are reached.
///
/// ```text
/// # frame label x y
/// 0 white 120 80
/// 0 red   300 200
/// 1 white 124 83
/// 1 red   -
/// ```
#[derive(Clone, Debug)]
pub struct ReplaySource {
    /// Frames with at least one line, in order.
    frames: VecDeque<Frame>,
    /// Index of the next frame to replay.
    next:   u64,
}

impl ReplaySource {
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| SourceError::Io { path: path.to_path_buf(), source })?;
        ReplaySource::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, SourceError> {
        let mut frames: VecDeque<Frame> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let fields: Vec<&str> = content.split_whitespace().collect();
            let (index, label, pos) = match fields.as_slice() {
                [f, label, "-"] => (parse_frame(f, line)?, *label, None),
                [f, label, x, y] => {
                    let x = parse_coord(x, line)?;
                    let y = parse_coord(y, line)?;
                    let pos = Position::from_f64(x, y)
                        .map_err(|source| SourceError::Sample { line, source })?;
                    (parse_frame(f, line)?, *label, Some(pos))
                }
                _ => {
                    return Err(SourceError::Parse {
                        line,
                        message: format!("expected `<frame> <label> <x> <y>`, got {:?}", content),
                    })
                }
            };

            match frames.back() {
                Some(last) if index < last.index => {
                    return Err(SourceError::FrameOrder { line, frame: index, previous: last.index });
                }
                Some(last) if index == last.index => {}
                _ => {
                    frames.push_back(Frame::new(index));
                    seen.clear();
                }
            }
            if !seen.insert(label.to_string()) {
                return Err(SourceError::Parse {
                    line,
                    message: format!("{:?} already appears in frame {}", label, index),
                });
            }

            if let (Some(frame), Some(pos)) = (frames.back_mut(), pos) {
                frame.centroids.insert(label.to_string(), pos);
            }
        }

        let next = frames.front().map_or(0, |f| f.index);
        Ok(ReplaySource { frames, next })
    }

    /// Frames not yet replayed, counting gaps.
    pub fn remaining(&self) -> u64 {
        self.frames.back().map_or(0, |last| (last.index - self.next).saturating_add(1))
    }
}

impl CentroidSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(front) = self.frames.front() else {
            return Ok(None);
        };
        let frame = if front.index == self.next {
            self.frames.pop_front()
        } else {
            Some(Frame::new(self.next))
        };
        self.next = self.next.saturating_add(1);
        Ok(frame)
    }
}

fn parse_frame(s: &str, line: usize) -> Result<u64, SourceError> {
    s.parse().map_err(|_| SourceError::Parse {
        line,
        message: format!("bad frame number {:?}", s),
    })
}

fn parse_coord(s: &str, line: usize) -> Result<f64, SourceError> {
    s.parse().map_err(|_| SourceError::Parse {
        line,
        message: format!("bad coordinate {:?}", s),
    })
}
