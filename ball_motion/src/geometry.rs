//! Pixel-space geometry used by the stroke tracker.
//!
//! Positions are integer pixel coordinates as delivered by the centroid
//! source.  All distance and angle math happens in `f64`.

use serde::{Deserialize, Serialize};

use crate::error::InvalidSampleError;

// ════════════════════════════════════════════════════════════════════════════
// Position
// ════════════════════════════════════════════════════════════════════════════

/// A centroid in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Build a position from floating point image moments.
    ///
    /// Fractional parts are truncated, matching how a contour centroid is
    /// usually rounded onto the pixel grid.  Non-finite input is rejected.
    pub fn from_f64(x: f64, y: f64) -> Result<Self, InvalidSampleError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(InvalidSampleError::NonFinite { x, y });
        }
        if x < i32::MIN as f64 || x > i32::MAX as f64
            || y < i32::MIN as f64 || y > i32::MAX as f64
        {
            return Err(InvalidSampleError::NonFinite { x, y });
        }
        Ok(Position { x: x as i32, y: y as i32 })
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Position) -> f64 {
        let dx = (other.x as f64) - (self.x as f64);
        let dy = (other.y as f64) - (self.y as f64);
        (dx * dx + dy * dy).sqrt()
    }

    /// Direction of the segment `self → other` in radians, `atan2(Δy, Δx)`.
    pub fn angle_to(self, other: Position) -> f64 {
        let dx = (other.x as f64) - (self.x as f64);
        let dy = (other.y as f64) - (self.y as f64);
        dy.atan2(dx)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Position { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Dominant stroke
// ════════════════════════════════════════════════════════════════════════════

/// Find the two samples furthest apart.
///
/// Exhaustive O(n²) search.  `n` is bounded by the sampling interval, so a
/// window never holds more than a handful of points.  Pairs are visited in
/// `(i, j)` order with `i < j` and a pair only replaces the current best when
/// it is strictly further apart, so ties keep the earliest pair.  Returns
/// `None` when fewer than two samples are given or all samples coincide.
pub fn furthest_pair(samples: &[Position]) -> Option<(Position, Position)> {
    let mut best: Option<(Position, Position)> = None;
    let mut best_dist = 0.0;

    for (i, &a) in samples.iter().enumerate() {
        for &b in &samples[i + 1..] {
            let d = a.distance(b);
            if d > best_dist {
                best_dist = d;
                best = Some((a, b));
            }
        }
    }
    best
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
