//! Pointer-driven simulation source using `minifb`.
//!
//! The mouse stands in for a ball: while the left button is held, the cursor
//! is the centroid of the selected object.  Releasing the button reports the
//! object as not detected.  Each object's last measured stroke is drawn as
//! a segment labelled with its size estimate.
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`9` | Select object by position in the config |
//! | `Q` / `Escape` | End the session |

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use tracing::info;

use ball_motion::{Position, StrokeMeasurement};

use crate::source::{CentroidSource, Frame, SourceError};

const BG_COLOR:     u32   = 0xFF1A1A2E;
const MARKER_R:     usize = 6;
const SWATCH:       usize = 14;

const NUMBER_KEYS: [Key; 9] = [
    Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5,
    Key::Key6, Key::Key7, Key::Key8, Key::Key9,
];

/// Marker color for a label, matching the ball colors of the live rig.
pub fn marker_color(label: &str) -> u32 {
    match label {
        "yellow" => 0xFFAF7900,
        "red"    => 0xFFFF0000,
        "white"  => 0xFFFFFFFF,
        _        => 0xFF8888AA,
    }
}

pub struct PointerSource {
    window:   Window,
    buf:      Vec<u32>,
    width:    usize,
    height:   usize,
    labels:   Vec<String>,
    selected: usize,
    frame:    u64,
    strokes:  Vec<(String, StrokeMeasurement)>,
}

impl PointerSource {
    pub fn new(labels: Vec<String>, width: usize, height: usize) -> Result<Self, SourceError> {
        let mut window = Window::new(
            "snook: hold the left button and move a ball",
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| SourceError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(33))); // ~30fps

        info!(objects = ?labels, "pointer source ready, keys 1–9 select an object");
        Ok(PointerSource {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            labels,
            selected: 0,
            frame: 0,
            strokes: Vec::new(),
        })
    }

    fn poll_keys(&mut self) -> bool {
        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            return false;
        }
        for (i, key) in NUMBER_KEYS.iter().enumerate().take(self.labels.len()) {
            if self.window.is_key_pressed(*key, KeyRepeat::No) {
                self.selected = i;
                info!(object = %self.labels[i], "selected");
            }
        }
        true
    }

    fn cursor(&self) -> Option<Position> {
        if !self.window.get_mouse_down(MouseButton::Left) {
            return None;
        }
        let (x, y) = self.window.get_mouse_pos(MouseMode::Discard)?;
        Position::from_f64(x as f64, y as f64).ok()
    }

    fn render(&mut self, cursor: Option<Position>) -> Result<(), SourceError> {
        self.buf.iter_mut().for_each(|px| *px = BG_COLOR);

        // Swatches along the top edge; the selected one is larger.
        for (i, label) in self.labels.iter().enumerate() {
            let size = if i == self.selected { SWATCH } else { SWATCH / 2 };
            let x = 8 + i * (SWATCH + 6);
            fill_rect(&mut self.buf, self.width, self.height, x, 8, size, size, marker_color(label));
        }

        for (label, m) in &self.strokes {
            let color = marker_color(label);
            draw_line(&mut self.buf, self.width, self.height, m.from, m.to, color);
            let mid = Position::new((m.from.x + m.to.x) / 2, (m.from.y + m.to.y) / 2 - 8);
            draw_number(&mut self.buf, self.width, self.height, mid, m.size_estimate, color);
        }

        if let Some(p) = cursor {
            let color = marker_color(&self.labels[self.selected]);
            let x = (p.x as usize).saturating_sub(MARKER_R);
            let y = (p.y as usize).saturating_sub(MARKER_R);
            fill_rect(&mut self.buf, self.width, self.height, x, y, 2 * MARKER_R, 2 * MARKER_R, color);
        }

        self.window.update_with_buffer(&self.buf, self.width, self.height)
            .map_err(|e| SourceError::Window(e.to_string()))
    }
}

impl CentroidSource for PointerSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if !self.window.is_open() || !self.poll_keys() {
            return Ok(None);
        }
        let cursor = self.cursor();
        self.render(cursor)?;

        let mut frame = Frame::new(self.frame);
        self.frame += 1;
        if let (Some(p), Some(label)) = (cursor, self.labels.get(self.selected)) {
            frame.centroids.insert(label.clone(), p);
        }
        Ok(Some(frame))
    }

    fn overlay(&mut self, strokes: &[(&str, StrokeMeasurement)]) {
        self.strokes = strokes.iter().map(|(l, m)| (l.to_string(), *m)).collect();
    }
}

#[allow(clippy::too_many_arguments)]
fn fill_rect(buf: &mut [u32], width: usize, height: usize,
             x: usize, y: usize, w: usize, h: usize, color: u32) {
    for row in y..(y + h).min(height) {
        for col in x..(x + w).min(width) {
            buf[row * width + col] = color;
        }
    }
}

fn set_pixel(buf: &mut [u32], width: usize, height: usize, x: i64, y: i64, color: u32) {
    if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
        buf[y as usize * width + x as usize] = color;
    }
}

/// Bresenham segment, clipped to the buffer.
fn draw_line(buf: &mut [u32], width: usize, height: usize, a: Position, b: Position, color: u32) {
    let (mut x, mut y) = (a.x as i64, a.y as i64);
    let (x1, y1) = (b.x as i64, b.y as i64);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        set_pixel(buf, width, height, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x += sx; }
        if e2 <= dx { err += dx; y += sy; }
    }
}

/// 3×5 digit glyphs, one row per entry, high bit on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

fn draw_number(buf: &mut [u32], width: usize, height: usize, at: Position, value: u32, color: u32) {
    for (i, ch) in value.to_string().bytes().enumerate() {
        let glyph = DIGITS[(ch - b'0') as usize];
        let x0 = at.x as i64 + 4 * i as i64;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3 {
                if bits & (1 << (2 - col)) != 0 {
                    set_pixel(buf, width, height, x0 + col, at.y as i64 + row as i64, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_clips_to_buffer() {
        let mut buf = vec![0u32; 4 * 3];
        fill_rect(&mut buf, 4, 3, 2, 1, 10, 10, 7);
        assert_eq!(buf, vec![
            0, 0, 0, 0,
            0, 0, 7, 7,
            0, 0, 7, 7,
        ]);
    }

    #[test]
    fn line_covers_both_endpoints_and_clips() {
        let mut buf = vec![0u32; 5 * 5];
        draw_line(&mut buf, 5, 5, Position::new(0, 0), Position::new(4, 4), 1);
        for i in 0..5 {
            assert_eq!(buf[i * 5 + i], 1);
        }
        assert_eq!(buf.iter().filter(|&&p| p == 1).count(), 5);

        let mut buf = vec![0u32; 4 * 2];
        draw_line(&mut buf, 4, 2, Position::new(1, 1), Position::new(9, 1), 2);
        assert_eq!(buf, vec![0, 0, 0, 0, 0, 2, 2, 2]);
    }

    #[test]
    fn size_label_uses_digit_glyphs() {
        let mut buf = vec![0u32; 8 * 5];
        draw_number(&mut buf, 8, 5, Position::new(0, 0), 17, 9);
        let lit: Vec<usize> = (0..5).map(|r| buf[r * 8..r * 8 + 8].iter().filter(|&&p| p == 9).count()).collect();
        // "1" then "7": 1+3, 2+1, 1+1, 1+1, 3+1
        assert_eq!(lit, vec![4, 3, 2, 2, 4]);
    }

    #[test]
    fn known_labels_have_distinct_colors() {
        let c = [marker_color("yellow"), marker_color("red"), marker_color("white")];
        assert_ne!(c[0], c[1]);
        assert_ne!(c[1], c[2]);
        assert_eq!(marker_color("teal"), marker_color("other"));
    }
}
