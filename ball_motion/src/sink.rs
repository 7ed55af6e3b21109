//! Note events and the capability that consumes them.

use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// Lowest and highest notes covered by the shutdown sweep.
pub const SWEEP_NOTES: std::ops::RangeInclusive<u8> = 1..=127;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    On,
    Off,
}

/// A note change addressed to an output channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub kind:     NoteKind,
    /// MIDI note number (0–127).
    pub note:     u8,
    /// MIDI velocity (0–127).
    pub velocity: u8,
    /// MIDI channel (0–15).
    pub channel:  u8,
    /// Driver's cumulative tick when the event was produced.
    pub tick:     u32,
}

impl NoteEvent {
    pub fn on(note: u8, velocity: u8, channel: u8, tick: u32) -> Self {
        NoteEvent { kind: NoteKind::On, note, velocity, channel, tick }
    }

    pub fn off(note: u8, velocity: u8, channel: u8, tick: u32) -> Self {
        NoteEvent { kind: NoteKind::Off, note, velocity, channel, tick }
    }
}

/// Anything that can receive [`NoteEvent`]s.
///
/// Failures are returned to the caller as-is; implementations must not retry
/// internally, since a late retry would reorder note-on/note-off pairs.
pub trait NoteSink {
    fn deliver(&mut self, event: &NoteEvent) -> Result<(), SinkError>;

    /// Release every note in [`SWEEP_NOTES`] on `channel`, regardless of what
    /// the trackers believe is sounding.
    fn all_notes_off(&mut self, channel: u8, velocity: u8, tick: u32) -> Result<(), SinkError> {
        for note in SWEEP_NOTES {
            self.deliver(&NoteEvent::off(note, velocity, channel, tick))?;
        }
        Ok(())
    }
}

/// Collects events in memory.
impl NoteSink for Vec<NoteEvent> {
    fn deliver(&mut self, event: &NoteEvent) -> Result<(), SinkError> {
        self.push(*event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sweep_covers_1_to_127() {
        let mut sink: Vec<NoteEvent> = Vec::new();
        sink.all_notes_off(2, 64, 9).unwrap();
        assert_eq!(sink.len(), 127);
        assert_eq!(sink[0], NoteEvent::off(1, 64, 2, 9));
        assert_eq!(sink[126], NoteEvent::off(127, 64, 2, 9));
        assert!(sink.iter().all(|e| e.kind == NoteKind::Off && e.channel == 2));
    }
}
