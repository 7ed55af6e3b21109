//! Persisted performance log.
//!
//! Every recorded note event is appended to a single-track Standard MIDI
//! File.  Delta times follow the recording convention of the live rig:
//!
//! * note-on events carry a delta of **0**;
//! * note-off events carry the driver's **cumulative** tick counter as their
//!   delta, not the time since the previous event.
//!
//! Players therefore stretch the file in a way that grows over the session.
//! The convention is kept so logs line up with earlier recordings.

use std::path::{Path, PathBuf};

use ball_motion::{NoteEvent, NoteKind};
use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use tracing::debug;

use crate::error::MidiError;

/// Ticks per quarter note written to the file header.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Largest delta a MIDI variable-length quantity can hold.
const MAX_DELTA: u32 = 0x0FFF_FFFF;

pub struct PerformanceLog {
    path:   PathBuf,
    events: Vec<TrackEvent<'static>>,
    dirty:  bool,
}

impl PerformanceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PerformanceLog { path: path.into(), events: Vec::new(), dirty: false }
    }

    pub fn path(&self) -> &Path { &self.path }
    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    /// Append one event.
    pub fn append(&mut self, event: &NoteEvent) {
        let (delta, message) = match event.kind {
            NoteKind::On => (0, MidiMessage::NoteOn {
                key: u7::new(event.note & 0x7F),
                vel: u7::new(event.velocity & 0x7F),
            }),
            NoteKind::Off => (event.tick.min(MAX_DELTA), MidiMessage::NoteOff {
                key: u7::new(event.note & 0x7F),
                vel: u7::new(event.velocity & 0x7F),
            }),
        };
        self.events.push(TrackEvent {
            delta: u28::new(delta),
            kind:  TrackEventKind::Midi { channel: u4::new(event.channel & 0x0F), message },
        });
        self.dirty = true;
    }

    /// Build the in-memory file: the recorded events plus End of Track.
    pub fn to_smf(&self) -> Smf<'static> {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
        ));
        let mut track = self.events.clone();
        track.push(TrackEvent {
            delta: u28::new(0),
            kind:  TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);
        smf
    }

    /// Serialise to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MidiError> {
        let mut buf = Vec::new();
        self.to_smf().write_std(&mut buf)?;
        Ok(buf)
    }

    /// Write the file, replacing any previous version.
    pub fn save(&mut self) -> Result<(), MidiError> {
        let bytes = self.to_bytes()?;
        std::fs::write(&self.path, bytes)?;
        self.dirty = false;
        debug!(path = %self.path.display(), events = self.events.len(), "performance log saved");
        Ok(())
    }

    /// Save only if events were appended since the last save.
    pub fn save_if_dirty(&mut self) -> Result<bool, MidiError> {
        if !self.dirty {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_has_zero_delta_off_has_cumulative_tick() {
        let mut log = PerformanceLog::new("unused.mid");
        log.append(&NoteEvent::on(88, 64, 2, 120));
        log.append(&NoteEvent::off(88, 64, 2, 130));
        log.append(&NoteEvent::on(90, 64, 2, 131));

        let smf = log.to_smf();
        let track = &smf.tracks[0];
        assert_eq!(track.len(), 4);
        assert_eq!(track[0].delta.as_int(), 0);
        assert_eq!(track[1].delta.as_int(), 130);
        assert_eq!(track[2].delta.as_int(), 0);
        assert_eq!(track[3].kind, TrackEventKind::Meta(MetaMessage::EndOfTrack));
        assert_eq!(
            track[1].kind,
            TrackEventKind::Midi {
                channel: u4::new(2),
                message: MidiMessage::NoteOff { key: u7::new(88), vel: u7::new(64) },
            }
        );
    }

    #[test]
    fn bytes_parse_back() {
        let mut log = PerformanceLog::new("unused.mid");
        log.append(&NoteEvent::on(60, 64, 0, 0));
        log.append(&NoteEvent::off(60, 64, 0, 500));
        let bytes = log.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"MThd");

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.tracks[0][1].delta.as_int(), 500);
    }

    #[test]
    fn save_writes_file_once_per_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.mid");
        let mut log = PerformanceLog::new(&path);

        assert!(!log.save_if_dirty().unwrap());
        assert!(!path.exists());

        log.append(&NoteEvent::on(70, 64, 1, 3));
        assert!(log.save_if_dirty().unwrap());
        assert!(path.exists());
        assert!(!log.save_if_dirty().unwrap());
    }
}
