//! The note sink used by the driver: live output plus performance log.

use ball_motion::{NoteEvent, NoteKind, NoteSink, SinkError, SWEEP_NOTES};

use crate::live::LiveOutput;
use crate::log::PerformanceLog;

pub struct MidiNoteSink {
    live:     Box<dyn LiveOutput>,
    log:      Option<PerformanceLog>,
    /// Channels whose events are appended to the log.
    recorded: Vec<u8>,
}

impl MidiNoteSink {
    pub fn new(live: Box<dyn LiveOutput>) -> Self {
        MidiNoteSink { live, log: None, recorded: Vec::new() }
    }

    /// Record events on `channels` into `log`.
    pub fn with_log(mut self, log: PerformanceLog, channels: &[u8]) -> Self {
        self.log      = Some(log);
        self.recorded = channels.iter().map(|c| c & 0x0F).collect();
        self
    }

    pub fn live_name(&self) -> &str { self.live.name() }
    pub fn log(&self) -> Option<&PerformanceLog> { self.log.as_ref() }
    pub fn log_mut(&mut self) -> Option<&mut PerformanceLog> { self.log.as_mut() }

    fn records(&self, channel: u8) -> bool {
        self.recorded.contains(&channel)
    }
}

impl NoteSink for MidiNoteSink {
    fn deliver(&mut self, event: &NoteEvent) -> Result<(), SinkError> {
        let sent = match event.kind {
            NoteKind::On  => self.live.note_on(event.channel, event.note, event.velocity),
            NoteKind::Off => self.live.note_off(event.channel, event.note, event.velocity),
        };
        sent.map_err(|e| SinkError::Instrument(e.to_string()))?;

        if self.records(event.channel) {
            if let Some(log) = self.log.as_mut() {
                log.append(event);
            }
        }
        Ok(())
    }

    /// The sweep only silences the instrument; it is not part of the
    /// performance.
    fn all_notes_off(&mut self, channel: u8, velocity: u8, _tick: u32) -> Result<(), SinkError> {
        for note in SWEEP_NOTES {
            self.live.note_off(channel, note, velocity)
                .map_err(|e| SinkError::Instrument(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::tests::Capture;

    #[test]
    fn live_gets_everything_log_gets_recorded_channels() {
        let mut sink = MidiNoteSink::new(Box::new(Capture::default()))
            .with_log(PerformanceLog::new("unused.mid"), &[2]);

        sink.deliver(&NoteEvent::on(88, 64, 0, 1)).unwrap();
        sink.deliver(&NoteEvent::on(88, 64, 2, 1)).unwrap();
        sink.deliver(&NoteEvent::off(88, 64, 2, 7)).unwrap();

        assert_eq!(sink.log().map(PerformanceLog::len), Some(2));
    }

    #[test]
    fn instrument_failure_skips_log() {
        let capture = Capture { fail: true, ..Capture::default() };
        let mut sink = MidiNoteSink::new(Box::new(capture))
            .with_log(PerformanceLog::new("unused.mid"), &[0]);

        let err = sink.deliver(&NoteEvent::on(60, 64, 0, 0)).unwrap_err();
        assert!(matches!(err, SinkError::Instrument(_)));
        assert_eq!(sink.log().map(PerformanceLog::len), Some(0));
    }

    #[test]
    fn sweep_is_not_logged() {
        let mut sink = MidiNoteSink::new(Box::new(Capture::default()))
            .with_log(PerformanceLog::new("unused.mid"), &[1]);
        sink.all_notes_off(1, 64, 50).unwrap();
        assert_eq!(sink.log().map(PerformanceLog::len), Some(0));
    }
}
