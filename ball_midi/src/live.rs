//! Live instrument output.
//!
//! [`LiveOutput`] abstracts over a `midir` connection and a null backend used
//! when no MIDI port is available.

use tracing::{info, warn};

use crate::error::MidiError;

const CLIENT_NAME: &str = "snook";
const PORT_NAME:   &str = "snook-live";

// ════════════════════════════════════════════════════════════════════════════
// LiveOutput
// ════════════════════════════════════════════════════════════════════════════

pub trait LiveOutput: Send {
    /// Name of the connected port, for logging.
    fn name(&self) -> &str;

    /// Send one raw MIDI message.
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError>;

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), MidiError> {
        self.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])
    }

    fn note_off(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), MidiError> {
        self.send(&[0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])
    }
}

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidirOutput {
    conn: midir::MidiOutputConnection,
    name: String,
}

impl LiveOutput for MidirOutput {
    fn name(&self) -> &str { &self.name }

    fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
        self.conn.send(message).map_err(|e| MidiError::Send(e.to_string()))
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

#[derive(Debug, Default)]
pub struct NullOutput;

impl LiveOutput for NullOutput {
    fn name(&self) -> &str { "null" }
    fn send(&mut self, _message: &[u8]) -> Result<(), MidiError> { Ok(()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Port selection
// ════════════════════════════════════════════════════════════════════════════

/// Pick a port index.
///
/// A `hint` matches case-insensitively as a substring of the port name.
/// Without a hint, a software synthesiser is preferred, then the first port.
pub fn choose_port(names: &[String], hint: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    if let Some(hint) = hint {
        let hint = hint.to_lowercase();
        return names.iter().position(|n| n.to_lowercase().contains(&hint));
    }
    let synth = names.iter().position(|n| {
        let n = n.to_lowercase();
        n.contains("fluid") || n.contains("timidity") ||
        n.contains("microsoft") || n.contains("gm") ||
        n.contains("synth")
    });
    Some(synth.unwrap_or(0))
}

/// Connect to a MIDI output port.
pub fn open_live_output(hint: Option<&str>) -> Result<Box<dyn LiveOutput>, MidiError> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME)
        .map_err(|e| MidiError::Init(e.to_string()))?;

    let ports = midi_out.ports();
    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();

    let idx = match choose_port(&names, hint) {
        Some(i) => i,
        None if names.is_empty() => return Err(MidiError::NoPorts),
        None => return Err(MidiError::PortNotFound(hint.unwrap_or_default().to_string())),
    };

    let name = names[idx].clone();
    info!(port = %name, "opening MIDI port");
    let conn = midi_out.connect(&ports[idx], PORT_NAME)
        .map_err(|e| MidiError::Connect { port: name.clone(), message: e.to_string() })?;
    Ok(Box::new(MidirOutput { conn, name }))
}

/// Like [`open_live_output`], but falls back to [`NullOutput`] with a warning.
pub fn open_live_output_or_null(hint: Option<&str>) -> Box<dyn LiveOutput> {
    match open_live_output(hint) {
        Ok(out) => out,
        Err(MidiError::NoPorts) => {
            warn!("no MIDI output ports found, using null output");
            warn!("install a MIDI synthesiser such as:");
            warn!("  macOS: built-in CoreMIDI / IAC Driver");
            warn!("  Linux: `timidity -iA` or `fluidsynth`");
            warn!("  Windows: built-in GS Wavetable Synth");
            Box::new(NullOutput)
        }
        Err(e) => {
            warn!(error = %e, "MIDI output unavailable, using null output");
            Box::new(NullOutput)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every message; fails on demand.
    #[derive(Default)]
    pub(crate) struct Capture {
        pub sent: Vec<Vec<u8>>,
        pub fail: bool,
    }

    impl LiveOutput for Capture {
        fn name(&self) -> &str { "capture" }
        fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
            if self.fail {
                return Err(MidiError::Send("unplugged".into()));
            }
            self.sent.push(message.to_vec());
            Ok(())
        }
    }

    #[test]
    fn status_bytes() {
        let mut c = Capture::default();
        c.note_on(2, 88, 64).unwrap();
        c.note_off(2, 88, 64).unwrap();
        assert_eq!(c.sent, vec![
            vec![0x92, 88, 64],
            vec![0x82, 88, 64],
        ]);
    }

    #[test]
    fn choose_port_prefers_hint_then_synth() {
        let names: Vec<String> = ["Midi Through", "IAC Driver Bus 1", "FluidSynth virtual port"]
            .iter().map(|s| s.to_string()).collect();
        assert_eq!(choose_port(&names, Some("iac")), Some(1));
        assert_eq!(choose_port(&names, Some("nope")), None);
        assert_eq!(choose_port(&names, None), Some(2));
        assert_eq!(choose_port(&names[..2], None), Some(0));
        assert_eq!(choose_port(&[], None), None);
    }

    #[test]
    fn null_output_accepts_everything() {
        let mut n = NullOutput;
        assert!(n.note_on(0, 60, 64).is_ok());
        assert_eq!(n.name(), "null");
    }
}
