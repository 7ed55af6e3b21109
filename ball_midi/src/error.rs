use thiserror::Error;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI init error: {0}")]
    Init(String),

    #[error("no MIDI output ports found")]
    NoPorts,

    #[error("no MIDI output port matching {0:?}")]
    PortNotFound(String),

    #[error("failed to connect to {port}: {message}")]
    Connect { port: String, message: String },

    #[error("MIDI send failed: {0}")]
    Send(String),

    #[error("performance log I/O: {0}")]
    Io(#[from] std::io::Error),
}
