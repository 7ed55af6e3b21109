//! Session configuration, loaded from TOML.
//!
//! ```toml
//! on_sink_error = "drop"
//!
//! [tracker]
//! sample_interval = 4
//!
//! [[objects]]
//! label   = "white"
//! channel = 2
//! record  = true
//!
//! [midi]
//! port = "IAC Driver Bus 1"
//!
//! [log]
//! path           = "performance.mid"
//! autosave_every = 30
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ball_motion::{TrackerConfig, DEFAULT_VELOCITY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("tracker config: {0}")]
    Tracker(#[from] ball_motion::ConfigError),

    #[error("at least one object must be tracked")]
    NoObjects,

    #[error("object label {0:?} used twice")]
    DuplicateLabel(String),

    #[error("object {label:?}: channel {channel} outside 0–15")]
    Channel { label: String, channel: u8 },

    #[error("object {label:?}: velocity {velocity} outside 0–127")]
    Velocity { label: String, velocity: u8 },
}

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

/// One tracked ball.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub label:    String,
    pub channel:  u8,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    /// Append this object's notes to the performance log.
    #[serde(default)]
    pub record:   bool,
}

fn default_velocity() -> u8 { DEFAULT_VELOCITY }

impl ObjectConfig {
    fn new(label: &str, channel: u8, record: bool) -> Self {
        ObjectConfig { label: label.to_string(), channel, velocity: DEFAULT_VELOCITY, record }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Send notes to a live MIDI port.
    pub enabled: bool,
    /// Case-insensitive substring of the port name.
    pub port:    Option<String>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig { enabled: true, port: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path:           PathBuf,
    /// Re-save the log every this many frames; 0 saves only at shutdown.
    pub autosave_every: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { path: PathBuf::from("performance.mid"), autosave_every: 30 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width:  usize,
    pub height: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig { width: 640, height: 480 }
    }
}

/// What to do when the note sink rejects an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkErrorPolicy {
    /// Log it and drop the rest of that object's events for the frame.
    #[default]
    Drop,
    /// Stop the session.
    Halt,
}

// ════════════════════════════════════════════════════════════════════════════
// SessionConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub on_sink_error: SinkErrorPolicy,
    pub tracker:       TrackerConfig,
    pub objects:       Vec<ObjectConfig>,
    pub midi:          MidiConfig,
    pub log:           LogConfig,
    pub window:        WindowConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            on_sink_error: SinkErrorPolicy::default(),
            tracker:       TrackerConfig::default(),
            objects: vec![
                ObjectConfig::new("yellow", 0, false),
                ObjectConfig::new("red",    1, false),
                ObjectConfig::new("white",  2, true),
            ],
            midi:   MidiConfig::default(),
            log:    LogConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: SessionConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        SessionConfig::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        if self.objects.is_empty() {
            return Err(ConfigError::NoObjects);
        }
        let mut seen = HashSet::new();
        for obj in &self.objects {
            if !seen.insert(obj.label.as_str()) {
                return Err(ConfigError::DuplicateLabel(obj.label.clone()));
            }
            if obj.channel > 15 {
                return Err(ConfigError::Channel { label: obj.label.clone(), channel: obj.channel });
            }
            if obj.velocity > 127 {
                return Err(ConfigError::Velocity { label: obj.label.clone(), velocity: obj.velocity });
            }
        }
        Ok(())
    }

    /// Channels whose notes go to the performance log.
    pub fn recorded_channels(&self) -> Vec<u8> {
        let mut chans: Vec<u8> = self.objects.iter()
            .filter(|o| o.record)
            .map(|o| o.channel)
            .collect();
        chans.sort_unstable();
        chans.dedup();
        chans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_three_balls() {
        let cfg = SessionConfig::from_toml("").unwrap();
        assert_eq!(cfg, SessionConfig::default());
        let labels: Vec<_> = cfg.objects.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["yellow", "red", "white"]);
        assert_eq!(cfg.recorded_channels(), vec![2]);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg = SessionConfig::from_toml(r#"
            on_sink_error = "halt"

            [tracker]
            sample_interval = 6
            pitch = { slope = 0.2 }

            [[objects]]
            label   = "blue"
            channel = 5

            [midi]
            port = "fluid"
        "#).unwrap();
        assert_eq!(cfg.on_sink_error, SinkErrorPolicy::Halt);
        assert_eq!(cfg.tracker.sample_interval, 6);
        assert_eq!(cfg.tracker.pitch.slope, 0.2);
        assert_eq!(cfg.tracker.pitch.reference, 69.0);
        assert_eq!(cfg.tracker.angle_delta_threshold, 0.3);
        assert_eq!(cfg.objects.len(), 1);
        assert_eq!(cfg.objects[0].velocity, 64);
        assert!(!cfg.objects[0].record);
        assert!(cfg.midi.enabled);
        assert_eq!(cfg.midi.port.as_deref(), Some("fluid"));
        assert!(cfg.recorded_channels().is_empty());
    }

    #[test]
    fn rejects_invalid_sessions() {
        assert!(matches!(
            SessionConfig::from_toml("objects = []"),
            Err(ConfigError::NoObjects)
        ));
        assert!(matches!(
            SessionConfig::from_toml(r#"
                [[objects]]
                label = "a"
                channel = 0
                [[objects]]
                label = "a"
                channel = 1
            "#),
            Err(ConfigError::DuplicateLabel(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml(r#"
                [[objects]]
                label = "a"
                channel = 16
            "#),
            Err(ConfigError::Channel { channel: 16, .. })
        ));
        assert!(matches!(
            SessionConfig::from_toml("[tracker]\nsample_interval = 0"),
            Err(ConfigError::Tracker(_))
        ));
        assert!(matches!(
            SessionConfig::from_toml("objects = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn shipped_example_parses() {
        let cfg = SessionConfig::from_toml(include_str!("../snook.toml")).unwrap();
        assert_eq!(cfg.tracker.frame(), Some((640, 480)));
        assert_eq!(cfg.recorded_channels(), vec![2]);
        assert_eq!(cfg.objects, SessionConfig::default().objects);
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = SessionConfig::default();
        let text = cfg.to_toml().unwrap();
        assert_eq!(SessionConfig::from_toml(&text).unwrap(), cfg);
    }
}
