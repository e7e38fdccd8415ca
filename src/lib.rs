//! Serial Tone Player
//!
//! A line-oriented command interpreter for a buzzer or speaker controller.
//! Text commands arrive over a byte-stream transport (typically a serial or
//! Bluetooth UART link), are mapped to tones, multi-note melodies or preset
//! slots stored in a small EEPROM-style byte store, and every command is
//! answered with a human-readable feedback line.
//!
//! # Features
//! - `TONE`, `MELODY`, `FX`, `STOP`, `VOLUME`, `LOOP`, `SAVE` and `PLAY` commands
//! - Note names (`C4`, `F#5`, `Bb3`) or raw frequencies in melodies
//! - Built-in effects (`BEEP`, `ALARM`, `UP`, `DOWN`)
//! - Ten persistent preset slots of 49 characters each
//! - Inactivity timeout that silences the output when the peer goes quiet
//! - Cooperative playback: `STOP` takes effect before the next melody event
//!
//! # Crate feature flags
//! - `streaming` (opt-in): audible output through the system audio device
//!   (enables the optional `rodio` dep)
//!
//! # Quick start
//! ```no_run
//! use serial_tone_player::host::{LogToneOutput, StdioTransport, SystemClock};
//! use serial_tone_player::{MemoryStore, PlayerConfig, TonePlayer};
//!
//! let config = PlayerConfig::default();
//! let mut player = TonePlayer::new(
//!     &config,
//!     StdioTransport::spawn(),
//!     LogToneOutput::default(),
//!     MemoryStore::eeprom(),
//!     SystemClock::new(),
//! );
//! loop {
//!     player.poll().ok();
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//! }
//! ```
//!
//! ## Deterministic simulation
//! ```
//! use serial_tone_player::sim::{ManualClock, MemoryTransport, RecordingToneOutput};
//! use serial_tone_player::{MemoryStore, PlayerConfig, TonePlayer};
//!
//! let clock = ManualClock::new();
//! let transport = MemoryTransport::new();
//! let output = RecordingToneOutput::with_clock(clock.clone());
//! let mut player = TonePlayer::new(
//!     &PlayerConfig::default(),
//!     transport.clone(),
//!     output.clone(),
//!     MemoryStore::eeprom(),
//!     clock.clone(),
//! );
//!
//! transport.push_str("TONE:440:500\n");
//! player.poll().unwrap();
//! assert_eq!(output.tones(), vec![(440, Some(500))]);
//! assert_eq!(transport.take_lines(), vec!["CMD: TONE:440:500", "PLAYING TONE 440Hz 500ms"]);
//! ```

#![warn(missing_docs)]

pub mod activity; // Idle-stop policy
pub mod command; // Command tokenizing
pub mod config; // Construction-time configuration
pub mod hal; // Tone/clock/transport capabilities
pub mod host; // Host implementations of the capabilities
pub mod line; // Line assembly from transport bytes
pub mod melody; // Melody string parsing
pub mod note_table; // Note name lookup
pub mod player; // Command interpreter and polling loop
pub mod preset; // Preset slots in the byte store
pub mod sequencer; // Cooperative melody playback
pub mod sim; // Deterministic doubles for tests and simulation
pub mod store; // Persistent byte store
#[cfg(feature = "streaming")]
pub mod streaming; // Audible output

/// Error types for tone player operations
#[derive(thiserror::Error, Debug)]
pub enum TonePlayerError {
    /// IO error from filesystem or transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Byte store access outside its capacity
    #[error("Store address {addr} outside capacity {capacity}")]
    Store {
        /// Requested address
        addr: usize,
        /// Store capacity in bytes
        capacity: usize,
    },

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for TonePlayerError {
    /// Converts a String into `TonePlayerError::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `AudioDeviceError`) when the
    /// failure has a known cause.
    fn from(msg: String) -> Self {
        TonePlayerError::Other(msg)
    }
}

impl From<&str> for TonePlayerError {
    /// Converts a string slice into `TonePlayerError::Other`.
    fn from(msg: &str) -> Self {
        TonePlayerError::Other(msg.to_string())
    }
}

/// Result type for tone player operations
pub type Result<T> = std::result::Result<T, TonePlayerError>;

// Public API exports
pub use activity::ActivityMonitor;
pub use command::Command;
pub use config::PlayerConfig;
pub use hal::{Clock, ToneOutput, Transport};
pub use line::LineAssembler;
pub use melody::{Effect, MelodyEvent};
pub use note_table::NoteTable;
pub use player::{PlayerState, TonePlayer};
pub use preset::{PresetId, PresetStore};
pub use sequencer::{PlaybackState, Sequencer, Step};
pub use store::{ByteStore, FileStore, MemoryStore};
#[cfg(feature = "streaming")]
pub use streaming::RodioToneOutput;
