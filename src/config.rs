//! Player Configuration
//!
//! Construction-time settings of a [`TonePlayer`](crate::TonePlayer). They are
//! never changed through the command surface. Every field has a default, so a
//! JSON file only needs to list what differs:
//!
//! ```json
//! { "inactivity_timeout_ms": 60000, "preset_file": "presets.bin" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::MAX_VOLUME;
use crate::{Result, TonePlayerError};

/// Default transport speed
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default startup volume
pub const DEFAULT_VOLUME: u8 = 8;

/// Construction-time configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Transport receive pin
    pub rx_pin: u8,
    /// Transport transmit pin
    pub tx_pin: u8,
    /// Tone output pin
    pub speaker_pin: u8,
    /// Transport speed in baud
    pub baud_rate: u32,
    /// Idle time after which the output is stopped (0 disables)
    pub inactivity_timeout_ms: u64,
    /// Volume level at startup (0-10)
    pub initial_volume: u8,
    /// Echo feedback lines to the diagnostic log
    pub diagnostic_echo: bool,
    /// Image file of the preset store (host only)
    pub preset_file: Option<PathBuf>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            rx_pin: 2,
            tx_pin: 3,
            speaker_pin: 5,
            baud_rate: DEFAULT_BAUD_RATE,
            inactivity_timeout_ms: 0,
            initial_volume: DEFAULT_VOLUME,
            diagnostic_echo: true,
            preset_file: None,
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)
            .map_err(|e| TonePlayerError::ConfigError(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            TonePlayerError::ConfigError(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(TonePlayerError::ConfigError(
                "baud_rate must be greater than 0".into(),
            ));
        }
        if self.initial_volume > MAX_VOLUME {
            return Err(TonePlayerError::ConfigError(format!(
                "initial_volume {} exceeds {MAX_VOLUME}",
                self.initial_volume
            )));
        }
        Ok(())
    }
}
