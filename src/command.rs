//! Command Tokenizing
//!
//! Turns one received line into a [`Command`]. Matching is a case-insensitive
//! prefix match on the verb, first match wins:
//!
//! | Line                  | Command                                  |
//! |-----------------------|------------------------------------------|
//! | `TONE:<f>[:<ms>]`     | [`Command::Tone`] (0 ms = indefinite)    |
//! | `MELODY:<body>`       | [`Command::Melody`] (original case)      |
//! | `FX:<name>`           | [`Command::Effect`]                      |
//! | `STOP`                | [`Command::Stop`]                        |
//! | `VOLUME:<0-10>`       | [`Command::Volume`] (clamped)            |
//! | `LOOP:<ON/OFF>`       | [`Command::Loop`]                        |
//! | `SAVE:<id>:<melody>`  | [`Command::Save`] (melody in original case) |
//! | `PLAY:<id>`           | [`Command::Play`]                        |
//!
//! Numeric arguments use [`parse_int_lossy`], so garbage reads as 0 instead of
//! failing. Anything else is [`Command::Unknown`].

use crate::melody::{parse_int_lossy, parse_u32_lossy};

/// Highest volume level
pub const MAX_VOLUME: u8 = 10;

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Play a single tone
    Tone {
        /// Frequency in Hz (0 = no sound)
        frequency: u32,
        /// Duration in ms, `None` until `STOP`
        duration_ms: Option<u32>,
    },
    /// Play a melody string
    Melody(String),
    /// Play a built-in effect by name
    Effect(String),
    /// Silence the output
    Stop,
    /// Set the volume (already clamped to 0-10)
    Volume(u8),
    /// Set the loop flag
    Loop(bool),
    /// Store a melody in a preset slot (id not yet validated)
    Save {
        /// Requested slot
        id: i64,
        /// Melody text
        melody: String,
    },
    /// Play a preset slot (id not yet validated)
    Play {
        /// Requested slot
        id: i64,
    },
    /// Unrecognised verb or malformed shape
    Unknown,
}

/// Trim a line and fold it to upper case for matching.
///
/// Only ASCII letters are folded, so byte offsets in the result match the
/// trimmed original.
pub fn normalize(line: &str) -> String {
    line.trim().to_ascii_uppercase()
}

impl Command {
    /// Parse a raw line
    pub fn parse(line: &str) -> Command {
        let original = line.trim();
        Self::parse_normalized(original, &normalize(original))
    }

    /// Parse using an already normalized line; `original` is the trimmed line
    /// with its case preserved.
    pub fn parse_normalized(original: &str, upper: &str) -> Command {
        if let Some(args) = upper.strip_prefix("TONE:") {
            let (frequency, duration) = match args.split_once(':') {
                Some((freq, dur)) => (parse_u32_lossy(freq), parse_u32_lossy(dur)),
                None => (parse_u32_lossy(args), 0),
            };
            Command::Tone {
                frequency,
                duration_ms: (duration > 0).then_some(duration),
            }
        } else if upper.starts_with("MELODY:") {
            Command::Melody(original["MELODY:".len()..].to_string())
        } else if let Some(name) = upper.strip_prefix("FX:") {
            Command::Effect(name.to_string())
        } else if upper.starts_with("STOP") {
            Command::Stop
        } else if let Some(level) = upper.strip_prefix("VOLUME:") {
            Command::Volume(parse_int_lossy(level).clamp(0, MAX_VOLUME as i64) as u8)
        } else if let Some(mode) = upper.strip_prefix("LOOP:") {
            Command::Loop(mode.contains("ON"))
        } else if let Some(args) = upper.strip_prefix("SAVE:") {
            match args.find(':') {
                Some(sep) => {
                    let melody_start = "SAVE:".len() + sep + 1;
                    Command::Save {
                        id: parse_int_lossy(&args[..sep]),
                        melody: original[melody_start..].to_string(),
                    }
                }
                None => Command::Unknown,
            }
        } else if let Some(id) = upper.strip_prefix("PLAY:") {
            Command::Play {
                id: parse_int_lossy(id),
            }
        } else {
            Command::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  tone:440 \r"), "TONE:440");
    }

    #[test]
    fn test_tone_shapes() {
        assert_eq!(Command::parse("TONE:440:500"), Command::Tone {
            frequency: 440,
            duration_ms: Some(500)
        });
        assert_eq!(Command::parse("tone:440"), Command::Tone {
            frequency: 440,
            duration_ms: None
        });
        assert_eq!(Command::parse("TONE:440:0"), Command::Tone {
            frequency: 440,
            duration_ms: None
        });
        assert_eq!(Command::parse("TONE:abc"), Command::Tone {
            frequency: 0,
            duration_ms: None
        });
    }

    #[test]
    fn test_melody_keeps_original_case() {
        assert_eq!(
            Command::parse("  melody:C4,500;Bb3,250 "),
            Command::Melody("C4,500;Bb3,250".into())
        );
    }

    #[test]
    fn test_effect_is_upper_cased() {
        assert_eq!(Command::parse("fx:beep"), Command::Effect("BEEP".into()));
    }

    #[test]
    fn test_stop_is_a_prefix_match() {
        assert_eq!(Command::parse("stop"), Command::Stop);
        assert_eq!(Command::parse("STOPNOW"), Command::Stop);
    }

    #[test]
    fn test_volume_clamped() {
        assert_eq!(Command::parse("VOLUME:15"), Command::Volume(10));
        assert_eq!(Command::parse("VOLUME:3"), Command::Volume(3));
        assert_eq!(Command::parse("VOLUME:-4"), Command::Volume(0));
        assert_eq!(Command::parse("VOLUME:x"), Command::Volume(0));
    }

    #[test]
    fn test_loop_flag() {
        assert_eq!(Command::parse("LOOP:on"), Command::Loop(true));
        assert_eq!(Command::parse("LOOP:OFF"), Command::Loop(false));
        assert_eq!(Command::parse("LOOP:1"), Command::Loop(false));
    }

    #[test]
    fn test_save_and_play() {
        assert_eq!(Command::parse("save:3:c4,100;E4,200"), Command::Save {
            id: 3,
            melody: "c4,100;E4,200".into()
        });
        assert_eq!(Command::parse("SAVE:12:C4,1"), Command::Save {
            id: 12,
            melody: "C4,1".into()
        });
        assert_eq!(Command::parse("SAVE:3"), Command::Unknown);
        assert_eq!(Command::parse("PLAY:7"), Command::Play { id: 7 });
        assert_eq!(Command::parse("PLAY:"), Command::Play { id: 0 });
    }

    #[test]
    fn test_unknown() {
        assert_eq!(Command::parse(""), Command::Unknown);
        assert_eq!(Command::parse("HELLO"), Command::Unknown);
        assert_eq!(Command::parse("TONE440"), Command::Unknown);
    }
}
