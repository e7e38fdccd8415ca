//! Melody String Parsing
//!
//! A melody is a `;`-separated list of entries. Each entry is either a
//! built-in effect (`FX:BEEP`) or a `<pitch>,<duration>` pair, where the pitch
//! is a frequency in Hz or a note name resolved through [`NoteTable`]:
//!
//! ```text
//! C4,500;D4,500;440,250;FX:ALARM
//! ```
//!
//! Malformed entries never abort a melody. An entry whose pitch cannot be
//! resolved (or that lacks a `,`) produces no event and parsing continues with
//! the next entry.

use std::fmt;
use std::str::FromStr;

use nom::{
    character::complete::{digit1, multispace0, one_of},
    combinator::opt,
    IResult,
};
use tracing::debug;

use crate::note_table::NoteTable;
use crate::sequencer::Step;

/// Separator between melody entries
pub const ENTRY_SEPARATOR: char = ';';

/// Separator between pitch and duration inside a tone entry
pub const FIELD_SEPARATOR: char = ',';

/// Prefix marking an effect entry
pub const EFFECT_PREFIX: &str = "FX:";

/// Silence appended after every melody note
pub const NOTE_MARGIN_MS: u32 = 20;

/// Built-in parameterless tone pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// 1000 Hz for 100 ms, 150 ms step
    Beep,
    /// Three 900 Hz pulses of 200 ms, 250 ms apart
    Alarm,
    /// Rising sweep 400..=1100 Hz in 100 Hz steps
    Up,
    /// Falling sweep 1200..=500 Hz in 100 Hz steps
    Down,
}

impl Effect {
    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Beep => "BEEP",
            Effect::Alarm => "ALARM",
            Effect::Up => "UP",
            Effect::Down => "DOWN",
        }
    }

    /// Expand the effect into timed playback steps
    pub fn steps(&self) -> Vec<Step> {
        match self {
            Effect::Beep => vec![Step::new(1000, 100, 150)],
            Effect::Alarm => vec![Step::new(900, 200, 250); 3],
            Effect::Up => (400..1200)
                .step_by(100)
                .map(|freq| Step::new(freq, 60, 80))
                .collect(),
            Effect::Down => (500..=1200)
                .rev()
                .step_by(100)
                .map(|freq| Step::new(freq, 60, 80))
                .collect(),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an effect name outside the built-in set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown effect '{0}'")]
pub struct UnknownEffect(pub String);

impl FromStr for Effect {
    type Err = UnknownEffect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BEEP" => Ok(Effect::Beep),
            "ALARM" => Ok(Effect::Alarm),
            "UP" => Ok(Effect::Up),
            "DOWN" => Ok(Effect::Down),
            other => Err(UnknownEffect(other.to_string())),
        }
    }
}

/// One playable unit of a melody
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MelodyEvent {
    /// Single tone; `None` duration plays until stopped
    Tone {
        /// Frequency in Hz
        frequency: u32,
        /// Duration in milliseconds
        duration_ms: Option<u32>,
    },
    /// Built-in effect
    Effect(Effect),
}

impl MelodyEvent {
    /// Expand the event into timed playback steps.
    ///
    /// Melody notes are held for their duration plus [`NOTE_MARGIN_MS`]. An
    /// indefinite note keeps sounding into the next step and only holds the
    /// margin.
    pub fn steps(&self) -> Vec<Step> {
        match *self {
            MelodyEvent::Tone {
                frequency,
                duration_ms: Some(duration),
            } => vec![Step::new(
                frequency,
                duration,
                duration.saturating_add(NOTE_MARGIN_MS),
            )],
            MelodyEvent::Tone {
                frequency,
                duration_ms: None,
            } => vec![Step::sustained(frequency, NOTE_MARGIN_MS)],
            MelodyEvent::Effect(effect) => effect.steps(),
        }
    }
}

/// Parse a melody string into its events, skipping unresolvable entries.
///
/// A trailing entry without a terminating `;` is still parsed.
pub fn parse_melody(melody: &str) -> Vec<MelodyEvent> {
    melody
        .split(ENTRY_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(parse_entry)
        .collect()
}

/// Parse a melody string straight into playback steps.
pub fn compile(melody: &str) -> Vec<Step> {
    parse_melody(melody)
        .iter()
        .flat_map(MelodyEvent::steps)
        .collect()
}

/// Parse one `;`-free entry.
pub fn parse_entry(entry: &str) -> Option<MelodyEvent> {
    if let Some(name) = entry.strip_prefix(EFFECT_PREFIX) {
        return match name.parse() {
            Ok(effect) => Some(MelodyEvent::Effect(effect)),
            Err(err) => {
                debug!(%err, "skipping effect entry");
                None
            }
        };
    }

    let (pitch, duration) = match entry.split_once(FIELD_SEPARATOR) {
        Some((pitch, duration)) if !pitch.is_empty() => (pitch.trim(), duration),
        _ => {
            debug!(%entry, "skipping entry without pitch and duration");
            return None;
        }
    };

    let Some(frequency) = resolve_pitch(pitch) else {
        debug!(%entry, "skipping entry with unresolvable pitch");
        return None;
    };

    // 0 sustains the note, like `TONE:<f>:0`
    let duration = parse_u32_lossy(duration);
    Some(MelodyEvent::Tone {
        frequency,
        duration_ms: (duration > 0).then_some(duration),
    })
}

/// Resolve a pitch token: a numeric frequency first, then a note name.
pub fn resolve_pitch(token: &str) -> Option<u32> {
    match parse_u32_lossy(token) {
        0 => NoteTable::lookup(token),
        freq => Some(freq),
    }
}

fn leading_integer(input: &str) -> IResult<&str, i64> {
    let (input, _) = multispace0(input)?;
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, digits) = digit1(input)?;

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    let value = if sign == Some('-') {
        -magnitude
    } else {
        magnitude
    };
    Ok((input, value))
}

/// Best-effort integer parse.
///
/// Skips leading whitespace, accepts an optional sign and reads leading digits,
/// ignoring anything after them (`"440Hz"` is 440). Input without leading
/// digits yields 0; overflow saturates.
pub fn parse_int_lossy(input: &str) -> i64 {
    leading_integer(input).map(|(_, value)| value).unwrap_or(0)
}

/// [`parse_int_lossy`] clamped into `u32` (negative values become 0).
pub fn parse_u32_lossy(input: &str) -> u32 {
    parse_int_lossy(input).clamp(0, u32::MAX as i64) as u32
}
