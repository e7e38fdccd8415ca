//! Note Name Lookup
//!
//! Maps note-name tokens such as `C4`, `F#5` or `Bb3` to integer frequencies
//! in Hz. Frequencies come from 12-tone equal temperament with A4 = 440 Hz,
//! rounded to the nearest integer, so the familiar buzzer values
//! (C4 = 262, A4 = 440, C5 = 523) fall out unchanged.
//!
//! Lookup is case-sensitive: the letter must be upper case and a flat is
//! written with a lower-case `b`.

/// Reference pitch (A4) in Hz
pub const A4_FREQUENCY_HZ: f32 = 440.0;

/// MIDI note number of A4
const A4_MIDI: i32 = 69;

/// Lowest octave accepted by the table
pub const MIN_OCTAVE: u8 = 0;

/// Highest octave accepted by the table
pub const MAX_OCTAVE: u8 = 8;

/// Static note-name to frequency mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteTable;

impl NoteTable {
    /// Resolve a note name to its rounded frequency in Hz.
    ///
    /// Returns `None` for anything that is not `<letter>[#|b]<octave>` with the
    /// octave in `0..=8`.
    pub fn lookup(name: &str) -> Option<u32> {
        Self::exact_frequency(name).map(|freq| freq.round() as u32)
    }

    /// Resolve a note name to its unrounded equal-temperament frequency.
    pub fn exact_frequency(name: &str) -> Option<f32> {
        let midi = Self::midi_number(name)?;
        Some(A4_FREQUENCY_HZ * 2f32.powf((midi - A4_MIDI) as f32 / 12.0))
    }

    /// MIDI note number for a note name (C4 = 60).
    pub fn midi_number(name: &str) -> Option<i32> {
        let mut chars = name.chars();
        let semitone = match chars.next()? {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let rest = chars.as_str();
        let (shift, octave) = match rest.as_bytes().first()? {
            b'#' => (1, &rest[1..]),
            b'b' => (-1, &rest[1..]),
            _ => (0, rest),
        };

        if octave.len() != 1 {
            return None;
        }
        let octave: u8 = octave.parse().ok()?;
        if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
            return None;
        }

        Some((octave as i32 + 1) * 12 + semitone + shift)
    }
}
