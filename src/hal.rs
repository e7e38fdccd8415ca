//! Hardware Capabilities
//!
//! The interpreter only talks to the outside world through these traits:
//! a tone generator, a millisecond clock and a line-oriented byte transport.
//! The persistent byte store lives in [`crate::store`].

use crate::Result;

/// Square-wave (or any) tone generator on the speaker pin
pub trait ToneOutput {
    /// Start a tone without blocking.
    ///
    /// `duration_ms` of `None` keeps the tone sounding until [`no_tone`]
    /// or the next `tone` call.
    ///
    /// [`no_tone`]: ToneOutput::no_tone
    fn tone(&mut self, frequency_hz: u32, duration_ms: Option<u32>);

    /// Silence the output.
    fn no_tone(&mut self);

    /// Apply a volume level (0-10).
    ///
    /// Default implementation does nothing: a plain buzzer pin has no volume
    /// control. Override if the output can scale its amplitude.
    fn set_volume(&mut self, _level: u8) {}
}

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}

/// Byte-stream peer delivering commands and receiving feedback lines
pub trait Transport {
    /// Next received byte, or `None` when nothing is pending. Must not block.
    fn read_byte(&mut self) -> Option<u8>;

    /// Send one feedback line; the implementation appends the line break.
    fn write_line(&mut self, line: &str) -> Result<()>;
}

impl<T: ToneOutput + ?Sized> ToneOutput for &mut T {
    fn tone(&mut self, frequency_hz: u32, duration_ms: Option<u32>) {
        (**self).tone(frequency_hz, duration_ms)
    }

    fn no_tone(&mut self) {
        (**self).no_tone()
    }

    fn set_volume(&mut self, level: u8) {
        (**self).set_volume(level)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ManualClock, RecordingToneOutput};

    fn ring<O: ToneOutput, C: Clock>(mut output: O, clock: C) -> u64 {
        output.tone(880, Some(50));
        output.no_tone();
        clock.now_ms()
    }

    #[test]
    fn test_borrowed_capabilities() {
        let clock = ManualClock::new();
        clock.set(42);
        let mut output = RecordingToneOutput::new();

        assert_eq!(ring(&mut output, &clock), 42);
        assert_eq!(output.tones(), vec![(880, Some(50))]);
        assert_eq!(output.silence_count(), 1);
    }
}
