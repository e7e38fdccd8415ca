//! Audio device output using rodio
//!
//! Renders tones as a square wave on the system audio device, the way a
//! buzzer on a PWM pin would sound. Each `tone` call replaces the sink, so a
//! new tone cuts the previous one off immediately.

use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::debug;

use crate::command::MAX_VOLUME;
use crate::hal::ToneOutput;
use crate::{Result, TonePlayerError};

/// Output sample rate
pub const SAMPLE_RATE: u32 = 44_100;

/// Peak amplitude of the square wave at full volume
const AMPLITUDE: f32 = 0.25;

/// Endless square wave source
struct SquareWave {
    phase: f32,
    step: f32,
}

impl SquareWave {
    fn new(frequency_hz: u32) -> Self {
        SquareWave {
            phase: 0.0,
            step: frequency_hz as f32 / SAMPLE_RATE as f32,
        }
    }
}

impl Iterator for SquareWave {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = if self.phase < 0.5 { AMPLITUDE } else { -AMPLITUDE };
        self.phase = (self.phase + self.step).fract();
        Some(sample)
    }
}

impl Source for SquareWave {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Tone output on the system audio device
pub struct RodioToneOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    volume: f32,
}

impl RodioToneOutput {
    /// Open the default audio device
    pub fn new(initial_volume: u8) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| {
            TonePlayerError::AudioDeviceError(format!("Failed to create audio stream: {}", e))
        })?;

        Ok(RodioToneOutput {
            _stream: stream,
            handle,
            sink: None,
            volume: level_to_gain(initial_volume),
        })
    }

    fn start(&mut self, frequency_hz: u32, duration_ms: Option<u32>) -> Result<()> {
        let sink = Sink::try_new(&self.handle).map_err(|e| {
            TonePlayerError::AudioDeviceError(format!("Failed to create audio sink: {}", e))
        })?;
        sink.set_volume(self.volume);

        let wave = SquareWave::new(frequency_hz);
        match duration_ms {
            Some(ms) => sink.append(wave.take_duration(Duration::from_millis(ms as u64))),
            None => sink.append(wave),
        }

        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        Ok(())
    }
}

impl ToneOutput for RodioToneOutput {
    fn tone(&mut self, frequency_hz: u32, duration_ms: Option<u32>) {
        if let Err(e) = self.start(frequency_hz, duration_ms) {
            debug!(error = %e, "tone dropped");
        }
    }

    fn no_tone(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level_to_gain(level);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }
}

fn level_to_gain(level: u8) -> f32 {
    level.min(MAX_VOLUME) as f32 / MAX_VOLUME as f32
}
