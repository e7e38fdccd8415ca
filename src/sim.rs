//! Simulation Doubles
//!
//! Deterministic, hardware-free implementations of the capabilities for unit
//! tests and host-side simulation. Every double is a cheap handle around
//! shared state: clone it before handing it to a [`TonePlayer`] and keep the
//! clone to drive or inspect it afterwards.
//!
//! [`TonePlayer`]: crate::TonePlayer

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::hal::{Clock, ToneOutput, Transport};
use crate::Result;

/// Manually advanced clock
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at time 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in ms
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }

    /// Jump to an absolute time
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::Relaxed);
    }

    /// Move the clock forward
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now()
    }
}

/// What the tone output was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneAction {
    /// `tone(frequency, duration)`
    Play {
        /// Frequency in Hz
        frequency: u32,
        /// Duration in ms, `None` for indefinite
        duration_ms: Option<u32>,
    },
    /// `no_tone()`
    Silence,
    /// `set_volume(level)`
    Volume(u8),
}

/// A recorded tone output call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneEvent {
    /// Clock time of the call (0 without an attached clock)
    pub at_ms: u64,
    /// The call
    pub action: ToneAction,
}

/// Tone output that records every call
#[derive(Debug, Clone, Default)]
pub struct RecordingToneOutput {
    events: Arc<Mutex<Vec<ToneEvent>>>,
    clock: Option<ManualClock>,
}

impl RecordingToneOutput {
    /// Create a recorder without timestamps
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder stamping events with `clock`
    pub fn with_clock(clock: ManualClock) -> Self {
        RecordingToneOutput {
            events: Arc::default(),
            clock: Some(clock),
        }
    }

    /// All recorded calls
    pub fn events(&self) -> Vec<ToneEvent> {
        self.events.lock().clone()
    }

    /// Played tones as `(frequency, duration)` pairs
    pub fn tones(&self) -> Vec<(u32, Option<u32>)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event.action {
                ToneAction::Play {
                    frequency,
                    duration_ms,
                } => Some((frequency, duration_ms)),
                _ => None,
            })
            .collect()
    }

    /// Played tones as `(start time, frequency)` pairs
    pub fn tone_times(&self) -> Vec<(u64, u32)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event.action {
                ToneAction::Play { frequency, .. } => Some((event.at_ms, frequency)),
                _ => None,
            })
            .collect()
    }

    /// Number of `no_tone` calls
    pub fn silence_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.action == ToneAction::Silence)
            .count()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, action: ToneAction) {
        let at_ms = self.clock.as_ref().map_or(0, ManualClock::now);
        self.events.lock().push(ToneEvent { at_ms, action });
    }
}

impl ToneOutput for RecordingToneOutput {
    fn tone(&mut self, frequency_hz: u32, duration_ms: Option<u32>) {
        self.record(ToneAction::Play {
            frequency: frequency_hz,
            duration_ms,
        });
    }

    fn no_tone(&mut self) {
        self.record(ToneAction::Silence);
    }

    fn set_volume(&mut self, level: u8) {
        self.record(ToneAction::Volume(level));
    }
}

#[derive(Debug, Default)]
struct Link {
    inbound: VecDeque<u8>,
    outbound: Vec<String>,
}

/// In-memory transport: push bytes in, read feedback lines out
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    link: Arc<Mutex<Link>>,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes as if sent by the peer
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.link.lock().inbound.extend(bytes.iter().copied());
    }

    /// Queue text as if sent by the peer
    pub fn push_str(&self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    /// Number of queued, unread bytes
    pub fn pending(&self) -> usize {
        self.link.lock().inbound.len()
    }

    /// Drain the feedback lines written so far
    pub fn take_lines(&self) -> Vec<String> {
        std::mem::take(&mut self.link.lock().outbound)
    }
}

impl Transport for MemoryTransport {
    fn read_byte(&mut self) -> Option<u8> {
        self.link.lock().inbound.pop_front()
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.link.lock().outbound.push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        clock.advance(250);
        handle.set(1_000);
        clock.advance(5);
        assert_eq!(handle.now_ms(), 1_005);
    }

    #[test]
    fn test_recorder_shares_state_across_clones() {
        let clock = ManualClock::new();
        let recorder = RecordingToneOutput::with_clock(clock.clone());
        let mut output = recorder.clone();

        output.tone(440, None);
        clock.set(30);
        output.no_tone();

        assert_eq!(recorder.tones(), vec![(440, None)]);
        assert_eq!(recorder.silence_count(), 1);
        assert_eq!(recorder.events()[1].at_ms, 30);
    }

    #[test]
    fn test_memory_transport() {
        let transport = MemoryTransport::new();
        let mut port = transport.clone();
        transport.push_str("AB");
        assert_eq!(port.read_byte(), Some(b'A'));
        assert_eq!(transport.pending(), 1);

        port.write_line("STOPPED").unwrap();
        assert_eq!(transport.take_lines(), vec!["STOPPED"]);
        assert!(transport.take_lines().is_empty());
    }
}
