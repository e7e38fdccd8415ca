//! Host Capabilities
//!
//! Implementations of the capability traits for running the player as a
//! desktop process: a monotonic clock, a transport over stdin/stdout, and a
//! tone output that only logs what it would play.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::hal::{Clock, ToneOutput, Transport};
use crate::Result;

/// Milliseconds since construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Create a clock starting at 0
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Transport reading commands from stdin and writing feedback to stdout.
///
/// A background thread forwards stdin bytes over a channel so that
/// [`read_byte`](Transport::read_byte) never blocks.
#[derive(Debug)]
pub struct StdioTransport {
    rx: Receiver<u8>,
    closed: Arc<AtomicBool>,
}

impl StdioTransport {
    /// Start the stdin reader thread
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<u8>();
        let closed = Arc::new(AtomicBool::new(false));
        let closed_clone = Arc::clone(&closed);

        std::thread::spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut buf = [0u8; 256];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if buf[..n].iter().any(|&b| tx.send(b).is_err()) {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
            closed_clone.store(true, Ordering::Relaxed);
        });

        StdioTransport { rx, closed }
    }

    /// Check if stdin reached end of input.
    ///
    /// Bytes read before the end may still be queued.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

impl Transport for StdioTransport {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.try_recv().ok()
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Tone output that logs instead of sounding
#[derive(Debug, Default, Clone, Copy)]
pub struct LogToneOutput {
    volume: u8,
}

impl LogToneOutput {
    /// Last volume level applied
    pub fn volume(&self) -> u8 {
        self.volume
    }
}

impl ToneOutput for LogToneOutput {
    fn tone(&mut self, frequency_hz: u32, duration_ms: Option<u32>) {
        match duration_ms {
            Some(ms) => info!(frequency_hz, duration_ms = ms, volume = self.volume, "tone"),
            None => info!(frequency_hz, volume = self.volume, "tone (until stopped)"),
        }
    }

    fn no_tone(&mut self) {
        debug!("silence");
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level;
    }
}
