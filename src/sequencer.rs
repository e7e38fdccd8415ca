//! Cooperative Melody Playback
//!
//! Drives a compiled list of [`Step`]s against a [`ToneOutput`] using the
//! polling clock instead of sleeping. Each step starts a non-blocking tone and
//! reserves `hold_ms` of the timeline before the next step may start, which
//! reproduces the timing of a blocking `tone(); delay();` loop while leaving
//! the caller free to handle new commands between steps.
//!
//! ```text
//!  start ──▶ Playing{index 0} ──tick ≥ deadline──▶ Playing{index 1} ──▶ … ──▶ Idle
//!              │                                                          ▲
//!              └──────────────── stop() / start() replaces ───────────────┘
//! ```

use tracing::{debug, trace};

use crate::hal::ToneOutput;

/// One timed tone inside a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Frequency in Hz
    pub frequency: u32,
    /// How long the tone sounds, `None` until the next tone or silence
    pub tone_ms: Option<u32>,
    /// Time reserved for the step before the next one starts
    pub hold_ms: u32,
}

impl Step {
    /// Create a new step
    pub const fn new(frequency: u32, tone_ms: u32, hold_ms: u32) -> Self {
        Step {
            frequency,
            tone_ms: Some(tone_ms),
            hold_ms,
        }
    }

    /// Create a step whose tone keeps sounding after `hold_ms`
    pub const fn sustained(frequency: u32, hold_ms: u32) -> Self {
        Step {
            frequency,
            tone_ms: None,
            hold_ms,
        }
    }
}

/// Playback state of the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing scheduled
    #[default]
    Idle,
    /// Step `index` is sounding; the next step is due at `next_at`
    Playing {
        /// Index of the current step
        index: usize,
        /// Clock time (ms) at which the next step starts
        next_at: u64,
    },
}

/// Step sequencer for melodies and effects
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    steps: Vec<Step>,
    state: PlaybackState,
    passes: u32,
}

impl Sequencer {
    /// Create an idle sequencer
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any running sequence and play the first step at `now`.
    ///
    /// Returns `false` (and stays idle) when `steps` is empty.
    pub fn start<O: ToneOutput>(&mut self, steps: Vec<Step>, now: u64, output: &mut O) -> bool {
        self.steps = steps;
        self.passes = 0;
        if self.steps.is_empty() {
            self.state = PlaybackState::Idle;
            return false;
        }
        debug!(steps = self.steps.len(), "sequence started");
        self.play_step(0, now, output);
        true
    }

    /// Advance the sequence if the current step's time is up.
    ///
    /// At most one step is started per call. With `looping` set, a finished
    /// sequence restarts from its first step.
    pub fn tick<O: ToneOutput>(&mut self, now: u64, looping: bool, output: &mut O) {
        let PlaybackState::Playing { index, next_at } = self.state else {
            return;
        };
        if now < next_at {
            return;
        }

        let next = index + 1;
        if next < self.steps.len() {
            self.play_step(next, next_at, output);
        } else if looping {
            self.passes += 1;
            trace!(pass = self.passes, "sequence restarted");
            self.play_step(0, next_at, output);
        } else {
            debug!("sequence finished");
            self.state = PlaybackState::Idle;
        }
    }

    /// Cancel the sequence. No further steps are played.
    ///
    /// Silencing the tone that is currently sounding is left to the caller.
    pub fn stop(&mut self) {
        if self.is_playing() {
            debug!("sequence cancelled");
        }
        self.state = PlaybackState::Idle;
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Check if a sequence is running
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// Clock time of the next scheduled transition
    pub fn next_deadline(&self) -> Option<u64> {
        match self.state {
            PlaybackState::Playing { next_at, .. } => Some(next_at),
            PlaybackState::Idle => None,
        }
    }

    /// Steps of the current (or last) sequence
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of completed loop passes of the current sequence
    pub fn passes(&self) -> u32 {
        self.passes
    }

    fn play_step<O: ToneOutput>(&mut self, index: usize, at: u64, output: &mut O) {
        let step = self.steps[index];
        trace!(index, frequency = step.frequency, tone_ms = ?step.tone_ms, "step");
        output.tone(step.frequency, step.tone_ms);
        self.state = PlaybackState::Playing {
            index,
            next_at: at + step.hold_ms as u64,
        };
    }
}
