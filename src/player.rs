//! Command Interpreter
//!
//! [`TonePlayer`] owns the four capabilities (transport, tone output, byte
//! store, clock) and is driven by repeatedly calling [`TonePlayer::poll`]
//! from a single control loop. One poll:
//!
//! 1. drains every pending transport byte through the [`LineAssembler`] and
//!    interprets each completed line,
//! 2. advances the running melody by at most one step,
//! 3. checks the inactivity timeout once.
//!
//! A requested melody counts as activity until it ends: the idle check is
//! suspended while a non-looping sequence plays, and the activity clock
//! restarts when it finishes. Looping playback is still stopped by the
//! timeout.
//!
//! Playback never blocks the poll, so a `STOP` received while a melody is
//! running silences it before its next event. A new `TONE`, `MELODY`, `FX` or
//! `PLAY` replaces whatever sequence is running.
//!
//! Every line is acknowledged with `CMD: <normalized line>` followed by the
//! command's own feedback. Feedback goes to the transport and, when
//! [`PlayerConfig::diagnostic_echo`] is set, to the log as an `INFO` event on
//! target [`FEEDBACK_TARGET`].

use tracing::{debug, info};

use crate::activity::ActivityMonitor;
use crate::command::{normalize, Command, MAX_VOLUME};
use crate::config::PlayerConfig;
use crate::hal::{Clock, ToneOutput, Transport};
use crate::line::LineAssembler;
use crate::melody::{self, EFFECT_PREFIX, ENTRY_SEPARATOR};
use crate::preset::{PresetId, PresetStore};
use crate::sequencer::{PlaybackState, Sequencer};
use crate::store::ByteStore;
use crate::Result;

/// Log target of the diagnostic feedback sink
pub const FEEDBACK_TARGET: &str = "serial_tone_player::feedback";

/// Feedback for a preset id outside 1-10
pub const PRESET_RANGE_FEEDBACK: &str = "PRESET ID 1-10";

/// Runtime state changed by commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    /// Volume level (0-10)
    pub volume: u8,
    /// Repeat melodies until stopped
    pub looping: bool,
    /// Last-activity clock and timeout
    pub activity: ActivityMonitor,
}

/// Line-oriented tone controller
#[derive(Debug)]
pub struct TonePlayer<T, O, S, C> {
    transport: T,
    output: O,
    presets: PresetStore<S>,
    clock: C,
    lines: LineAssembler,
    sequencer: Sequencer,
    state: PlayerState,
    diagnostic_echo: bool,
}

impl<T, O, S, C> TonePlayer<T, O, S, C>
where
    T: Transport,
    O: ToneOutput,
    S: ByteStore,
    C: Clock,
{
    /// Create a player. The output is silenced, the configured volume applied
    /// and the activity clock started.
    pub fn new(config: &PlayerConfig, transport: T, mut output: O, store: S, clock: C) -> Self {
        let now = clock.now_ms();
        let volume = config.initial_volume.min(MAX_VOLUME);
        output.no_tone();
        output.set_volume(volume);

        info!(
            rx_pin = config.rx_pin,
            tx_pin = config.tx_pin,
            speaker_pin = config.speaker_pin,
            baud = config.baud_rate,
            timeout_ms = config.inactivity_timeout_ms,
            "tone player ready"
        );

        TonePlayer {
            transport,
            output,
            presets: PresetStore::new(store),
            clock,
            lines: LineAssembler::new(),
            sequencer: Sequencer::new(),
            state: PlayerState {
                volume,
                looping: false,
                activity: ActivityMonitor::new(config.inactivity_timeout_ms, now),
            },
            diagnostic_echo: config.diagnostic_echo,
        }
    }

    /// Run one polling cycle.
    ///
    /// Errors come only from the transport or the byte store; unread bytes
    /// stay queued and are handled by the next poll.
    pub fn poll(&mut self) -> Result<()> {
        while let Some(byte) = self.transport.read_byte() {
            if let Some(line) = self.lines.push(byte) {
                self.state.activity.record(self.clock.now_ms());
                self.handle_line(&line)?;
            }
        }

        let now = self.clock.now_ms();
        let deadline = self.sequencer.next_deadline();
        self.sequencer.tick(now, self.state.looping, &mut self.output);
        if let (Some(finished_at), false) = (deadline, self.sequencer.is_playing()) {
            self.state.activity.record(finished_at);
        }

        let playing_once = self.sequencer.is_playing() && !self.state.looping;
        if !playing_once && self.state.activity.poll(now) {
            info!(
                timeout_ms = self.state.activity.timeout_ms(),
                "inactivity timeout"
            );
            self.stop()?;
        }
        Ok(())
    }

    /// Interpret one command line
    pub fn handle_line(&mut self, line: &str) -> Result<()> {
        let original = line.trim();
        let upper = normalize(original);
        self.feedback(&format!("CMD: {upper}"))?;

        let command = Command::parse_normalized(original, &upper);
        debug!(?command, "dispatch");
        self.execute(command)
    }

    /// Execute a parsed command
    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Tone {
                frequency,
                duration_ms,
            } => self.play_tone(frequency, duration_ms),
            Command::Melody(body) => {
                self.play_melody(&format!("{body}{ENTRY_SEPARATOR}"));
                Ok(())
            }
            Command::Effect(name) => {
                self.play_melody(&format!("{EFFECT_PREFIX}{name}{ENTRY_SEPARATOR}"));
                Ok(())
            }
            Command::Stop => self.stop(),
            Command::Volume(level) => self.set_volume(level),
            Command::Loop(enabled) => self.set_loop(enabled),
            Command::Save { id, melody } => self.add_preset(id, &melody),
            Command::Play { id } => self.play_preset(id),
            Command::Unknown => self.feedback("UNKNOWN"),
        }
    }

    /// Play a single tone, replacing any running melody.
    ///
    /// `None` keeps the tone sounding until [`stop`](Self::stop). A frequency of
    /// 0 silences the output.
    pub fn play_tone(&mut self, frequency: u32, duration_ms: Option<u32>) -> Result<()> {
        self.sequencer.stop();
        if frequency > 0 {
            self.output.tone(frequency, duration_ms);
        } else {
            self.output.no_tone();
        }
        self.feedback(&format!(
            "PLAYING TONE {frequency}Hz {}ms",
            duration_ms.unwrap_or(0)
        ))
    }

    /// Start a melody string, replacing any running melody.
    ///
    /// Returns `false` when the melody has no playable entry.
    pub fn play_melody(&mut self, text: &str) -> bool {
        let steps = melody::compile(text);
        let now = self.clock.now_ms();
        let started = self.sequencer.start(steps, now, &mut self.output);
        if !started {
            debug!(melody = text, "nothing playable in melody");
        }
        started
    }

    /// Cancel any melody and silence the output
    pub fn stop(&mut self) -> Result<()> {
        self.sequencer.stop();
        self.output.no_tone();
        self.feedback("STOPPED")
    }

    /// Set the volume, clamped to 0-10
    pub fn set_volume(&mut self, level: u8) -> Result<()> {
        let level = level.min(MAX_VOLUME);
        self.state.volume = level;
        self.output.set_volume(level);
        self.feedback(&format!("VOLUME {level}"))
    }

    /// Set the loop flag. Switching it off lets the current pass finish.
    pub fn set_loop(&mut self, enabled: bool) -> Result<()> {
        self.state.looping = enabled;
        self.feedback(if enabled { "LOOP ON" } else { "LOOP OFF" })
    }

    /// Store a melody in preset slot `id`
    pub fn add_preset(&mut self, id: i64, melody: &str) -> Result<()> {
        let Ok(id) = PresetId::new(id) else {
            return self.feedback(PRESET_RANGE_FEEDBACK);
        };
        self.presets.save(id, melody)?;
        self.feedback(&format!("SAVED PRESET {id}"))
    }

    /// Play the melody stored in preset slot `id`
    pub fn play_preset(&mut self, id: i64) -> Result<()> {
        let Ok(id) = PresetId::new(id) else {
            return self.feedback(PRESET_RANGE_FEEDBACK);
        };
        let melody = self.presets.load(id)?;
        self.play_melody(&melody);
        self.feedback(&format!("PLAYING PRESET {id}"))
    }

    /// Runtime state
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Sequencer state
    pub fn playback_state(&self) -> PlaybackState {
        self.sequencer.state()
    }

    /// Check if a melody or effect is running
    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    /// Clock time at which the running melody next needs a poll
    pub fn next_deadline(&self) -> Option<u64> {
        self.sequencer.next_deadline()
    }

    /// Transport capability
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tone output capability
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Preset slots
    pub fn presets(&self) -> &PresetStore<S> {
        &self.presets
    }

    fn feedback(&mut self, msg: &str) -> Result<()> {
        let result = self.transport.write_line(msg);
        if self.diagnostic_echo {
            info!(target: FEEDBACK_TARGET, "{msg}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ManualClock, MemoryTransport, RecordingToneOutput, ToneAction};
    use crate::store::MemoryStore;

    type SimPlayer = TonePlayer<MemoryTransport, RecordingToneOutput, MemoryStore, ManualClock>;

    fn setup(config: &PlayerConfig) -> (SimPlayer, MemoryTransport, RecordingToneOutput) {
        let clock = ManualClock::new();
        let transport = MemoryTransport::new();
        let output = RecordingToneOutput::with_clock(clock.clone());
        let player = TonePlayer::new(
            config,
            transport.clone(),
            output.clone(),
            MemoryStore::eeprom(),
            clock,
        );
        (player, transport, output)
    }

    #[test]
    fn test_startup_silences_and_sets_volume() {
        let (player, _, output) = setup(&PlayerConfig::default());
        let actions: Vec<ToneAction> = output.events().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![ToneAction::Silence, ToneAction::Volume(8)]);
        assert_eq!(player.state().volume, 8);
        assert!(!player.state().looping);
    }

    #[test]
    fn test_cmd_echo_precedes_feedback() {
        let (mut player, transport, _) = setup(&PlayerConfig::default());
        player.handle_line("  volume:3 ").unwrap();
        assert_eq!(transport.take_lines(), vec!["CMD: VOLUME:3", "VOLUME 3"]);
    }

    #[test]
    fn test_unknown_verb_changes_nothing() {
        let (mut player, transport, output) = setup(&PlayerConfig::default());
        output.clear();
        player.handle_line("JUMP:3").unwrap();
        assert_eq!(transport.take_lines(), vec!["CMD: JUMP:3", "UNKNOWN"]);
        assert!(output.events().is_empty());
        assert_eq!(player.state().volume, 8);
    }

    #[test]
    fn test_zero_frequency_tone_is_silent() {
        let (mut player, transport, output) = setup(&PlayerConfig::default());
        output.clear();
        player.handle_line("TONE:abc:250").unwrap();
        assert!(output.tones().is_empty());
        assert_eq!(output.silence_count(), 1);
        assert_eq!(transport.take_lines()[1], "PLAYING TONE 0Hz 250ms");
    }

    #[test]
    fn test_tone_replaces_running_melody() {
        let (mut player, _, output) = setup(&PlayerConfig::default());
        player.handle_line("MELODY:C4,500;D4,500").unwrap();
        assert!(player.is_playing());
        player.handle_line("TONE:880").unwrap();
        assert!(!player.is_playing());
        assert_eq!(output.tones(), vec![(262, Some(500)), (880, None)]);
    }

    #[test]
    fn test_loop_feedback() {
        let (mut player, transport, _) = setup(&PlayerConfig::default());
        player.handle_line("LOOP:ON").unwrap();
        assert!(player.state().looping);
        player.handle_line("LOOP:OFF").unwrap();
        assert_eq!(transport.take_lines(), vec![
            "CMD: LOOP:ON",
            "LOOP ON",
            "CMD: LOOP:OFF",
            "LOOP OFF"
        ]);
    }

    #[test]
    fn test_save_without_melody_separator_is_unknown() {
        let (mut player, transport, _) = setup(&PlayerConfig::default());
        player.handle_line("SAVE:4").unwrap();
        assert_eq!(transport.take_lines(), vec!["CMD: SAVE:4", "UNKNOWN"]);
    }

    #[test]
    fn test_empty_melody_does_not_start() {
        let (mut player, _, _) = setup(&PlayerConfig::default());
        assert!(!player.play_melody("Z9,100;;"));
        assert_eq!(player.playback_state(), PlaybackState::Idle);
    }
}
