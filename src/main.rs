//! CLI entrypoint: drives a tone player from stdin/stdout.
//!
//! Each stdin line is one command; feedback lines go to stdout and logs to
//! stderr. The process exits once stdin is closed and nothing is playing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serial_tone_player::host::{StdioTransport, SystemClock};
use serial_tone_player::store::EEPROM_SIZE;
use serial_tone_player::{ByteStore, FileStore, MemoryStore, PlayerConfig, ToneOutput, TonePlayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Sleep between polling cycles
const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Parser, Debug)]
#[command(author, version, about = "Serial tone player", long_about = None)]
struct Cli {
    /// Increase verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Inactivity timeout in ms (0 disables).
    #[arg(short, long)]
    timeout_ms: Option<u64>,
    /// Transport speed in baud.
    #[arg(short, long)]
    baud: Option<u32>,
    /// Preset store image file.
    #[arg(short, long)]
    presets: Option<PathBuf>,
    /// Do not echo feedback lines to the log.
    #[arg(long)]
    no_echo: bool,
}

impl Cli {
    fn player_config(&self) -> anyhow::Result<PlayerConfig> {
        let mut config = match &self.config {
            Some(path) => PlayerConfig::load(path)?,
            None => PlayerConfig::default(),
        };
        if let Some(timeout_ms) = self.timeout_ms {
            config.inactivity_timeout_ms = timeout_ms;
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(presets) = &self.presets {
            config.preset_file = Some(presets.clone());
        }
        if self.no_echo {
            config.diagnostic_echo = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.player_config()?;
    let output = open_output(&config)?;

    match &config.preset_file {
        Some(path) => {
            let store = FileStore::open(path, EEPROM_SIZE)
                .with_context(|| format!("opening preset store {}", path.display()))?;
            info!(path = %path.display(), "preset store");
            run(&config, output, store)
        }
        None => run(&config, output, MemoryStore::eeprom()),
    }
}

#[cfg(feature = "streaming")]
fn open_output(config: &PlayerConfig) -> anyhow::Result<serial_tone_player::RodioToneOutput> {
    Ok(serial_tone_player::RodioToneOutput::new(
        config.initial_volume,
    )?)
}

#[cfg(not(feature = "streaming"))]
fn open_output(_config: &PlayerConfig) -> anyhow::Result<serial_tone_player::host::LogToneOutput> {
    Ok(serial_tone_player::host::LogToneOutput::default())
}

fn run<O: ToneOutput, S: ByteStore>(config: &PlayerConfig, output: O, store: S) -> anyhow::Result<()> {
    let mut player = TonePlayer::new(
        config,
        StdioTransport::spawn(),
        output,
        store,
        SystemClock::new(),
    );

    loop {
        // Sampled before polling so every byte sent before EOF is handled
        let input_closed = player.transport().is_closed();
        if let Err(e) = player.poll() {
            warn!(error = %e, "poll failed");
        }
        if input_closed && !player.is_playing() {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    info!("input closed, exiting");
    Ok(())
}
