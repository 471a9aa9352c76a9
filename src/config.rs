use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::Verbosity;
use serde::Deserialize;

use crate::platform::RepeatMode;

fn default_process_name() -> String {
    String::from("iTunes")
}

fn default_poll_time_ms() -> u64 {
    50
}

fn default_report_time() -> u64 {
    5
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(
        long,
        help = "Name of the player process to watch. Defaults to \"iTunes\" if not specified."
    )]
    process_name: Option<String>,

    #[clap(
        long,
        help = "Milliseconds between checks whether the player is running. Defaults to 50."
    )]
    poll_time_ms: Option<u64>,

    #[clap(
        long,
        help = "Seconds between now playing reports when watching. Defaults to 5."
    )]
    report_time: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub verbosity: Verbosity,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Keep reporting what is playing until interrupted
    Watch,
    #[command(flatten)]
    Player(PlayerCommand),
}

/// One-shot requests to the player.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Report what is playing once
    Status {
        #[clap(long, help = "Save the cover art of the current track as PNG")]
        artwork: Option<PathBuf>,
    },
    Play,
    Pause,
    Next,
    Previous,
    /// Show or set the volume, 0 to 100
    Volume { level: Option<i32> },
    /// Show or set shuffling of the current playlist
    Shuffle { state: Option<Switch> },
    /// Show or set song repeat of the current playlist
    Repeat { mode: Option<RepeatMode> },
    /// Show or set the position in the current track, in seconds
    Seek { seconds: Option<f64> },
    /// Show whether the current track carries a user rating
    Like,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        switch == Switch::On
    }
}

#[derive(Deserialize)]
struct Toml {
    #[serde(default = "default_process_name")]
    process_name: String,
    #[serde(default = "default_poll_time_ms")]
    poll_time_ms: u64,
    #[serde(default = "default_report_time")]
    report_time: u64,
}

impl Default for Toml {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            poll_time_ms: default_poll_time_ms(),
            report_time: default_report_time(),
        }
    }
}

impl Toml {
    pub fn new() -> Self {
        let Some(config_dir) = dirs::config_local_dir() else {
            warn!("Impossible to find config directory, using default config");
            return Toml::default();
        };
        let file = config_dir.join(env!("CARGO_PKG_NAME").to_string() + ".toml");

        if !file.exists() {
            debug!("No config file at {}, using defaults", file.display());
            return Toml::default();
        }
        let content = std::fs::read_to_string(&file).unwrap_or_default();
        Self::parse(&content).unwrap_or_else(|| {
            warn!("Failed to parse config file {}, using defaults", file.display());
            Toml::default()
        })
    }

    fn parse(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }
}

#[derive(Debug)]
pub struct Config {
    pub process_name: String,
    pub poll_interval: Duration,
    pub report_interval: Duration,
}

impl Config {
    pub fn new(cli: &Cli) -> Self {
        Self::merge(cli, Toml::new())
    }

    fn merge(cli: &Cli, toml_data: Toml) -> Self {
        let poll_time_ms = cli.poll_time_ms.unwrap_or(toml_data.poll_time_ms);
        let report_time = cli.report_time.unwrap_or(toml_data.report_time);

        Config {
            process_name: cli.process_name.clone().unwrap_or(toml_data.process_name),
            poll_interval: Duration::from_millis(poll_time_ms),
            report_interval: Duration::from_secs(report_time),
        }
    }
}
