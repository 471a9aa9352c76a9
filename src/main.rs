#![warn(clippy::pedantic)]

mod config;
mod controls;
mod error;
mod monitor;
mod platform;
mod probe;
mod track;
mod watcher;

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use clap::Parser;
use config::{Cli, Command, Config, PlayerCommand};
use controls::ITunesControls;
use monitor::Liveness;
use platform::ITunesConnector;
use probe::SystemProbe;
use serde_json::Value;
use tokio::{runtime::Handle, signal, time};
use watcher::{Snapshot, Watcher};

#[macro_use]
extern crate log;

async fn report_loop(mut watcher: Watcher, report_interval: Duration) -> anyhow::Result<()> {
    let mut interval = time::interval(report_interval);
    loop {
        interval.tick().await;
        if let Some(data) = watcher.poll().await? {
            Watcher::report(&data);
        }
    }
}

async fn watch(controls: Arc<ITunesControls>, report_interval: Duration) -> anyhow::Result<()> {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = report_loop(Watcher::new(controls), report_interval) => result,
        () = ctrl_c => {
            info!("Interruption signal received");
            Ok(())
        },
        () = terminate => {
            info!("Terminate signal received");
            Ok(())
        },
    }
}

fn run_command(controls: &ITunesControls, command: PlayerCommand) -> anyhow::Result<()> {
    match command {
        PlayerCommand::Status { artwork } => {
            let snapshot = Snapshot::read(controls)?;
            println!("{}", Value::Object(snapshot.serialize()));
            if let Some(path) = artwork {
                let track = snapshot
                    .track
                    .ok_or_else(|| anyhow!("Nothing is playing"))?;
                let image = track
                    .artwork
                    .ok_or_else(|| anyhow!("\"{}\" has no artwork", track.name))?;
                track::save_artwork(&image, &path)
                    .with_context(|| format!("Failed to save artwork to {}", path.display()))?;
            }
        }
        PlayerCommand::Play => controls.play()?,
        PlayerCommand::Pause => controls.pause()?,
        PlayerCommand::Next => controls.next()?,
        PlayerCommand::Previous => controls.previous()?,
        PlayerCommand::Volume { level: Some(level) } => controls.set_volume(level)?,
        PlayerCommand::Volume { level: None } => println!("{}", controls.volume()?),
        PlayerCommand::Shuffle { state: Some(state) } => controls.set_shuffle(state.into())?,
        PlayerCommand::Shuffle { state: None } => println!("{}", controls.shuffle()?),
        PlayerCommand::Repeat { mode: Some(mode) } => controls.set_repeat_mode(mode)?,
        PlayerCommand::Repeat { mode: None } => println!("{:?}", controls.repeat_mode()?),
        PlayerCommand::Seek {
            seconds: Some(seconds),
        } => {
            let position = Duration::try_from_secs_f64(seconds)
                .with_context(|| format!("Invalid position {seconds}"))?;
            controls.set_progress(position)?;
        }
        PlayerCommand::Seek { seconds: None } => {
            println!("{:.3}", controls.progress()?.as_secs_f64());
        }
        PlayerCommand::Like => println!("{}", controls.get_like()?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity.log_level().unwrap_or(log::Level::Error);
    simple_logger::init_with_level(verbosity)?;

    let config = Config::new(&cli);
    debug!("Using {config:?}");

    let liveness = Liveness::new(
        config.process_name.clone(),
        Arc::new(SystemProbe::new()),
        Arc::new(ITunesConnector::new()),
    );
    let controls = ITunesControls::new(liveness, config.poll_interval, Handle::current());
    let controls = Arc::new(controls);
    if let Err(e) = controls.start() {
        if e.is_interop() {
            error!("{} automation is unavailable, is it installed?", config.process_name);
        }
        return Err(e).with_context(|| format!("Failed to connect to {}", config.process_name));
    }

    let result = match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(Arc::clone(&controls), config.report_interval).await,
        Command::Player(command) => {
            let blocking_controls = Arc::clone(&controls);
            tokio::task::spawn_blocking(move || run_command(&blocking_controls, command))
                .await
                .with_context(|| "Player command did not finish")?
        }
    };

    controls.stop();
    result
}
