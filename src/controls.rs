use std::{sync::Arc, time::Duration};

use tokio::runtime::Handle;

use crate::error::{suppress_interop, Fault};
use crate::monitor::{Liveness, Monitor};
use crate::platform::{PlayerState, RatingKind, RepeatMode};
use crate::track::Track;

/// Playback state and transport controls of a running iTunes.
///
/// Operations the player may reject at any time (transport commands,
/// playing state, current track) turn an automation fault into their
/// "nothing happening" value. The remaining properties report every fault.
pub struct ITunesControls {
    liveness: Arc<Liveness>,
    monitor: Monitor,
}

impl ITunesControls {
    pub fn new(liveness: Liveness, poll_interval: Duration, runtime: Handle) -> Self {
        let liveness = Arc::new(liveness);
        let monitor = Monitor::new(Arc::clone(&liveness), poll_interval, runtime);
        Self { liveness, monitor }
    }

    pub fn start(&self) -> Result<(), Fault> {
        self.monitor.start()
    }

    pub fn stop(&self) {
        self.monitor.stop();
    }

    /// Whether the player process was running at the last liveness check.
    pub fn is_connected(&self) -> bool {
        self.liveness.last_seen_running()
    }

    pub fn is_playing(&self) -> Result<bool, Fault> {
        if !self.liveness.is_process_running() {
            return Ok(false);
        }
        let handle = self.liveness.handle()?;
        suppress_interop(handle.player_state().map(PlayerState::is_playing), false)
    }

    /// `None` while the player is closed, idle, or not answering.
    pub fn current_track(&self) -> Result<Option<Track>, Fault> {
        if !self.liveness.is_process_running() {
            return Ok(None);
        }
        let handle = self.liveness.handle()?;
        let track = handle
            .current_track()
            .and_then(|track| track.map(|track| Track::read(track.as_ref())).transpose());
        suppress_interop(track, None)
    }

    pub fn progress(&self) -> Result<Duration, Fault> {
        let position = self.liveness.handle()?.player_position_ms()?;
        Ok(Duration::from_millis(u64::try_from(position).unwrap_or(0)))
    }

    /// Sub-millisecond precision is dropped; the position is not checked
    /// against the track length.
    pub fn set_progress(&self, progress: Duration) -> Result<(), Fault> {
        let position = i32::try_from(progress.as_millis()).unwrap_or(i32::MAX);
        self.liveness.handle()?.set_player_position_ms(position)
    }

    pub fn shuffle(&self) -> Result<bool, Fault> {
        self.liveness.handle()?.shuffle()
    }

    pub fn set_shuffle(&self, shuffle: bool) -> Result<(), Fault> {
        self.liveness.handle()?.set_shuffle(shuffle)
    }

    pub fn repeat_mode(&self) -> Result<RepeatMode, Fault> {
        self.liveness.handle()?.song_repeat()
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) -> Result<(), Fault> {
        self.liveness.handle()?.set_song_repeat(mode)
    }

    /// Volume in `[0, 100]`.
    pub fn volume(&self) -> Result<i32, Fault> {
        self.liveness.handle()?.sound_volume()
    }

    /// The player decides what to do with values outside `[0, 100]`.
    pub fn set_volume(&self, volume: i32) -> Result<(), Fault> {
        self.liveness.handle()?.set_sound_volume(volume)
    }

    pub fn play(&self) -> Result<(), Fault> {
        suppress_interop(self.liveness.handle()?.play(), ())
    }

    pub fn pause(&self) -> Result<(), Fault> {
        suppress_interop(self.liveness.handle()?.pause(), ())
    }

    pub fn next(&self) -> Result<(), Fault> {
        suppress_interop(self.liveness.handle()?.next_track(), ())
    }

    pub fn previous(&self) -> Result<(), Fault> {
        suppress_interop(self.liveness.handle()?.previous_track(), ())
    }

    /// Whether the user rated the current track themselves.
    pub fn get_like(&self) -> Result<bool, Fault> {
        let track = self
            .liveness
            .handle()?
            .current_track()?
            .ok_or(Fault::NotFileTrack)?;
        let kind = track.rating_kind()?.ok_or(Fault::NotFileTrack)?;
        Ok(kind == RatingKind::User)
    }
}
