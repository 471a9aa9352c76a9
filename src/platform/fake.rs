//! In-memory player used by the tests.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use super::{
    Artwork, ArtworkCollection, Connector, PlayerHandle, PlayerState, ProcessProbe, RatingKind,
    RepeatMode, TrackHandle,
};
use crate::error::Fault;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    Interop,
    Other,
}

impl Failure {
    fn fault(self) -> Fault {
        match self {
            Failure::Interop => Fault::Interop("object is no longer connected".to_string()),
            Failure::Other => Fault::NotFileTrack,
        }
    }
}

#[derive(Clone)]
pub struct FakeTrack {
    pub album: String,
    pub artist: String,
    pub duration_secs: i32,
    pub name: String,
    pub rating_kind: Option<RatingKind>,
    pub artwork: Vec<Vec<u8>>,
    /// Makes reading the name fail, after album and artist were read.
    pub name_fails: bool,
}

impl Default for FakeTrack {
    fn default() -> Self {
        Self {
            album: "Kind of Blue".to_string(),
            artist: "Miles Davis".to_string(),
            duration_secs: 562,
            name: "So What".to_string(),
            rating_kind: Some(RatingKind::Computed),
            artwork: Vec::new(),
            name_fails: false,
        }
    }
}

#[derive(Default)]
pub struct FakeState {
    pub player_state: i32,
    pub position_ms: i32,
    pub volume: i32,
    pub shuffle: bool,
    pub repeat: i32,
    pub track: Option<FakeTrack>,
    pub transport: Vec<&'static str>,
}

#[derive(Default)]
pub struct FakePlayer {
    pub state: Mutex<FakeState>,
    failure: Mutex<Option<Failure>>,
    calls: AtomicUsize,
}

impl FakePlayer {
    pub fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<std::sync::MutexGuard<'_, FakeState>, Fault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.failure.lock().unwrap() {
            return Err(failure.fault());
        }
        Ok(self.state.lock().unwrap())
    }

    fn transport(&self, command: &'static str) -> Result<(), Fault> {
        self.enter()?.transport.push(command);
        Ok(())
    }
}

impl PlayerHandle for FakePlayer {
    fn player_state(&self) -> Result<PlayerState, Fault> {
        Ok(PlayerState(self.enter()?.player_state))
    }

    fn player_position_ms(&self) -> Result<i32, Fault> {
        Ok(self.enter()?.position_ms)
    }

    fn set_player_position_ms(&self, position: i32) -> Result<(), Fault> {
        self.enter()?.position_ms = position;
        Ok(())
    }

    fn sound_volume(&self) -> Result<i32, Fault> {
        Ok(self.enter()?.volume)
    }

    fn set_sound_volume(&self, volume: i32) -> Result<(), Fault> {
        self.enter()?.volume = volume;
        Ok(())
    }

    fn shuffle(&self) -> Result<bool, Fault> {
        Ok(self.enter()?.shuffle)
    }

    fn set_shuffle(&self, shuffle: bool) -> Result<(), Fault> {
        self.enter()?.shuffle = shuffle;
        Ok(())
    }

    fn song_repeat(&self) -> Result<RepeatMode, Fault> {
        RepeatMode::from_raw(self.enter()?.repeat)
    }

    fn set_song_repeat(&self, mode: RepeatMode) -> Result<(), Fault> {
        self.enter()?.repeat = mode.as_raw();
        Ok(())
    }

    fn play(&self) -> Result<(), Fault> {
        self.transport("play")
    }

    fn pause(&self) -> Result<(), Fault> {
        self.transport("pause")
    }

    fn next_track(&self) -> Result<(), Fault> {
        self.transport("next")
    }

    fn previous_track(&self) -> Result<(), Fault> {
        self.transport("previous")
    }

    fn current_track(&self) -> Result<Option<Box<dyn TrackHandle>>, Fault> {
        Ok(self
            .enter()?
            .track
            .clone()
            .map(|track| Box::new(track) as Box<dyn TrackHandle>))
    }
}

impl TrackHandle for FakeTrack {
    fn album(&self) -> Result<String, Fault> {
        Ok(self.album.clone())
    }

    fn artist(&self) -> Result<String, Fault> {
        Ok(self.artist.clone())
    }

    fn duration_secs(&self) -> Result<i32, Fault> {
        Ok(self.duration_secs)
    }

    fn name(&self) -> Result<String, Fault> {
        if self.name_fails {
            return Err(Failure::Interop.fault());
        }
        Ok(self.name.clone())
    }

    fn rating_kind(&self) -> Result<Option<RatingKind>, Fault> {
        Ok(self.rating_kind)
    }

    fn artwork(&self) -> Result<Box<dyn ArtworkCollection>, Fault> {
        Ok(Box::new(FakeArtworks(self.artwork.clone())))
    }
}

struct FakeArtworks(Vec<Vec<u8>>);

impl ArtworkCollection for FakeArtworks {
    fn len(&self) -> Result<usize, Fault> {
        Ok(self.0.len())
    }

    fn get(&self, index: usize) -> Result<Box<dyn Artwork>, Fault> {
        Ok(Box::new(FakeArtwork(self.0[index].clone())))
    }
}

struct FakeArtwork(Vec<u8>);

impl Artwork for FakeArtwork {
    fn save_to_file(&self, path: &Path) -> Result<(), Fault> {
        std::fs::write(path, &self.0)?;
        Ok(())
    }
}

pub struct FakeProbe {
    running: AtomicBool,
    checks: AtomicUsize,
}

impl FakeProbe {
    pub fn new(running: bool) -> Self {
        Self {
            running: AtomicBool::new(running),
            checks: AtomicUsize::new(0),
        }
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl ProcessProbe for FakeProbe {
    fn is_running(&self, _name: &str) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.running.load(Ordering::SeqCst)
    }
}

/// Hands out the same [`FakePlayer`] on every successful connect.
pub struct FakeConnector {
    pub player: Arc<FakePlayer>,
    failing: AtomicBool,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            player: Arc::new(FakePlayer::default()),
            failing: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Connection attempts, failed ones included.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    fn connect(&self) -> Result<Arc<dyn PlayerHandle>, Fault> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Failure::Interop.fault());
        }
        Ok(self.player.clone())
    }
}
