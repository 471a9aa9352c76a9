#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub use windows::ITunesConnector;

#[cfg(not(target_os = "windows"))]
mod unsupported;
#[cfg(not(target_os = "windows"))]
pub use unsupported::ITunesConnector;

#[cfg(test)]
pub mod fake;

use std::{path::Path, sync::Arc};

use clap::ValueEnum;

use crate::error::Fault;

/// Raw player state as reported by the automation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState(pub i32);

impl PlayerState {
    pub const PLAYING: Self = Self(1);

    /// Tests the playing flag, so rewinding also counts as playing.
    pub fn is_playing(self) -> bool {
        self.0 & Self::PLAYING.0 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepeatMode {
    Off,
    One,
    All,
}

impl RepeatMode {
    pub fn from_raw(value: i32) -> Result<Self, Fault> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::One),
            2 => Ok(Self::All),
            other => Err(Fault::Interop(format!("unknown repeat mode {other}"))),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Off => 0,
            Self::One => 1,
            Self::All => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingKind {
    User,
    Computed,
}

/// A live reference to the player's automation interface.
pub trait PlayerHandle: Send + Sync {
    fn player_state(&self) -> Result<PlayerState, Fault>;

    fn player_position_ms(&self) -> Result<i32, Fault>;
    fn set_player_position_ms(&self, position: i32) -> Result<(), Fault>;

    fn sound_volume(&self) -> Result<i32, Fault>;
    fn set_sound_volume(&self, volume: i32) -> Result<(), Fault>;

    // Both act on the current playlist.
    fn shuffle(&self) -> Result<bool, Fault>;
    fn set_shuffle(&self, shuffle: bool) -> Result<(), Fault>;
    fn song_repeat(&self) -> Result<RepeatMode, Fault>;
    fn set_song_repeat(&self, mode: RepeatMode) -> Result<(), Fault>;

    fn play(&self) -> Result<(), Fault>;
    fn pause(&self) -> Result<(), Fault>;
    fn next_track(&self) -> Result<(), Fault>;
    fn previous_track(&self) -> Result<(), Fault>;

    fn current_track(&self) -> Result<Option<Box<dyn TrackHandle>>, Fault>;
}

pub trait TrackHandle {
    fn album(&self) -> Result<String, Fault>;
    fn artist(&self) -> Result<String, Fault>;
    fn duration_secs(&self) -> Result<i32, Fault>;
    fn name(&self) -> Result<String, Fault>;

    /// `None` when the track is not backed by a file or CD.
    fn rating_kind(&self) -> Result<Option<RatingKind>, Fault>;

    fn artwork(&self) -> Result<Box<dyn ArtworkCollection>, Fault>;
}

pub trait ArtworkCollection {
    fn len(&self) -> Result<usize, Fault>;

    /// Zero-based, whatever the backend's own addressing is.
    fn get(&self, index: usize) -> Result<Box<dyn Artwork>, Fault>;
}

pub trait Artwork {
    fn save_to_file(&self, path: &Path) -> Result<(), Fault>;
}

/// Acquires a fresh player handle.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn PlayerHandle>, Fault>;
}

pub trait ProcessProbe: Send + Sync {
    fn is_running(&self, name: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playing_flag_covers_rewind() {
        assert!(PlayerState::PLAYING.is_playing());
        // rewind
        assert!(PlayerState(3).is_playing());
        // stopped, fast forward
        assert!(!PlayerState(0).is_playing());
        assert!(!PlayerState(2).is_playing());
    }

    #[test]
    fn repeat_mode_maps_automation_values() {
        for mode in [RepeatMode::Off, RepeatMode::One, RepeatMode::All] {
            assert_eq!(RepeatMode::from_raw(mode.as_raw()).unwrap(), mode);
        }
        assert!(RepeatMode::from_raw(7).unwrap_err().is_interop());
    }
}
