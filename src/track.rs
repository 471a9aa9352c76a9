use std::{path::Path, time::Duration};

use image::{ImageFormat, ImageReader, RgbaImage};
use serde_json::{Map, Value};

use crate::error::Fault;
use crate::platform::{ArtworkCollection, TrackHandle};

const ARTWORK_PREFIX: &str = "itunes-artwork-";

/// What was playing at the moment it was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub album: String,
    pub artist: String,
    pub length: Duration,
    pub name: String,
    pub artwork: Option<RgbaImage>,
}

impl Track {
    /// Reads every field up front so a failure leaves no half-filled track.
    pub fn read(track: &dyn TrackHandle) -> Result<Self, Fault> {
        let album = track.album()?;
        let artist = track.artist()?;
        let length = Duration::from_secs(u64::try_from(track.duration_secs()?).unwrap_or(0));
        let name = track.name()?;
        let artwork = extract_artwork(track.artwork()?.as_ref())?;

        Ok(Self {
            album,
            artist,
            length,
            name,
            artwork,
        })
    }

    pub fn serialize(&self) -> Map<String, Value> {
        let mut data = Map::new();

        data.insert("title".to_string(), Value::String(self.name.clone()));
        if !self.artist.is_empty() {
            data.insert("artist".to_string(), Value::String(self.artist.clone()));
        }
        if !self.album.is_empty() {
            data.insert("album".to_string(), Value::String(self.album.clone()));
        }
        data.insert("length_s".to_string(), Value::from(self.length.as_secs()));
        if let Some(artwork) = &self.artwork {
            data.insert(
                "artwork".to_string(),
                Value::String(format!("{}x{}", artwork.width(), artwork.height())),
            );
        }

        data
    }
}

/// Decodes the first artwork of the collection, if there is one.
///
/// The player can only hand artwork out as a file, so it goes through a
/// temporary file that is removed on every path out of here.
pub fn extract_artwork(collection: &dyn ArtworkCollection) -> Result<Option<RgbaImage>, Fault> {
    if collection.len()? == 0 {
        return Ok(None);
    }

    let artwork = collection.get(0)?;
    let path = tempfile::Builder::new()
        .prefix(ARTWORK_PREFIX)
        .tempfile()?
        .into_temp_path();

    artwork.save_to_file(&path)?;
    let image = ImageReader::open(&path)?.with_guessed_format()?.decode()?;
    path.close()?;

    Ok(Some(image.into_rgba8()))
}

/// Writes cover art as PNG whatever extension `path` has.
pub fn save_artwork(artwork: &RgbaImage, path: &Path) -> Result<(), Fault> {
    artwork.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
