use std::sync::Arc;

use anyhow::Context;
use serde_json::{Map, Value};

use crate::controls::ITunesControls;
use crate::error::Fault;
use crate::track::Track;

/// Player state read in one go.
pub struct Snapshot {
    pub playing: bool,
    pub running: bool,
    pub track: Option<Track>,
}

impl Snapshot {
    pub fn read(controls: &ITunesControls) -> Result<Self, Fault> {
        Ok(Self {
            playing: controls.is_playing()?,
            running: controls.is_connected(),
            track: controls.current_track()?,
        })
    }

    pub fn serialize(&self) -> Map<String, Value> {
        let mut data = self
            .track
            .as_ref()
            .map(Track::serialize)
            .unwrap_or_default();
        data.insert("playing".to_string(), Value::Bool(self.playing));
        data.insert("running".to_string(), Value::Bool(self.running));
        data
    }
}

/// Reports what the player is doing whenever it changes.
pub struct Watcher {
    controls: Arc<ITunesControls>,
    last: Option<Map<String, Value>>,
}

impl Watcher {
    pub fn new(controls: Arc<ITunesControls>) -> Self {
        Self {
            controls,
            last: None,
        }
    }

    /// Returns the report if it differs from the previous one.
    pub async fn poll(&mut self) -> anyhow::Result<Option<Map<String, Value>>> {
        let controls = Arc::clone(&self.controls);
        let data = tokio::task::spawn_blocking(move || Snapshot::read(&controls))
            .await
            .with_context(|| "Player state check did not finish")?
            .with_context(|| "Failed to read player state")?
            .serialize();

        if self.last.as_ref() == Some(&data) {
            return Ok(None);
        }
        self.last = Some(data.clone());
        Ok(Some(data))
    }

    pub fn report(data: &Map<String, Value>) {
        info!("Reporting {data:?}");
        println!("{}", Value::Object(data.clone()));
    }
}
