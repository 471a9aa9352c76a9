use std::sync::Arc;

use super::{Connector, PlayerHandle};
use crate::error::Fault;

/// iTunes automation only exists on Windows; elsewhere every connection
/// attempt fails like a missing COM server would.
#[derive(Default)]
pub struct ITunesConnector {}

impl ITunesConnector {
    pub fn new() -> Self {
        Self {}
    }
}

impl Connector for ITunesConnector {
    fn connect(&self) -> Result<Arc<dyn PlayerHandle>, Fault> {
        Err(Fault::Interop(format!(
            "iTunes automation is not available on {}",
            std::env::consts::OS
        )))
    }
}
