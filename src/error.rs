use thiserror::Error;

/// Failures surfaced by the player adapter.
///
/// Only [`Fault::Interop`] is ever absorbed by the adapter; every other
/// variant reaches the caller.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("automation call failed: {0}")]
    Interop(String),

    #[error("player handle has not been acquired, call start() first")]
    NotStarted,

    #[error("current track has no rating classification")]
    NotFileTrack,

    #[error("failed to decode artwork: {0}")]
    Artwork(#[from] image::ImageError),

    #[error("artwork temp file: {0}")]
    Io(#[from] std::io::Error),
}

impl Fault {
    pub fn is_interop(&self) -> bool {
        matches!(self, Fault::Interop(_))
    }
}

/// Converts an interop fault into `default`, passing everything else through.
pub fn suppress_interop<T>(result: Result<T, Fault>, default: T) -> Result<T, Fault> {
    match result {
        Err(Fault::Interop(message)) => {
            debug!("Ignoring automation fault: {message}");
            Ok(default)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interop_becomes_default() {
        let result: Result<bool, Fault> = Err(Fault::Interop("gone".into()));
        assert!(!suppress_interop(result, false).unwrap());
    }

    #[test]
    fn other_faults_pass_through() {
        let result: Result<bool, Fault> = Err(Fault::NotStarted);
        assert!(matches!(
            suppress_interop(result, false),
            Err(Fault::NotStarted)
        ));
        assert!(suppress_interop(Ok(true), false).unwrap());
    }
}
