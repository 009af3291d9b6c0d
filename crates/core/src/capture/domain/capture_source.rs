use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("captured image has zero dimensions")]
    ZeroDimensions,
}

/// Produces one still image on demand.
///
/// Stands in for a live camera: each call is a shutter press.
pub trait CaptureSource: Send {
    fn capture(&mut self) -> Result<Frame, CaptureError>;
}
