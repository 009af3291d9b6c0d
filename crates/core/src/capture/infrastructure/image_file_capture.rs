use std::path::PathBuf;

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::shared::frame::Frame;

/// Captures by decoding a file-addressable still image with the `image` crate.
///
/// Any format `image` supports is accepted; pixels are converted to RGB8.
pub struct ImageFileCapture {
    path: PathBuf,
}

impl ImageFileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureSource for ImageFileCapture {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let bytes = std::fs::read(&self.path).map_err(|source| CaptureError::Read {
            path: self.path.clone(),
            source,
        })?;
        let rgb = image::load_from_memory(&bytes)
            .map_err(|e| CaptureError::Decode(e.to_string()))?
            .to_rgb8();

        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptureError::ZeroDimensions);
        }
        log::debug!("Captured {width}x{height} frame from {}", self.path.display());
        Ok(Frame::new(rgb.into_raw(), width, height))
    }
}
