use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// One face found by a detector, in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

/// Domain interface for face detection.
///
/// Implementations return detections sorted by confidence, highest first.
/// An empty result is a normal outcome, not an error. Inference may hold
/// mutable session state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
