use super::face_detector::Detection;

/// Typed result of running the detector on a captured frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DetectionOutcome {
    NoFace,
    Detected(Detection),
}

impl DetectionOutcome {
    /// Keeps the first (most confident) detection. Extra faces are ignored.
    pub fn from_detections(detections: Vec<Detection>) -> Self {
        match detections.into_iter().next() {
            Some(detection) => Self::Detected(detection),
            None => Self::NoFace,
        }
    }
}
