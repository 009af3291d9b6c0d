use crate::detection::domain::face_detector::Detection;
use crate::shared::bounding_box::{BoundingBox, InvalidBoundingBox};

/// Geometry of the registered face: `[left, top, width, height]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceProfile {
    bbox: BoundingBox,
}

impl FaceProfile {
    pub fn new(bbox: BoundingBox) -> Self {
        Self { bbox }
    }

    /// Reduces a detection to its profile. Pure; confidence is dropped.
    pub fn extract(detection: &Detection) -> Self {
        Self::new(detection.bbox)
    }

    pub fn from_array(values: [f64; 4]) -> Result<Self, InvalidBoundingBox> {
        let [left, top, width, height] = values;
        BoundingBox::new(left, top, width, height).map(Self::new)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [
            self.bbox.left(),
            self.bbox.top(),
            self.bbox.width(),
            self.bbox.height(),
        ]
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn area(&self) -> f64 {
        self.bbox.area()
    }
}
