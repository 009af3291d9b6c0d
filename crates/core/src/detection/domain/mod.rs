pub mod detection_outcome;
pub mod face_detector;
