//! Face registration and recognition by bounding-box area.
//!
//! A captured frame goes through a [`FaceDetector`], the most confident
//! face is reduced to a [`FaceProfile`], and that profile is either stored
//! as the registered face or compared with it by area ratio.
//!
//! [`FaceDetector`]: detection::domain::face_detector::FaceDetector
//! [`FaceProfile`]: matching::domain::face_profile::FaceProfile

pub mod capture;
pub mod detection;
pub mod matching;
pub mod pipeline;
pub mod shared;
