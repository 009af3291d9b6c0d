use std::fmt;

use crate::capture::domain::capture_source::CaptureSource;
use crate::detection::domain::detection_outcome::DetectionOutcome;
use crate::detection::domain::face_detector::FaceDetector;
use crate::matching::domain::face_matcher::{Comparison, DegenerateProfile, FaceMatcher};
use crate::matching::domain::face_profile::FaceProfile;
use crate::shared::frame::Frame;

use super::activity::{Activity, ActivityGuard};
use super::session_error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegisterOutcome {
    Registered(FaceProfile),
    NoFaceDetected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecognizeOutcome {
    /// Accepted: the front end moves on to the home view.
    Matched(Comparison),
    NotMatched(Comparison),
    NotRegistered,
    NoFaceDetected,
}

impl fmt::Display for RegisterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered(_) => write!(f, "Face registered"),
            Self::NoFaceDetected => write!(f, "No face detected"),
        }
    }
}

impl fmt::Display for RecognizeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched(c) => write!(f, "Face recognized ({:.1}%)", c.percentage),
            Self::NotMatched(c) => write!(f, "Face not recognized ({:.1}%)", c.percentage),
            Self::NotRegistered => write!(f, "No face registered yet"),
            Self::NoFaceDetected => write!(f, "No face detected"),
        }
    }
}

/// Session context for the capture → detect → extract → register/recognize
/// flow.
///
/// Owns the detector and matcher; the busy flag lives in [`Activity`] so at
/// most one request runs at a time.
pub struct FaceSession {
    detector: Box<dyn FaceDetector>,
    matcher: FaceMatcher,
    threshold: f64,
    activity: Activity,
}

impl FaceSession {
    pub fn new(detector: Box<dyn FaceDetector>, matcher: FaceMatcher, threshold: f64) -> Self {
        Self {
            detector,
            matcher,
            threshold,
            activity: Activity::new(),
        }
    }

    /// Handle to the busy flag, shareable with other threads.
    pub fn activity(&self) -> Activity {
        self.activity.clone()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_registered(&self) -> bool {
        self.matcher.is_registered()
    }

    pub fn profile(&self) -> Option<&FaceProfile> {
        self.matcher.profile()
    }

    /// The Register action is only offered until a face is registered.
    pub fn can_register(&self) -> bool {
        !self.is_registered() && !self.activity.is_busy()
    }

    /// Captures a frame and registers the detected face.
    ///
    /// With a face already registered this fails with `RegistrationLocked`
    /// unless `replace` is set.
    pub fn register(
        &mut self,
        source: &mut dyn CaptureSource,
        replace: bool,
    ) -> Result<RegisterOutcome, SessionError> {
        let guard = self.activity.try_begin()?;
        self.register_with(guard, source, replace)
    }

    /// Captures a frame and compares the detected face with the registered one.
    pub fn recognize(
        &mut self,
        source: &mut dyn CaptureSource,
    ) -> Result<RecognizeOutcome, SessionError> {
        let guard = self.activity.try_begin()?;
        self.recognize_with(guard, source)
    }

    /// Clears the registered face.
    pub fn forget(&mut self) -> Result<(), SessionError> {
        let guard = self.activity.try_begin()?;
        self.forget_with(guard)
    }

    pub(crate) fn register_with(
        &mut self,
        guard: ActivityGuard,
        source: &mut dyn CaptureSource,
        replace: bool,
    ) -> Result<RegisterOutcome, SessionError> {
        debug_assert!(self.activity.owns(&guard));
        if self.is_registered() && !replace {
            return Err(SessionError::RegistrationLocked);
        }

        let frame = self.capture(source)?;
        guard.processing();

        let detection = match self.detect(&frame)? {
            DetectionOutcome::NoFace => {
                log::info!("Registration skipped: no face detected");
                return Ok(RegisterOutcome::NoFaceDetected);
            }
            DetectionOutcome::Detected(detection) => detection,
        };

        let profile = FaceProfile::extract(&detection);
        if profile.area() <= 0.0 {
            return Err(DegenerateProfile::Candidate.into());
        }
        self.matcher.register(profile)?;
        log::info!("Registered face {:?}", profile.to_array());
        Ok(RegisterOutcome::Registered(profile))
    }

    pub(crate) fn recognize_with(
        &mut self,
        guard: ActivityGuard,
        source: &mut dyn CaptureSource,
    ) -> Result<RecognizeOutcome, SessionError> {
        debug_assert!(self.activity.owns(&guard));
        let frame = self.capture(source)?;
        guard.processing();

        let detection = match self.detect(&frame)? {
            DetectionOutcome::NoFace => return Ok(RecognizeOutcome::NoFaceDetected),
            DetectionOutcome::Detected(detection) => detection,
        };
        if !self.is_registered() {
            return Ok(RecognizeOutcome::NotRegistered);
        }

        let candidate = FaceProfile::extract(&detection);
        let comparison = self.matcher.decide(&candidate, self.threshold)?;
        log::info!(
            "Match {:.1}% against threshold {:.1}%: {:?}",
            comparison.percentage,
            self.threshold,
            comparison.decision
        );
        Ok(if comparison.is_match() {
            RecognizeOutcome::Matched(comparison)
        } else {
            RecognizeOutcome::NotMatched(comparison)
        })
    }

    pub(crate) fn forget_with(&mut self, guard: ActivityGuard) -> Result<(), SessionError> {
        debug_assert!(self.activity.owns(&guard));
        self.matcher.forget()?;
        log::info!("Registered face cleared");
        Ok(())
    }

    fn capture(&mut self, source: &mut dyn CaptureSource) -> Result<Frame, SessionError> {
        source.capture().map_err(|e| {
            log::warn!("Capture failed: {e}");
            SessionError::from(e)
        })
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionOutcome, SessionError> {
        let detections = self.detector.detect(frame).map_err(|e| {
            log::warn!("Detection failed: {e}");
            SessionError::Detection(e.to_string())
        })?;
        log::debug!("Detector returned {} face(s)", detections.len());
        Ok(DetectionOutcome::from_detections(detections))
    }
}
