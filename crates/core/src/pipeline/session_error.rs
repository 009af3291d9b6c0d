use thiserror::Error;

use crate::capture::domain::capture_source::CaptureError;
use crate::matching::domain::face_matcher::DegenerateProfile;
use crate::matching::domain::profile_store::StorageError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("another capture is still in progress")]
    Busy,
    #[error("a face is already registered")]
    RegistrationLocked,
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("face detection failed: {0}")]
    Detection(String),
    #[error("cannot compare faces: {0}")]
    Degenerate(#[from] DegenerateProfile),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("session worker has stopped")]
    WorkerStopped,
}

impl SessionError {
    /// Storage failures are fatal to the operation and must reach the
    /// caller; everything else is reported as a notice and the user retries.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::WorkerStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(SessionError::Busy.is_recoverable());
        assert!(SessionError::Capture(CaptureError::ZeroDimensions).is_recoverable());
        assert!(SessionError::Degenerate(DegenerateProfile::Candidate).is_recoverable());
        assert!(!SessionError::Storage(StorageError::NoDataDir).is_recoverable());
        assert!(!SessionError::WorkerStopped.is_recoverable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            SessionError::Degenerate(DegenerateProfile::Stored).to_string(),
            "cannot compare faces: registered face has zero area"
        );
        assert_eq!(
            SessionError::Storage(StorageError::NoDataDir).to_string(),
            "could not determine a data directory for the profile"
        );
    }
}
