use thiserror::Error;

use super::face_profile::FaceProfile;
use super::profile_store::{ProfileStore, StorageError};

/// Geometry for which the area ratio is not a finite percentage.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateProfile {
    #[error("registered face has zero area")]
    Stored,
    #[error("detected face has zero area")]
    Candidate,
    #[error("face areas are too far apart to compare")]
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    Match,
    NoMatch,
}

/// Match percentage together with the decision taken at a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub percentage: f64,
    pub decision: MatchDecision,
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        self.decision == MatchDecision::Match
    }
}

/// Candidate area as a percentage of the stored area.
///
/// This is a ratio of rectangle areas: it ignores position entirely, so
/// moving closer to the camera looks the same as being a different person.
pub fn area_ratio_percent(
    stored: &FaceProfile,
    candidate: &FaceProfile,
) -> Result<f64, DegenerateProfile> {
    let stored_area = stored.area();
    let candidate_area = candidate.area();
    if stored_area <= 0.0 {
        return Err(DegenerateProfile::Stored);
    }
    if candidate_area <= 0.0 {
        return Err(DegenerateProfile::Candidate);
    }
    let percentage = candidate_area / stored_area * 100.0;
    // Both areas are positive, but huge extents can still overflow
    if !percentage.is_finite() {
        return Err(DegenerateProfile::OutOfRange);
    }
    Ok(percentage)
}

/// Holds the single registered profile and answers match queries.
///
/// The in-memory copy mirrors the store: it only changes after the store
/// accepted the write.
pub struct FaceMatcher {
    store: Box<dyn ProfileStore>,
    profile: Option<FaceProfile>,
}

impl FaceMatcher {
    /// Opens the matcher, loading any previously registered profile.
    pub fn open(store: Box<dyn ProfileStore>) -> Result<Self, StorageError> {
        let profile = store.load()?;
        Ok(Self { store, profile })
    }

    pub fn is_registered(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Option<&FaceProfile> {
        self.profile.as_ref()
    }

    /// Persists `profile`, replacing any earlier registration.
    pub fn register(&mut self, profile: FaceProfile) -> Result<(), StorageError> {
        self.store.save(&profile)?;
        self.profile = Some(profile);
        Ok(())
    }

    /// Drops the registered profile from the store and memory.
    pub fn forget(&mut self) -> Result<(), StorageError> {
        self.store.clear()?;
        self.profile = None;
        Ok(())
    }

    /// Match percentage of `candidate` against the registered profile;
    /// 0.0 when nothing is registered.
    pub fn compare(&self, candidate: &FaceProfile) -> Result<f64, DegenerateProfile> {
        match &self.profile {
            Some(stored) => area_ratio_percent(stored, candidate),
            None => Ok(0.0),
        }
    }

    /// `Match` iff the percentage reaches `threshold`.
    pub fn decide(
        &self,
        candidate: &FaceProfile,
        threshold: f64,
    ) -> Result<Comparison, DegenerateProfile> {
        let percentage = self.compare(candidate)?;
        let decision = if self.is_registered() && percentage >= threshold {
            MatchDecision::Match
        } else {
            MatchDecision::NoMatch
        };
        Ok(Comparison {
            percentage,
            decision,
        })
    }
}
