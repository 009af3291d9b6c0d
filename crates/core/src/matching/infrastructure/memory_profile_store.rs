use crate::matching::domain::face_profile::FaceProfile;
use crate::matching::domain::profile_store::{ProfileStore, StorageError};

/// Keeps the profile in process memory only. Nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryProfileStore {
    profile: Option<FaceProfile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: FaceProfile) -> Self {
        Self {
            profile: Some(profile),
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self) -> Result<Option<FaceProfile>, StorageError> {
        Ok(self.profile)
    }

    fn save(&mut self, profile: &FaceProfile) -> Result<(), StorageError> {
        self.profile = Some(*profile);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.profile = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(width: f64) -> FaceProfile {
        FaceProfile::from_array([0.0, 0.0, width, width]).unwrap()
    }

    #[test]
    fn test_starts_empty() {
        assert_eq!(MemoryProfileStore::new().load().unwrap(), None);
    }

    #[test]
    fn test_save_overwrites() {
        let mut store = MemoryProfileStore::with_profile(profile(10.0));
        store.save(&profile(20.0)).unwrap();
        assert_eq!(store.load().unwrap(), Some(profile(20.0)));
    }

    #[test]
    fn test_clear() {
        let mut store = MemoryProfileStore::with_profile(profile(10.0));
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
