use std::path::PathBuf;

use thiserror::Error;

use super::face_profile::FaceProfile;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("profile storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored profile at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("could not determine a data directory for the profile")]
    NoDataDir,
}

/// Persistence for the single registered profile.
///
/// `save` replaces whatever was stored before; there is never more than one
/// profile.
pub trait ProfileStore: Send {
    /// `Ok(None)` when nothing has been registered.
    fn load(&self) -> Result<Option<FaceProfile>, StorageError>;

    fn save(&mut self, profile: &FaceProfile) -> Result<(), StorageError>;

    /// Removes the stored profile. Clearing an empty store succeeds.
    fn clear(&mut self) -> Result<(), StorageError>;
}
