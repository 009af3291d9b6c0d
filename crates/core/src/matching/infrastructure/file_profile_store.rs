use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::matching::domain::face_profile::FaceProfile;
use crate::matching::domain::profile_store::{ProfileStore, StorageError};
use crate::shared::settings::Settings;

/// Leading tag of the on-disk record; the digit is the format version.
const MAGIC: &[u8; 4] = b"FMP1";

/// Magic plus four little-endian f64 fields.
pub const RECORD_LEN: usize = MAGIC.len() + 4 * 8;

/// Stores the profile as a fixed 36-byte binary record:
/// `FMP1` followed by left, top, width, height as little-endian f64.
///
/// Writes go to a `.part` sibling and are renamed over the target, so a
/// reader never observes a half-written record.
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the location configured in `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, StorageError> {
        settings
            .resolved_profile_path()
            .map(Self::new)
            .ok_or(StorageError::NoDataDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> StorageError {
    let path = path.to_path_buf();
    move |source| StorageError::Io {
        path: path.clone(),
        source,
    }
}

pub fn encode(profile: &FaceProfile) -> [u8; RECORD_LEN] {
    let mut record = [0u8; RECORD_LEN];
    record[..MAGIC.len()].copy_from_slice(MAGIC);
    for (i, value) in profile.to_array().iter().enumerate() {
        let start = MAGIC.len() + i * 8;
        record[start..start + 8].copy_from_slice(&value.to_le_bytes());
    }
    record
}

/// Parses a record, rejecting wrong length, unknown magic or invalid geometry.
pub fn decode(bytes: &[u8]) -> Result<FaceProfile, String> {
    if bytes.len() != RECORD_LEN {
        return Err(format!(
            "expected {RECORD_LEN} bytes, found {}",
            bytes.len()
        ));
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err("unrecognized header".into());
    }
    let mut values = [0f64; 4];
    for (i, chunk) in bytes[MAGIC.len()..].chunks_exact(8).enumerate() {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        values[i] = f64::from_le_bytes(raw);
    }
    FaceProfile::from_array(values).map_err(|e| e.to_string())
}

impl ProfileStore for FileProfileStore {
    fn load(&self) -> Result<Option<FaceProfile>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&self.path)(e)),
        };
        decode(&bytes).map(Some).map_err(|reason| self.corrupt(reason))
    }

    fn save(&mut self, profile: &FaceProfile) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let temp_path = self.path.with_extension("part");
        let write_err = io_err(&temp_path);
        let mut file = fs::File::create(&temp_path).map_err(&write_err)?;
        file.write_all(&encode(profile)).map_err(&write_err)?;
        file.sync_all().map_err(&write_err)?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(io_err(&self.path))?;
        log::debug!("Profile written to {}", self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&self.path)(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn profile(values: [f64; 4]) -> FaceProfile {
        FaceProfile::from_array(values).unwrap()
    }

    fn store_in(dir: &TempDir) -> FileProfileStore {
        FileProfileStore::new(dir.path().join("profile.bin"))
    }

    #[test]
    fn test_missing_file_is_unregistered() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load_is_exact() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        // Values without a short decimal representation must survive bit-for-bit
        let p = profile([0.1, 1.0 / 3.0, 100.000_000_001, 2.0_f64.sqrt()]);
        store.save(&p).unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.load().unwrap(), Some(p));
    }

    #[test]
    fn test_record_layout() {
        let record = encode(&profile([1.0, 2.0, 3.0, 4.0]));
        assert_eq!(record.len(), 36);
        assert_eq!(&record[..4], b"FMP1");
        assert_eq!(&record[4..12], &1.0f64.to_le_bytes());
        assert_eq!(&record[28..36], &4.0f64.to_le_bytes());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.save(&profile([0.0, 0.0, 10.0, 10.0])).unwrap();
        store.save(&profile([5.0, 5.0, 20.0, 30.0])).unwrap();
        assert_eq!(
            store.load().unwrap(),
            Some(profile([5.0, 5.0, 20.0, 30.0]))
        );
        assert!(!dir.path().join("profile.part").exists());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let mut store = FileProfileStore::new(dir.path().join("a").join("b").join("p.bin"));
        store.save(&profile([0.0, 0.0, 1.0, 1.0])).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_truncated_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"FMP1\x00\x01").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_wrong_magic_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut record = encode(&profile([0.0, 0.0, 1.0, 1.0]));
        record[..4].copy_from_slice(b"XXXX");
        fs::write(store.path(), record).unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_non_finite_field_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut record = encode(&profile([0.0, 0.0, 1.0, 1.0]));
        record[20..28].copy_from_slice(&f64::NAN.to_le_bytes());
        fs::write(store.path(), record).unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_clear_removes_profile() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.save(&profile([0.0, 0.0, 1.0, 1.0])).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_unwritable_location_reports_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        // parent "directory" is a regular file
        let mut store = FileProfileStore::new(blocker.join("profile.bin"));
        assert!(matches!(
            store.save(&profile([0.0, 0.0, 1.0, 1.0])),
            Err(StorageError::Io { .. })
        ));
    }
}
