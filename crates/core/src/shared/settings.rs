use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::constants::{
    APP_DIR_NAME, DEFAULT_CONFIDENCE, DEFAULT_MATCH_THRESHOLD, PROFILE_FILE_NAME,
    SETTINGS_FILE_NAME,
};

/// User-tunable options, persisted as JSON in the platform config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Minimum match percentage for acceptance.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Detector confidence cutoff (0.0-1.0).
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Overrides the default profile location.
    #[serde(default)]
    pub profile_path: Option<PathBuf>,
}

fn default_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            confidence: default_confidence(),
            profile_path: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Loads from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring invalid settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Where the registered profile lives: the configured override, or
    /// `<data_dir>/FaceMatch/profile.bin`.
    pub fn resolved_profile_path(&self) -> Option<PathBuf> {
        self.profile_path.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join(APP_DIR_NAME).join(PROFILE_FILE_NAME))
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(format!(
                "Threshold must be a non-negative percentage, got {}",
                self.threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_relative_eq!(s.threshold, 80.0);
        assert_relative_eq!(s.confidence, 0.5);
        assert!(s.profile_path.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("absent.json"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_invalid_json_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "threshold": 65.5 }"#).unwrap();
        let s = Settings::load_from(&path);
        assert_relative_eq!(s.threshold, 65.5);
        assert_relative_eq!(s.confidence, 0.5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let s = Settings {
            threshold: 90.0,
            confidence: 0.7,
            profile_path: Some(PathBuf::from("/tmp/face.bin")),
        };
        s.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), s);
    }

    #[test]
    fn test_explicit_profile_path_wins() {
        let s = Settings {
            profile_path: Some(PathBuf::from("/srv/profile.bin")),
            ..Settings::default()
        };
        assert_eq!(
            s.resolved_profile_path(),
            Some(PathBuf::from("/srv/profile.bin"))
        );
    }

    #[test]
    fn test_validate() {
        assert!(Settings::default().validate().is_ok());
        let negative = Settings {
            threshold: -1.0,
            ..Settings::default()
        };
        assert!(negative.validate().is_err());
        let nan = Settings {
            threshold: f64::NAN,
            ..Settings::default()
        };
        assert!(nan.validate().is_err());
        let confidence = Settings {
            confidence: 1.5,
            ..Settings::default()
        };
        assert!(confidence.validate().is_err());
    }
}
