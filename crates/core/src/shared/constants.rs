pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Application directory name under the platform config/data/cache roots.
pub const APP_DIR_NAME: &str = "FaceMatch";

pub const PROFILE_FILE_NAME: &str = "profile.bin";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Minimum match percentage for a candidate to be accepted.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 80.0;

/// Detector confidence below which a box is discarded.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
