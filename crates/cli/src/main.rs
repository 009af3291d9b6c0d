use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use facematch_core::capture::infrastructure::image_file_capture::ImageFileCapture;
use facematch_core::detection::domain::face_detector::FaceDetector;
use facematch_core::detection::infrastructure::model_resolver;
use facematch_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facematch_core::matching::domain::face_matcher::FaceMatcher;
use facematch_core::matching::infrastructure::file_profile_store::FileProfileStore;
use facematch_core::pipeline::face_session::{FaceSession, RecognizeOutcome, RegisterOutcome};
use facematch_core::pipeline::infrastructure::session_worker::{
    SessionCommand, SessionEvent, SessionWorker,
};
use facematch_core::pipeline::session_error::SessionError;
use facematch_core::shared::constants::{IMAGE_EXTENSIONS, YOLO_MODEL_NAME, YOLO_MODEL_URL};
use facematch_core::shared::settings::Settings;

/// Exit status when a face was captured but not accepted.
const EXIT_NOT_RECOGNIZED: i32 = 2;

/// Register a face once, then recognize it by bounding-box size.
#[derive(Parser)]
#[command(name = "facematch")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Minimum match percentage for acceptance (overrides settings).
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Face detection confidence threshold 0.0-1.0 (overrides settings).
    #[arg(long, global = true)]
    confidence: Option<f64>,

    /// Registered profile file (overrides settings).
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Use this ONNX face model instead of the cached download.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Settings file (default: platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the settings file.
    #[arg(long, global = true)]
    save_config: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Register the face in an image.
    Register {
        image: PathBuf,
        /// Replace an existing registration.
        #[arg(long)]
        replace: bool,
    },
    /// Check the face in an image against the registered one.
    /// Exits with status 2 when the face is not recognized.
    Detect { image: PathBuf },
    /// Show registration state and active threshold.
    Status,
    /// Remove the registered face.
    Forget,
    /// Interactive session reading commands from stdin.
    Session,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = load_settings(&cli);
    settings.validate()?;
    if cli.save_config {
        let path = save_settings(&cli, &settings)?;
        eprintln!("Settings saved to {}", path.display());
    }

    match &cli.command {
        Command::Register { image, replace } => {
            validate_image(image)?;
            let mut session = build_session(&cli, &settings)?;
            let outcome = session.register(&mut ImageFileCapture::new(image), *replace);
            Ok(report_register(outcome)?)
        }
        Command::Detect { image } => {
            validate_image(image)?;
            let mut session = build_session(&cli, &settings)?;
            let outcome = session.recognize(&mut ImageFileCapture::new(image));
            Ok(report_recognize(outcome)?)
        }
        Command::Status => {
            let matcher = open_matcher(&settings)?;
            print_status(matcher.profile().map(|p| p.to_array()), settings.threshold);
            Ok(0)
        }
        Command::Forget => {
            let mut matcher = open_matcher(&settings)?;
            matcher.forget()?;
            println!("Registered face removed");
            Ok(0)
        }
        Command::Session => {
            let session = build_session(&cli, &settings)?;
            run_interactive(session)?;
            Ok(0)
        }
    }
}

fn load_settings(cli: &Cli) -> Settings {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    if let Some(threshold) = cli.threshold {
        settings.threshold = threshold;
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if let Some(profile) = &cli.profile {
        settings.profile_path = Some(profile.clone());
    }
    settings
}

fn save_settings(cli: &Cli, settings: &Settings) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Settings::config_path().ok_or("Could not determine config directory")?,
    };
    settings.save_to(&path)?;
    Ok(path)
}

fn open_matcher(settings: &Settings) -> Result<FaceMatcher, Box<dyn std::error::Error>> {
    let store = FileProfileStore::from_settings(settings)?;
    log::debug!("Using profile at {}", store.path().display());
    Ok(FaceMatcher::open(Box::new(store))?)
}

fn build_session(
    cli: &Cli,
    settings: &Settings,
) -> Result<FaceSession, Box<dyn std::error::Error>> {
    let matcher = open_matcher(settings)?;
    let detector = build_detector(cli.model.as_deref(), settings.confidence)?;
    Ok(FaceSession::new(detector, matcher, settings.threshold))
}

fn build_detector(
    model: Option<&Path>,
    confidence: f64,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let model_path = match model {
        Some(path) => model_resolver::explicit(path)?,
        None => {
            log::info!("Resolving model: {YOLO_MODEL_NAME}");
            let path = model_resolver::resolve(
                YOLO_MODEL_NAME,
                YOLO_MODEL_URL,
                None,
                Some(Box::new(download_progress)),
            )?;
            eprint!("\r");
            path
        }
    };
    Ok(Box::new(OnnxYoloDetector::new(&model_path, confidence)?))
}

/// Recoverable failures become notices; storage failures abort.
fn report_register(
    outcome: Result<RegisterOutcome, SessionError>,
) -> Result<i32, SessionError> {
    match outcome {
        Ok(RegisterOutcome::Registered(profile)) => {
            let [left, top, width, height] = profile.to_array();
            println!("Face registered at ({left:.1}, {top:.1}) size {width:.1}x{height:.1}");
            Ok(0)
        }
        Ok(outcome @ RegisterOutcome::NoFaceDetected) => {
            eprintln!("{outcome}");
            Ok(EXIT_NOT_RECOGNIZED)
        }
        Err(SessionError::RegistrationLocked) => {
            eprintln!("A face is already registered; use --replace to register again");
            Ok(EXIT_NOT_RECOGNIZED)
        }
        Err(e) if e.is_recoverable() => {
            eprintln!("{e}");
            Ok(EXIT_NOT_RECOGNIZED)
        }
        Err(e) => Err(e),
    }
}

fn report_recognize(
    outcome: Result<RecognizeOutcome, SessionError>,
) -> Result<i32, SessionError> {
    match outcome {
        Ok(RecognizeOutcome::Matched(comparison)) => {
            print_home(comparison.percentage);
            Ok(0)
        }
        Ok(other) => {
            eprintln!("{other}");
            Ok(EXIT_NOT_RECOGNIZED)
        }
        Err(e) if e.is_recoverable() => {
            eprintln!("{e}");
            Ok(EXIT_NOT_RECOGNIZED)
        }
        Err(e) => Err(e),
    }
}

fn print_home(percentage: f64) {
    println!("Welcome home ({percentage:.1}% match)");
}

fn print_status(profile: Option<[f64; 4]>, threshold: f64) {
    match profile {
        Some([left, top, width, height]) => println!(
            "Registered: ({left:.1}, {top:.1}) size {width:.1}x{height:.1}, area {:.1}",
            width * height
        ),
        None => println!("Not registered"),
    }
    println!("Threshold: {threshold:.1}%");
}

// ---------------------------------------------------------------------------
// Interactive session
// ---------------------------------------------------------------------------

const SESSION_HELP: &str = "Commands: register <image>, replace <image>, detect <image>, status, forget, quit";

fn run_interactive(session: FaceSession) -> Result<(), Box<dyn std::error::Error>> {
    let threshold = session.threshold();
    let worker = SessionWorker::spawn(session);
    println!("{SESSION_HELP}");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

        let command = match (verb, arg) {
            ("", _) => continue,
            ("quit" | "exit", _) => break,
            ("status", _) => {
                println!(
                    "{} (register {})",
                    if worker.is_registered() { "Registered" } else { "Not registered" },
                    if worker.can_register() { "available" } else { "disabled" }
                );
                println!("Threshold: {threshold:.1}%");
                continue;
            }
            ("register", Some(path)) if worker.is_registered() => {
                println!("Register is disabled while a face is registered; use replace {path}");
                continue;
            }
            ("register", Some(path)) => SessionCommand::Register {
                source: Box::new(ImageFileCapture::new(path)),
                replace: false,
            },
            ("replace", Some(path)) => SessionCommand::Register {
                source: Box::new(ImageFileCapture::new(path)),
                replace: true,
            },
            ("detect", Some(path)) => SessionCommand::Recognize {
                source: Box::new(ImageFileCapture::new(path)),
            },
            ("forget", _) => SessionCommand::Forget,
            _ => {
                println!("{SESSION_HELP}");
                continue;
            }
        };

        match worker.submit(command) {
            Ok(()) => wait_for_event(&worker)?,
            Err(e) if e.is_recoverable() => println!("{e}"),
            Err(e) => return Err(e.into()),
        }
    }

    worker.shutdown();
    Ok(())
}

fn wait_for_event(worker: &SessionWorker) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match worker.events().recv_timeout(Duration::from_millis(250)) {
            Ok(event) => {
                eprint!("\r");
                return print_event(event);
            }
            Err(e) if e.is_timeout() => {
                eprint!(".");
                let _ = io::stderr().flush();
            }
            Err(_) => return Err(SessionError::WorkerStopped.into()),
        }
    }
}

fn print_event(event: SessionEvent) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        SessionEvent::Registered(outcome) => {
            report_register(outcome)?;
        }
        SessionEvent::Recognized(outcome) => {
            report_recognize(outcome)?;
        }
        SessionEvent::Forgotten(result) => {
            result?;
            println!("Registered face removed");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    if !is_image(path) {
        return Err(format!(
            "Unsupported image type: {} (expected one of {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
