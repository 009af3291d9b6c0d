use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::capture::domain::capture_source::CaptureSource;
use crate::pipeline::activity::{Activity, ActivityGuard};
use crate::pipeline::face_session::{FaceSession, RecognizeOutcome, RegisterOutcome};
use crate::pipeline::session_error::SessionError;

pub enum SessionCommand {
    Register {
        source: Box<dyn CaptureSource>,
        replace: bool,
    },
    Recognize {
        source: Box<dyn CaptureSource>,
    },
    Forget,
}

#[derive(Debug)]
pub enum SessionEvent {
    Registered(Result<RegisterOutcome, SessionError>),
    Recognized(Result<RecognizeOutcome, SessionError>),
    Forgotten(Result<(), SessionError>),
}

/// Runs a [`FaceSession`] on a background thread so slow detection never
/// blocks the caller.
///
/// `submit` claims the session's busy flag on the caller's thread: a second
/// request while one is in flight is rejected with `Busy` instead of queued.
/// The flag is released before the result event is sent.
pub struct SessionWorker {
    commands: Option<Sender<(SessionCommand, ActivityGuard)>>,
    events: Receiver<SessionEvent>,
    activity: Activity,
    registered: Arc<AtomicBool>,
    handle: Option<JoinHandle<FaceSession>>,
}

impl SessionWorker {
    pub fn spawn(session: FaceSession) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let activity = session.activity();
        let registered = Arc::new(AtomicBool::new(session.is_registered()));

        let registered_flag = registered.clone();
        let handle = thread::spawn(move || run(session, command_rx, event_tx, registered_flag));

        Self {
            commands: Some(command_tx),
            events: event_rx,
            activity,
            registered,
            handle: Some(handle),
        }
    }

    /// Hands a command to the worker, or fails with `Busy` while another
    /// command is still running.
    pub fn submit(&self, command: SessionCommand) -> Result<(), SessionError> {
        let commands = self.commands.as_ref().ok_or(SessionError::WorkerStopped)?;
        let guard = self.activity.try_begin()?;
        // On failure the guard comes back inside the error and is dropped
        commands
            .send((command, guard))
            .map_err(|_| SessionError::WorkerStopped)
    }

    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    pub fn is_busy(&self) -> bool {
        self.activity.is_busy()
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Whether the Register action should be offered right now.
    pub fn can_register(&self) -> bool {
        !self.is_registered() && !self.is_busy()
    }

    /// Stops accepting commands, waits for the worker and hands the
    /// session back. `None` if the worker thread panicked.
    pub fn shutdown(mut self) -> Option<FaceSession> {
        self.stop()
    }

    fn stop(&mut self) -> Option<FaceSession> {
        self.commands.take();
        self.handle.take().and_then(|h| h.join().ok())
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    mut session: FaceSession,
    commands: Receiver<(SessionCommand, ActivityGuard)>,
    events: Sender<SessionEvent>,
    registered: Arc<AtomicBool>,
) -> FaceSession {
    for (command, guard) in commands {
        // Each *_with call consumes the guard, so the session is idle again
        // by the time the event goes out
        let event = match command {
            SessionCommand::Register {
                mut source,
                replace,
            } => SessionEvent::Registered(session.register_with(guard, source.as_mut(), replace)),
            SessionCommand::Recognize { mut source } => {
                SessionEvent::Recognized(session.recognize_with(guard, source.as_mut()))
            }
            SessionCommand::Forget => SessionEvent::Forgotten(session.forget_with(guard)),
        };
        registered.store(session.is_registered(), Ordering::Release);
        if events.send(event).is_err() {
            log::debug!("Session event receiver dropped; stopping worker");
            break;
        }
    }
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::{Detection, FaceDetector};
    use crate::matching::domain::face_matcher::FaceMatcher;
    use crate::matching::domain::face_profile::FaceProfile;
    use crate::matching::infrastructure::memory_profile_store::MemoryProfileStore;
    use crate::pipeline::face_session::tests::{detection, ScriptedDetector, StubCapture};
    use crate::shared::frame::Frame;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Blocks inside `detect` until the test releases it.
    struct GatedDetector {
        entered: Sender<()>,
        release: Receiver<()>,
        face: [f64; 4],
    }

    impl FaceDetector for GatedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            let _ = self.entered.send(());
            self.release.recv_timeout(TIMEOUT)?;
            Ok(vec![detection(self.face)])
        }
    }

    fn worker(detector: Box<dyn FaceDetector>, stored: Option<[f64; 4]>) -> SessionWorker {
        let store = match stored {
            Some(b) => MemoryProfileStore::with_profile(FaceProfile::from_array(b).unwrap()),
            None => MemoryProfileStore::new(),
        };
        let matcher = FaceMatcher::open(Box::new(store)).unwrap();
        SessionWorker::spawn(FaceSession::new(detector, matcher, 80.0))
    }

    fn register(replace: bool) -> SessionCommand {
        SessionCommand::Register {
            source: Box::new(StubCapture::ok()),
            replace,
        }
    }

    fn recognize() -> SessionCommand {
        SessionCommand::Recognize {
            source: Box::new(StubCapture::ok()),
        }
    }

    #[test]
    fn test_register_then_recognize() {
        let w = worker(
            Box::new(ScriptedDetector::faces(&[
                [10.0, 10.0, 100.0, 100.0],
                [50.0, 50.0, 100.0, 100.0],
            ])),
            None,
        );
        assert!(w.can_register());

        w.submit(register(false)).unwrap();
        match w.events().recv_timeout(TIMEOUT).unwrap() {
            SessionEvent::Registered(Ok(RegisterOutcome::Registered(_))) => {}
            other => panic!("unexpected event {other:?}"),
        }
        assert!(w.is_registered());
        assert!(!w.can_register());

        w.submit(recognize()).unwrap();
        match w.events().recv_timeout(TIMEOUT).unwrap() {
            SessionEvent::Recognized(Ok(RecognizeOutcome::Matched(c))) => {
                assert_eq!(c.percentage, 100.0)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_rejects_second_request_while_in_flight() {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        let w = worker(
            Box::new(GatedDetector {
                entered: entered_tx,
                release: release_rx,
                face: [0.0, 0.0, 100.0, 100.0],
            }),
            Some([0.0, 0.0, 100.0, 100.0]),
        );

        w.submit(recognize()).unwrap();
        entered_rx.recv_timeout(TIMEOUT).unwrap();
        assert!(w.is_busy());
        assert!(matches!(w.submit(recognize()), Err(SessionError::Busy)));
        assert!(matches!(w.submit(register(true)), Err(SessionError::Busy)));

        release_tx.send(()).unwrap();
        match w.events().recv_timeout(TIMEOUT).unwrap() {
            SessionEvent::Recognized(Ok(RecognizeOutcome::Matched(_))) => {}
            other => panic!("unexpected event {other:?}"),
        }
        // exactly one event: the rejected requests never reached the worker
        assert!(w.events().try_recv().is_err());
        assert!(!w.is_busy());
    }

    #[test]
    fn test_failure_event_releases_busy_flag() {
        let w = worker(Box::new(ScriptedDetector::faces(&[])), None);
        w.submit(SessionCommand::Register {
            source: Box::new(StubCapture::failing()),
            replace: false,
        })
        .unwrap();
        match w.events().recv_timeout(TIMEOUT).unwrap() {
            SessionEvent::Registered(Err(SessionError::Capture(_))) => {}
            other => panic!("unexpected event {other:?}"),
        }
        assert!(!w.is_busy());
        w.submit(recognize()).unwrap();
    }

    #[test]
    fn test_forget_updates_registration_flag() {
        let w = worker(
            Box::new(ScriptedDetector::faces(&[])),
            Some([0.0, 0.0, 10.0, 10.0]),
        );
        assert!(w.is_registered());
        w.submit(SessionCommand::Forget).unwrap();
        assert!(matches!(
            w.events().recv_timeout(TIMEOUT).unwrap(),
            SessionEvent::Forgotten(Ok(()))
        ));
        assert!(!w.is_registered());
    }

    #[test]
    fn test_shutdown_returns_session() {
        let w = worker(
            Box::new(ScriptedDetector::faces(&[[0.0, 0.0, 40.0, 40.0]])),
            None,
        );
        w.submit(register(false)).unwrap();
        w.events().recv_timeout(TIMEOUT).unwrap();

        let session = w.shutdown().unwrap();
        assert_eq!(session.profile().unwrap().to_array(), [0.0, 0.0, 40.0, 40.0]);
    }
}
