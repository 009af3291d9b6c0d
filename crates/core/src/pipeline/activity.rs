use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::session_error::SessionError;

/// Where the single in-flight request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Capturing,
    Processing,
}

const IDLE: u8 = 0;
const CAPTURING: u8 = 1;
const PROCESSING: u8 = 2;

impl SessionPhase {
    fn from_raw(raw: u8) -> Self {
        match raw {
            CAPTURING => Self::Capturing,
            PROCESSING => Self::Processing,
            _ => Self::Idle,
        }
    }
}

/// Shared busy flag of a session: `Idle → Capturing → Processing → Idle`.
///
/// Clones observe the same flag, so a front end can check it while a worker
/// thread owns the session.
#[derive(Clone, Debug, Default)]
pub struct Activity {
    phase: Arc<AtomicU8>,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_raw(self.phase.load(Ordering::Acquire))
    }

    pub fn is_busy(&self) -> bool {
        self.phase() != SessionPhase::Idle
    }

    /// Claims the session for one request, or fails with `Busy` while
    /// another request is in flight.
    pub fn try_begin(&self) -> Result<ActivityGuard, SessionError> {
        self.phase
            .compare_exchange(IDLE, CAPTURING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;
        log::debug!("Session phase: Idle -> Capturing");
        Ok(ActivityGuard {
            phase: self.phase.clone(),
        })
    }

    pub(crate) fn owns(&self, guard: &ActivityGuard) -> bool {
        Arc::ptr_eq(&self.phase, &guard.phase)
    }
}

/// Proof that a request holds the session. Dropping it returns the session
/// to `Idle`, whichever way the request ended.
#[derive(Debug)]
pub struct ActivityGuard {
    phase: Arc<AtomicU8>,
}

impl ActivityGuard {
    /// Capture finished; detection and matching follow.
    pub fn processing(&self) {
        self.phase.store(PROCESSING, Ordering::Release);
        log::debug!("Session phase: Capturing -> Processing");
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_raw(self.phase.load(Ordering::Acquire))
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.phase.store(IDLE, Ordering::Release);
        log::debug!("Session phase: -> Idle");
    }
}
