use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::debug;

/// Single-flight guard around the external screen capture.
///
/// At most one [`CaptureGuard`] exists at any instant. A trigger that finds
/// the gate closed is dropped by the caller, never queued.
#[derive(Debug, Clone, Default)]
pub struct CaptureGate {
    in_progress: Arc<AtomicBool>,
}

impl CaptureGate {
    /// Create an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check-and-set the in-progress flag.
    ///
    /// Returns `None` when a capture is already outstanding. The flag is
    /// cleared when the returned guard is dropped, which covers success,
    /// error returns and panic unwinding alike.
    pub fn try_acquire(&self) -> Option<CaptureGuard> {
        match self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                debug!("Capture gate acquired");
                Some(CaptureGuard {
                    in_progress: Arc::clone(&self.in_progress),
                })
            }
            Err(_) => None,
        }
    }

    /// Whether a capture is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

/// RAII release for [`CaptureGate`].
///
/// Dropping the guard reopens the gate exactly once.
#[derive(Debug)]
pub struct CaptureGuard {
    in_progress: Arc<AtomicBool>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.in_progress.store(false, Ordering::Release);
        debug!("Capture gate released");
    }
}
