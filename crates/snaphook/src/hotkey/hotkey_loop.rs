//! Dedicated-thread bridge between an OS global hotkey and an app callback.
//!
//! Each active registration owns two threads:
//!
//! - the **pump** registers the hotkey, blocks on the OS message source and
//!   forwards presses into a bounded queue. Registration, pumping and
//!   revocation all happen on this one thread.
//! - the **dispatcher** drains that queue and runs the callback, so a slow
//!   callback never delays the pump.
//!
//! Teardown posts a quit sentinel to the pump and waits a bounded time for it
//! to exit.

use crate::{
    AppError, AppResult,
    hotkey::{HotkeyBackend, HotkeySession, HotkeySpec, PumpMessage, QuitSignal},
};

use std::{
    panic::{AssertUnwindSafe, Location, catch_unwind},
    sync::{Arc, Mutex, PoisonError, RwLock},
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, TrySendError, bounded};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// How long `unregister` waits for the pump thread before giving up on it.
pub(crate) const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Presses buffered between pump and dispatcher. Extra presses are dropped.
const DISPATCH_QUEUE_CAPACITY: usize = 32;

/// Callback invoked on the dispatcher thread once per hotkey press.
pub(crate) type HotkeyCallback = Arc<dyn Fn() + Send + Sync>;

/// Lifecycle of a [`HotkeyLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HotkeyLoopState {
    Idle,
    Registering,
    Active,
    Unregistering,
}

struct ActiveLoop<Q> {
    spec: HotkeySpec,
    quit: Q,
    pump_done: Receiver<()>,
    pump: JoinHandle<()>,
}

/// Owns at most one live global hotkey registration.
pub(crate) struct HotkeyLoop<B: HotkeyBackend> {
    backend: Arc<B>,
    teardown_timeout: Duration,
    active: Mutex<Option<ActiveLoop<B::Quit>>>,
    state: RwLock<HotkeyLoopState>,
}

impl<B: HotkeyBackend> HotkeyLoop<B> {
    /// Create an idle loop over `backend`.
    pub(crate) fn new(backend: B) -> Self {
        Self::with_teardown_timeout(backend, DEFAULT_TEARDOWN_TIMEOUT)
    }

    /// Create an idle loop with a custom bound on `unregister`.
    pub(crate) fn with_teardown_timeout(backend: B, teardown_timeout: Duration) -> Self {
        Self {
            backend: Arc::new(backend),
            teardown_timeout,
            active: Mutex::new(None),
            state: RwLock::new(HotkeyLoopState::Idle),
        }
    }

    /// Current lifecycle state.
    pub(crate) fn state(&self) -> HotkeyLoopState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binding of the active registration, if any.
    pub(crate) fn current(&self) -> Option<HotkeySpec> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|running| running.spec)
    }

    /// Parse `binding`, register it on a fresh pump thread and start
    /// dispatching presses to `handler`.
    ///
    /// Blocks until the pump thread reports whether the OS accepted the
    /// registration.
    #[track_caller]
    #[instrument(skip(self, handler))]
    pub(crate) fn register(&self, binding: &str, handler: HotkeyCallback) -> AppResult<HotkeySpec> {
        let location = Location::caller();
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(running) = active.as_ref() {
            warn!(active = %running.spec, "Register rejected, a hotkey is already active");
            return Err(AppError::HotkeyLoopActive {
                location: ErrorLocation::from(location),
            });
        }

        let spec = HotkeySpec::parse(binding)?;

        self.set_state(HotkeyLoopState::Registering);

        match self.start(spec, handler, location) {
            Ok(running) => {
                *active = Some(running);
                self.set_state(HotkeyLoopState::Active);
                info!(hotkey = %spec, "Global hotkey registered");
                Ok(spec)
            }
            Err(e) => {
                self.set_state(HotkeyLoopState::Idle);
                Err(e)
            }
        }
    }

    /// Revoke the active registration. No-op when idle.
    ///
    /// Waits at most the teardown timeout for the pump thread; past that the
    /// thread is left behind and a warning is logged.
    #[instrument(skip(self))]
    pub(crate) fn unregister(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(running) = active.take() else {
            debug!("Unregister requested with no active hotkey");
            return;
        };

        self.set_state(HotkeyLoopState::Unregistering);

        if !running.quit.post_quit() {
            warn!(hotkey = %running.spec, "Failed to post quit to hotkey pump");
        }

        match running.pump_done.recv_timeout(self.teardown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if running.pump.join().is_err() {
                    warn!(hotkey = %running.spec, "Hotkey pump thread panicked");
                }
                info!(hotkey = %running.spec, "Global hotkey unregistered");
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    hotkey = %running.spec,
                    timeout_ms = self.teardown_timeout.as_millis(),
                    "Hotkey pump did not exit within timeout, leaving it behind"
                );
            }
        }

        self.set_state(HotkeyLoopState::Idle);
    }

    /// Unregister the current binding, then register `binding`.
    ///
    /// Not atomic: on failure the loop is left idle.
    #[track_caller]
    pub(crate) fn change_hotkey(&self, binding: &str, handler: HotkeyCallback) -> AppResult<HotkeySpec> {
        self.unregister();
        self.register(binding, handler)
    }

    fn set_state(&self, state: HotkeyLoopState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn start(
        &self,
        spec: HotkeySpec,
        handler: HotkeyCallback,
        location: &'static Location<'static>,
    ) -> AppResult<ActiveLoop<B::Quit>> {
        let spawn_failed = |what: &str, e: std::io::Error| AppError::HotkeyRegistrationFailed {
            reason: format!("Failed to spawn {what} thread: {e}"),
            location: ErrorLocation::from(location),
        };

        let (press_tx, press_rx) = bounded::<()>(DISPATCH_QUEUE_CAPACITY);
        let (ready_tx, ready_rx) = bounded::<AppResult<B::Quit>>(1);
        let (done_tx, done_rx) = bounded::<()>(1);

        // Detached. Exits once the pump drops `press_tx` and the queue drains.
        thread::Builder::new()
            .name("snaphook-hotkey-dispatch".to_string())
            .spawn(move || {
                while press_rx.recv().is_ok() {
                    if catch_unwind(AssertUnwindSafe(|| handler())).is_err() {
                        error!("Hotkey callback panicked");
                    }
                }
                debug!("Hotkey dispatcher stopped");
            })
            .map_err(|e| spawn_failed("dispatcher", e))?;

        let backend = Arc::clone(&self.backend);
        let pump = thread::Builder::new()
            .name("snaphook-hotkey-pump".to_string())
            .spawn(move || {
                let (mut session, quit) = match backend.open(&spec) {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                if ready_tx.send(Ok(quit)).is_err() {
                    return;
                }

                loop {
                    match session.next_message() {
                        PumpMessage::Pressed => match press_tx.try_send(()) {
                            Ok(()) => debug!(hotkey = %spec, "Hotkey press queued"),
                            Err(TrySendError::Full(())) => {
                                warn!(hotkey = %spec, "Dispatch queue full, dropping hotkey press");
                            }
                            Err(TrySendError::Disconnected(())) => {
                                warn!(hotkey = %spec, "Hotkey dispatcher gone, stopping pump");
                                break;
                            }
                        },
                        PumpMessage::Ignored => {}
                        PumpMessage::Quit => break,
                    }
                }

                drop(session);
                drop(press_tx);
                let _ = done_tx.send(());
                debug!(hotkey = %spec, "Hotkey pump stopped");
            })
            .map_err(|e| spawn_failed("pump", e))?;

        match ready_rx.recv() {
            Ok(Ok(quit)) => Ok(ActiveLoop {
                spec,
                quit,
                pump_done: done_rx,
                pump,
            }),
            Ok(Err(e)) => {
                let _ = pump.join();
                warn!(hotkey = %spec, error = ?e, "Hotkey registration refused");
                Err(e)
            }
            Err(_) => {
                let _ = pump.join();
                Err(AppError::HotkeyRegistrationFailed {
                    reason: format!("Hotkey pump for {spec} exited before registering"),
                    location: ErrorLocation::from(location),
                })
            }
        }
    }
}

impl<B: HotkeyBackend> Drop for HotkeyLoop<B> {
    fn drop(&mut self) {
        self.unregister();
    }
}
