use crate::{AppResult, hotkey::HotkeySpec};

/// What the pump thread saw when it woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PumpMessage {
    /// The registered hotkey was pressed.
    Pressed,
    /// Something unrelated arrived; keep waiting.
    Ignored,
    /// The quit sentinel arrived or the message source closed.
    Quit,
}

/// Cross-thread handle that wakes a blocked pump with the quit sentinel.
pub(crate) trait QuitSignal: Send + Sync + 'static {
    /// Post the sentinel. Returns `false` if it could not be delivered.
    fn post_quit(&self) -> bool;
}

/// A live OS registration, owned by the pump thread.
///
/// Dropping the session revokes the registration. It is created, pumped and
/// dropped on the same thread.
pub(crate) trait HotkeySession {
    /// Block until the next message for this thread.
    fn next_message(&mut self) -> PumpMessage;
}

/// Platform hook for registering a global hotkey.
pub(crate) trait HotkeyBackend: Send + Sync + 'static {
    /// Session type kept on the pump thread.
    type Session: HotkeySession;
    /// Quit handle handed back to the registering thread.
    type Quit: QuitSignal;

    /// Register `spec` for the calling thread. Runs on the pump thread.
    fn open(&self, spec: &HotkeySpec) -> AppResult<(Self::Session, Self::Quit)>;
}
