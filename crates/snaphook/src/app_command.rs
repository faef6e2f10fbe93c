use uuid::Uuid;

/// Commands delivered to the main application loop.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// The hotkey fired; take a screenshot.
    Capture {
        /// Correlates log lines for this capture.
        capture_id: Uuid,
    },
    /// Swap the global hotkey for `binding`.
    ChangeHotkey {
        /// New hotkey string, e.g. `Ctrl+Alt+S`.
        binding: String,
    },
    /// Request application shutdown.
    Shutdown,
}
