/// Commands sent from the async runtime to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`),
/// so all tray mutations and process lifecycle events flow through this enum.
#[derive(Debug, Clone)]
pub enum TrayCommand {
    /// Show the active hotkey in the menu label and tooltip.
    SetHotkeyLabel(String),
    /// Sync the check marks with the current config.
    SetToggles {
        /// Preview server enabled.
        preview: bool,
        /// Copy captures to the clipboard.
        copy_to_clipboard: bool,
        /// Auto-save captures.
        auto_save: bool,
    },
    /// Shut down the application. The main thread will exit the event loop.
    Shutdown,
}
