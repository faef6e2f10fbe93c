use snaphook_core::CoreError;

use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Application-level errors for the snaphook binary.
///
/// All variants include `ErrorLocation` for call-site tracking.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the preview/history core.
    #[error("Core error: {source} {location}")]
    Core {
        /// The underlying core error.
        #[source]
        source: CoreError,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Hotkey string could not be parsed into a supported binding.
    #[error("Unsupported hotkey '{input}': {reason} {location}")]
    UnsupportedHotkey {
        /// The rejected hotkey string.
        input: String,
        /// Human-readable reason for rejection.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The OS refused the hotkey registration.
    #[error("Hotkey registration failed: {reason} {location}")]
    HotkeyRegistrationFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// `register` was called while a hotkey loop is already running.
    #[error("Hotkey loop already active {location}")]
    HotkeyLoopActive {
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// A capture is already in progress; the trigger was dropped.
    #[error("Capture already in progress {location}")]
    CaptureBusy {
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The screen capture step failed.
    #[error("Screen capture failed: {reason} {location}")]
    CaptureFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to copy an image to the clipboard.
    #[error("Failed to copy to clipboard: {reason} {location}")]
    ClipboardError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to open a URL in the default browser.
    #[error("Failed to open browser: {reason} {location}")]
    BrowserOpenFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to send message through a channel.
    #[error("Channel send failed: {message} {location}")]
    ChannelSendFailed {
        /// Human-readable error message.
        message: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Configuration loading or saving error.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    IoError {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

// Manual From impls with location tracking.
// `#[from]` does not support the extra location field.
impl From<CoreError> for AppError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        AppError::Core {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::IoError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
