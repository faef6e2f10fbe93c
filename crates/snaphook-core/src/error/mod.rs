use error_location::ErrorLocation;
use thiserror::Error;

/// Errors raised by the capture history, broadcast and preview server layers.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Requested image or history position does not exist.
    #[error("Not found: {what} {location}")]
    NotFound {
        /// Description of the missing resource.
        what: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Request was malformed (missing or invalid field).
    #[error("Validation failed: {reason} {location}")]
    Validation {
        /// Description of the validation failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Preview server failed to bind or serve.
    #[error("Preview server error: {reason} {location}")]
    Server {
        /// Description of the server failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Filesystem operation failed.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<std::io::Error> for CoreError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CoreError::Io {
            source,
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
