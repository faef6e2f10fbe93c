//! Clipboard and browser integration.
//!
//! Copies captured screenshots to the clipboard as images and opens the
//! preview viewer in the default browser.

use crate::{AppError, AppResult};

use std::{
    borrow::Cow,
    panic::Location,
    path::Path,
    sync::{Mutex, PoisonError},
};

use arboard::{Clipboard, ImageData};
use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Side effects on the user's desktop session.
pub(crate) trait Desktop: Send + Sync + 'static {
    /// Decode the PNG at `path` and place it on the clipboard. Blocking.
    fn copy_image(&self, path: &Path) -> AppResult<()>;

    /// Open `url` in the default browser. Blocking.
    fn open_url(&self, url: &str) -> AppResult<()>;
}

/// Real clipboard plus `open`.
pub(crate) struct SystemDesktop {
    clipboard: Mutex<Clipboard>,
}

impl SystemDesktop {
    /// Connect to the system clipboard.
    #[track_caller]
    #[instrument]
    pub(crate) fn new() -> AppResult<Self> {
        let clipboard = Clipboard::new().map_err(|e| AppError::ClipboardError {
            reason: format!("Failed to initialize clipboard: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("Clipboard initialized");

        Ok(Self {
            clipboard: Mutex::new(clipboard),
        })
    }
}

impl Desktop for SystemDesktop {
    #[instrument(skip(self))]
    fn copy_image(&self, path: &Path) -> AppResult<()> {
        let decoded = image::open(path).map_err(|e| AppError::ClipboardError {
            reason: format!("Failed to decode {}: {}", path.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rgba = decoded.into_rgba8();
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);

        self.clipboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_image(ImageData {
                width,
                height,
                bytes: Cow::Owned(rgba.into_raw()),
            })
            .map_err(|e| AppError::ClipboardError {
                reason: format!("Failed to set clipboard image: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(width, height, "Screenshot copied to clipboard");

        Ok(())
    }

    #[instrument(skip(self))]
    fn open_url(&self, url: &str) -> AppResult<()> {
        open::that(url).map_err(|e| AppError::BrowserOpenFailed {
            reason: format!("Failed to open {}: {}", url, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(url, "Opened browser");

        Ok(())
    }
}
