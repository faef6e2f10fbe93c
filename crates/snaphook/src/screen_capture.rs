//! Primary-monitor capture to PNG files, plus temp-file housekeeping.

use crate::{AppError, AppResult, config::CaptureConfig};

use std::{
    fs,
    panic::Location,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use chrono::Local;
use error_location::ErrorLocation;
use image::ImageFormat;
use tracing::{debug, info, instrument, warn};
use xcap::Monitor;

/// File name prefix for captures written to the temp directory.
pub(crate) const TEMP_FILE_PREFIX: &str = "snaphook-";

/// Temp captures older than this are removed at startup.
pub(crate) const TEMP_FILE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Produces one screenshot file per call.
pub(crate) trait ScreenGrabber: Send + Sync + 'static {
    /// Capture the screen and return the path of the written PNG.
    ///
    /// Blocking; callers run it on a blocking worker.
    fn capture(&self, settings: &CaptureConfig) -> AppResult<PathBuf>;
}

/// `xcap` grabber writing into a temp directory.
#[derive(Debug, Clone)]
pub(crate) struct XcapGrabber {
    temp_dir: PathBuf,
}

impl XcapGrabber {
    /// Grabber writing into the system temp directory.
    pub(crate) fn new() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
        }
    }

    #[track_caller]
    fn primary_monitor() -> AppResult<Monitor> {
        let location = Location::caller();
        let monitors = Monitor::all().map_err(|e| AppError::CaptureFailed {
            reason: format!("Failed to enumerate monitors: {}", e),
            location: ErrorLocation::from(location),
        })?;

        let primary = monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0);

        monitors
            .into_iter()
            .nth(primary)
            .ok_or_else(|| AppError::CaptureFailed {
                reason: "No monitor found".to_string(),
                location: ErrorLocation::from(location),
            })
    }
}

impl ScreenGrabber for XcapGrabber {
    #[instrument(skip(self, settings))]
    fn capture(&self, settings: &CaptureConfig) -> AppResult<PathBuf> {
        let monitor = Self::primary_monitor()?;

        let image = monitor.capture_image().map_err(|e| AppError::CaptureFailed {
            reason: format!("Failed to capture monitor: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let path = self.temp_dir.join(format!("{TEMP_FILE_PREFIX}{nanos}.png"));

        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| AppError::CaptureFailed {
                reason: format!("Failed to write {}: {}", path.display(), e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(path = ?path, width = image.width(), height = image.height(), "Screenshot written");

        if settings.auto_save {
            match auto_save_copy(&path, &settings.auto_save_dir) {
                Ok(saved) => info!(path = ?saved, "Screenshot auto-saved"),
                Err(e) => warn!(error = ?e, "Auto-save failed, capture kept in temp"),
            }
        }

        Ok(path)
    }
}

/// Copy `source` into `dir` as `screenshot_<YYYY-MM-DD_HH-MM-SS>.png`.
#[track_caller]
pub(crate) fn auto_save_copy(source: &Path, dir: &Path) -> AppResult<PathBuf> {
    fs::create_dir_all(dir)?;

    let name = format!("screenshot_{}.png", Local::now().format("%Y-%m-%d_%H-%M-%S"));
    let target = dir.join(name);

    fs::copy(source, &target)?;

    Ok(target)
}

/// Remove `snaphook-*.png` files in `dir` whose modification time is older
/// than `max_age`. Returns how many files were removed.
#[instrument]
pub(crate) fn cleanup_old_temp_files(dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = ?dir, error = ?e, "Failed to read temp directory");
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(TEMP_FILE_PREFIX) || !name.ends_with(".png") {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > max_age);

        if !expired {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = ?entry.path(), error = ?e, "Failed to remove old capture"),
        }
    }

    if removed > 0 {
        info!(removed, "Removed old temp captures");
    }

    removed
}
