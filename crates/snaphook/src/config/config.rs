//! Persistent settings stored as `config.toml` in the platform config dir.
//!
//! Missing sections and fields fall back to their defaults, so older or
//! hand-trimmed files keep loading.

use crate::{
    AppError, AppResult,
    config::{CaptureConfig, HotkeyConfig, PreviewConfig},
};

use std::{
    fmt::Display,
    fs,
    io::{self, Write},
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const CONFIG_FILE_NAME: &str = "config.toml";

/// All user-facing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Global hotkey binding.
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    /// Post-capture behaviour.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Preview server settings.
    #[serde(default)]
    pub preview: PreviewConfig,
}

#[track_caller]
fn config_error(what: &str, e: impl Display) -> AppError {
    AppError::ConfigError {
        reason: format!("{what}: {e}"),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Write `contents` beside `path`, flush it to disk, then move it into place.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let staging = path.with_extension("toml.tmp");
    {
        let mut file = fs::File::create(&staging)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&staging, path)
}

impl Config {
    /// Read the settings file, creating it with defaults on first run.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Like [`Config::load`] but for an explicit file.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            info!(path = ?path, "Config file missing, writing defaults");
            let defaults = Self::default();
            defaults.save_to(path)?;
            return Ok(defaults);
        }

        let raw = fs::read_to_string(path)
            .map_err(|e| config_error(&format!("Cannot read {}", path.display()), e))?;
        let config = toml::from_str::<Self>(&raw)
            .map_err(|e| config_error(&format!("Invalid TOML in {}", path.display()), e))?;

        debug!(path = ?path, hotkey = %config.hotkey.binding, "Config loaded");

        Ok(config)
    }

    /// Persist to the platform settings file.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Persist to `path`. A crash mid-write leaves the previous file intact.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let serialized =
            toml::to_string_pretty(self).map_err(|e| config_error("Cannot serialize config", e))?;

        write_atomic(path, &serialized)
            .map_err(|e| config_error(&format!("Cannot write {}", path.display()), e))?;

        debug!(path = ?path, "Config saved");

        Ok(())
    }

    /// Viewer URL for the configured preview port.
    pub fn preview_url(&self) -> String {
        format!("http://localhost:{}", self.preview.port)
    }

    /// Project directories shared by config and log files.
    #[track_caller]
    pub fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "snaphook", "SnapHook").ok_or_else(|| AppError::ConfigError {
            reason: "No home directory to place project directories in".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let dirs = Self::project_dirs()?;
        let dir = dirs.config_dir();
        fs::create_dir_all(dir)?;
        Ok(dir.join(CONFIG_FILE_NAME))
    }
}
