mod capture_config;
#[allow(clippy::module_inception)]
mod config;
mod hotkey_config;
mod preview_config;

pub(crate) use {
    capture_config::CaptureConfig, config::Config, hotkey_config::HotkeyConfig,
    preview_config::PreviewConfig,
};

use std::path::PathBuf;

use directories::UserDirs;

pub(crate) const DEFAULT_HOTKEY: &str = "Ctrl+Shift+S";
pub(crate) const DEFAULT_AUTO_SAVE: bool = false;
pub(crate) const DEFAULT_COPY_TO_CLIPBOARD: bool = true;
pub(crate) const DEFAULT_PREVIEW_ENABLED: bool = true;

pub(crate) fn default_hotkey() -> String {
    DEFAULT_HOTKEY.to_string()
}

pub(crate) fn default_auto_save() -> bool {
    DEFAULT_AUTO_SAVE
}

pub(crate) fn default_copy_to_clipboard() -> bool {
    DEFAULT_COPY_TO_CLIPBOARD
}

pub(crate) fn default_preview_enabled() -> bool {
    DEFAULT_PREVIEW_ENABLED
}

pub(crate) fn default_port() -> u16 {
    snaphook_core::DEFAULT_PREVIEW_PORT
}

/// `<Pictures>/SnapHook`, falling back to the home directory and then the
/// temp directory on systems without a pictures folder.
pub(crate) fn default_auto_save_dir() -> PathBuf {
    let base = UserDirs::new().and_then(|dirs| {
        dirs.picture_dir()
            .map(PathBuf::from)
            .or_else(|| Some(dirs.home_dir().to_path_buf()))
    });

    base.unwrap_or_else(std::env::temp_dir).join("SnapHook")
}
