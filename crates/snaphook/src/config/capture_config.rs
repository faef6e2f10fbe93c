use crate::config::{default_auto_save, default_auto_save_dir, default_copy_to_clipboard};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What happens to a screenshot after it is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Keep a timestamped copy of every capture in `auto_save_dir`.
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,

    /// Directory for auto-saved copies. Created on demand.
    #[serde(default = "default_auto_save_dir")]
    pub auto_save_dir: PathBuf,

    /// Put each capture on the clipboard as an image.
    #[serde(default = "default_copy_to_clipboard")]
    pub copy_to_clipboard: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            auto_save: default_auto_save(),
            auto_save_dir: default_auto_save_dir(),
            copy_to_clipboard: default_copy_to_clipboard(),
        }
    }
}
