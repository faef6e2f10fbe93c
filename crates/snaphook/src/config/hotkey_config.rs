use crate::config::default_hotkey;

use serde::{Deserialize, Serialize};

/// Global hotkey configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Hotkey string, e.g. `Ctrl+Shift+S`.
    #[serde(default = "default_hotkey")]
    pub binding: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            binding: default_hotkey(),
        }
    }
}
