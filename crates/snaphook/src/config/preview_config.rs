use crate::config::{default_port, default_preview_enabled};

use serde::{Deserialize, Serialize};

/// Local preview server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Run the preview server and auto-open the viewer after captures.
    #[serde(default = "default_preview_enabled")]
    pub enabled: bool,

    /// Loopback port for the preview server.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: default_preview_enabled(),
            port: default_port(),
        }
    }
}
