use crate::{BroadcastHub, HistoryStore};

use tokio::sync::mpsc;

/// Shared state handed to every preview route handler.
#[derive(Debug, Clone)]
pub struct PreviewState {
    /// Captured image history.
    pub history: HistoryStore,
    /// Live viewer fan-out.
    pub hub: BroadcastHub,
    /// Hotkey change requests submitted from the settings page.
    pub hotkey_change_tx: mpsc::Sender<String>,
}

impl PreviewState {
    /// Bundle the shared services for the router.
    pub fn new(
        history: HistoryStore,
        hub: BroadcastHub,
        hotkey_change_tx: mpsc::Sender<String>,
    ) -> Self {
        Self {
            history,
            hub,
            hotkey_change_tx,
        }
    }
}
