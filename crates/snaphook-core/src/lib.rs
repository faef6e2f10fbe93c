//! SnapHook Core Library
//!
//! Platform-independent pieces of the screenshot pipeline: the single-flight
//! capture gate, the bounded image history, the live viewer broadcast hub and
//! the loopback preview server that composes them.
//!
//! # Example
//!
//! ```no_run
//! use snaphook_core::{BroadcastHub, CoreResult, HistoryStore, PreviewServer, PreviewState, UPDATE_EVENT};
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let history = HistoryStore::new();
//!     let hub = BroadcastHub::new();
//!     let (hotkey_tx, _hotkey_rx) = tokio::sync::mpsc::channel(10);
//!
//!     let server = PreviewServer::start(PreviewState::new(history.clone(), hub.clone(), hotkey_tx), 8765).await?;
//!
//!     history.append("/tmp/snaphook-1.png");
//!     hub.publish(UPDATE_EVENT);
//!
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```

mod broadcast;
mod capture;
mod error;
mod history;
mod preview;

pub use {
    broadcast::{
        BroadcastHub, MAX_SUBSCRIBERS, SUBSCRIBER_QUEUE_CAPACITY, Subscription, UPDATE_EVENT,
    },
    capture::{CaptureGate, CaptureGuard},
    error::{CoreError, Result as CoreResult},
    history::{HistoryStore, ImageRecord, MAX_HISTORY_SIZE},
    preview::{DEFAULT_PREVIEW_PORT, PreviewServer, PreviewState, router},
};

#[cfg(test)]
mod tests;
