//! What happens when the hotkey fires.
//!
//! A trigger takes the capture gate, grabs the screen on a blocking worker,
//! records the file in history and notifies viewers. Clipboard copy and
//! browser auto-open follow, driven by a config snapshot taken at trigger
//! time.

use crate::{AppError, AppResult, config::Config, desktop::Desktop, screen_capture::ScreenGrabber};

use snaphook_core::{BroadcastHub, CaptureGate, HistoryStore, ImageRecord, UPDATE_EVENT};

use std::{panic::Location, sync::Arc, time::Instant};

use error_location::ErrorLocation;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Shared handles needed to service a capture trigger.
pub(crate) struct CapturePipeline<G, D> {
    gate: CaptureGate,
    history: HistoryStore,
    hub: BroadcastHub,
    grabber: Arc<G>,
    desktop: Arc<D>,
    config: Arc<Mutex<Config>>,
}

impl<G, D> Clone for CapturePipeline<G, D> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            history: self.history.clone(),
            hub: self.hub.clone(),
            grabber: Arc::clone(&self.grabber),
            desktop: Arc::clone(&self.desktop),
            config: Arc::clone(&self.config),
        }
    }
}

impl<G: ScreenGrabber, D: Desktop> CapturePipeline<G, D> {
    pub(crate) fn new(
        history: HistoryStore,
        hub: BroadcastHub,
        grabber: G,
        desktop: D,
        config: Arc<Mutex<Config>>,
    ) -> Self {
        Self {
            gate: CaptureGate::new(),
            history,
            hub,
            grabber: Arc::new(grabber),
            desktop: Arc::new(desktop),
            config,
        }
    }

    pub(crate) fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub(crate) fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub(crate) fn desktop(&self) -> &Arc<D> {
        &self.desktop
    }

    /// Run one capture. Returns `CaptureBusy` without side effects when a
    /// capture is already in flight.
    #[instrument(skip(self, capture_id), fields(capture_id = %capture_id))]
    pub(crate) async fn on_trigger(&self, capture_id: Uuid) -> AppResult<ImageRecord> {
        let caller = Location::caller();

        let Some(guard) = self.gate.try_acquire() else {
            debug!(capture_id = %capture_id, "Capture already in progress, dropping trigger");
            return Err(AppError::CaptureBusy {
                location: ErrorLocation::from(caller),
            });
        };

        let config = self.config.lock().await.clone();
        let started = Instant::now();

        let grabber = Arc::clone(&self.grabber);
        let settings = config.capture.clone();
        let captured = tokio::task::spawn_blocking(move || grabber.capture(&settings))
            .await
            .map_err(|e| AppError::CaptureFailed {
                reason: format!("Capture task panicked: {}", e),
                location: ErrorLocation::from(caller),
            })
            .and_then(|result| result);

        let path = match captured {
            Ok(path) => path,
            Err(e) => {
                error!(capture_id = %capture_id, error = ?e, "Screen capture failed");
                return Err(e);
            }
        };

        let record = self.history.append(path);
        let delivered = self.hub.publish(UPDATE_EVENT);

        // Side effects below may be slow; the next trigger can start now.
        drop(guard);

        info!(
            capture_id = %capture_id,
            sequence = record.sequence,
            path = ?record.path,
            delivered,
            duration_ms = started.elapsed().as_millis(),
            "Screenshot captured"
        );

        if config.capture.copy_to_clipboard {
            let desktop = Arc::clone(&self.desktop);
            let path = record.path.clone();
            match tokio::task::spawn_blocking(move || desktop.copy_image(&path)).await {
                Ok(Ok(())) => debug!(capture_id = %capture_id, "Copied to clipboard"),
                Ok(Err(e)) => warn!(capture_id = %capture_id, error = ?e, "Clipboard copy failed"),
                Err(e) => warn!(capture_id = %capture_id, error = ?e, "Clipboard task panicked"),
            }
        }

        if config.preview.enabled && !self.hub.has_subscribers() {
            let desktop = Arc::clone(&self.desktop);
            let url = config.preview_url();
            match tokio::task::spawn_blocking(move || desktop.open_url(&url)).await {
                Ok(Ok(())) => debug!(capture_id = %capture_id, "Viewer opened"),
                Ok(Err(e)) => warn!(capture_id = %capture_id, error = ?e, "Failed to open viewer"),
                Err(e) => warn!(capture_id = %capture_id, error = ?e, "Browser task panicked"),
            }
        }

        Ok(record)
    }
}
