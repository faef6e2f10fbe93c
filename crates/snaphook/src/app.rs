use crate::{
    AppCommand, AppError, AppResult, CapturePipeline, TrayCommand, TrayMenuIds,
    config::Config,
    desktop::{Desktop, SystemDesktop},
    hotkey::{HotkeyCallback, HotkeyLoop, HotkeyLoopState, PlatformBackend},
    screen_capture::XcapGrabber,
};

use snaphook_core::{PreviewServer, PreviewState};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::MenuEvent;
use uuid::Uuid;

/// Capacity of the hotkey-change channel fed by the settings page.
pub(crate) const HOTKEY_CHANGE_CAPACITY: usize = 8;

/// Main application state.
///
/// Runs on the async runtime thread. Tray updates go back to the main thread
/// through `tray_proxy` because `TrayIcon` is `!Send` and must remain on the
/// UI thread.
pub struct App {
    pub(crate) pipeline: CapturePipeline<XcapGrabber, SystemDesktop>,
    pub(crate) hotkeys: Arc<HotkeyLoop<PlatformBackend>>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) config: Arc<Mutex<Config>>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) hotkey_change_tx: mpsc::Sender<String>,
    pub(crate) hotkey_change_rx: mpsc::Receiver<String>,
    pub(crate) preview: Option<PreviewServer>,
    pub(crate) menu_ids: TrayMenuIds,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("SnapHook starting");

        let binding = self.config.lock().await.hotkey.binding.clone();
        if let Err(e) = self.register_hotkey(binding).await {
            warn!(error = ?e, "Continuing without a global hotkey");
        }

        if self.config.lock().await.preview.enabled {
            self.start_preview().await;
        }

        // Tray event forwarding via single persistent blocking task.
        //
        // MenuEvent::receiver() returns a crossbeam_channel::Receiver with a
        // blocking recv(). When tray_event_rx is dropped after the loop, the
        // next blocking_send() fails and the task ends.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    if let Err(e) = self.handle_tray_event(event).await {
                        error!(error = ?e, "Failed to handle tray event");
                    }
                }

                Some(binding) = self.hotkey_change_rx.recv() => {
                    if self.handle_command(AppCommand::ChangeHotkey { binding }).await {
                        break;
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    if self.handle_command(cmd).await {
                        break;
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(tray_event_rx);

        self.shutdown().await;

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        info!("SnapHook shut down successfully");

        Ok(())
    }

    /// Returns `true` when the loop should stop.
    async fn handle_command(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::Capture { capture_id } => {
                let pipeline = self.pipeline.clone();
                tokio::spawn(async move {
                    match pipeline.on_trigger(capture_id).await {
                        Ok(_) | Err(AppError::CaptureBusy { .. }) => {}
                        Err(e) => error!(capture_id = %capture_id, error = ?e, "Capture failed"),
                    }
                });
                false
            }
            AppCommand::ChangeHotkey { binding } => {
                if let Err(e) = self.change_hotkey(binding).await {
                    warn!(error = ?e, "Hotkey change failed");
                }
                false
            }
            AppCommand::Shutdown => {
                info!("Shutdown requested");
                true
            }
        }
    }

    /// Callback run on the hotkey dispatcher thread for every press.
    fn hotkey_callback(&self) -> HotkeyCallback {
        let command_tx = self.command_tx.clone();
        Arc::new(move || {
            let capture_id = Uuid::new_v4();
            if let Err(e) = command_tx.try_send(AppCommand::Capture { capture_id }) {
                warn!(capture_id = %capture_id, error = %e, "Dropping hotkey press, app loop unavailable");
            }
        })
    }

    #[instrument(skip(self))]
    async fn register_hotkey(&self, binding: String) -> AppResult<()> {
        let hotkeys = Arc::clone(&self.hotkeys);
        let handler = self.hotkey_callback();

        let spec = tokio::task::spawn_blocking(move || hotkeys.register(&binding, handler))
            .await
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Registration task panicked: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })??;

        self.send_tray(TrayCommand::SetHotkeyLabel(spec.to_string()));

        Ok(())
    }

    /// Swap the hotkey; persist on success, restore the previous binding on
    /// failure.
    #[instrument(skip(self))]
    async fn change_hotkey(&self, binding: String) -> AppResult<()> {
        let previous = self.hotkeys.current();
        let hotkeys = Arc::clone(&self.hotkeys);
        let handler = self.hotkey_callback();

        let result = tokio::task::spawn_blocking(move || hotkeys.change_hotkey(&binding, handler))
            .await
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Hotkey change task panicked: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
            .and_then(|result| result);

        match result {
            Ok(spec) => {
                let canonical = spec.to_string();
                {
                    let mut cfg = self.config.lock().await;
                    cfg.hotkey.binding = canonical.clone();
                    if let Err(e) = cfg.save() {
                        error!(error = ?e, "Failed to persist new hotkey");
                    }
                }
                self.send_tray(TrayCommand::SetHotkeyLabel(canonical.clone()));
                info!(hotkey = %canonical, "Hotkey changed");
                Ok(())
            }
            Err(e) => {
                let Some(previous) = previous else {
                    warn!(error = ?e, "New hotkey rejected, no previous hotkey to restore");
                    return Err(e);
                };
                warn!(error = ?e, previous = %previous, "New hotkey rejected, restoring previous");
                if let Err(restore) = self.register_hotkey(previous.to_string()).await {
                    error!(error = ?restore, "Failed to restore previous hotkey");
                }
                Err(e)
            }
        }
    }

    async fn start_preview(&mut self) {
        if self.preview.is_some() {
            return;
        }

        let port = self.config.lock().await.preview.port;
        let state = PreviewState::new(
            self.pipeline.history().clone(),
            self.pipeline.hub().clone(),
            self.hotkey_change_tx.clone(),
        );

        match PreviewServer::start(state, port).await {
            Ok(server) => {
                info!(url = %server.url(), "Preview server started");
                self.preview = Some(server);
            }
            Err(e) => error!(port, error = ?e, "Failed to start preview server"),
        }
    }

    async fn stop_preview(&mut self) {
        if let Some(server) = self.preview.take() {
            server.shutdown().await;
        }
    }

    async fn shutdown(&mut self) {
        if self.hotkeys.state() != HotkeyLoopState::Idle {
            let hotkeys = Arc::clone(&self.hotkeys);
            if let Err(e) = tokio::task::spawn_blocking(move || hotkeys.unregister()).await {
                warn!(error = ?e, "Hotkey unregister task panicked");
            }
        }

        self.stop_preview().await;

        self.send_tray(TrayCommand::Shutdown);
    }

    fn send_tray(&self, cmd: TrayCommand) {
        if let Err(e) = self.tray_proxy.send_event(cmd) {
            debug!(error = ?e, "Tray event loop closed");
        }
    }

    fn sync_toggles(&self, cfg: &Config) {
        if let Err(e) = cfg.save() {
            error!(error = ?e, "Failed to persist settings");
        }
        self.send_tray(TrayCommand::SetToggles {
            preview: cfg.preview.enabled,
            copy_to_clipboard: cfg.capture.copy_to_clipboard,
            auto_save: cfg.capture.auto_save,
        });
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&mut self, event: MenuEvent) -> AppResult<()> {
        let event_id = &event.id;
        let ids = &self.menu_ids;

        if *event_id == ids.view_preview || *event_id == ids.settings {
            if self.preview.is_none() {
                info!("Preview server is off, not opening browser");
                return Ok(());
            }
            let mut url = self.config.lock().await.preview_url();
            if *event_id == ids.settings {
                url.push_str("/settings");
            }
            let desktop = Arc::clone(self.pipeline.desktop());
            tokio::task::spawn_blocking(move || desktop.open_url(&url))
                .await
                .map_err(|e| AppError::BrowserOpenFailed {
                    reason: format!("Browser task panicked: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })??;
        } else if *event_id == ids.enable_preview {
            let enabled = {
                let mut cfg = self.config.lock().await;
                cfg.preview.enabled = !cfg.preview.enabled;
                self.sync_toggles(&cfg);
                cfg.preview.enabled
            };
            if enabled {
                self.start_preview().await;
            } else {
                self.stop_preview().await;
            }
            info!(enabled, "Preview toggled");
        } else if *event_id == ids.copy_to_clipboard {
            let mut cfg = self.config.lock().await;
            cfg.capture.copy_to_clipboard = !cfg.capture.copy_to_clipboard;
            self.sync_toggles(&cfg);
            info!(enabled = cfg.capture.copy_to_clipboard, "Clipboard copy toggled");
        } else if *event_id == ids.auto_save {
            let mut cfg = self.config.lock().await;
            cfg.capture.auto_save = !cfg.capture.auto_save;
            self.sync_toggles(&cfg);
            info!(enabled = cfg.capture.auto_save, "Auto-save toggled");
        } else if *event_id == ids.quit {
            info!("Quit requested from tray menu");
            self.command_tx
                .send(AppCommand::Shutdown)
                .await
                .map_err(|e| AppError::ChannelSendFailed {
                    message: format!("Failed to send shutdown command: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        Ok(())
    }
}
