//! SnapHook: global-hotkey screenshots with a live browser preview.

mod app;
mod app_command;
mod capture_pipeline;
mod config;
mod desktop;
mod error;
mod hotkey;
mod screen_capture;
mod tray_command;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    capture_pipeline::CapturePipeline,
    error::{AppError, Result as AppResult},
    tray_command::TrayCommand,
    tray_manager::{TrayManager, TrayMenuIds},
};

use crate::{
    app::HOTKEY_CHANGE_CAPACITY,
    config::Config,
    desktop::SystemDesktop,
    hotkey::{HotkeyLoop, PlatformBackend},
    screen_capture::{TEMP_FILE_MAX_AGE, XcapGrabber, cleanup_old_temp_files},
};

use snaphook_core::{BroadcastHub, HistoryStore};

use std::sync::Arc;

use tao::{
    event::{Event, StartCause},
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy},
};
use tokio::sync::{Mutex, mpsc};
use tracing::{error, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "snaphook=debug,snaphook_core=debug";

/// Stdout plus a daily log file under the project data directory.
///
/// The returned guard flushes the file writer and must live as long as the
/// process.
fn init_tracing() -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let log_dir = Config::project_dirs()
        .ok()
        .map(|dirs| dirs.data_dir().join("logs"))
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(&dir, "snaphook.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Build the app and run it on a dedicated tokio runtime thread.
fn spawn_runtime(config: Config, menu_ids: TrayMenuIds, tray_proxy: EventLoopProxy<TrayCommand>) {
    let desktop = match SystemDesktop::new() {
        Ok(desktop) => desktop,
        Err(e) => {
            error!("Failed to initialize desktop integration: {:?}", e);
            std::process::exit(1);
        }
    };

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime: {:?}", e);
                std::process::exit(1);
            }
        };

        rt.block_on(async move {
            let config = Arc::new(Mutex::new(config));
            let (command_tx, command_rx) = mpsc::channel(32);
            let (hotkey_change_tx, hotkey_change_rx) = mpsc::channel(HOTKEY_CHANGE_CAPACITY);

            let pipeline = CapturePipeline::new(
                HistoryStore::new(),
                BroadcastHub::new(),
                XcapGrabber::new(),
                desktop,
                Arc::clone(&config),
            );

            let app = App {
                pipeline,
                hotkeys: Arc::new(HotkeyLoop::new(PlatformBackend::default())),
                tray_proxy,
                config,
                command_tx,
                command_rx,
                hotkey_change_tx,
                hotkey_change_rx,
                preview: None,
                menu_ids,
            };

            if let Err(e) = app.run().await {
                error!(error = ?e, "App error");
            }
        });
    });
}

/// Application entry point.
fn main() {
    let log_guard = init_tracing();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = ?e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    cleanup_old_temp_files(&std::env::temp_dir(), TEMP_FILE_MAX_AGE);

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    // It is created once the event loop has started, as tray-icon requires on macOS.
    let mut tray_manager: Option<TrayManager> = None;
    let mut startup_config = Some(config);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                let Some(config) = startup_config.take() else {
                    return;
                };

                let manager = match TrayManager::new(&config) {
                    Ok(tm) => tm,
                    Err(e) => {
                        error!("Failed to create TrayManager: {:?}", e);
                        std::process::exit(1);
                    }
                };
                let menu_ids = manager.ids().clone();
                tray_manager = Some(manager);

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                spawn_runtime(config, menu_ids, tray_proxy.clone());
            }
            Event::UserEvent(cmd) => match cmd {
                TrayCommand::SetHotkeyLabel(binding) => {
                    if let Some(tm) = tray_manager.as_mut() {
                        if let Err(e) = tm.set_hotkey_label(&binding) {
                            error!(error = ?e, "Failed to update tray hotkey label");
                        }
                    }
                }
                TrayCommand::SetToggles {
                    preview,
                    copy_to_clipboard,
                    auto_save,
                } => {
                    if let Some(tm) = tray_manager.as_mut() {
                        tm.set_toggles(preview, copy_to_clipboard, auto_save);
                    }
                }
                TrayCommand::Shutdown => {
                    *control_flow = ControlFlow::ExitWithCode(0);
                }
            },
            _ => {}
        }

        // Keep the log writer alive in the closure for the app's lifetime.
        let _ = &log_guard;
    });
}
