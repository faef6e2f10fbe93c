//! System tray icon and menu.
//!
//! Shows the active hotkey, toggles for preview/clipboard/auto-save, and
//! shortcuts to the viewer, settings page and quit.

use crate::{AppError, AppResult, config::Config};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{info, instrument};
use tray_icon::{
    Icon, TrayIcon, TrayIconBuilder,
    menu::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem},
};

const ICON_SIZE: u32 = 32;

/// Ids of the menu entries the app loop reacts to.
#[derive(Debug, Clone)]
pub struct TrayMenuIds {
    /// Open the viewer in the browser.
    pub view_preview: MenuId,
    /// Toggle the preview server.
    pub enable_preview: MenuId,
    /// Toggle clipboard copy.
    pub copy_to_clipboard: MenuId,
    /// Toggle auto-save.
    pub auto_save: MenuId,
    /// Open the settings page.
    pub settings: MenuId,
    /// Quit the app.
    pub quit: MenuId,
}

/// System tray icon manager. Lives on the main thread.
pub struct TrayManager {
    tray_icon: TrayIcon,
    hotkey_item: MenuItem,
    view_item: MenuItem,
    preview_item: CheckMenuItem,
    clipboard_item: CheckMenuItem,
    auto_save_item: CheckMenuItem,
    ids: TrayMenuIds,
}

#[track_caller]
fn tray_error(what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::ConfigError {
        reason: format!("{}: {}", what, e),
        location: ErrorLocation::from(Location::caller()),
    }
}

impl TrayManager {
    /// Build the tray icon with check marks taken from `config`.
    #[track_caller]
    #[instrument(skip(config))]
    pub fn new(config: &Config) -> AppResult<Self> {
        let menu = Menu::new();

        let hotkey_item = MenuItem::new(hotkey_label(&config.hotkey.binding), false, None);
        let view_item = MenuItem::new("View Preview", config.preview.enabled, None);
        let preview_item = CheckMenuItem::new("Enable Preview", true, config.preview.enabled, None);
        let clipboard_item =
            CheckMenuItem::new("Copy to Clipboard", true, config.capture.copy_to_clipboard, None);
        let auto_save_item = CheckMenuItem::new("Auto-Save", true, config.capture.auto_save, None);
        let settings_item = MenuItem::new("Settings", true, None);
        let quit_item = MenuItem::new("Quit", true, None);

        let ids = TrayMenuIds {
            view_preview: view_item.id().clone(),
            enable_preview: preview_item.id().clone(),
            copy_to_clipboard: clipboard_item.id().clone(),
            auto_save: auto_save_item.id().clone(),
            settings: settings_item.id().clone(),
            quit: quit_item.id().clone(),
        };

        menu.append_items(&[
            &hotkey_item,
            &PredefinedMenuItem::separator(),
            &view_item,
            &preview_item,
            &clipboard_item,
            &auto_save_item,
            &PredefinedMenuItem::separator(),
            &settings_item,
            &quit_item,
        ])
        .map_err(|e| tray_error("Failed to build tray menu", e))?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(tooltip(&config.hotkey.binding))
            .with_menu(Box::new(menu))
            .with_icon(Self::build_icon()?)
            .build()
            .map_err(|e| tray_error("Failed to create tray icon", e))?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            hotkey_item,
            view_item,
            preview_item,
            clipboard_item,
            auto_save_item,
            ids,
        })
    }

    /// Menu ids for event matching on the runtime thread.
    pub fn ids(&self) -> &TrayMenuIds {
        &self.ids
    }

    /// Show `binding` as the active hotkey.
    #[track_caller]
    pub fn set_hotkey_label(&mut self, binding: &str) -> AppResult<()> {
        self.hotkey_item.set_text(hotkey_label(binding));
        self.tray_icon
            .set_tooltip(Some(tooltip(binding)))
            .map_err(|e| tray_error("Failed to update tooltip", e))
    }

    /// Sync check marks with config. "View Preview" is greyed out while the
    /// server is off.
    pub fn set_toggles(&mut self, preview: bool, copy_to_clipboard: bool, auto_save: bool) {
        self.view_item.set_enabled(preview);
        self.preview_item.set_checked(preview);
        self.clipboard_item.set_checked(copy_to_clipboard);
        self.auto_save_item.set_checked(auto_save);
    }

    #[cfg(test)]
    pub(crate) fn view_preview_enabled(&self) -> bool {
        self.view_item.is_enabled()
    }

    /// Draw a simple camera glyph: rounded body with a lens ring.
    #[track_caller]
    fn build_icon() -> AppResult<Icon> {
        let size = ICON_SIZE as i32;
        let center = size / 2;
        let mut rgba = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let (dx, dy) = (x - center, y - center);
                let dist_sq = dx * dx + dy * dy;
                let in_body = (3..size - 3).contains(&x) && (7..size - 5).contains(&y);
                let in_bump = (10..size - 10).contains(&x) && (4..7).contains(&y);

                let pixel = if dist_sq <= 16 {
                    [0x21, 0x96, 0xF3, 0xFF]
                } else if dist_sq <= 49 {
                    [0x1E, 0x1E, 0x1E, 0xFF]
                } else if in_body || in_bump {
                    [0xE0, 0xE0, 0xE0, 0xFF]
                } else {
                    [0, 0, 0, 0]
                };
                rgba.extend_from_slice(&pixel);
            }
        }

        Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE)
            .map_err(|e| tray_error("Failed to create icon from RGBA", e))
    }
}

fn hotkey_label(binding: &str) -> String {
    format!("Hotkey: {}", binding)
}

fn tooltip(binding: &str) -> String {
    format!("SnapHook - {}", binding)
}
