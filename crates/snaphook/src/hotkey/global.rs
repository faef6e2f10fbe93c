//! `global-hotkey` backend for macOS and Linux.

use crate::{
    AppError, AppResult,
    hotkey::{
        HotkeyBackend, HotkeyKey, HotkeyModifiers, HotkeySession, HotkeySpec, PumpMessage,
        QuitSignal,
    },
};

use std::panic::Location;

use crossbeam_channel::{Receiver, Sender, bounded, select};
use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use tracing::{debug, warn};

/// Backend over a `GlobalHotKeyManager` owned by the pump thread.
#[derive(Debug, Default)]
pub(crate) struct GlobalHotkeyBackend;

/// Live registration. Unregisters on drop.
pub(crate) struct GlobalSession {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
    events: &'static Receiver<GlobalHotKeyEvent>,
    quit_rx: Receiver<()>,
}

/// Wakes the pump's `select!` through a dedicated channel.
#[derive(Debug)]
pub(crate) struct GlobalQuit {
    quit_tx: Sender<()>,
}

fn to_hotkey(spec: &HotkeySpec) -> HotKey {
    let mods = to_modifiers(spec.modifiers);
    HotKey::new((!mods.is_empty()).then_some(mods), to_code(spec.key))
}

fn to_modifiers(held: HotkeyModifiers) -> Modifiers {
    let mut mods = Modifiers::empty();
    if held.ctrl {
        mods |= Modifiers::CONTROL;
    }
    if held.alt {
        mods |= Modifiers::ALT;
    }
    if held.shift {
        mods |= Modifiers::SHIFT;
    }
    if held.win {
        mods |= Modifiers::SUPER;
    }
    mods
}

fn to_code(key: HotkeyKey) -> Code {
    const LETTERS: [Code; 26] = [
        Code::KeyA, Code::KeyB, Code::KeyC, Code::KeyD, Code::KeyE, Code::KeyF, Code::KeyG,
        Code::KeyH, Code::KeyI, Code::KeyJ, Code::KeyK, Code::KeyL, Code::KeyM, Code::KeyN,
        Code::KeyO, Code::KeyP, Code::KeyQ, Code::KeyR, Code::KeyS, Code::KeyT, Code::KeyU,
        Code::KeyV, Code::KeyW, Code::KeyX, Code::KeyY, Code::KeyZ,
    ];
    const DIGITS: [Code; 10] = [
        Code::Digit0, Code::Digit1, Code::Digit2, Code::Digit3, Code::Digit4,
        Code::Digit5, Code::Digit6, Code::Digit7, Code::Digit8, Code::Digit9,
    ];
    const FUNCTIONS: [Code; 12] = [
        Code::F1, Code::F2, Code::F3, Code::F4, Code::F5, Code::F6,
        Code::F7, Code::F8, Code::F9, Code::F10, Code::F11, Code::F12,
    ];

    // Indices are in range: HotkeySpec only builds A-Z, 0-9 and F1-F12.
    match key {
        HotkeyKey::Letter(c) => LETTERS[usize::from(c as u8 - b'A')],
        HotkeyKey::Digit(d) => DIGITS[usize::from(d)],
        HotkeyKey::Function(n) => FUNCTIONS[usize::from(n - 1)],
        HotkeyKey::PrintScreen => Code::PrintScreen,
        HotkeyKey::Space => Code::Space,
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    type Session = GlobalSession;
    type Quit = GlobalQuit;

    #[track_caller]
    fn open(&self, spec: &HotkeySpec) -> AppResult<(GlobalSession, GlobalQuit)> {
        let manager = GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
            reason: format!("Failed to create manager: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let hotkey = to_hotkey(spec);

        manager
            .register(hotkey)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to register {}: {}", spec, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(hotkey = %spec, hotkey_id = hotkey.id(), "global-hotkey registration succeeded");

        let (quit_tx, quit_rx) = bounded(1);

        Ok((
            GlobalSession {
                manager,
                hotkey,
                events: GlobalHotKeyEvent::receiver(),
                quit_rx,
            },
            GlobalQuit { quit_tx },
        ))
    }
}

impl HotkeySession for GlobalSession {
    fn next_message(&mut self) -> PumpMessage {
        select! {
            recv(self.events) -> event => match event {
                Ok(event) if event.id() == self.hotkey.id() && matches!(event.state(), HotKeyState::Pressed) => {
                    PumpMessage::Pressed
                }
                Ok(_) => PumpMessage::Ignored,
                Err(_) => {
                    warn!("Hotkey event channel closed, stopping pump");
                    PumpMessage::Quit
                }
            },
            recv(self.quit_rx) -> _ => PumpMessage::Quit,
        }
    }
}

impl Drop for GlobalSession {
    fn drop(&mut self) {
        if let Err(e) = self.manager.unregister(self.hotkey) {
            warn!(error = %e, "Failed to unregister global hotkey");
        }
    }
}

impl QuitSignal for GlobalQuit {
    fn post_quit(&self) -> bool {
        self.quit_tx.try_send(()).is_ok()
    }
}
