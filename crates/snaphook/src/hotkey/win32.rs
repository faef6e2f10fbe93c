//! `RegisterHotKey` backend with a thread-local message pump.

use crate::{
    AppError, AppResult,
    hotkey::{
        HotkeyBackend, HotkeyKey, HotkeyModifiers, HotkeySession, HotkeySpec, PumpMessage,
        QuitSignal,
    },
};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{debug, warn};
use windows::Win32::{
    Foundation::{HWND, LPARAM, WPARAM},
    System::Threading::GetCurrentThreadId,
    UI::{
        Input::KeyboardAndMouse::{
            HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT, MOD_WIN,
            RegisterHotKey, UnregisterHotKey, VK_F1, VK_SNAPSHOT, VK_SPACE,
        },
        WindowsAndMessaging::{
            GetMessageW, MSG, PM_NOREMOVE, PeekMessageW, PostThreadMessageW, WM_HOTKEY, WM_QUIT,
            WM_USER,
        },
    },
};

/// Hotkey id used for the single registration on the pump thread.
const HOTKEY_ID: i32 = 1;

/// Win32 backend: thread-scoped registration, no window.
#[derive(Debug, Default)]
pub(crate) struct Win32Backend;

/// Registration owned by the pump thread. Unregisters on drop.
pub(crate) struct Win32Session {
    id: i32,
}

/// Posts `WM_QUIT` into the pump thread's queue.
#[derive(Debug)]
pub(crate) struct Win32Quit {
    thread_id: u32,
}

fn modifiers(held: HotkeyModifiers) -> HOT_KEY_MODIFIERS {
    let mut mods = MOD_NOREPEAT;
    if held.ctrl {
        mods = mods | MOD_CONTROL;
    }
    if held.alt {
        mods = mods | MOD_ALT;
    }
    if held.shift {
        mods = mods | MOD_SHIFT;
    }
    if held.win {
        mods = mods | MOD_WIN;
    }
    mods
}

fn virtual_key(key: HotkeyKey) -> u32 {
    match key {
        // Letters and digits share their ASCII codes with their virtual keys.
        HotkeyKey::Letter(c) => c as u32,
        HotkeyKey::Digit(d) => u32::from(b'0' + d),
        HotkeyKey::Function(n) => u32::from(VK_F1.0) + u32::from(n - 1),
        HotkeyKey::PrintScreen => u32::from(VK_SNAPSHOT.0),
        HotkeyKey::Space => u32::from(VK_SPACE.0),
    }
}

impl HotkeyBackend for Win32Backend {
    type Session = Win32Session;
    type Quit = Win32Quit;

    #[track_caller]
    fn open(&self, spec: &HotkeySpec) -> AppResult<(Win32Session, Win32Quit)> {
        let mut msg = MSG::default();

        // SAFETY: plain Win32 calls on the current thread. The peek forces the
        // thread message queue into existence so PostThreadMessageW can reach
        // it before the first GetMessageW.
        let (registered, thread_id) = unsafe {
            let _ = PeekMessageW(&mut msg, HWND(0), WM_USER, WM_USER, PM_NOREMOVE);
            (
                RegisterHotKey(HWND(0), HOTKEY_ID, modifiers(spec.modifiers), virtual_key(spec.key)),
                GetCurrentThreadId(),
            )
        };

        registered.map_err(|e| AppError::HotkeyRegistrationFailed {
            reason: format!("RegisterHotKey({spec}) failed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(hotkey = %spec, thread_id, "RegisterHotKey succeeded");

        Ok((Win32Session { id: HOTKEY_ID }, Win32Quit { thread_id }))
    }
}

impl HotkeySession for Win32Session {
    fn next_message(&mut self) -> PumpMessage {
        let mut msg = MSG::default();

        // SAFETY: `msg` is a valid out-pointer for the duration of the call.
        let ret = unsafe { GetMessageW(&mut msg, HWND(0), 0, 0) };

        match ret.0 {
            0 => PumpMessage::Quit,
            -1 => {
                warn!("GetMessageW failed, stopping hotkey pump");
                PumpMessage::Quit
            }
            _ if msg.message == WM_HOTKEY && msg.wParam.0 == self.id as usize => {
                PumpMessage::Pressed
            }
            _ => PumpMessage::Ignored,
        }
    }
}

impl Drop for Win32Session {
    fn drop(&mut self) {
        // SAFETY: runs on the pump thread that registered `self.id`.
        if let Err(e) = unsafe { UnregisterHotKey(HWND(0), self.id) } {
            warn!(error = %e, "UnregisterHotKey failed");
        }
    }
}

impl QuitSignal for Win32Quit {
    fn post_quit(&self) -> bool {
        // SAFETY: posting to a thread id is sound even if the thread is gone.
        unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }.is_ok()
    }
}
