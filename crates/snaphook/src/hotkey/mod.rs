mod backend;
#[cfg(not(target_os = "windows"))]
mod global;
mod hotkey_loop;
mod spec;
#[cfg(target_os = "windows")]
mod win32;

pub(crate) use {
    backend::{HotkeyBackend, HotkeySession, PumpMessage, QuitSignal},
    hotkey_loop::{HotkeyCallback, HotkeyLoop, HotkeyLoopState},
    spec::{HotkeyKey, HotkeyModifiers, HotkeySpec},
};

/// Backend used by the running application on this platform.
#[cfg(target_os = "windows")]
pub(crate) type PlatformBackend = win32::Win32Backend;

/// Backend used by the running application on this platform.
#[cfg(not(target_os = "windows"))]
pub(crate) type PlatformBackend = global::GlobalHotkeyBackend;
