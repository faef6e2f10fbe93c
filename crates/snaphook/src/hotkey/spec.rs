//! Parsing and canonical rendering of hotkey strings such as `Ctrl+Shift+S`.

use crate::{AppError, AppResult};

use std::{fmt, panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Modifier keys held together with the main key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) struct HotkeyModifiers {
    pub(crate) ctrl: bool,
    pub(crate) alt: bool,
    pub(crate) shift: bool,
    pub(crate) win: bool,
}

/// The single non-modifier key of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum HotkeyKey {
    /// `A`-`Z`, stored uppercase.
    Letter(char),
    /// `0`-`9`.
    Digit(u8),
    /// `F1`-`F12`.
    Function(u8),
    PrintScreen,
    Space,
}

/// A parsed global hotkey binding.
///
/// Immutable once built; switching bindings goes through a full
/// unregister/register cycle on the hotkey loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HotkeySpec {
    pub(crate) modifiers: HotkeyModifiers,
    pub(crate) key: HotkeyKey,
}

impl HotkeySpec {
    /// Parse a `+`-separated, case-insensitive hotkey string.
    #[track_caller]
    pub(crate) fn parse(input: &str) -> AppResult<Self> {
        let location = Location::caller();
        let reject = |reason: String| AppError::UnsupportedHotkey {
            input: input.to_string(),
            reason,
            location: ErrorLocation::from(location),
        };

        let mut modifiers = HotkeyModifiers::default();
        let mut key = None;

        for raw in input.split('+') {
            let token = raw.trim();
            if token.is_empty() {
                return Err(reject("empty key token".to_string()));
            }

            let upper = token.to_ascii_uppercase();
            let modifier = match upper.as_str() {
                "CTRL" | "CONTROL" => Some(&mut modifiers.ctrl),
                "ALT" => Some(&mut modifiers.alt),
                "SHIFT" => Some(&mut modifiers.shift),
                "WIN" | "SUPER" | "CMD" | "META" => Some(&mut modifiers.win),
                _ => None,
            };

            if let Some(flag) = modifier {
                if *flag {
                    return Err(reject(format!("modifier '{token}' given twice")));
                }
                *flag = true;
                continue;
            }

            let parsed = parse_key(&upper).ok_or_else(|| reject(format!("unknown key '{token}'")))?;
            if key.replace(parsed).is_some() {
                return Err(reject("more than one non-modifier key".to_string()));
            }
        }

        let key = key.ok_or_else(|| reject("no key given".to_string()))?;

        Ok(Self { modifiers, key })
    }
}

fn parse_key(upper: &str) -> Option<HotkeyKey> {
    match upper {
        "PRINTSCREEN" | "PRTSC" => return Some(HotkeyKey::PrintScreen),
        "SPACE" => return Some(HotkeyKey::Space),
        _ => {}
    }

    let mut chars = upper.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => return Some(HotkeyKey::Letter(c)),
        (Some(c), None) if c.is_ascii_digit() => {
            return c.to_digit(10).map(|d| HotkeyKey::Digit(d as u8));
        }
        _ => {}
    }

    upper
        .strip_prefix('F')
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=12).contains(n))
        .map(HotkeyKey::Function)
}

impl FromStr for HotkeySpec {
    type Err = AppError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HotkeyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyKey::Letter(c) => write!(f, "{c}"),
            HotkeyKey::Digit(d) => write!(f, "{d}"),
            HotkeyKey::Function(n) => write!(f, "F{n}"),
            HotkeyKey::PrintScreen => f.write_str("PrintScreen"),
            HotkeyKey::Space => f.write_str("Space"),
        }
    }
}

impl fmt::Display for HotkeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        let names = [(m.ctrl, "Ctrl"), (m.alt, "Alt"), (m.shift, "Shift"), (m.win, "Win")];
        for (_, name) in names.iter().filter(|(held, _)| *held) {
            write!(f, "{name}+")?;
        }
        write!(f, "{}", self.key)
    }
}
