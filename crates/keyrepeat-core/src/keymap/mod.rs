//! Key code space shared by the listener, the matcher, and the injector.
//!
//! A [`KeyCode`] is a Windows Virtual Key code for keyboard keys.  Mouse
//! buttons and wheel ticks live in the same integer space: they use the
//! button-down window message id, with the high 16 bits selecting the
//! X button or the wheel direction.
//!
//! | Input        | KeyCode                    |
//! |--------------|----------------------------|
//! | Letter A     | `0x41`                     |
//! | Left Ctrl    | `0xA2`                     |
//! | Left mouse   | `0x0201`                   |
//! | X button 2   | `0x020B \| (2 << 16)`      |
//! | Wheel up     | `0x020A \| 0x10000`        |
//!
//! Because every code is a plain integer, combos can be stored, compared
//! and persisted without knowing what kind of device produced them.

pub mod windows_vk;

use std::fmt;

use serde::{Deserialize, Serialize};

/// `WM_LBUTTONDOWN`.
const MSG_LBUTTONDOWN: u32 = 0x0201;
/// `WM_RBUTTONDOWN`.
const MSG_RBUTTONDOWN: u32 = 0x0204;
/// `WM_MBUTTONDOWN`.
const MSG_MBUTTONDOWN: u32 = 0x0207;
/// `WM_MOUSEWHEEL`.
const MSG_MOUSEWHEEL: u32 = 0x020A;
/// `WM_XBUTTONDOWN`.
const MSG_XBUTTONDOWN: u32 = 0x020B;

/// High-bit flag marking a wheel tick away from the user.
const WHEEL_UP_FLAG: u32 = 0x1_0000;
/// High-bit flag marking a wheel tick toward the user.
const WHEEL_DOWN_FLAG: u32 = 0x2_0000;

/// Identifier for a physical key or a mouse pseudo-key.
///
/// Opaque beyond equality and ordering; see the module docs for the encoding.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const BACKSPACE: KeyCode = KeyCode(0x08);
    pub const TAB: KeyCode = KeyCode(0x09);
    pub const ENTER: KeyCode = KeyCode(0x0D);
    pub const SHIFT: KeyCode = KeyCode(0x10);
    pub const CTRL: KeyCode = KeyCode(0x11);
    pub const ALT: KeyCode = KeyCode(0x12);
    pub const ESCAPE: KeyCode = KeyCode(0x1B);
    pub const SPACE: KeyCode = KeyCode(0x20);
    pub const LEFT_SHIFT: KeyCode = KeyCode(0xA0);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(0xA1);
    pub const LEFT_CTRL: KeyCode = KeyCode(0xA2);
    pub const RIGHT_CTRL: KeyCode = KeyCode(0xA3);
    pub const LEFT_ALT: KeyCode = KeyCode(0xA4);
    pub const RIGHT_ALT: KeyCode = KeyCode(0xA5);
    pub const F1: KeyCode = KeyCode(0x70);
    pub const F12: KeyCode = KeyCode(0x7B);

    pub const MOUSE_LEFT: KeyCode = KeyCode(MSG_LBUTTONDOWN);
    pub const MOUSE_RIGHT: KeyCode = KeyCode(MSG_RBUTTONDOWN);
    pub const MOUSE_MIDDLE: KeyCode = KeyCode(MSG_MBUTTONDOWN);
    pub const MOUSE_X1: KeyCode = KeyCode(MSG_XBUTTONDOWN | (1 << 16));
    pub const MOUSE_X2: KeyCode = KeyCode(MSG_XBUTTONDOWN | (2 << 16));
    pub const WHEEL_UP: KeyCode = KeyCode(MSG_MOUSEWHEEL | WHEEL_UP_FLAG);
    pub const WHEEL_DOWN: KeyCode = KeyCode(MSG_MOUSEWHEEL | WHEEL_DOWN_FLAG);

    /// Builds the code for an ASCII letter or digit key (`'a'`..`'z'`, `'0'`..`'9'`).
    ///
    /// Returns `None` for any other character.
    pub fn from_char(c: char) -> Option<KeyCode> {
        match c {
            'a'..='z' | 'A'..='Z' => Some(KeyCode(c.to_ascii_uppercase() as u32)),
            '0'..='9' => Some(KeyCode(c as u32)),
            _ => None,
        }
    }

    /// Builds the code for an X button (`1` or `2`) as reported in the high
    /// word of the hook's `mouseData`.
    pub fn x_button(index: u16) -> KeyCode {
        KeyCode(MSG_XBUTTONDOWN | (u32::from(index) << 16))
    }

    /// Builds the wheel code for a signed wheel delta.
    pub fn wheel(delta: i16) -> KeyCode {
        if delta > 0 {
            Self::WHEEL_UP
        } else {
            Self::WHEEL_DOWN
        }
    }

    /// Returns the Windows Virtual Key code if this is a keyboard key.
    pub fn as_vk(self) -> Option<u8> {
        if self.0 > 0 && self.0 <= 0xFE {
            Some(self.0 as u8)
        } else {
            None
        }
    }

    /// `true` for mouse buttons and wheel ticks.
    pub fn is_mouse(self) -> bool {
        matches!(
            self.0 & 0xFFFF,
            MSG_LBUTTONDOWN | MSG_RBUTTONDOWN | MSG_MBUTTONDOWN | MSG_MOUSEWHEEL | MSG_XBUTTONDOWN
        ) && self.0 > 0xFF
    }

    /// `true` for Shift, Ctrl and Alt in both their generic and sided forms.
    pub fn is_modifier(self) -> bool {
        windows_vk::modifier_group(self.0).is_some()
    }

    /// Human-readable label, e.g. `"CTRL"`, `"A"`, `"WHEEL UP"`.
    ///
    /// Sided modifiers collapse to their base name; unmapped codes render as
    /// `"Unknown (n)"`.
    pub fn name(self) -> String {
        if let Some(group) = windows_vk::modifier_group(self.0) {
            return group.to_string();
        }
        if let Some(name) = self.as_vk().and_then(windows_vk::vk_name) {
            return name.to_string();
        }
        match self {
            Self::MOUSE_LEFT => "LEFT MOUSE".to_string(),
            Self::MOUSE_RIGHT => "RIGHT MOUSE".to_string(),
            Self::MOUSE_MIDDLE => "MIDDLE MOUSE".to_string(),
            Self::MOUSE_X1 => "XBUTTON1".to_string(),
            Self::MOUSE_X2 => "XBUTTON2".to_string(),
            Self::WHEEL_UP => "WHEEL UP".to_string(),
            Self::WHEEL_DOWN => "WHEEL DOWN".to_string(),
            other => format!("Unknown ({})", other.0),
        }
    }
}

impl fmt::Debug for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyCode(0x{:X})", self.0)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<u32> for KeyCode {
    fn from(raw: u32) -> Self {
        KeyCode(raw)
    }
}

impl From<u8> for KeyCode {
    fn from(vk: u8) -> Self {
        KeyCode(u32::from(vk))
    }
}
