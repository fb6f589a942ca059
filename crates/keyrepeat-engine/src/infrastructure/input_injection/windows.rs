//! Windows input injection via the SendInput API.
//!
//! A chord becomes one `INPUT` array: every key down in order, then every key
//! up in reverse order.  Submitting the whole array in one call keeps other
//! input from landing between the presses.  Wheel codes produce a single
//! ±`WHEEL_DELTA` tick and no release.

#![cfg(target_os = "windows")]

use keyrepeat_core::KeyCode;
use tracing::trace;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
    MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEEVENTF_WHEEL, MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP, MOUSEINPUT, MOUSE_EVENT_FLAGS,
    VIRTUAL_KEY,
};

use super::INJECTION_MARKER;
use crate::application::execute_macro::{InjectionError, InputInjector};

/// One notch of the wheel.
const WHEEL_DELTA: i32 = 120;

/// Virtual keys that need `KEYEVENTF_EXTENDEDKEY`.
const EXTENDED_VKS: &[u8] = &[
    0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, // nav
    0x2D, 0x2E, // Insert, Delete
    0x5B, 0x5C, 0x5D, // Win keys, Apps
    0x6F, // Numpad divide
    0x90, // NumLock
    0xA3, 0xA5, // Right Ctrl, Right Alt
];

/// [`InputInjector`] backed by `SendInput`.
#[derive(Debug, Default)]
pub struct SendInputInjector;

impl SendInputInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for SendInputInjector {
    fn press_chord(&self, keys: &[KeyCode]) -> Result<(), InjectionError> {
        let inputs = build_chord(keys)?;
        if inputs.is_empty() {
            return Ok(());
        }

        // SAFETY: every element of `inputs` is a fully initialised INPUT and
        // the size argument matches the element type.
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if (sent as usize) < inputs.len() {
            return Err(InjectionError::Platform(format!(
                "SendInput accepted {sent} of {} events: {}",
                inputs.len(),
                std::io::Error::last_os_error()
            )));
        }
        trace!(events = inputs.len(), "chord injected");
        Ok(())
    }
}

/// Builds the down-then-reverse-up event array for `keys`.
fn build_chord(keys: &[KeyCode]) -> Result<Vec<INPUT>, InjectionError> {
    let mut downs = Vec::with_capacity(keys.len());
    let mut ups = Vec::with_capacity(keys.len());

    for &key in keys {
        if let Some(vk) = key.as_vk() {
            downs.push(keyboard_input(vk, false));
            ups.push(keyboard_input(vk, true));
            continue;
        }
        match key {
            KeyCode::WHEEL_UP => downs.push(mouse_input(MOUSEEVENTF_WHEEL, WHEEL_DELTA as u32)),
            KeyCode::WHEEL_DOWN => downs.push(mouse_input(MOUSEEVENTF_WHEEL, (-WHEEL_DELTA) as u32)),
            _ => {
                let (down, up, data) = mouse_button_flags(key)?;
                downs.push(mouse_input(down, data));
                ups.push(mouse_input(up, data));
            }
        }
    }

    ups.reverse();
    downs.extend(ups);
    Ok(downs)
}

fn mouse_button_flags(
    key: KeyCode,
) -> Result<(MOUSE_EVENT_FLAGS, MOUSE_EVENT_FLAGS, u32), InjectionError> {
    match key {
        KeyCode::MOUSE_LEFT => Ok((MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, 0)),
        KeyCode::MOUSE_RIGHT => Ok((MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, 0)),
        KeyCode::MOUSE_MIDDLE => Ok((MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, 0)),
        KeyCode::MOUSE_X1 => Ok((MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP, 1)),
        KeyCode::MOUSE_X2 => Ok((MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP, 2)),
        other => Err(InjectionError::UnsupportedKey(other)),
    }
}

fn keyboard_input(vk: u8, key_up: bool) -> INPUT {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if key_up {
        flags |= KEYEVENTF_KEYUP;
    }
    if EXTENDED_VKS.contains(&vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }

    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(u16::from(vk)),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: INJECTION_MARKER,
            },
        },
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS, mouse_data: u32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: mouse_data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: INJECTION_MARKER,
            },
        },
    }
}
