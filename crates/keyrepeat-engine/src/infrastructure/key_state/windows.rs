//! Hardware key state via `GetAsyncKeyState`.

#![cfg(target_os = "windows")]

use keyrepeat_core::KeyCode;
use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

use crate::application::execute_macro::KeyStateProbe;

/// Most significant bit of `GetAsyncKeyState`: key is currently down.
const KEY_DOWN_BIT: u16 = 0x8000;

/// Reads the physical key state.  Wheel codes are never down.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsyncKeyState;

impl KeyStateProbe for AsyncKeyState {
    fn is_down(&self, key: KeyCode) -> bool {
        let Some(vk) = probe_vk(key) else {
            return false;
        };
        // SAFETY: GetAsyncKeyState has no preconditions and accepts any
        // virtual key value.
        let state = unsafe { GetAsyncKeyState(i32::from(vk)) };
        (state as u16) & KEY_DOWN_BIT != 0
    }
}

/// Virtual key to poll for `key`.  Mouse buttons map to `VK_LBUTTON` and
/// friends; wheel ticks have no state to poll.
fn probe_vk(key: KeyCode) -> Option<u8> {
    match key {
        KeyCode::MOUSE_LEFT => Some(0x01),
        KeyCode::MOUSE_RIGHT => Some(0x02),
        KeyCode::MOUSE_MIDDLE => Some(0x04),
        KeyCode::MOUSE_X1 => Some(0x05),
        KeyCode::MOUSE_X2 => Some(0x06),
        other if other.is_mouse() => None,
        other => other.as_vk(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_buttons_map_to_button_vks() {
        assert_eq!(probe_vk(KeyCode::MOUSE_LEFT), Some(0x01));
        assert_eq!(probe_vk(KeyCode::MOUSE_X2), Some(0x06));
    }

    #[test]
    fn test_wheel_has_no_probe() {
        assert_eq!(probe_vk(KeyCode::WHEEL_UP), None);
        assert!(!AsyncKeyState.is_down(KeyCode::WHEEL_DOWN));
    }

    #[test]
    fn test_keyboard_keys_probe_their_own_vk() {
        assert_eq!(probe_vk(KeyCode::LEFT_CTRL), Some(0xA2));
    }
}
