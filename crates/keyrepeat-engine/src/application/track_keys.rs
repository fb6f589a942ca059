//! PressedKeyTracker: turns raw hook events into combo-changed notifications.
//!
//! The tracker owns the authoritative set of physically held keys.  It is
//! driven by exactly one thread (the listener thread), so it needs no locking
//! of its own.

use keyrepeat_core::{KeyCode, KeyCombo};
use tracing::trace;

use super::listen_hotkeys::RawInputEvent;

/// Maintains the pressed-key set and decides which events produce a combo.
#[derive(Debug, Default)]
pub struct PressedKeyTracker {
    pressed: KeyCombo,
}

impl PressedKeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one raw event and returns the combo to deliver, if any.
    ///
    /// - Injected events are dropped without touching the pressed set.
    /// - A key-down for a key that is already held (OS auto-repeat) yields
    ///   nothing.
    /// - A key-up always removes the key and yields the remaining set, which
    ///   may be empty.
    /// - Mouse buttons and wheel ticks yield a single-key combo and leave the
    ///   pressed set unchanged.
    pub fn apply(&mut self, event: &RawInputEvent) -> Option<KeyCombo> {
        if event.is_injected() {
            trace!(?event, "ignoring injected event");
            return None;
        }

        match *event {
            RawInputEvent::KeyDown { vk_code, .. } => {
                if self.pressed.insert(KeyCode::from(vk_code)) {
                    Some(self.pressed.clone())
                } else {
                    None
                }
            }
            RawInputEvent::KeyUp { vk_code, .. } => {
                self.pressed.remove(KeyCode::from(vk_code));
                Some(self.pressed.clone())
            }
            RawInputEvent::MouseButtonDown { button, .. } => {
                Some(KeyCombo::single(button.key_code()))
            }
            RawInputEvent::MouseWheel { delta, .. } => Some(KeyCombo::single(KeyCode::wheel(delta))),
        }
    }

    /// Returns a copy of the currently held keys.
    pub fn snapshot(&self) -> KeyCombo {
        self.pressed.clone()
    }

    /// Forgets every held key.
    pub fn clear(&mut self) {
        self.pressed = KeyCombo::new();
    }
}
