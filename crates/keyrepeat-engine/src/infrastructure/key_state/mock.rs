//! Scriptable key state for tests.

use std::collections::HashSet;

use keyrepeat_core::KeyCode;
use parking_lot::RwLock;

use crate::application::execute_macro::KeyStateProbe;

/// Key state driven by `press`/`release` calls instead of hardware.
#[derive(Debug, Default)]
pub struct MockKeyState {
    down: RwLock<HashSet<KeyCode>>,
}

impl MockKeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: KeyCode) {
        self.down.write().insert(key);
    }

    pub fn release(&self, key: KeyCode) {
        self.down.write().remove(&key);
    }

    pub fn release_all(&self) {
        self.down.write().clear();
    }
}

impl KeyStateProbe for MockKeyState {
    fn is_down(&self, key: KeyCode) -> bool {
        self.down.read().contains(&key)
    }
}
