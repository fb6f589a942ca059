//! Physical key state queries used by hold macros.

use std::sync::Arc;

use crate::application::execute_macro::KeyStateProbe;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Returns the key state probe for the current platform.
///
/// Off Windows this is a probe that reports every key as released, so hold
/// macros run zero passes.
pub fn platform_key_state() -> Arc<dyn KeyStateProbe> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::AsyncKeyState)
    }

    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(mock::MockKeyState::new())
    }
}
