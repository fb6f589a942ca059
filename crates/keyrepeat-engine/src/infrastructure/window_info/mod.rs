//! Focused-window queries used for macro window scopes.

use std::sync::Arc;

use keyrepeat_core::FocusedWindow;

use crate::application::dispatch_macros::FocusedWindowProvider;

#[cfg(target_os = "windows")]
pub mod windows;

/// Provider that never knows the focused window.
///
/// Scoped macros never fire under it; unscoped ones always do.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownWindowProvider;

impl FocusedWindowProvider for UnknownWindowProvider {
    fn focused_window(&self) -> FocusedWindow {
        FocusedWindow::default()
    }
}

/// Returns the focused-window provider for the current platform.
pub fn platform_window_provider() -> Arc<dyn FocusedWindowProvider> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::ForegroundWindowProvider)
    }

    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(UnknownWindowProvider)
    }
}
