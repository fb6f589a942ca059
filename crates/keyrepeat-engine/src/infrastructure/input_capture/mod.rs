//! Input capture infrastructure.
//!
//! On Windows, this installs low-level keyboard and mouse hooks (WH_KEYBOARD_LL,
//! WH_MOUSE_LL) on a dedicated Win32 message loop thread.  Raw events are
//! placed into a channel and consumed by the listener thread.
//!
//! # Windows-Specific Implementation
//!
//! The hook callbacks must complete within ~300ms or Windows will remove the hook.
//! All processing is deferred out of the callback via an `mpsc` channel.
//!
//! # Testability
//!
//! [`mock::MockInputSource`] implements the same `InputSource` trait and lets
//! tests inject synthetic events without OS hooks.

use std::sync::Arc;

use crate::application::listen_hotkeys::{CaptureError, InputSource};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Returns the input source for the current platform.
///
/// # Errors
///
/// Returns [`CaptureError::UnsupportedPlatform`] on platforms without a hook
/// implementation.
pub fn platform_input_source() -> Result<Arc<dyn InputSource>, CaptureError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsInputSource::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(CaptureError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}
