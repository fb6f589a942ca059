//! Input injection infrastructure.
//!
//! On Windows, chords are synthesized with a single `SendInput` call so the
//! OS delivers them without interleaving other input.  Every synthesized
//! event carries [`INJECTION_MARKER`] in `dwExtraInfo`.
//!
//! [`mock::MockInjector`] records chords for tests and can loop them back
//! into a [`MockInputSource`](super::input_capture::mock::MockInputSource).

use std::sync::Arc;

use crate::application::execute_macro::{InjectionError, InputInjector};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Tag written to `dwExtraInfo` of every event this engine synthesizes.
///
/// ASCII `"KRPT"`.
pub const INJECTION_MARKER: usize = 0x4B52_5054;

/// Returns the injector for the current platform.
///
/// # Errors
///
/// Returns [`InjectionError::Platform`] where input cannot be synthesized.
pub fn platform_injector() -> Result<Arc<dyn InputInjector>, InjectionError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::SendInputInjector::new()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(InjectionError::Platform(format!(
            "input injection is not supported on {}",
            std::env::consts::OS
        )))
    }
}
