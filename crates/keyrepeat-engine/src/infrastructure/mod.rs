//! Infrastructure layer for the hotkey engine.
//!
//! Contains the OS-facing adapters: low-level input hooks, `SendInput`
//! injection, hardware key state, foreground-window queries, file storage,
//! and the UI command bridge.  Each OS adapter has a `mock` sibling used by
//! tests and a `platform_*` constructor that picks the right one at compile
//! time.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keyrepeat_core`, but MUST NOT be imported by the `application` layer
//! outside of tests.

pub mod input_capture;
pub mod input_injection;
pub mod key_state;
pub mod storage;
pub mod ui_bridge;
pub mod window_info;
