//! # keyrepeat-core
//!
//! Shared library for the keyrepeat hotkey macro engine containing the key
//! code space, the `KeyCombo` set type, macro records, and the window-scope
//! rule.
//!
//! It has zero dependencies on OS APIs, threads, or the file system, so every
//! rule here can be unit-tested on any platform.
//!
//! # Architecture overview
//!
//! - **`keymap`** – the integer key code space.  Keyboard keys are Windows
//!   virtual-key codes; mouse buttons and wheel ticks are folded into the same
//!   space so a combo can mix both.
//!
//! - **`domain`** – `KeyCombo`, `Macro`, `MacroKind`, `AppData`, and the
//!   `scope_allows` rule that decides whether a macro may fire in the
//!   focused window.

pub mod domain;
pub mod keymap;

pub use domain::combo::KeyCombo;
pub use domain::macros::{AppData, Macro, MacroAction, MacroId, MacroKind, UnknownMacroKind};
pub use domain::scope::{scope_allows, FocusedWindow};
pub use keymap::KeyCode;
