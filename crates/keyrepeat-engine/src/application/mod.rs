//! Application layer use cases for the hotkey engine.
//!
//! Use cases in this layer orchestrate domain objects from `keyrepeat_core`
//! and depend only on traits (`InputSource`, `InputInjector`,
//! `KeyStateProbe`, `FocusedWindowProvider`).  The OS adapters implementing
//! those traits live in `infrastructure`.
//!
//! # Sub-modules
//!
//! - **`track_keys`**      – folds raw key events into the set of keys
//!   currently held.
//! - **`listen_hotkeys`**  – runs the tracker on a dedicated thread fed by an
//!   input source and emits a combo on every change.  This runs on every
//!   keystroke and must never block on macro execution.
//! - **`capture_combo`**   – capture mode used by the editor to record an
//!   activation combo.
//! - **`dispatch_macros`** – matches combos against the macro list, applies
//!   the window scope and starts executions.
//! - **`registry`**        – per-macro execution state (sequence in flight,
//!   toggle running, hold workers alive).
//! - **`execute_macro`**   – the sequence, toggle and hold strategies.
//! - **`engine`**          – facade owning the whole pipeline.

pub mod capture_combo;
pub mod dispatch_macros;
pub mod engine;
pub mod execute_macro;
pub mod listen_hotkeys;
pub mod registry;
pub mod track_keys;
