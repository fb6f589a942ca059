//! Domain entities for the macro engine.
//!
//! Everything here is plain data plus pure rules: no hooks, no threads, no
//! file I/O.  The engine crate builds its listener, dispatcher and executors
//! on top of these types, and the editor reads and writes the same JSON shape.

/// Order-independent set of held keys.
pub mod combo;

/// Macro records and the persisted `AppData` aggregate.
pub mod macros;

/// Focused-window restriction rule.
pub mod scope;
