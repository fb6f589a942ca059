//! Storage infrastructure: engine configuration and the macro file.
//!
//! - `config` reads the TOML engine configuration from the platform config
//!   directory, falling back to defaults on first run.
//! - `macros` reads and writes the JSON macro list.

pub mod config;
pub mod macros;
