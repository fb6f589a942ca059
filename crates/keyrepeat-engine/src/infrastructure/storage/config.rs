//! TOML-based engine configuration.
//!
//! Reads `EngineConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\keyrepeat\config.toml`
//! - Linux:    `~/.config/keyrepeat/config.toml`
//! - macOS:    `~/Library/Application Support/keyrepeat/config.toml`
//!
//! ```toml
//! [engine]
//! log_level = "debug"
//! hold_workers = 4
//! hold_poll_interval_ms = 10
//!
//! [storage]
//! data_file = "data.json"
//! ```
//!
//! Every field is optional; `#[serde(default = "...")]` fills in anything the
//! file leaves out, and a missing file yields [`EngineConfig::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::engine::EngineSettings;
use crate::application::execute_macro::ExecutionSettings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub storage: StorageSection,
}

/// Listener and execution tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSection {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Redundant workers per hold macro.
    #[serde(default = "default_hold_workers")]
    pub hold_workers: usize,
    #[serde(default = "default_hold_poll_interval_ms")]
    pub hold_poll_interval_ms: u64,
    #[serde(default = "default_toggle_pass_pause_ms")]
    pub toggle_pass_pause_ms: u64,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Executable name of this program; macros never fire into it.
    #[serde(default = "default_own_process_name")]
    pub own_process_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSection {
    /// Macro file.  Relative paths resolve against the config directory.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_hold_workers() -> usize {
    4
}
fn default_hold_poll_interval_ms() -> u64 {
    10
}
fn default_toggle_pass_pause_ms() -> u64 {
    50
}
fn default_shutdown_grace_ms() -> u64 {
    100
}
fn default_own_process_name() -> String {
    "keyrepeat.exe".to_string()
}
fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            hold_workers: default_hold_workers(),
            hold_poll_interval_ms: default_hold_poll_interval_ms(),
            toggle_pass_pause_ms: default_toggle_pass_pause_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            own_process_name: default_own_process_name(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

impl EngineConfig {
    /// Converts the `[engine]` section into runtime settings.
    ///
    /// A worker count of zero is raised to one.
    pub fn engine_settings(&self) -> EngineSettings {
        let e = &self.engine;
        EngineSettings {
            execution: ExecutionSettings {
                hold_workers: e.hold_workers.max(1),
                hold_poll_interval: Duration::from_millis(e.hold_poll_interval_ms),
                toggle_pass_pause: Duration::from_millis(e.toggle_pass_pause_ms),
            },
            own_process: e.own_process_name.clone(),
            shutdown_grace: Duration::from_millis(e.shutdown_grace_ms),
        }
    }

    /// Resolves the macro file, anchoring a relative `data_file` at `base`.
    pub fn data_path(&self, base: &Path) -> PathBuf {
        if self.storage.data_file.is_absolute() {
            self.storage.data_file.clone()
        } else {
            base.join(&self.storage.data_file)
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Platform directory holding `config.toml` and, by default, the macro file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `EngineConfig` from `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EngineConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &EngineConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `keyrepeat` leaf.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("keyrepeat"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keyrepeat"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("keyrepeat")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
