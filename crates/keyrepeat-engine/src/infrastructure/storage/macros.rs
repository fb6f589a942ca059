//! JSON persistence of the macro list.
//!
//! The file holds one [`AppData`] document.  A missing file is the first-run
//! state and reads as an empty list; anything else that stops the file from
//! loading is an error, because silently starting with no macros would
//! overwrite the user's data on the next save.

use std::path::{Path, PathBuf};

use keyrepeat_core::AppData;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error accessing macros at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse macros at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize macros: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads the macro list from `path`.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] for any failure other than a missing
/// file, and [`PersistenceError::Parse`] for malformed JSON or an unknown
/// macro type tag.
pub fn read_macros(path: &Path) -> Result<AppData, PersistenceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no macro file yet; starting empty");
            return Ok(AppData::default());
        }
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let data: AppData = serde_json::from_str(&content).map_err(|source| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), macros = data.macros.len(), "macros loaded");
    Ok(data)
}

/// Overwrites `path` with `data` as pretty-printed JSON, creating parent
/// directories.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] when the directory or file cannot be
/// written.
pub fn write_macros(path: &Path, data: &AppData) -> Result<(), PersistenceError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = serde_json::to_string_pretty(data)?;
    std::fs::write(path, content).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), macros = data.macros.len(), "macros saved");
    Ok(())
}
