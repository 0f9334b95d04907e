//! JSON persistence for the topology position cache.
//!
//! Pinned and adopted node coordinates live in `positions.json` next to
//! the config file.  The cache's two-level map serializes directly, so the
//! on-disk shape is `{"grid": {"3": {"x": .., "y": ..}}, "tree": {..}}`.
//! The file is rewritten wholesale after every position change; the next
//! start reads the last fully-written file.

use std::path::{Path, PathBuf};

use thiserror::Error;

use rackmap_core::PositionCache;

use super::config::config_dir;

/// Error type for position file operations.
#[derive(Debug, Error)]
pub enum PositionStoreError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing positions at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JSON content could not be parsed or serialized.
    #[error("malformed positions JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Resolves the default path of the positions file.
///
/// # Errors
///
/// Returns [`PositionStoreError::NoPlatformConfigDir`] if the base directory
/// cannot be determined.
pub fn positions_file_path() -> Result<PathBuf, PositionStoreError> {
    let dir = config_dir().map_err(|_| PositionStoreError::NoPlatformConfigDir)?;
    Ok(dir.join("positions.json"))
}

/// Loads the position cache from `path`, returning an empty cache if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`PositionStoreError::Io`] for file-system errors other than
/// "not found", and [`PositionStoreError::Json`] if the JSON is malformed.
pub fn load_positions(path: &Path) -> Result<PositionCache, PositionStoreError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cache: PositionCache = serde_json::from_str(&content)?;
            Ok(cache)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PositionCache::new()),
        Err(e) => Err(PositionStoreError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `cache` at `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`PositionStoreError::Io`] for file-system failures or
/// [`PositionStoreError::Json`] if serialization fails.
pub fn save_positions(path: &Path, cache: &PositionCache) -> Result<(), PositionStoreError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| PositionStoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = serde_json::to_string_pretty(cache)?;
    std::fs::write(path, content).map_err(|source| PositionStoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
