//! TOML-based configuration persistence for the console application.
//!
//! Reads and writes `AppConfig` at the platform-appropriate location:
//! - Windows:  `%APPDATA%\rackmap\config.toml`
//! - Linux:    `~/.config/rackmap/config.toml`
//! - macOS:    `~/Library/Application Support/rackmap/config.toml`
//!
//! # Serde default values
//!
//! Every field is annotated with `#[serde(default = "some_fn")]`, so a
//! partial or missing config file still produces a fully-populated
//! `AppConfig`.  First runs work without any file on disk, and upgrades
//! that add new fields keep reading old files unchanged.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rackmap_core::{ViewMode, UNIT_HEIGHT_PX};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub elevation: ElevationConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
}

/// Where the inventory service lives and how patiently we talk to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the inventory service, scheme + host + port.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Rack elevation rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElevationConfig {
    /// Rendered height of one rack unit in pixels.  Pointer-to-unit
    /// conversion during drags divides by this value.
    #[serde(default = "default_unit_height")]
    pub unit_height_px: f64,
}

/// Topology view settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopologyConfig {
    /// View shown when the topology screen first opens: `"grid"` or `"tree"`.
    #[serde(default = "default_view")]
    pub default_view: ViewMode,
    /// Canvas width hint handed to the front end, in pixels.
    #[serde(default = "default_canvas_width")]
    pub canvas_width_px: u32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_unit_height() -> f64 {
    f64::from(UNIT_HEIGHT_PX)
}
fn default_view() -> ViewMode {
    ViewMode::Grid
}
fn default_canvas_width() -> u32 {
    1200
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            elevation: ElevationConfig::default(),
            topology: TopologyConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            unit_height_px: default_unit_height(),
        }
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            default_view: default_view(),
            canvas_width_px: default_canvas_width(),
        }
    }
}

impl ApiConfig {
    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for config and position
/// files.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the default path of the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` at `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    // Ensure directory exists before writing.
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
    })?;
    Ok(())
}

/// Resolves the platform config base directory plus the `rackmap`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("rackmap"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("rackmap"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("rackmap")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rackmap_cfg_{}_{tag}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_default_config_points_at_local_service() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.api.base_url, "http://localhost:8080");
        assert_eq!(cfg.api.timeout_secs, 10);
    }

    #[test]
    fn test_default_unit_height_matches_elevation_constant() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.elevation.unit_height_px, 34.0);
    }

    #[test]
    fn test_default_topology_view_is_grid() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.topology.default_view, ViewMode::Grid);
        assert_eq!(cfg.topology.canvas_width_px, 1200);
    }

    #[test]
    fn test_api_timeout_converts_to_duration() {
        let mut cfg = AppConfig::default();
        cfg.api.timeout_secs = 3;
        assert_eq!(cfg.api.timeout(), Duration::from_secs(3));
    }

    // ── TOML round-trip ───────────────────────────────────────────────────────

    #[test]
    fn test_config_serializes_and_deserializes_round_trip() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.api.base_url = "http://rack-host:9000".to_string();
        cfg.topology.default_view = ViewMode::Tree;

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_view_mode_serializes_as_lowercase_label() {
        let mut cfg = AppConfig::default();
        cfg.topology.default_view = ViewMode::Tree;

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");

        assert!(toml_str.contains("default_view = \"tree\""));
    }

    #[test]
    fn test_deserialize_empty_toml_uses_all_defaults() {
        // Arrange: an empty file is the first-run case
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[api]
base_url = "http://inventory.lab:8080"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.api.base_url, "http://inventory.lab:8080");
        // Unspecified fields keep their defaults
        assert_eq!(cfg.api.timeout_secs, 10);
        assert_eq!(cfg.elevation.unit_height_px, 34.0);
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_unknown_view_mode_is_an_error() {
        let toml_str = r#"
[topology]
default_view = "starburst"
"#;
        let result: Result<AppConfig, toml::de::Error> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    // ── load / save against the file system ───────────────────────────────────

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        // Arrange
        let path = PathBuf::from("/nonexistent/rackmap/path/config.toml");

        // Act
        let cfg = load_config(&path).expect("missing file is not an error");

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = temp_config_dir("roundtrip");
        let path = dir.join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.api.base_url = "http://10.0.0.5:8080".to_string();
        cfg.elevation.unit_height_px = 40.0;

        // Act
        save_config(&path, &cfg).expect("save");
        let loaded = load_config(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_config_creates_missing_parent_directories() {
        // Arrange
        let dir = temp_config_dir("mkdirs").join("nested").join("deeper");
        let path = dir.join("config.toml");

        // Act
        save_config(&path, &AppConfig::default()).expect("save into fresh dirs");

        // Assert
        assert!(path.exists());

        // Cleanup
        std::fs::remove_dir_all(dir.parent().unwrap().parent().unwrap()).ok();
    }

    // ── Path formation ────────────────────────────────────────────────────────

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            // Path::ends_with compares whole components, so this holds on
            // every platform separator.
            assert!(
                path.ends_with("rackmap/config.toml"),
                "expected a rackmap/config.toml suffix, got {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped CI environment is also acceptable.
    }
}
