//! Storage infrastructure: configuration and position persistence.
//!
//! This module is a thin adapter between the application and the file
//! system.  Two sub-modules:
//!
//! - **`config`** – Reads and writes the TOML configuration file in the
//!   platform-appropriate directory, with sensible defaults for a first
//!   run.
//! - **`positions`** – Persists the topology position cache as JSON next
//!   to the config file, so hand-pinned node positions survive restarts.
//!
//! Both accept the target path as an argument rather than resolving it
//! internally, because the CLI can point the app at an alternate config
//! file.  The `*_file_path()` helpers supply the platform default.

pub mod config;
pub mod positions;
