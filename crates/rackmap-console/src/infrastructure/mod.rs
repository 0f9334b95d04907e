//! Infrastructure layer for the console application.
//!
//! Contains the outward-facing adapters: the reqwest inventory gateway,
//! file-system storage (config + position cache), and the UI command
//! bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `rackmap_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod http;
pub mod storage;
pub mod ui_bridge;
