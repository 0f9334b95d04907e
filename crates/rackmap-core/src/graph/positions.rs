//! The position cache: one remembered coordinate per (view mode, node).
//!
//! A cached entry always wins over a freshly computed layout position, so
//! re-running an engine on unrelated data changes never undoes the user's
//! manual arrangement. The cache is an explicit two-level structure rather
//! than a string-keyed map, so a grid position can never shadow a tree
//! position for the same node.

use crate::domain::inventory::DeviceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 2D canvas coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which topology layout the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Square-ish grid, initial placement only.
    Grid,
    /// Hierarchical BFS-level tree.
    Tree,
}

impl ViewMode {
    /// The lowercase label used in config files and CLI flags.
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::Tree => "tree",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error parsing a view-mode label.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown view mode: {0:?} (expected grid or tree)")]
pub struct ParseViewModeError(pub String);

impl FromStr for ViewMode {
    type Err = ParseViewModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "tree" => Ok(ViewMode::Tree),
            other => Err(ParseViewModeError(other.to_string())),
        }
    }
}

/// Two-level coordinate cache: view mode -> device -> point.
///
/// Serialized wholesale to `positions.json` by the console's storage layer;
/// the on-disk shape is `{"grid": {"3": {...}}, "tree": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionCache {
    #[serde(default)]
    grid: BTreeMap<DeviceId, Point>,
    #[serde(default)]
    tree: BTreeMap<DeviceId, Point>,
}

impl PositionCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn level(&self, mode: ViewMode) -> &BTreeMap<DeviceId, Point> {
        match mode {
            ViewMode::Grid => &self.grid,
            ViewMode::Tree => &self.tree,
        }
    }

    fn level_mut(&mut self, mode: ViewMode) -> &mut BTreeMap<DeviceId, Point> {
        match mode {
            ViewMode::Grid => &mut self.grid,
            ViewMode::Tree => &mut self.tree,
        }
    }

    /// The cached coordinate for `device` in `mode`, if any.
    pub fn get(&self, mode: ViewMode, device: DeviceId) -> Option<Point> {
        self.level(mode).get(&device).copied()
    }

    /// Returns `true` if `device` has a cached coordinate in `mode`.
    pub fn contains(&self, mode: ViewMode, device: DeviceId) -> bool {
        self.level(mode).contains_key(&device)
    }

    /// Returns `true` if every id yielded by `devices` is cached in `mode`.
    /// This is the layout engines' "skip recomputation" test.
    pub fn covers(&self, mode: ViewMode, devices: impl IntoIterator<Item = DeviceId>) -> bool {
        let level = self.level(mode);
        devices.into_iter().all(|id| level.contains_key(&id))
    }

    /// Records a user-adjusted coordinate, overwriting any previous entry.
    pub fn set(&mut self, mode: ViewMode, device: DeviceId, point: Point) {
        self.level_mut(mode).insert(device, point);
    }

    /// Adopts engine-computed coordinates for nodes that have no entry yet.
    /// Existing entries are untouched. Returns how many were adopted.
    pub fn adopt(&mut self, mode: ViewMode, computed: &BTreeMap<DeviceId, Point>) -> usize {
        let level = self.level_mut(mode);
        let mut adopted = 0;
        for (device, point) in computed {
            if !level.contains_key(device) {
                level.insert(*device, *point);
                adopted += 1;
            }
        }
        adopted
    }

    /// Drops the entry for `device` in `mode`, if present.
    pub fn remove(&mut self, mode: ViewMode, device: DeviceId) -> Option<Point> {
        self.level_mut(mode).remove(&device)
    }

    /// Number of cached entries in `mode`.
    pub fn len(&self, mode: ViewMode) -> usize {
        self.level(mode).len()
    }

    /// Returns `true` if `mode` has no cached entries.
    pub fn is_empty(&self, mode: ViewMode) -> bool {
        self.level(mode).is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
