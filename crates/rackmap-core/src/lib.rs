//! # rackmap-core
//!
//! Shared library for Rackmap containing the inventory domain model, the
//! rack-unit placement engine, and the network-topology layout algorithms.
//!
//! This crate is used by the console application and by anything else that
//! needs to reason about rack layouts. It has zero dependencies on OS APIs,
//! UI frameworks, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! Rackmap is a visualization tool for a home-lab or small-business server
//! rack inventory. It shows two views of the same hardware: a **rack
//! elevation** (which device sits in which slot of which rack, drawn
//! top-down the way you would see the physical rack) and a **network
//! topology graph** (which device is cabled to which, drawn as nodes and
//! edges).
//!
//! This crate (`rackmap-core`) is the shared foundation. It defines:
//!
//! - **`domain`** - Pure business logic with no I/O. The central concepts
//!   are rack-unit *occupancy* (a device of height `size_u` anchored at top
//!   unit `position_u` fills a contiguous downward span), the *placement
//!   validator* that decides whether a candidate slot is legal, and the
//!   *drag session* state machine that turns pointer gestures into
//!   validated move commands.
//!
//! - **`graph`** - The topology side: building a node/edge graph from
//!   devices and their connections, two layout engines (a stable grid and a
//!   hierarchical tree), and the position cache that keeps user-adjusted
//!   coordinates sticky across re-layouts.

// Declare the two top-level modules. Rust will look for each in a
// subdirectory with the same name (e.g., src/domain/mod.rs).
pub mod domain;
pub mod graph;

// Re-export the most-used types at the crate root so callers can write
// `rackmap_core::Device` instead of `rackmap_core::domain::inventory::Device`.
pub use domain::drag::{
    unit_at_pointer, DragSession, DragState, DropOutcome, MoveCommand, PlacementPreview,
};
pub use domain::inventory::{
    Connection, ConnectionId, Device, DeviceId, DeviceKind, HealthStatus, LabelError, Rack,
    RackId, DEFAULT_DEVICE_ICON, DEFAULT_RACK_SIZE_U, STANDARD_RACK_SIZES_U,
};
pub use domain::occupancy::{
    elevation_rows, label_placement, row_height_px, ElevationRow, LabelPlacement, RackOccupancy,
    UnitConflict, UNIT_HEIGHT_PX,
};
pub use domain::placement::{
    check_placement, first_valid_top_unit, is_valid_placement, PlacementError,
};
pub use graph::builder::{classify_speed, EdgeStyle, TopoEdge, TopoGraph, TopoNode};
pub use graph::layout::{grid_layout, tree_layout};
pub use graph::positions::{ParseViewModeError, Point, PositionCache, ViewMode};
