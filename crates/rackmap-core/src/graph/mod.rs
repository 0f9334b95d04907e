//! Network-topology graph: building, laying out, and remembering positions.
//!
//! The pipeline is `builder -> layout -> positions`: the builder turns raw
//! inventory records into a node/edge graph, a layout engine (grid or tree,
//! selected by view mode) assigns coordinates, and the position cache keeps
//! the user's manual adjustments sticky across re-layouts and restarts.

/// Devices + connections -> nodes + styled edges.
pub mod builder;

/// The grid and hierarchical-tree layout engines.
pub mod layout;

/// Per-(view-mode, node) coordinate cache.
pub mod positions;
