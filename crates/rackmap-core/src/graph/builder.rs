//! Builds the renderable topology graph from raw inventory records.
//!
//! The builder is defensive about its inputs: duplicate device records are
//! collapsed, and a connection whose endpoint cannot be resolved is dropped
//! with a warning instead of producing a dangling edge.

use crate::domain::inventory::{
    Connection, ConnectionId, Device, DeviceId, DeviceKind, HealthStatus, Rack, RackId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

/// Speed tiers, highest first. The substring match is ordered so that a
/// "100GbE" label is never misread as the "10g" or "1g" tier.
const SPEED_TIERS: [(&str, &str, f64); 4] = [
    ("100g", "#f97316", 4.0),
    ("25g", "#a855f7", 3.0),
    ("10g", "#3b82f6", 2.5),
    ("1g", "#22c55e", 1.5),
];

/// Stroke for absent or unrecognised speed labels.
const NEUTRAL_COLOR: &str = "#9ca3af";
const NEUTRAL_WIDTH: f64 = 1.0;

/// Maps a free-form speed label to a stroke `(color, width)` pair.
///
/// Matching is case-insensitive substring search over the tiers in
/// [`SPEED_TIERS`] order; anything unmatched gets the neutral stroke.
pub fn classify_speed(speed: &str) -> (&'static str, f64) {
    let lowered = speed.to_ascii_lowercase();
    for (needle, color, width) in SPEED_TIERS {
        if lowered.contains(needle) {
            return (color, width);
        }
    }
    (NEUTRAL_COLOR, NEUTRAL_WIDTH)
}

/// Visual stroke of an edge, derived from its speed and rack span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeStyle {
    /// Stroke colour as a CSS hex string.
    pub color: &'static str,
    /// Stroke width in pixels.
    pub width: f64,
    /// Dashed for inter-rack links, solid within a rack.
    pub dashed: bool,
}

/// A device as drawn on the topology canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopoNode {
    pub device_id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
    pub status: HealthStatus,
    pub rack_id: RackId,
    /// Resolved rack name; `None` when the rack record was not in the read.
    pub rack_name: Option<String>,
    /// True when any of this node's connections crosses racks.
    pub inter_rack: bool,
}

/// A connection as drawn on the topology canvas. Display labels live on the
/// underlying [`Connection`]; join by `connection_id` when building
/// tooltips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopoEdge {
    pub connection_id: ConnectionId,
    pub source: DeviceId,
    pub target: DeviceId,
    /// True when the endpoints live in different racks.
    pub inter_rack: bool,
    pub style: EdgeStyle,
}

/// The node/edge graph fed to a layout engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TopoGraph {
    /// Nodes in ascending device-id order.
    pub nodes: Vec<TopoNode>,
    /// Edges in connection order, dangling ones dropped.
    pub edges: Vec<TopoEdge>,
}

impl TopoGraph {
    /// Builds the graph from a full inventory read.
    pub fn build(devices: &[Device], racks: &[Rack], connections: &[Connection]) -> Self {
        // Collapse duplicate device records; the BTreeMap also fixes node
        // order to ascending id regardless of service ordering.
        let mut by_id: BTreeMap<DeviceId, &Device> = BTreeMap::new();
        let mut duplicates = 0usize;
        for dev in devices {
            if by_id.insert(dev.id, dev).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            warn!(duplicates, "collapsed duplicate device records");
        }

        let rack_names: HashMap<RackId, &str> =
            racks.iter().map(|r| (r.id, r.name.as_str())).collect();

        let mut edges = Vec::with_capacity(connections.len());
        let mut inter_rack_devices: BTreeSet<DeviceId> = BTreeSet::new();
        for conn in connections {
            let (Some(source), Some(target)) = (
                by_id.get(&conn.source_device_id),
                by_id.get(&conn.target_device_id),
            ) else {
                warn!(
                    connection_id = conn.id,
                    source = conn.source_device_id,
                    target = conn.target_device_id,
                    "dropping connection with unresolved endpoint"
                );
                continue;
            };

            let inter_rack = source.rack_id != target.rack_id;
            let (color, width) = classify_speed(&conn.speed);
            edges.push(TopoEdge {
                connection_id: conn.id,
                source: source.id,
                target: target.id,
                inter_rack,
                style: EdgeStyle { color, width, dashed: inter_rack },
            });
            if inter_rack {
                inter_rack_devices.insert(source.id);
                inter_rack_devices.insert(target.id);
            }
        }

        let nodes = by_id
            .values()
            .map(|dev| TopoNode {
                device_id: dev.id,
                name: dev.name.clone(),
                kind: dev.kind,
                status: dev.status,
                rack_id: dev.rack_id,
                rack_name: rack_names.get(&dev.rack_id).map(|n| n.to_string()),
                inter_rack: inter_rack_devices.contains(&dev.id),
            })
            .collect();

        Self { nodes, edges }
    }

    /// Device ids of all nodes, in node order.
    pub fn node_ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.nodes.iter().map(|n| n.device_id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
