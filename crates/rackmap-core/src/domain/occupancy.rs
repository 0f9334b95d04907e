//! Rack-unit occupancy scanning and top-down elevation rows.
//!
//! The elevation view draws a rack the way you would see it in the room:
//! highest unit first. A device anchored at `position_u` with height
//! `size_u` consumes a contiguous downward span, so the row list is built
//! by walking from `rack.size_u` down to 1, emitting either a device row
//! (which swallows its whole span) or a single empty slot.
//!
//! Overlapping input is tolerated and reported, never fatal: the validated
//! write path ([`crate::domain::placement`]) never produces it, but a stale
//! read or a hand-edited database might.

use crate::domain::inventory::{Device, DeviceId, Rack};
use serde::Serialize;

/// Pixel height of one rack unit in the elevation view.
pub const UNIT_HEIGHT_PX: u32 = 34;

/// Device spans up to this many units get a single centred label; taller
/// spans repeat the label so it stays visible while scrolling.
const CENTRED_LABEL_MAX_U: u32 = 4;

/// How a device row's label should be drawn, given the row's height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelPlacement {
    /// One label, vertically centred in the span.
    Centred,
    /// Label repeated at the top, middle, and bottom of the span.
    TopMiddleBottom,
}

/// Label placement rule for a device spanning `span_u` units.
pub fn label_placement(span_u: u32) -> LabelPlacement {
    if span_u <= CENTRED_LABEL_MAX_U {
        LabelPlacement::Centred
    } else {
        LabelPlacement::TopMiddleBottom
    }
}

/// Pixel height of a row spanning `span_u` units.
pub fn row_height_px(span_u: u32) -> u32 {
    span_u * UNIT_HEIGHT_PX
}

/// Two devices claiming the same unit. Diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitConflict {
    /// The contested unit index.
    pub unit_u: u32,
    /// The device that claimed the unit first (lowest id wins the scan).
    pub holder: DeviceId,
    /// The device whose span also covers the unit.
    pub intruder: DeviceId,
}

/// Per-unit occupancy of one rack.
///
/// Built by [`RackOccupancy::scan`]; read-only afterwards. Unit indices are
/// 1-based; queries outside `1..=size_u` report the unit as not free.
#[derive(Debug, Clone, PartialEq)]
pub struct RackOccupancy {
    size_u: u32,
    /// `units[i]` holds the occupant of unit `i + 1`.
    units: Vec<Option<DeviceId>>,
    conflicts: Vec<UnitConflict>,
}

impl RackOccupancy {
    /// Scans `devices` (the full inventory; only those in `rack` count) into
    /// a per-unit occupancy table.
    ///
    /// Devices are applied in ascending id order so the table is
    /// deterministic regardless of service ordering. Units outside the rack
    /// bounds are ignored; a span that pokes past either end is clipped.
    pub fn scan(rack: &Rack, devices: &[Device]) -> Self {
        let mut in_rack: Vec<&Device> = devices.iter().filter(|d| d.rack_id == rack.id).collect();
        in_rack.sort_by_key(|d| d.id);

        let size_u = rack.size_u;
        let mut units: Vec<Option<DeviceId>> = vec![None; size_u as usize];
        let mut conflicts = Vec::new();

        for dev in in_rack {
            let (bottom, top) = dev.occupied_range();
            let clipped_bottom = bottom.max(1);
            let clipped_top = top.min(size_u as i64);
            for unit in clipped_bottom..=clipped_top {
                let slot = &mut units[(unit - 1) as usize];
                match slot {
                    Some(holder) => conflicts.push(UnitConflict {
                        unit_u: unit as u32,
                        holder: *holder,
                        intruder: dev.id,
                    }),
                    None => *slot = Some(dev.id),
                }
            }
        }

        Self { size_u, units, conflicts }
    }

    /// Rack height this table was scanned for.
    pub fn size_u(&self) -> u32 {
        self.size_u
    }

    /// The device occupying `unit_u`, if any.
    pub fn occupant(&self, unit_u: u32) -> Option<DeviceId> {
        if unit_u == 0 || unit_u > self.size_u {
            return None;
        }
        self.units[(unit_u - 1) as usize]
    }

    /// Returns `true` if `unit_u` is inside the rack and unoccupied.
    pub fn is_free(&self, unit_u: u32) -> bool {
        unit_u >= 1 && unit_u <= self.size_u && self.units[(unit_u - 1) as usize].is_none()
    }

    /// Conflicts found during the scan. Empty for validator-produced data.
    pub fn conflicts(&self) -> &[UnitConflict] {
        &self.conflicts
    }

    /// Contiguous free spans as inclusive `(bottom_u, top_u)` pairs,
    /// ascending from the rack bottom.
    pub fn free_ranges(&self) -> Vec<(u32, u32)> {
        let mut ranges = Vec::new();
        let mut start: Option<u32> = None;
        for unit in 1..=self.size_u {
            let free = self.units[(unit - 1) as usize].is_none();
            match (free, start) {
                (true, None) => start = Some(unit),
                (false, Some(s)) => {
                    ranges.push((s, unit - 1));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            ranges.push((s, self.size_u));
        }
        ranges
    }
}

/// One row of the top-down elevation view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ElevationRow {
    /// A device anchored at `top_u`, drawn as one row `span_u` units tall.
    Device {
        device_id: DeviceId,
        top_u: u32,
        span_u: u32,
    },
    /// A single empty mounting slot.
    Empty { unit_u: u32 },
}

/// Builds the elevation rows for `rack`, highest unit first.
///
/// `suppress` removes one device from the rendering (its span shows as empty
/// slots); the drag flow uses this so a device being dragged is not drawn
/// twice, once in its old slot and once under the pointer.
///
/// When two devices claim the same top unit, the lowest id wins the row;
/// the other device's unconsumed units fall out as empty slots rather than
/// breaking the walk.
pub fn elevation_rows(
    rack: &Rack,
    devices: &[Device],
    suppress: Option<DeviceId>,
) -> Vec<ElevationRow> {
    let mut anchored: Vec<&Device> = devices
        .iter()
        .filter(|d| d.rack_id == rack.id && Some(d.id) != suppress)
        .collect();
    // Lowest id wins a contested anchor: later duplicates never replace an
    // earlier entry once sorted.
    anchored.sort_by_key(|d| d.id);

    let mut by_top: std::collections::HashMap<u32, &Device> = std::collections::HashMap::new();
    for dev in anchored {
        by_top.entry(dev.position_u).or_insert(dev);
    }

    let mut rows = Vec::new();
    let mut current = rack.size_u;
    while current >= 1 {
        match by_top.get(&current) {
            Some(dev) => {
                // Clip the span so a record that reaches below unit 1 still
                // terminates the walk cleanly.
                let span = dev.size_u.min(current);
                rows.push(ElevationRow::Device {
                    device_id: dev.id,
                    top_u: current,
                    span_u: span,
                });
                current -= span;
            }
            None => {
                rows.push(ElevationRow::Empty { unit_u: current });
                current -= 1;
            }
        }
    }
    rows
}

// ── Tests ─────────────────────────────────────────────────────────────────────
