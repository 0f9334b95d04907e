//! The placement validator: may a device of height `size_u` legally occupy
//! top unit `top_u` of a rack?
//!
//! Pure functions, no side effects. The drag flow calls these on every
//! pointer move, so they must stay cheap: one pass over the target rack's
//! devices, no allocation on the success path.

use crate::domain::inventory::{Device, DeviceId, Rack};
use thiserror::Error;

/// Why a candidate placement is illegal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// A device must be at least one unit tall.
    #[error("device height must be at least 1U")]
    ZeroHeight,

    /// The candidate top unit is above the rack's highest unit.
    #[error("top unit {top_u} exceeds rack height {rack_size_u}U")]
    AboveRack { top_u: u32, rack_size_u: u32 },

    /// The candidate span would extend below unit 1.
    #[error("a {size_u}U device anchored at unit {top_u} would extend below unit 1")]
    BelowRack { top_u: u32, size_u: u32 },

    /// The candidate span intersects another device's span.
    #[error("units {bottom_u}..={top_u} are blocked by device {blocking}")]
    Overlap {
        /// Bottom of the candidate span.
        bottom_u: i64,
        /// Top of the candidate span.
        top_u: u32,
        /// The device already occupying part of the span.
        blocking: DeviceId,
    },
}

/// Returns `true` if two inclusive unit spans intersect.
///
/// Two spans intersect iff neither lies entirely above nor entirely below
/// the other.
pub(crate) fn spans_intersect(a_bottom: i64, a_top: i64, b_bottom: i64, b_top: i64) -> bool {
    a_bottom <= b_top && b_bottom <= a_top
}

/// Checks whether a device of height `size_u` may occupy top unit `top_u`
/// in `rack`, reporting the first failure cause.
///
/// `devices` is the full inventory; only devices mounted in `rack` are
/// considered, so a cross-rack move is validated against the *target* rack
/// simply by passing that rack. `exclude` removes one device from the
/// comparison by identity (not by position), so a device re-validated at
/// its own current slot passes.
pub fn check_placement(
    rack: &Rack,
    devices: &[Device],
    top_u: u32,
    size_u: u32,
    exclude: Option<DeviceId>,
) -> Result<(), PlacementError> {
    if size_u == 0 {
        return Err(PlacementError::ZeroHeight);
    }
    if top_u > rack.size_u {
        return Err(PlacementError::AboveRack { top_u, rack_size_u: rack.size_u });
    }
    let bottom_u = top_u as i64 - size_u as i64 + 1;
    if bottom_u < 1 {
        return Err(PlacementError::BelowRack { top_u, size_u });
    }

    for dev in devices {
        if dev.rack_id != rack.id || Some(dev.id) == exclude {
            continue;
        }
        let (dev_bottom, dev_top) = dev.occupied_range();
        if spans_intersect(bottom_u, top_u as i64, dev_bottom, dev_top) {
            return Err(PlacementError::Overlap { bottom_u, top_u, blocking: dev.id });
        }
    }
    Ok(())
}

/// Boolean form of [`check_placement`], for the per-pointer-move hot path.
pub fn is_valid_placement(
    rack: &Rack,
    devices: &[Device],
    top_u: u32,
    size_u: u32,
    exclude: Option<DeviceId>,
) -> bool {
    check_placement(rack, devices, top_u, size_u, exclude).is_ok()
}

/// Scans from the rack's top-most unit downward and returns the first top
/// unit where a device of height `size_u` fits, or `None` if the rack has
/// no room.
///
/// Used by the coarse-drop fallback: a drop on a rack's background with no
/// tracked preview lands the device in the highest slot that takes it.
pub fn first_valid_top_unit(
    rack: &Rack,
    devices: &[Device],
    size_u: u32,
    exclude: Option<DeviceId>,
) -> Option<u32> {
    (1..=rack.size_u)
        .rev()
        .find(|&top_u| is_valid_placement(rack, devices, top_u, size_u, exclude))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
