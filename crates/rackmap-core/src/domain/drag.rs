//! The drag-and-drop placement session, modelled as an explicit state
//! machine.
//!
//! States: `Idle -> Dragging -> (Previewing <-> Dragging)`; a release or
//! cancel returns to `Idle` and reports the gesture's outcome. Every
//! transition is a total function of (state, event): unexpected events are
//! absorbed (an `Idle` release is a no-op cancellation), never panics.
//!
//! Two rules here exist for event-ordering robustness and are easy to
//! violate when refactoring:
//!
//! 1. [`DragSession::begin`] must be called synchronously from the
//!    pointer-down handler. The dragged device's identity is captured into
//!    the state at that instant, so a fast press-release cannot observe a
//!    session that forgot what it was moving.
//! 2. [`DragSession::release_over`] resets to `Idle` *before* the caller
//!    does anything asynchronous with the outcome, so a re-entrant release
//!    event finds an idle session and cannot double-commit.

use crate::domain::inventory::{Device, DeviceId, Rack, RackId};
use crate::domain::placement::{check_placement, first_valid_top_unit};

/// A candidate slot under the pointer, revalidated on every drag-over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Rack being hovered.
    pub rack_id: RackId,
    /// Candidate top unit, already clamped to the rack.
    pub top_u: u32,
    /// Bottom of the candidate span; may fall below 1 when the device is
    /// taller than the hovered slot allows (the preview is then invalid).
    pub bottom_u: i64,
    /// Whether the candidate passed the placement validator.
    pub valid: bool,
}

/// Current state of a drag gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A device is being dragged but is not over a candidate slot.
    Dragging {
        device_id: DeviceId,
        source_rack_id: RackId,
        size_u: u32,
    },
    /// A device is being dragged over a candidate slot.
    Previewing {
        device_id: DeviceId,
        source_rack_id: RackId,
        size_u: u32,
        preview: PlacementPreview,
    },
}

/// The single move emitted by a committed gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCommand {
    /// Device to move.
    pub device_id: DeviceId,
    /// Target rack, set only when the move crosses racks.
    pub rack_id: Option<RackId>,
    /// New top unit.
    pub top_u: u32,
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// A validated move; emitted at most once per gesture.
    Committed(MoveCommand),
    /// The drop targeted a rack but no legal slot was found.
    Rejected { device_id: DeviceId, rack_id: RackId },
    /// Nothing was being dragged, or the gesture was aborted.
    Cancelled,
}

/// Converts a pointer's vertical pixel offset (measured from the rack's top
/// edge) into a candidate top unit, clamped to `[1, rack_size_u]`.
///
/// The elevation is drawn top-down, so pixel row 0 is the rack's highest
/// unit.
pub fn unit_at_pointer(rack_size_u: u32, pointer_y_px: f64, unit_height_px: f64) -> u32 {
    if rack_size_u == 0 {
        return 1;
    }
    if !(unit_height_px > 0.0) {
        return rack_size_u;
    }
    let units_from_top = (pointer_y_px / unit_height_px).floor() as i64;
    (rack_size_u as i64 - units_from_top).clamp(1, rack_size_u as i64) as u32
}

/// One drag gesture over the rack-display surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    /// A session with no drag in progress.
    pub fn new() -> Self {
        Self { state: DragState::Idle }
    }

    /// Current state, for rendering.
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Returns `true` while a gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    /// The device whose original slot should be hidden from the elevation
    /// while the gesture runs (it is drawn only under the pointer).
    pub fn suppressed_device(&self) -> Option<DeviceId> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { device_id, .. } | DragState::Previewing { device_id, .. } => {
                Some(*device_id)
            }
        }
    }

    /// Starts dragging `device`. Call synchronously from the pointer-down
    /// handler. A `begin` during an active gesture abandons the old gesture
    /// and starts fresh.
    pub fn begin(&mut self, device: &Device) {
        self.state = DragState::Dragging {
            device_id: device.id,
            source_rack_id: device.rack_id,
            size_u: device.size_u,
        };
    }

    /// Pointer moved over `rack` at vertical offset `pointer_y_px`: compute
    /// and validate the candidate slot, entering `Previewing`.
    ///
    /// Returns the fresh preview, or `None` when no drag is in progress
    /// (the event is absorbed).
    pub fn drag_over(
        &mut self,
        rack: &Rack,
        devices: &[Device],
        pointer_y_px: f64,
        unit_height_px: f64,
    ) -> Option<PlacementPreview> {
        let (device_id, source_rack_id, size_u) = match &self.state {
            DragState::Idle => return None,
            DragState::Dragging { device_id, source_rack_id, size_u }
            | DragState::Previewing { device_id, source_rack_id, size_u, .. } => {
                (*device_id, *source_rack_id, *size_u)
            }
        };

        let top_u = unit_at_pointer(rack.size_u, pointer_y_px, unit_height_px);
        let valid = check_placement(rack, devices, top_u, size_u, Some(device_id)).is_ok();
        let preview = PlacementPreview {
            rack_id: rack.id,
            top_u,
            bottom_u: top_u as i64 - size_u as i64 + 1,
            valid,
        };
        self.state = DragState::Previewing { device_id, source_rack_id, size_u, preview };
        Some(preview)
    }

    /// Pointer left the candidate slot but the gesture continues:
    /// `Previewing -> Dragging`. Absorbed in any other state.
    pub fn drag_out(&mut self) {
        if let DragState::Previewing { device_id, source_rack_id, size_u, .. } = self.state {
            self.state = DragState::Dragging { device_id, source_rack_id, size_u };
        }
    }

    /// Pointer released over `rack`: resolve the gesture.
    ///
    /// With a valid preview for this rack, commits at the previewed slot.
    /// With an invalid preview, rejects. With no preview for this rack
    /// (coarse drop on the rack background, or the last preview was for a
    /// different rack), falls back to the first legal slot scanning from
    /// the rack top; if none exists the drop is rejected.
    ///
    /// The session is `Idle` again before this returns, so a duplicate
    /// release event yields `Cancelled`, never a second command.
    pub fn release_over(&mut self, rack: &Rack, devices: &[Device]) -> DropOutcome {
        let state = std::mem::take(&mut self.state);
        let (device_id, source_rack_id, size_u, preview) = match state {
            DragState::Idle => return DropOutcome::Cancelled,
            DragState::Dragging { device_id, source_rack_id, size_u } => {
                (device_id, source_rack_id, size_u, None)
            }
            DragState::Previewing { device_id, source_rack_id, size_u, preview } => {
                (device_id, source_rack_id, size_u, Some(preview))
            }
        };

        let top_u = match preview {
            // A tracked preview for this rack settles the drop: commit if
            // valid, reject if not. An invalid preview must not fall back
            // to another slot; the user aimed at one that refused the device.
            Some(p) if p.rack_id == rack.id => p.valid.then_some(p.top_u),
            // No candidate tracked for this rack: deterministic fallback.
            _ => first_valid_top_unit(rack, devices, size_u, Some(device_id)),
        };

        match top_u {
            Some(top_u) => DropOutcome::Committed(MoveCommand {
                device_id,
                rack_id: (rack.id != source_rack_id).then_some(rack.id),
                top_u,
            }),
            None => DropOutcome::Rejected { device_id, rack_id: rack.id },
        }
    }

    /// Aborts the gesture (release outside any rack surface, Escape, focus
    /// loss). No command is emitted and no partial state survives.
    pub fn cancel(&mut self) -> DropOutcome {
        self.state = DragState::Idle;
        DropOutcome::Cancelled
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
