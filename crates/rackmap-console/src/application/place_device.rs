//! Drives the drag-and-drop placement gesture over the rack elevation.
//!
//! The pure gesture state machine lives in `rackmap-core` as
//! [`DragSession`]; this use case feeds it inventory snapshots, turns a
//! committed gesture into a position update against the gateway, and covers
//! the click-to-create flow for empty slots.
//!
//! # Architecture
//!
//! `begin_drag`, `drag_over`, `drag_out` and `cancel_drag` are synchronous:
//! pointer handling must never wait on the network.  Only `drop_on` and
//! `create_at` are async, and by the time `drop_on` awaits the gateway the
//! session is already idle again, so a commit that completes late cannot
//! collide with a gesture the user has since started.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, trace};

use rackmap_core::{
    Device, DeviceId, DragSession, DropOutcome, PlacementPreview, RackId,
};

use crate::application::gateway::{GatewayError, InventoryGateway, NewDevice};
use crate::application::sync_inventory::InventorySnapshot;

/// Error type for placement operations.
#[derive(Debug, Error)]
pub enum PlaceError {
    /// The device to drag is not in the current snapshot.
    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),

    /// Click-to-create fired while a drag gesture was still active.
    #[error("a drag gesture is in progress")]
    GestureInProgress,

    /// The gateway refused or failed the mutation.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// How a completed drop was resolved, after the gateway round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReport {
    /// The move was validated, sent and acknowledged; `device` is the
    /// record as the service stored it.
    Committed { device: Device, moved_rack: bool },
    /// The drop targeted a rack but no legal slot accepted the device.
    Rejected { device_id: DeviceId, rack_id: RackId },
    /// Nothing was being dragged, or the gesture was aborted.
    Cancelled,
}

/// The placement interaction use case: one per rack-display surface.
pub struct PlaceDeviceUseCase {
    gateway: Arc<dyn InventoryGateway>,
    session: DragSession,
    unit_height_px: f64,
}

impl PlaceDeviceUseCase {
    /// Creates the use case over a gateway.  `unit_height_px` is the fixed
    /// height of one rack unit as rendered, used to translate pointer
    /// offsets into unit indices.
    pub fn new(gateway: Arc<dyn InventoryGateway>, unit_height_px: f64) -> Self {
        Self {
            gateway,
            session: DragSession::new(),
            unit_height_px,
        }
    }

    /// Returns `true` while a gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.session.is_active()
    }

    /// The device the elevation should hide while the gesture runs, so it
    /// is drawn only under the pointer.
    pub fn suppressed_device(&self) -> Option<DeviceId> {
        self.session.suppressed_device()
    }

    /// Starts dragging `device_id`.  Must be called synchronously from the
    /// pointer-down handler so the identity is captured before any deferred
    /// visual updates run.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceError::UnknownDevice`] when the device is not in the
    /// snapshot.
    pub fn begin_drag(
        &mut self,
        snapshot: &InventorySnapshot,
        device_id: DeviceId,
    ) -> Result<(), PlaceError> {
        let device = snapshot
            .device(device_id)
            .ok_or(PlaceError::UnknownDevice(device_id))?;
        self.session.begin(device);
        debug!(device_id, source_rack_id = device.rack_id, "drag started");
        Ok(())
    }

    /// Pointer moved over `rack_id` at vertical offset `pointer_y_px`
    /// (measured from the rack's top edge).  Returns the validated
    /// candidate slot, or `None` when no drag is in progress or the rack is
    /// not in the snapshot (the event is absorbed).
    pub fn drag_over(
        &mut self,
        snapshot: &InventorySnapshot,
        rack_id: RackId,
        pointer_y_px: f64,
    ) -> Option<PlacementPreview> {
        let rack = snapshot.rack(rack_id)?;
        let preview =
            self.session
                .drag_over(rack, &snapshot.devices, pointer_y_px, self.unit_height_px)?;
        trace!(rack_id, top_u = preview.top_u, valid = preview.valid, "placement preview");
        Some(preview)
    }

    /// Pointer left the candidate slot but the gesture continues.
    pub fn drag_out(&mut self) {
        self.session.drag_out();
    }

    /// Aborts the gesture (release outside any rack surface, Escape, focus
    /// loss).  No command is emitted.
    pub fn cancel_drag(&mut self) {
        self.session.cancel();
        debug!("drag cancelled");
    }

    /// Pointer released over `rack_id`: resolve the gesture and, for a
    /// committed move, send the position update to the gateway.
    ///
    /// The session is idle again before the gateway is awaited, so a
    /// re-entrant release or a fresh drag cannot double-commit.  After a
    /// [`DropReport::Committed`] the caller should refresh the snapshot;
    /// the in-memory inventory is never patched locally.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceError::Gateway`] when the service refuses or fails
    /// the update.  The gesture is over either way.
    pub async fn drop_on(
        &mut self,
        snapshot: &InventorySnapshot,
        rack_id: RackId,
    ) -> Result<DropReport, PlaceError> {
        let Some(rack) = snapshot.rack(rack_id) else {
            // The surface no longer maps to a rack; same as releasing
            // outside every rack.
            self.session.cancel();
            return Ok(DropReport::Cancelled);
        };

        match self.session.release_over(rack, &snapshot.devices) {
            DropOutcome::Committed(command) => {
                let device_id = command.device_id;
                let top_u = command.top_u;
                let moved_rack = command.rack_id.is_some();
                match self.gateway.update_device_position(command).await {
                    Ok(device) => {
                        info!(device_id, rack_id, top_u, moved_rack, "device move committed");
                        Ok(DropReport::Committed { device, moved_rack })
                    }
                    Err(err) => {
                        error!(device_id, rack_id, top_u, %err, "device move failed");
                        Err(PlaceError::Gateway(err))
                    }
                }
            }
            DropOutcome::Rejected { device_id, rack_id } => {
                debug!(device_id, rack_id, "drop rejected: no legal slot");
                Ok(DropReport::Rejected { device_id, rack_id })
            }
            DropOutcome::Cancelled => Ok(DropReport::Cancelled),
        }
    }

    /// Clicking an empty slot outside a drag: create a device there with
    /// the stock defaults (1U server, online).  No placement validation
    /// runs here; nothing existing moves, and the service owns creation.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceError::GestureInProgress`] when a drag is active, or
    /// [`PlaceError::Gateway`] when the service refuses the creation.
    pub async fn create_at(
        &self,
        rack_id: RackId,
        position_u: u32,
        name: impl Into<String>,
    ) -> Result<Device, PlaceError> {
        if self.session.is_active() {
            return Err(PlaceError::GestureInProgress);
        }
        let device = self
            .gateway
            .create_device(NewDevice::at_slot(rack_id, position_u, name))
            .await?;
        info!(device_id = device.id, rack_id, position_u, "device created from empty slot");
        Ok(device)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
