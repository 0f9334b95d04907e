//! Full-inventory refresh: one consistent snapshot of racks, devices and
//! connections.
//!
//! The console never patches its in-memory model after a mutation.  A commit
//! goes to the service, and the next snapshot replaces the old one
//! wholesale, so the occupancy and topology views always render what the
//! service actually stored.  A short-lived optimistic preview during a drag
//! is the only exception, and it lives entirely inside the drag session.

use std::sync::Arc;

use tracing::info;

use rackmap_core::{Connection, ConnectionId, Device, DeviceId, Rack, RackId};

use crate::application::gateway::{GatewayError, InventoryGateway};

/// One read of everything the console renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySnapshot {
    /// All racks, in service order.
    pub racks: Vec<Rack>,
    /// All devices across every rack.
    pub devices: Vec<Device>,
    /// All network connections.
    pub connections: Vec<Connection>,
}

impl InventorySnapshot {
    /// Looks up a rack by id.
    pub fn rack(&self, rack_id: RackId) -> Option<&Rack> {
        self.racks.iter().find(|r| r.id == rack_id)
    }

    /// Looks up a device by id.
    pub fn device(&self, device_id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    /// Looks up a connection by id.
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == connection_id)
    }

    /// The devices mounted in `rack_id`, in service order.
    pub fn devices_in_rack(&self, rack_id: RackId) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(move |d| d.rack_id == rack_id)
    }

    /// Returns `true` when a connection with exactly this (source, target)
    /// pair already exists.  The pair is ordered: an existing B→A link does
    /// not block a new A→B link.
    pub fn has_connection(&self, source: DeviceId, target: DeviceId) -> bool {
        self.connections
            .iter()
            .any(|c| c.source_device_id == source && c.target_device_id == target)
    }
}

/// Fetches the full inventory from the gateway.
pub struct SyncInventoryUseCase {
    gateway: Arc<dyn InventoryGateway>,
}

impl SyncInventoryUseCase {
    /// Creates the use case over a gateway.
    pub fn new(gateway: Arc<dyn InventoryGateway>) -> Self {
        Self { gateway }
    }

    /// Fetches racks, devices and connections and returns them as one
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first [`GatewayError`] encountered; a partially fetched
    /// snapshot is never returned.
    pub async fn refresh(&self) -> Result<InventorySnapshot, GatewayError> {
        let racks = self.gateway.fetch_racks().await?;
        let devices = self.gateway.fetch_devices(None).await?;
        let connections = self.gateway.fetch_connections().await?;

        info!(
            racks = racks.len(),
            devices = devices.len(),
            connections = connections.len(),
            "inventory snapshot refreshed"
        );

        Ok(InventorySnapshot { racks, devices, connections })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
