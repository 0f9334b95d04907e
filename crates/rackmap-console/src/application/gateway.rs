//! The inventory service port: every read and write goes through this trait.
//!
//! # Architecture
//!
//! Use cases hold an `Arc<dyn InventoryGateway>` and never touch HTTP
//! directly.  The reqwest-backed implementation lives in
//! `infrastructure::http`; tests substitute a recording fake.  Splitting the
//! port from its implementation keeps the application layer runnable in unit
//! tests with no network.

use async_trait::async_trait;
use rackmap_core::{
    Connection, ConnectionId, Device, DeviceId, DeviceKind, HealthStatus, MoveCommand, Rack,
    RackId, DEFAULT_DEVICE_ICON,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service could not be reached (DNS failure, refused connection,
    /// timeout).
    #[error("inventory service unreachable: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("inventory service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not decode into the expected shape.
    #[error("malformed inventory response: {0}")]
    Decode(String),
}

/// Payload for creating a device.
///
/// The click-to-create flow fills most of this from defaults; the device
/// form sends it fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    /// Rack to mount the device in.
    pub rack_id: RackId,
    /// Display name.
    pub name: String,
    /// Broad device category.
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    /// Emoji or short glyph for the elevation.
    pub icon: String,
    /// Top unit, 1-indexed from the rack bottom.
    pub position_u: u32,
    /// Height in rack units.
    pub size_u: u32,
    /// Initial health status.
    pub status: HealthStatus,
}

impl NewDevice {
    /// A 1U server at `position_u` with the stock icon and `online` status,
    /// as created by clicking an empty elevation slot.
    pub fn at_slot(rack_id: RackId, position_u: u32, name: impl Into<String>) -> Self {
        Self {
            rack_id,
            name: name.into(),
            kind: DeviceKind::Server,
            icon: DEFAULT_DEVICE_ICON.to_string(),
            position_u,
            size_u: 1,
            status: HealthStatus::Online,
        }
    }
}

/// Payload for creating a connection between two devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConnection {
    /// Device the link is drawn from.
    pub source_device_id: DeviceId,
    /// Device the link is drawn to.
    pub target_device_id: DeviceId,
    /// Link kind label (e.g. "ethernet"); empty when unset.
    #[serde(default)]
    pub connection_type: String,
    /// Port annotation; empty when unset.
    #[serde(default)]
    pub port_info: String,
    /// Link speed label (e.g. "10GbE"); empty when unset.
    #[serde(default)]
    pub speed: String,
}

/// Partial update for an existing connection's labels.
///
/// `None` fields are omitted from the JSON body, so the service keeps their
/// stored values.  Endpoints are not editable; rewiring a link is a delete
/// plus a create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionUpdate {
    /// New link kind label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    /// New port annotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_info: Option<String>,
    /// New link speed label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
}

/// Read and mutate the rack inventory held by the external service.
///
/// Reads return the service's current truth; the console re-fetches after
/// every committed mutation instead of patching local state.
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Fetches all racks.
    async fn fetch_racks(&self) -> Result<Vec<Rack>, GatewayError>;

    /// Fetches devices, all of them or one rack's worth.
    async fn fetch_devices(&self, rack_id: Option<RackId>) -> Result<Vec<Device>, GatewayError>;

    /// Fetches all network connections.
    async fn fetch_connections(&self) -> Result<Vec<Connection>, GatewayError>;

    /// Creates a device and returns the stored record.
    async fn create_device(&self, device: NewDevice) -> Result<Device, GatewayError>;

    /// Applies a committed move: new top unit and, for a cross-rack move,
    /// the new rack.
    async fn update_device_position(&self, command: MoveCommand) -> Result<Device, GatewayError>;

    /// Creates a connection and returns the stored record.
    async fn create_connection(&self, connection: NewConnection)
        -> Result<Connection, GatewayError>;

    /// Rewrites an existing connection's labels and returns the stored
    /// record.
    async fn update_connection(
        &self,
        connection_id: ConnectionId,
        update: ConnectionUpdate,
    ) -> Result<Connection, GatewayError>;

    /// Deletes a connection.
    async fn delete_connection(&self, connection_id: ConnectionId) -> Result<(), GatewayError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
