//! Inventory records: racks, devices, and the network connections between them.
//!
//! These are the wire-faithful shapes served by the inventory REST service.
//! Identifiers are service-issued 64-bit integers; unit positions are
//! 1-indexed from the rack's **bottom**, with `position_u` naming the *top*
//! unit of the device (a 2U device at `position_u = 10` fills units 9 and 10).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a rack, issued by the inventory service.
pub type RackId = i64;

/// Unique identifier for a device, issued by the inventory service.
pub type DeviceId = i64;

/// Unique identifier for a network connection, issued by the inventory service.
pub type ConnectionId = i64;

/// Rack heights offered as presets by editors. Any positive height is legal;
/// these are just the common chassis sizes.
pub const STANDARD_RACK_SIZES_U: [u32; 4] = [12, 25, 42, 48];

/// Default rack height when the user does not pick one.
pub const DEFAULT_RACK_SIZE_U: u32 = 25;

/// Icon assigned to a device created without an explicit icon.
pub const DEFAULT_DEVICE_ICON: &str = "🖥️";

/// Errors raised when parsing inventory labels from free text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    /// The string names no known device category.
    #[error("unknown device kind: {0:?} (expected server, network, or storage)")]
    UnknownKind(String),
}

/// Broad category of a rack-mounted device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// General-purpose compute: hypervisors, NAS heads, bare-metal hosts.
    Server,
    /// Switches, routers, firewalls, patch panels.
    Network,
    /// Disk shelves, JBODs, tape units.
    Storage,
}

impl DeviceKind {
    /// The lowercase label used on the wire and in editors.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceKind::Server => "server",
            DeviceKind::Network => "network",
            DeviceKind::Storage => "storage",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeviceKind {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(DeviceKind::Server),
            "network" => Ok(DeviceKind::Network),
            "storage" => Ok(DeviceKind::Storage),
            other => Err(LabelError::UnknownKind(other.to_string())),
        }
    }
}

/// Health of a device as last reported by the inventory service.
///
/// The core only *renders* health; it never probes devices itself. Anything
/// the service sends that we do not recognise degrades to [`HealthStatus::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Device responded healthy on its last check.
    Online,
    /// Device responded, but degraded (e.g. an HTTP 4xx from its check URL).
    Warning,
    /// Device did not respond.
    Offline,
    /// No check configured, or the status label was unrecognised.
    #[default]
    #[serde(other)]
    Unknown,
}

impl HealthStatus {
    /// The lowercase label used on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Online => "online",
            HealthStatus::Warning => "warning",
            HealthStatus::Offline => "offline",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A physical rack: a named column of `size_u` mounting slots.
///
/// Unit indices run `1..=size_u` counting from the **bottom**, matching the
/// numbering printed on real rack rails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rack {
    /// Service-issued identifier.
    pub id: RackId,
    /// Display name (e.g. "Lab rack A").
    pub name: String,
    /// Free-form description; empty when the user left it blank.
    #[serde(default)]
    pub description: String,
    /// Height in rack units. Positive; commonly one of [`STANDARD_RACK_SIZES_U`].
    pub size_u: u32,
}

/// A rack-mounted device occupying a contiguous span of units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Service-issued identifier.
    pub id: DeviceId,
    /// The rack this device is mounted in.
    pub rack_id: RackId,
    /// Display name (e.g. "proxmox-01").
    pub name: String,
    /// Emoji or short glyph shown on the elevation; defaults to [`DEFAULT_DEVICE_ICON`].
    #[serde(default)]
    pub icon: String,
    /// Broad device category.
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    /// Top unit of the device, 1-indexed from the rack bottom.
    pub position_u: u32,
    /// Height in rack units, at least 1.
    pub size_u: u32,
    /// Last reported health.
    #[serde(default)]
    pub status: HealthStatus,
    /// Hardware model string, if recorded.
    #[serde(default)]
    pub model: Option<String>,
    /// Management IP address, if recorded.
    #[serde(default)]
    pub ip_address: Option<String>,
    /// URL polled by the service's health checker, if configured.
    #[serde(default)]
    pub health_check_url: Option<String>,
    /// Free-form hardware specs (e.g. "cpu" -> "2x Xeon 4310").
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
}

impl Device {
    /// The inclusive unit span `[bottom_u, top_u]` this device occupies.
    ///
    /// Computed in `i64` so that an inconsistent record (height larger than
    /// its top position) yields a bottom below 1 rather than an underflow.
    pub fn occupied_range(&self) -> (i64, i64) {
        let top = self.position_u as i64;
        (top - self.size_u as i64 + 1, top)
    }

    /// Returns `true` if this device's span covers `unit`.
    pub fn occupies(&self, unit: u32) -> bool {
        let (bottom, top) = self.occupied_range();
        let unit = unit as i64;
        bottom <= unit && unit <= top
    }
}

/// A network link between two devices.
///
/// Direction (source vs. target) is display-only; it is not a dependency
/// ordering. Multiple connections between the same pair are legal at this
/// layer (LACP bundles, redundant paths), though the inventory service
/// rejects an exact duplicate pair on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Service-issued identifier.
    pub id: ConnectionId,
    /// Device the link is drawn from.
    pub source_device_id: DeviceId,
    /// Device the link is drawn to.
    pub target_device_id: DeviceId,
    /// Link kind label (e.g. "ethernet", "fiber"); empty when unset.
    #[serde(default)]
    pub connection_type: String,
    /// Port annotation (e.g. "eth0 -> ge-0/0/12"); empty when unset.
    #[serde(default)]
    pub port_info: String,
    /// Link speed label (e.g. "10GbE"); empty when unset. Drives edge styling.
    #[serde(default)]
    pub speed: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_device(id: DeviceId, position_u: u32, size_u: u32) -> Device {
        Device {
            id,
            rack_id: 1,
            name: format!("dev-{id}"),
            icon: DEFAULT_DEVICE_ICON.to_string(),
            kind: DeviceKind::Server,
            position_u,
            size_u,
            status: HealthStatus::Online,
            model: None,
            ip_address: None,
            health_check_url: None,
            specs: BTreeMap::new(),
        }
    }

    // ── Occupied range ────────────────────────────────────────────────────────

    #[test]
    fn test_occupied_range_of_1u_device_is_its_own_unit() {
        let dev = make_device(1, 7, 1);
        assert_eq!(dev.occupied_range(), (7, 7));
    }

    #[test]
    fn test_occupied_range_spans_downward_from_top_unit() {
        let dev = make_device(1, 10, 3);
        assert_eq!(dev.occupied_range(), (8, 10));
    }

    #[test]
    fn test_occupies_is_inclusive_at_both_ends() {
        let dev = make_device(1, 10, 3);
        assert!(dev.occupies(8));
        assert!(dev.occupies(10));
        assert!(!dev.occupies(7));
        assert!(!dev.occupies(11));
    }

    #[test]
    fn test_occupied_range_of_inconsistent_record_reaches_below_unit_one() {
        // A 5U device anchored at unit 2 is illegal, but the range must still
        // be computable for diagnostics.
        let dev = make_device(1, 2, 5);
        assert_eq!(dev.occupied_range(), (-2, 2));
    }

    // ── Label parsing ─────────────────────────────────────────────────────────

    #[test]
    fn test_device_kind_parses_case_insensitively() {
        assert_eq!("Server".parse::<DeviceKind>(), Ok(DeviceKind::Server));
        assert_eq!(" network ".parse::<DeviceKind>(), Ok(DeviceKind::Network));
        assert_eq!("STORAGE".parse::<DeviceKind>(), Ok(DeviceKind::Storage));
    }

    #[test]
    fn test_device_kind_rejects_unknown_label() {
        let err = "toaster".parse::<DeviceKind>().unwrap_err();
        assert_eq!(err, LabelError::UnknownKind("toaster".to_string()));
    }

    #[test]
    fn test_device_kind_round_trips_through_display() {
        for kind in [DeviceKind::Server, DeviceKind::Network, DeviceKind::Storage] {
            assert_eq!(kind.to_string().parse::<DeviceKind>(), Ok(kind));
        }
    }

    // ── Serde shapes ──────────────────────────────────────────────────────────

    #[test]
    fn test_device_deserializes_from_service_json() {
        let json = r#"{
            "id": 3,
            "rack_id": 1,
            "name": "core-switch",
            "icon": "🔀",
            "type": "network",
            "position_u": 25,
            "size_u": 1,
            "status": "online",
            "ip_address": "10.0.0.2",
            "specs": {"ports": "48x SFP+"}
        }"#;
        let dev: Device = serde_json::from_str(json).unwrap();
        assert_eq!(dev.kind, DeviceKind::Network);
        assert_eq!(dev.status, HealthStatus::Online);
        assert_eq!(dev.specs.get("ports").map(String::as_str), Some("48x SFP+"));
        assert_eq!(dev.model, None);
    }

    #[test]
    fn test_unrecognised_status_degrades_to_unknown() {
        let json = r#"{
            "id": 4,
            "rack_id": 1,
            "name": "mystery",
            "type": "server",
            "position_u": 1,
            "size_u": 1,
            "status": "flaky"
        }"#;
        let dev: Device = serde_json::from_str(json).unwrap();
        assert_eq!(dev.status, HealthStatus::Unknown);
    }

    #[test]
    fn test_missing_optional_fields_take_defaults() {
        let json = r#"{
            "id": 5,
            "rack_id": 2,
            "name": "bare",
            "type": "storage",
            "position_u": 4,
            "size_u": 2
        }"#;
        let dev: Device = serde_json::from_str(json).unwrap();
        assert_eq!(dev.status, HealthStatus::Unknown);
        assert_eq!(dev.icon, "");
        assert!(dev.specs.is_empty());
    }

    #[test]
    fn test_connection_tolerates_absent_labels() {
        let json = r#"{"id": 9, "source_device_id": 1, "target_device_id": 2}"#;
        let conn: Connection = serde_json::from_str(json).unwrap();
        assert_eq!(conn.speed, "");
        assert_eq!(conn.connection_type, "");
        assert_eq!(conn.port_info, "");
    }
}
