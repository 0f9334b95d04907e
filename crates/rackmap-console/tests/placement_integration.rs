//! Integration tests for the device placement pipeline.
//!
//! These tests exercise the application layer of rackmap-console end-to-end:
//! `SyncInventoryUseCase` + `PlaceDeviceUseCase` over a fake gateway that
//! mutates in-memory records the way the real service would.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rackmap_console::application::gateway::{
    ConnectionUpdate, GatewayError, InventoryGateway, NewConnection, NewDevice,
};
use rackmap_console::application::place_device::{DropReport, PlaceDeviceUseCase};
use rackmap_console::application::sync_inventory::SyncInventoryUseCase;
use rackmap_core::{
    Connection, ConnectionId, Device, DeviceId, DeviceKind, HealthStatus, MoveCommand, Rack,
    RackId, UNIT_HEIGHT_PX,
};

// ── Fake service ──────────────────────────────────────────────────────────────

/// In-memory stand-in for the inventory service.  Mutations change the
/// stored records, so a refresh after a commit observes the move exactly
/// like a real round-trip would.
struct FakeService {
    racks: Mutex<Vec<Rack>>,
    devices: Mutex<Vec<Device>>,
    moves: Mutex<Vec<MoveCommand>>,
    next_id: AtomicI64,
}

impl FakeService {
    fn new(racks: Vec<Rack>, devices: Vec<Device>) -> Arc<Self> {
        Arc::new(Self {
            racks: Mutex::new(racks),
            devices: Mutex::new(devices),
            moves: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(500),
        })
    }

    fn recorded_moves(&self) -> Vec<MoveCommand> {
        self.moves.lock().unwrap().clone()
    }
}

#[async_trait]
impl InventoryGateway for FakeService {
    async fn fetch_racks(&self) -> Result<Vec<Rack>, GatewayError> {
        Ok(self.racks.lock().unwrap().clone())
    }

    async fn fetch_devices(&self, rack_id: Option<RackId>) -> Result<Vec<Device>, GatewayError> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .filter(|d| rack_id.map_or(true, |r| d.rack_id == r))
            .cloned()
            .collect())
    }

    async fn fetch_connections(&self) -> Result<Vec<Connection>, GatewayError> {
        Ok(Vec::new())
    }

    async fn create_device(&self, device: NewDevice) -> Result<Device, GatewayError> {
        let created = Device {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            rack_id: device.rack_id,
            name: device.name,
            icon: device.icon,
            kind: device.kind,
            position_u: device.position_u,
            size_u: device.size_u,
            status: device.status,
            model: None,
            ip_address: None,
            health_check_url: None,
            specs: BTreeMap::new(),
        };
        self.devices.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_device_position(&self, command: MoveCommand) -> Result<Device, GatewayError> {
        self.moves.lock().unwrap().push(command.clone());
        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .iter_mut()
            .find(|d| d.id == command.device_id)
            .ok_or_else(|| GatewayError::Api {
                status: 404,
                message: format!("device {} not found", command.device_id),
            })?;
        device.position_u = command.top_u;
        if let Some(rack_id) = command.rack_id {
            device.rack_id = rack_id;
        }
        Ok(device.clone())
    }

    async fn create_connection(&self, _: NewConnection) -> Result<Connection, GatewayError> {
        unimplemented!("placement tests never create connections")
    }

    async fn update_connection(
        &self,
        _: ConnectionId,
        _: ConnectionUpdate,
    ) -> Result<Connection, GatewayError> {
        unimplemented!("placement tests never update connections")
    }

    async fn delete_connection(&self, _: ConnectionId) -> Result<(), GatewayError> {
        unimplemented!("placement tests never delete connections")
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn make_rack(id: RackId, size_u: u32) -> Rack {
    Rack {
        id,
        name: format!("rack-{id}"),
        description: String::new(),
        size_u,
    }
}

fn make_device(id: DeviceId, rack_id: RackId, position_u: u32, size_u: u32) -> Device {
    Device {
        id,
        rack_id,
        name: format!("dev-{id}"),
        icon: String::new(),
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

/// Pointer offset (from the rack's top edge) that lands in `top_u`.
fn pointer_at(rack_size_u: u32, top_u: u32) -> f64 {
    f64::from((rack_size_u - top_u) * UNIT_HEIGHT_PX) + 1.0
}

const UNIT: f64 = UNIT_HEIGHT_PX as f64;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_drag_gesture_moves_device_and_survives_refresh() {
    // Arrange: a 12U rack with a 2U device parked at the top
    let service = FakeService::new(vec![make_rack(1, 12)], vec![make_device(7, 1, 12, 2)]);
    let sync = SyncInventoryUseCase::new(service.clone() as Arc<dyn InventoryGateway>);
    let mut placement = PlaceDeviceUseCase::new(service.clone() as Arc<dyn InventoryGateway>, UNIT);

    let snapshot = sync.refresh().await.expect("initial load");

    // Act: drag the device down to unit 5 and release
    placement.begin_drag(&snapshot, 7).expect("device exists");
    let preview = placement
        .drag_over(&snapshot, 1, pointer_at(12, 5))
        .expect("a candidate while dragging");
    assert!(preview.valid, "an empty span must preview as valid");
    let report = placement.drop_on(&snapshot, 1).await.expect("commit");

    // Assert: committed in place, visible after a re-fetch
    match report {
        DropReport::Committed { device, moved_rack } => {
            assert_eq!(device.position_u, 5);
            assert!(!moved_rack);
        }
        other => panic!("expected a commit, got {other:?}"),
    }
    let refreshed = sync.refresh().await.expect("refresh");
    assert_eq!(refreshed.device(7).expect("still present").position_u, 5);
    assert_eq!(service.recorded_moves().len(), 1);
}

#[tokio::test]
async fn test_cross_rack_drag_updates_rack_assignment() {
    // Arrange: device 7 lives in rack 1; rack 2 is empty
    let service = FakeService::new(
        vec![make_rack(1, 12), make_rack(2, 12)],
        vec![make_device(7, 1, 12, 2)],
    );
    let sync = SyncInventoryUseCase::new(service.clone() as Arc<dyn InventoryGateway>);
    let mut placement = PlaceDeviceUseCase::new(service.clone() as Arc<dyn InventoryGateway>, UNIT);
    let snapshot = sync.refresh().await.expect("initial load");

    // Act: carry it over to rack 2, unit 3
    placement.begin_drag(&snapshot, 7).expect("device exists");
    placement
        .drag_over(&snapshot, 2, pointer_at(12, 3))
        .expect("a candidate while dragging");
    placement.drop_on(&snapshot, 2).await.expect("commit");

    // Assert: the move carried the new rack id and the store reflects it
    let moves = service.recorded_moves();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].rack_id, Some(2));
    assert_eq!(moves[0].top_u, 3);

    let refreshed = sync.refresh().await.expect("refresh");
    let moved = refreshed.device(7).expect("still present");
    assert_eq!(moved.rack_id, 2);
    assert!(refreshed.devices_in_rack(1).next().is_none());
}

#[tokio::test]
async fn test_drop_on_full_rack_is_rejected_without_a_write() {
    // Arrange: rack 2 is completely filled by one 8U device
    let service = FakeService::new(
        vec![make_rack(1, 12), make_rack(2, 8)],
        vec![make_device(7, 1, 12, 1), make_device(8, 2, 8, 8)],
    );
    let sync = SyncInventoryUseCase::new(service.clone() as Arc<dyn InventoryGateway>);
    let mut placement = PlaceDeviceUseCase::new(service.clone() as Arc<dyn InventoryGateway>, UNIT);
    let snapshot = sync.refresh().await.expect("initial load");

    // Act: hover an occupied slot and release on it
    placement.begin_drag(&snapshot, 7).expect("device exists");
    let preview = placement
        .drag_over(&snapshot, 2, pointer_at(8, 4))
        .expect("a candidate while dragging");
    let report = placement.drop_on(&snapshot, 2).await.expect("resolves");

    // Assert: invalid preview, rejection, and no gateway traffic
    assert!(!preview.valid);
    assert!(matches!(
        report,
        DropReport::Rejected { device_id: 7, rack_id: 2 }
    ));
    assert!(service.recorded_moves().is_empty());

    let refreshed = sync.refresh().await.expect("refresh");
    assert_eq!(refreshed.device(7).expect("unmoved").rack_id, 1);
}

#[tokio::test]
async fn test_cancelled_gesture_leaves_inventory_untouched() {
    // Arrange
    let service = FakeService::new(vec![make_rack(1, 12)], vec![make_device(7, 1, 12, 2)]);
    let sync = SyncInventoryUseCase::new(service.clone() as Arc<dyn InventoryGateway>);
    let mut placement = PlaceDeviceUseCase::new(service.clone() as Arc<dyn InventoryGateway>, UNIT);
    let snapshot = sync.refresh().await.expect("initial load");

    // Act: start a drag, preview a slot, then abort (Escape / drop outside)
    placement.begin_drag(&snapshot, 7).expect("device exists");
    placement.drag_over(&snapshot, 1, pointer_at(12, 4));
    placement.cancel_drag();

    // Assert
    assert!(!placement.is_dragging());
    assert!(service.recorded_moves().is_empty());
    let refreshed = sync.refresh().await.expect("refresh");
    assert_eq!(refreshed.device(7).expect("unmoved").position_u, 12);
}

#[tokio::test]
async fn test_gesture_commits_at_most_once() {
    // Arrange
    let service = FakeService::new(vec![make_rack(1, 12)], vec![make_device(7, 1, 12, 2)]);
    let sync = SyncInventoryUseCase::new(service.clone() as Arc<dyn InventoryGateway>);
    let mut placement = PlaceDeviceUseCase::new(service.clone() as Arc<dyn InventoryGateway>, UNIT);
    let snapshot = sync.refresh().await.expect("initial load");

    placement.begin_drag(&snapshot, 7).expect("device exists");
    placement.drag_over(&snapshot, 1, pointer_at(12, 5));

    // Act: the release event arrives twice (jittery pointer-up handling)
    let first = placement.drop_on(&snapshot, 1).await.expect("commit");
    let second = placement.drop_on(&snapshot, 1).await.expect("resolves");

    // Assert: one command, second release is a no-op cancellation
    assert!(matches!(first, DropReport::Committed { .. }));
    assert!(matches!(second, DropReport::Cancelled));
    assert_eq!(service.recorded_moves().len(), 1);
}

#[tokio::test]
async fn test_click_to_create_then_drag_the_new_device() {
    // Arrange: an empty rack
    let service = FakeService::new(vec![make_rack(1, 12)], vec![]);
    let sync = SyncInventoryUseCase::new(service.clone() as Arc<dyn InventoryGateway>);
    let mut placement = PlaceDeviceUseCase::new(service.clone() as Arc<dyn InventoryGateway>, UNIT);
    let snapshot = sync.refresh().await.expect("initial load");

    // Act: click unit 6 to create, refresh, then drag the newcomer to unit 2
    let created = placement
        .create_at(1, 6, "proxmox-01")
        .await
        .expect("creation");
    let snapshot = sync.refresh().await.expect("refresh after create");

    placement
        .begin_drag(&snapshot, created.id)
        .expect("new device is draggable");
    placement.drag_over(&snapshot, 1, pointer_at(12, 2));
    let report = placement.drop_on(&snapshot, 1).await.expect("commit");

    // Assert: stock creation defaults plus the follow-up move
    assert_eq!(created.size_u, 1);
    assert_eq!(created.status, HealthStatus::Online);
    assert!(matches!(report, DropReport::Committed { .. }));
    let final_state = sync.refresh().await.expect("final refresh");
    assert_eq!(final_state.device(created.id).expect("present").position_u, 2);
}
