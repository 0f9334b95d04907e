//! Command bridge: exposes application-layer operations to a UI shell.
//!
//! All command functions live here and delegate to the shared [`AppState`].
//! The binary's snapshot mode and the integration tests are today's
//! consumers; a desktop shell or web front end would register these same
//! functions as its command handlers.  The bridge is the only module that
//! turns domain types into view models; it must NOT be imported by the
//! application layer.
//!
//! # Data Transfer Objects (DTOs)
//!
//! The application layer works with internal types (`Device`, `TopoGraph`,
//! `PlacementPreview`) that carry more than a front end needs and, in some
//! cases, non-JSON-friendly shapes.  DTOs are simple structs that:
//!
//! - Contain only JSON-serialisable fields (`String`, `f64`, `bool`, ids).
//! - Are defined with `#[derive(Serialize, Deserialize)]` so any shell can
//!   convert them to/from JSON mechanically.
//! - Pre-compute display attributes (status colour classes, row heights,
//!   label repetition) so the front end never re-implements domain rules.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>` so
//! every response has the same shape:
//! `{ success: bool, data: T | null, error: string | null }`.
//! A front end can always check `result.success` without wrapping the call
//! in a try/catch.
//!
//! # Locking
//!
//! `AppState` fields are `tokio::sync::Mutex`es.  Commands that need more
//! than one lock acquire them in field-declaration order (snapshot,
//! placement, topology, config) and drop each as early as possible; the
//! inventory snapshot is cheap to clone, so use-case calls work on a clone
//! rather than holding the snapshot lock across an await.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use rackmap_core::{
    elevation_rows, label_placement, Connection, ConnectionId, Device, DeviceId, ElevationRow,
    HealthStatus, LabelPlacement, PlacementPreview, Point, PositionCache, Rack, RackId, TopoEdge,
    TopoNode, ViewMode,
};

use crate::application::gateway::{ConnectionUpdate, GatewayError, InventoryGateway};
use crate::application::map_topology::{ConnectionLabels, MapTopologyUseCase, TopologyView};
use crate::application::place_device::{DropReport, PlaceDeviceUseCase};
use crate::application::sync_inventory::{InventorySnapshot, SyncInventoryUseCase};
use crate::infrastructure::storage::config::AppConfig;
use crate::infrastructure::storage::positions::save_positions;

// ── Shared application state ──────────────────────────────────────────────────

/// Application state shared between commands.
///
/// Wrapped in `Arc<>` by [`AppState::new`]; every command takes the `Arc`
/// and locks only the fields it needs.  The mutexes are async (Tokio) ones
/// because commands run on the async runtime and several hold a lock across
/// a gateway await.
pub struct AppState {
    /// Full-reload use case; stateless besides the gateway handle.
    pub sync: SyncInventoryUseCase,
    /// Latest inventory read, replaced wholesale on every refresh.
    pub snapshot: Mutex<InventorySnapshot>,
    /// Drag gesture state and the move-commit path.
    pub placement: Mutex<PlaceDeviceUseCase>,
    /// Topology view mode, position cache, and the connect flow.
    pub topology: Mutex<MapTopologyUseCase>,
    /// Current application configuration.
    pub config: Mutex<AppConfig>,
    /// Where pinned positions are persisted; `None` disables persistence
    /// (tests, or a platform without a config directory).
    positions_path: Option<PathBuf>,
}

impl AppState {
    /// Wires the use cases around one shared gateway.
    ///
    /// `cache` is the position store loaded at startup; `positions_path` is
    /// where changes to it are written back.
    pub fn new(
        gateway: Arc<dyn InventoryGateway>,
        config: AppConfig,
        cache: PositionCache,
        positions_path: Option<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sync: SyncInventoryUseCase::new(Arc::clone(&gateway)),
            snapshot: Mutex::new(InventorySnapshot::default()),
            placement: Mutex::new(PlaceDeviceUseCase::new(
                Arc::clone(&gateway),
                config.elevation.unit_height_px,
            )),
            topology: Mutex::new(MapTopologyUseCase::new(
                gateway,
                cache,
                config.topology.default_view,
            )),
            config: Mutex::new(config),
            positions_path,
        })
    }

    /// Re-fetches the inventory and replaces the shared snapshot.
    ///
    /// Every mutation command calls this instead of patching the snapshot
    /// locally, so the views always show what the service actually stored.
    async fn refresh_snapshot(&self) -> Result<InventorySnapshot, GatewayError> {
        let fresh = self.sync.refresh().await?;
        *self.snapshot.lock().await = fresh.clone();
        Ok(fresh)
    }

    /// Writes the topology position cache to disk, if persistence is
    /// configured.  Failures are logged and swallowed; the in-memory cache
    /// stays authoritative for the session.
    fn persist_positions(&self, cache: &PositionCache) {
        let Some(path) = &self.positions_path else {
            return;
        };
        if let Err(e) = save_positions(path, cache) {
            warn!(error = %e, "failed to persist topology positions");
        }
    }
}

// ── Data Transfer Objects (Presentation layer) ────────────────────────────────

/// CSS colour class for a health status.
fn status_colour(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Online => "green",
        HealthStatus::Warning => "amber",
        HealthStatus::Offline => "red",
        HealthStatus::Unknown => "grey",
    }
}

/// DTO for one rack in the rack list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RackDto {
    pub id: RackId,
    pub name: String,
    pub description: String,
    pub size_u: u32,
    /// Number of devices currently mounted in this rack.
    pub device_count: usize,
}

/// DTO for one device, shared by the elevation and detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDto {
    pub id: DeviceId,
    pub rack_id: RackId,
    pub name: String,
    pub icon: String,
    pub kind: String,
    pub position_u: u32,
    pub size_u: u32,
    pub status: String,
    /// Colour class derived from `status`: green, amber, red, or grey.
    pub status_colour: String,
    pub model: Option<String>,
    pub ip_address: Option<String>,
}

impl From<&Device> for DeviceDto {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id,
            rack_id: d.rack_id,
            name: d.name.clone(),
            icon: d.icon.clone(),
            kind: d.kind.label().to_string(),
            position_u: d.position_u,
            size_u: d.size_u,
            status: d.status.label().to_string(),
            status_colour: status_colour(d.status).to_string(),
            model: d.model.clone(),
            ip_address: d.ip_address.clone(),
        }
    }
}

/// DTO for one row of the top-down elevation view.
///
/// `device` is `None` for an empty mounting slot.  `top_u` is the row's
/// highest unit; an empty row always spans exactly one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationRowDto {
    pub device: Option<DeviceDto>,
    pub top_u: u32,
    pub span_u: u32,
    pub height_px: f64,
    /// True when the label should repeat top/middle/bottom instead of a
    /// single centred label.  Always false for empty rows.
    pub repeat_label: bool,
}

/// DTO for one rack's full elevation rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationDto {
    pub rack: RackDto,
    /// Rows top-down, highest unit first.
    pub rows: Vec<ElevationRowDto>,
    pub unit_height_px: f64,
    pub total_height_px: f64,
}

/// DTO for the candidate slot under the pointer during a drag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementPreviewDto {
    pub rack_id: RackId,
    pub top_u: u32,
    pub bottom_u: i64,
    pub valid: bool,
}

impl From<PlacementPreview> for PlacementPreviewDto {
    fn from(p: PlacementPreview) -> Self {
        Self {
            rack_id: p.rack_id,
            top_u: p.top_u,
            bottom_u: p.bottom_u,
            valid: p.valid,
        }
    }
}

/// DTO describing how a drag gesture ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropReportDto {
    /// `"committed"`, `"rejected"`, or `"cancelled"`.
    pub outcome: String,
    /// The moved device as stored by the service; only for a commit.
    pub device: Option<DeviceDto>,
    /// The rack that refused the drop; only for a rejection.
    pub rejected_rack_id: Option<RackId>,
}

impl From<&DropReport> for DropReportDto {
    fn from(report: &DropReport) -> Self {
        match report {
            DropReport::Committed { device, .. } => Self {
                outcome: "committed".to_string(),
                device: Some(DeviceDto::from(device)),
                rejected_rack_id: None,
            },
            DropReport::Rejected { rack_id, .. } => Self {
                outcome: "rejected".to_string(),
                device: None,
                rejected_rack_id: Some(*rack_id),
            },
            DropReport::Cancelled => Self {
                outcome: "cancelled".to_string(),
                device: None,
                rejected_rack_id: None,
            },
        }
    }
}

/// DTO for one node on the topology canvas, coordinate included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopoNodeDto {
    pub device_id: DeviceId,
    pub name: String,
    pub kind: String,
    pub status: String,
    pub status_colour: String,
    pub rack_id: RackId,
    pub rack_name: Option<String>,
    /// True when any of this node's links crosses racks.
    pub inter_rack: bool,
    pub x: f64,
    pub y: f64,
    /// True when this node is the chosen source of the connect flow.
    pub selected: bool,
    /// True when a connect flow is armed and clicking this node would
    /// complete it.
    pub pending_connection_target: bool,
}

/// DTO for one styled edge on the topology canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopoEdgeDto {
    pub connection_id: ConnectionId,
    pub source: DeviceId,
    pub target: DeviceId,
    pub inter_rack: bool,
    /// Stroke colour as a CSS hex string.
    pub color: String,
    pub width: f64,
    pub dashed: bool,
    pub connection_type: String,
    pub port_info: String,
    pub speed: String,
}

/// DTO for one rendered topology frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyViewDto {
    /// `"grid"` or `"tree"`.
    pub view_mode: String,
    /// Front-end sizing hint from config; the engines do not consume it.
    pub canvas_width_px: u32,
    pub nodes: Vec<TopoNodeDto>,
    pub edges: Vec<TopoEdgeDto>,
}

/// DTO for one network connection record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub id: ConnectionId,
    pub source_device_id: DeviceId,
    pub target_device_id: DeviceId,
    pub connection_type: String,
    pub port_info: String,
    pub speed: String,
}

impl From<&Connection> for ConnectionDto {
    fn from(c: &Connection) -> Self {
        Self {
            id: c.id,
            source_device_id: c.source_device_id,
            target_device_id: c.target_device_id,
            connection_type: c.connection_type.clone(),
            port_info: c.port_info.clone(),
            speed: c.speed.clone(),
        }
    }
}

/// DTO for the labels entered in the connection form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionLabelsDto {
    #[serde(default)]
    pub connection_type: String,
    #[serde(default)]
    pub port_info: String,
    #[serde(default)]
    pub speed: String,
}

/// DTO summarising a refresh: record counts only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummaryDto {
    pub racks: usize,
    pub devices: usize,
    pub connections: usize,
}

/// Unified response wrapper used by all commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── View-model assembly ───────────────────────────────────────────────────────

fn rack_dto(rack: &Rack, snapshot: &InventorySnapshot) -> RackDto {
    RackDto {
        id: rack.id,
        name: rack.name.clone(),
        description: rack.description.clone(),
        size_u: rack.size_u,
        device_count: snapshot.devices_in_rack(rack.id).count(),
    }
}

fn elevation_row_dto(
    row: &ElevationRow,
    snapshot: &InventorySnapshot,
    unit_height_px: f64,
) -> ElevationRowDto {
    match row {
        ElevationRow::Device {
            device_id,
            top_u,
            span_u,
        } => ElevationRowDto {
            device: snapshot.device(*device_id).map(DeviceDto::from),
            top_u: *top_u,
            span_u: *span_u,
            height_px: f64::from(*span_u) * unit_height_px,
            repeat_label: label_placement(*span_u) == LabelPlacement::TopMiddleBottom,
        },
        ElevationRow::Empty { unit_u } => ElevationRowDto {
            device: None,
            top_u: *unit_u,
            span_u: 1,
            height_px: unit_height_px,
            repeat_label: false,
        },
    }
}

fn topo_node_dto(
    node: &TopoNode,
    view: &TopologyView,
    connect_source: Option<DeviceId>,
) -> TopoNodeDto {
    let position = view
        .positions
        .get(&node.device_id)
        .copied()
        .unwrap_or(Point { x: 0.0, y: 0.0 });
    let selected = connect_source == Some(node.device_id);
    TopoNodeDto {
        device_id: node.device_id,
        name: node.name.clone(),
        kind: node.kind.label().to_string(),
        status: node.status.label().to_string(),
        status_colour: status_colour(node.status).to_string(),
        rack_id: node.rack_id,
        rack_name: node.rack_name.clone(),
        inter_rack: node.inter_rack,
        x: position.x,
        y: position.y,
        selected,
        pending_connection_target: connect_source.is_some() && !selected,
    }
}

fn topo_edge_dto(edge: &TopoEdge, snapshot: &InventorySnapshot) -> TopoEdgeDto {
    // Display labels live on the connection record; join by id.
    let labels = snapshot.connection(edge.connection_id);
    TopoEdgeDto {
        connection_id: edge.connection_id,
        source: edge.source,
        target: edge.target,
        inter_rack: edge.inter_rack,
        color: edge.style.color.to_string(),
        width: edge.style.width,
        dashed: edge.style.dashed,
        connection_type: labels.map(|c| c.connection_type.clone()).unwrap_or_default(),
        port_info: labels.map(|c| c.port_info.clone()).unwrap_or_default(),
        speed: labels.map(|c| c.speed.clone()).unwrap_or_default(),
    }
}

fn topology_view_dto(
    view: &TopologyView,
    snapshot: &InventorySnapshot,
    connect_source: Option<DeviceId>,
    canvas_width_px: u32,
) -> TopologyViewDto {
    TopologyViewDto {
        view_mode: view.view_mode.label().to_string(),
        canvas_width_px,
        nodes: view
            .graph
            .nodes
            .iter()
            .map(|n| topo_node_dto(n, view, connect_source))
            .collect(),
        edges: view
            .graph
            .edges
            .iter()
            .map(|e| topo_edge_dto(e, snapshot))
            .collect(),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Re-fetches racks, devices, and connections from the service and replaces
/// the shared snapshot.  Call once at startup and after external changes.
pub async fn refresh_inventory(state: Arc<AppState>) -> CommandResult<InventorySummaryDto> {
    match state.refresh_snapshot().await {
        Ok(snapshot) => CommandResult::ok(InventorySummaryDto {
            racks: snapshot.racks.len(),
            devices: snapshot.devices.len(),
            connections: snapshot.connections.len(),
        }),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Returns all racks with their device counts.
pub async fn get_racks(state: Arc<AppState>) -> CommandResult<Vec<RackDto>> {
    let snapshot = state.snapshot.lock().await;
    let dtos = snapshot
        .racks
        .iter()
        .map(|r| rack_dto(r, &snapshot))
        .collect();
    CommandResult::ok(dtos)
}

/// Returns the top-down elevation rendering of one rack.
///
/// While a drag is in progress the dragged device's old span renders as
/// empty slots, so it is never drawn twice.
pub async fn get_elevation(state: Arc<AppState>, rack_id: RackId) -> CommandResult<ElevationDto> {
    let snapshot = state.snapshot.lock().await.clone();
    let suppress = state.placement.lock().await.suppressed_device();
    let unit_height_px = state.config.lock().await.elevation.unit_height_px;

    let Some(rack) = snapshot.rack(rack_id) else {
        return CommandResult::err(format!("unknown rack: {rack_id}"));
    };

    let rows: Vec<ElevationRowDto> = elevation_rows(rack, &snapshot.devices, suppress)
        .iter()
        .map(|row| elevation_row_dto(row, &snapshot, unit_height_px))
        .collect();

    CommandResult::ok(ElevationDto {
        rack: rack_dto(rack, &snapshot),
        rows,
        unit_height_px,
        total_height_px: f64::from(rack.size_u) * unit_height_px,
    })
}

/// Starts dragging a device.
pub async fn begin_drag(state: Arc<AppState>, device_id: DeviceId) -> CommandResult<()> {
    let snapshot = state.snapshot.lock().await.clone();
    let mut placement = state.placement.lock().await;
    match placement.begin_drag(&snapshot, device_id) {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Pointer moved over a rack during a drag; returns the validated candidate
/// slot, or `None` when there is nothing to preview.
pub async fn preview_drag(
    state: Arc<AppState>,
    rack_id: RackId,
    pointer_y_px: f64,
) -> CommandResult<Option<PlacementPreviewDto>> {
    let snapshot = state.snapshot.lock().await.clone();
    let mut placement = state.placement.lock().await;
    let preview = placement.drag_over(&snapshot, rack_id, pointer_y_px);
    CommandResult::ok(preview.map(PlacementPreviewDto::from))
}

/// Pointer left every rack surface; the gesture continues with no candidate.
pub async fn drag_leave(state: Arc<AppState>) -> CommandResult<()> {
    state.placement.lock().await.drag_out();
    CommandResult::ok(())
}

/// Aborts the current drag gesture without emitting anything.
pub async fn cancel_drag(state: Arc<AppState>) -> CommandResult<()> {
    state.placement.lock().await.cancel_drag();
    CommandResult::ok(())
}

/// Pointer released over a rack: resolves the gesture, commits a valid move
/// through the gateway, and refreshes the snapshot on a commit.
pub async fn drop_device(state: Arc<AppState>, rack_id: RackId) -> CommandResult<DropReportDto> {
    let snapshot = state.snapshot.lock().await.clone();
    let report = {
        let mut placement = state.placement.lock().await;
        match placement.drop_on(&snapshot, rack_id).await {
            Ok(report) => report,
            Err(e) => return CommandResult::err(e.to_string()),
        }
    };

    if matches!(report, DropReport::Committed { .. }) {
        if let Err(e) = state.refresh_snapshot().await {
            return CommandResult::err(format!("move stored but refresh failed: {e}"));
        }
    }
    CommandResult::ok(DropReportDto::from(&report))
}

/// Creates a device in an empty slot with the stock defaults, then
/// refreshes the snapshot.
pub async fn create_device_at(
    state: Arc<AppState>,
    rack_id: RackId,
    position_u: u32,
    name: String,
) -> CommandResult<DeviceDto> {
    let created = {
        let placement = state.placement.lock().await;
        match placement.create_at(rack_id, position_u, name).await {
            Ok(device) => device,
            Err(e) => return CommandResult::err(e.to_string()),
        }
    };

    if let Err(e) = state.refresh_snapshot().await {
        return CommandResult::err(format!("device created but refresh failed: {e}"));
    }
    CommandResult::ok(DeviceDto::from(&created))
}

/// Renders the topology in the current view mode.
///
/// Newly adopted engine coordinates are persisted so the next session
/// starts from the same picture.
pub async fn get_topology(state: Arc<AppState>) -> CommandResult<TopologyViewDto> {
    let snapshot = state.snapshot.lock().await.clone();
    let mut topology = state.topology.lock().await;
    let canvas_width_px = state.config.lock().await.topology.canvas_width_px;

    let view = topology.render(&snapshot);
    state.persist_positions(topology.cache());
    CommandResult::ok(topology_view_dto(
        &view,
        &snapshot,
        topology.connection_source(),
        canvas_width_px,
    ))
}

/// Switches between the grid and tree layouts and returns the re-rendered
/// frame.  `mode` is `"grid"` or `"tree"`.
pub async fn set_view_mode(state: Arc<AppState>, mode: String) -> CommandResult<TopologyViewDto> {
    let parsed: ViewMode = match mode.parse() {
        Ok(m) => m,
        Err(e) => return CommandResult::err(e.to_string()),
    };

    let snapshot = state.snapshot.lock().await.clone();
    let mut topology = state.topology.lock().await;
    let canvas_width_px = state.config.lock().await.topology.canvas_width_px;

    topology.set_view_mode(parsed);
    let view = topology.render(&snapshot);
    state.persist_positions(topology.cache());
    CommandResult::ok(topology_view_dto(
        &view,
        &snapshot,
        topology.connection_source(),
        canvas_width_px,
    ))
}

/// Records a hand-placed coordinate for a node in the current view mode and
/// persists it.
pub async fn pin_node(
    state: Arc<AppState>,
    device_id: DeviceId,
    x: f64,
    y: f64,
) -> CommandResult<()> {
    let mut topology = state.topology.lock().await;
    topology.pin_node(device_id, Point { x, y });
    state.persist_positions(topology.cache());
    CommandResult::ok(())
}

/// First click of the connect flow: arms the gesture with a source device.
pub async fn select_connection_source(
    state: Arc<AppState>,
    device_id: DeviceId,
) -> CommandResult<()> {
    let snapshot = state.snapshot.lock().await.clone();
    let mut topology = state.topology.lock().await;
    match topology.select_connection_source(&snapshot, device_id) {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Disarms the connect flow without creating anything.
pub async fn clear_connection_source(state: Arc<AppState>) -> CommandResult<()> {
    state.topology.lock().await.clear_connection_source();
    CommandResult::ok(())
}

/// Second click of the connect flow: creates the connection from the armed
/// source to `target_id` and refreshes the snapshot.
pub async fn complete_connection(
    state: Arc<AppState>,
    target_id: DeviceId,
    labels: ConnectionLabelsDto,
) -> CommandResult<ConnectionDto> {
    let snapshot = state.snapshot.lock().await.clone();
    let created = {
        let mut topology = state.topology.lock().await;
        let labels = ConnectionLabels {
            connection_type: labels.connection_type,
            port_info: labels.port_info,
            speed: labels.speed,
        };
        match topology.complete_connection(&snapshot, target_id, labels).await {
            Ok(connection) => connection,
            Err(e) => return CommandResult::err(e.to_string()),
        }
    };

    if let Err(e) = state.refresh_snapshot().await {
        return CommandResult::err(format!("connection stored but refresh failed: {e}"));
    }
    CommandResult::ok(ConnectionDto::from(&created))
}

/// Rewrites a connection's labels from the edit form and refreshes the
/// snapshot.
pub async fn update_connection(
    state: Arc<AppState>,
    connection_id: ConnectionId,
    labels: ConnectionLabelsDto,
) -> CommandResult<ConnectionDto> {
    let snapshot = state.snapshot.lock().await.clone();
    let updated = {
        let topology = state.topology.lock().await;
        let update = ConnectionUpdate {
            connection_type: Some(labels.connection_type),
            port_info: Some(labels.port_info),
            speed: Some(labels.speed),
        };
        match topology.relabel_connection(&snapshot, connection_id, update).await {
            Ok(connection) => connection,
            Err(e) => return CommandResult::err(e.to_string()),
        }
    };

    if let Err(e) = state.refresh_snapshot().await {
        return CommandResult::err(format!("connection updated but refresh failed: {e}"));
    }
    CommandResult::ok(ConnectionDto::from(&updated))
}

/// Deletes a connection and refreshes the snapshot.
pub async fn remove_connection(
    state: Arc<AppState>,
    connection_id: ConnectionId,
) -> CommandResult<()> {
    let snapshot = state.snapshot.lock().await.clone();
    {
        let topology = state.topology.lock().await;
        if let Err(e) = topology.remove_connection(&snapshot, connection_id).await {
            return CommandResult::err(e.to_string());
        }
    }

    if let Err(e) = state.refresh_snapshot().await {
        return CommandResult::err(format!("connection deleted but refresh failed: {e}"));
    }
    CommandResult::ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
