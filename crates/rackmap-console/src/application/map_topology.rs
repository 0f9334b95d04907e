//! Produces the network topology view and manages its interactions.
//!
//! Rendering is a pure pipeline over the current snapshot: build the
//! node/edge graph, run the selected layout engine against the position
//! cache, then adopt any freshly computed coordinates so the next render
//! starts from the same picture.  On top of that sit the two topology
//! interactions: pinning a node the user dragged, and the two-click connect
//! gesture (pick a source, pick a target).

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use rackmap_core::{
    grid_layout, tree_layout, Connection, ConnectionId, DeviceId, Point, PositionCache, TopoGraph,
    ViewMode,
};

use crate::application::gateway::{ConnectionUpdate, GatewayError, InventoryGateway, NewConnection};
use crate::application::sync_inventory::InventorySnapshot;

/// Error type for topology operations.
#[derive(Debug)]
pub enum TopologyError {
    /// A connect endpoint is not in the current snapshot.
    UnknownDevice(DeviceId),

    /// The connection to delete is not in the current snapshot.
    UnknownConnection(ConnectionId),

    /// A link with exactly this (source, target) pair already exists.
    DuplicateConnection { source: DeviceId, target: DeviceId },

    /// Completing a connection with no source selected.
    NoPendingConnection,

    /// The gateway refused or failed the mutation.
    Gateway(GatewayError),
}

// Implemented by hand instead of `derive(Error)`: the `DuplicateConnection`
// field named `source` is a `DeviceId`, which the derive would insist on
// treating as the underlying error cause.
impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDevice(id) => write!(f, "unknown device {id}"),
            Self::UnknownConnection(id) => write!(f, "unknown connection {id}"),
            Self::DuplicateConnection { source, target } => write!(
                f,
                "a connection from device {source} to device {target} already exists"
            ),
            Self::NoPendingConnection => f.write_str("no connection source selected"),
            Self::Gateway(inner) => std::fmt::Display::fmt(inner, f),
        }
    }
}

impl std::error::Error for TopologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gateway(inner) => std::error::Error::source(inner),
            _ => None,
        }
    }
}

impl From<GatewayError> for TopologyError {
    fn from(source: GatewayError) -> Self {
        Self::Gateway(source)
    }
}

/// Optional labels attached when completing a connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionLabels {
    /// Link kind (e.g. "ethernet"); empty when unset.
    pub connection_type: String,
    /// Port annotation; empty when unset.
    pub port_info: String,
    /// Link speed label (e.g. "10GbE"); empty when unset.
    pub speed: String,
}

/// One rendered topology frame: the graph plus a coordinate per node.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyView {
    /// The layout the frame was produced with.
    pub view_mode: ViewMode,
    /// Nodes and styled edges.
    pub graph: TopoGraph,
    /// Final coordinate per node, cache merged with engine output.
    pub positions: BTreeMap<DeviceId, Point>,
}

/// The topology use case: layout selection, position memory, connect flow.
pub struct MapTopologyUseCase {
    gateway: Arc<dyn InventoryGateway>,
    cache: PositionCache,
    view_mode: ViewMode,
    pending_source: Option<DeviceId>,
}

impl MapTopologyUseCase {
    /// Creates the use case with a previously persisted cache (pass an
    /// empty cache on first run).
    pub fn new(gateway: Arc<dyn InventoryGateway>, cache: PositionCache, view_mode: ViewMode) -> Self {
        Self {
            gateway,
            cache,
            view_mode,
            pending_source: None,
        }
    }

    /// The currently selected layout.
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Switches the layout used by the next [`render`](Self::render).
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if mode != self.view_mode {
            debug!(from = %self.view_mode, to = %mode, "view mode switched");
            self.view_mode = mode;
        }
    }

    /// The position cache, for persistence after a write.
    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    /// Builds the graph from `snapshot` and lays it out in the current view
    /// mode.  Freshly computed coordinates are adopted into the cache;
    /// coordinates already cached (user-pinned or adopted earlier) always
    /// win, so re-rendering never moves a node the user has placed.
    pub fn render(&mut self, snapshot: &InventorySnapshot) -> TopologyView {
        let graph = TopoGraph::build(&snapshot.devices, &snapshot.racks, &snapshot.connections);
        let positions = match self.view_mode {
            ViewMode::Grid => grid_layout(&graph.nodes, &self.cache),
            ViewMode::Tree => tree_layout(&graph.nodes, &graph.edges, &self.cache),
        };

        let adopted = self.cache.adopt(self.view_mode, &positions);
        if adopted > 0 {
            debug!(mode = %self.view_mode, adopted, "adopted freshly computed node positions");
        }

        TopologyView { view_mode: self.view_mode, graph, positions }
    }

    /// Records a node coordinate the user dragged to, in the current view
    /// mode.  Pinned coordinates overwrite cached ones and survive
    /// re-layout; the caller should persist the cache afterwards.
    pub fn pin_node(&mut self, device_id: DeviceId, point: Point) {
        debug!(device_id, mode = %self.view_mode, x = point.x, y = point.y, "node pinned");
        self.cache.set(self.view_mode, device_id, point);
    }

    // ── Connect gesture ───────────────────────────────────────────────────────

    /// The device selected as the pending connection source, if any.
    pub fn connection_source(&self) -> Option<DeviceId> {
        self.pending_source
    }

    /// First click of the connect gesture: remember `device_id` as the
    /// source of the connection being drawn.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownDevice`] when the device is not in
    /// the snapshot.
    pub fn select_connection_source(
        &mut self,
        snapshot: &InventorySnapshot,
        device_id: DeviceId,
    ) -> Result<(), TopologyError> {
        if snapshot.device(device_id).is_none() {
            return Err(TopologyError::UnknownDevice(device_id));
        }
        debug!(device_id, "connection source selected");
        self.pending_source = Some(device_id);
        Ok(())
    }

    /// Abandons the connect gesture without creating anything.
    pub fn clear_connection_source(&mut self) {
        self.pending_source = None;
    }

    /// Second click of the connect gesture: create a connection from the
    /// pending source to `target`.  The pending source is cleared on
    /// success and kept on failure, so the user can retry with a different
    /// target.  After a success the caller should refresh the snapshot.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::NoPendingConnection`] with no source selected.
    /// - [`TopologyError::UnknownDevice`] when either endpoint left the
    ///   snapshot.
    /// - [`TopologyError::DuplicateConnection`] when this exact (source,
    ///   target) pair already exists.
    /// - [`TopologyError::Gateway`] when the service refuses the creation.
    pub async fn complete_connection(
        &mut self,
        snapshot: &InventorySnapshot,
        target: DeviceId,
        labels: ConnectionLabels,
    ) -> Result<Connection, TopologyError> {
        let source = self.pending_source.ok_or(TopologyError::NoPendingConnection)?;
        if snapshot.device(source).is_none() {
            return Err(TopologyError::UnknownDevice(source));
        }
        if snapshot.device(target).is_none() {
            return Err(TopologyError::UnknownDevice(target));
        }
        if snapshot.has_connection(source, target) {
            return Err(TopologyError::DuplicateConnection { source, target });
        }

        let connection = self
            .gateway
            .create_connection(NewConnection {
                source_device_id: source,
                target_device_id: target,
                connection_type: labels.connection_type,
                port_info: labels.port_info,
                speed: labels.speed,
            })
            .await?;

        info!(source, target, connection_id = connection.id, "connection created");
        self.pending_source = None;
        Ok(connection)
    }

    /// Rewrites the labels of an existing connection.  After a success the
    /// caller should refresh the snapshot so the edge restyles.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownConnection`] when the id is not in
    /// the snapshot, or [`TopologyError::Gateway`] when the service fails
    /// the update.
    pub async fn relabel_connection(
        &self,
        snapshot: &InventorySnapshot,
        connection_id: ConnectionId,
        update: ConnectionUpdate,
    ) -> Result<Connection, TopologyError> {
        if snapshot.connection(connection_id).is_none() {
            return Err(TopologyError::UnknownConnection(connection_id));
        }
        let connection = self.gateway.update_connection(connection_id, update).await?;
        info!(connection_id, "connection labels updated");
        Ok(connection)
    }

    /// Deletes a connection.  After a success the caller should refresh the
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownConnection`] when the id is not in
    /// the snapshot, or [`TopologyError::Gateway`] when the service fails
    /// the deletion.
    pub async fn remove_connection(
        &self,
        snapshot: &InventorySnapshot,
        connection_id: ConnectionId,
    ) -> Result<(), TopologyError> {
        if snapshot.connection(connection_id).is_none() {
            return Err(TopologyError::UnknownConnection(connection_id));
        }
        self.gateway.delete_connection(connection_id).await?;
        info!(connection_id, "connection deleted");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gateway::NewDevice;
    use async_trait::async_trait;
    use rackmap_core::{Device, DeviceKind, HealthStatus, MoveCommand, Rack, RackId};
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    /// Gateway fake that records connection mutations.
    #[derive(Default)]
    struct RecordingGateway {
        connected: Mutex<Vec<NewConnection>>,
        relabelled: Mutex<Vec<(ConnectionId, ConnectionUpdate)>>,
        deleted: Mutex<Vec<ConnectionId>>,
    }

    #[async_trait]
    impl InventoryGateway for RecordingGateway {
        async fn fetch_racks(&self) -> Result<Vec<Rack>, GatewayError> {
            unimplemented!("not exercised by these tests")
        }

        async fn fetch_devices(
            &self,
            _rack_id: Option<RackId>,
        ) -> Result<Vec<Device>, GatewayError> {
            unimplemented!("not exercised by these tests")
        }

        async fn fetch_connections(&self) -> Result<Vec<Connection>, GatewayError> {
            unimplemented!("not exercised by these tests")
        }

        async fn create_device(&self, _device: NewDevice) -> Result<Device, GatewayError> {
            unimplemented!("not exercised by these tests")
        }

        async fn update_device_position(
            &self,
            _command: MoveCommand,
        ) -> Result<Device, GatewayError> {
            unimplemented!("not exercised by these tests")
        }

        async fn create_connection(
            &self,
            connection: NewConnection,
        ) -> Result<Connection, GatewayError> {
            let stored = Connection {
                id: 500,
                source_device_id: connection.source_device_id,
                target_device_id: connection.target_device_id,
                connection_type: connection.connection_type.clone(),
                port_info: connection.port_info.clone(),
                speed: connection.speed.clone(),
            };
            self.connected.lock().unwrap().push(connection);
            Ok(stored)
        }

        async fn update_connection(
            &self,
            connection_id: ConnectionId,
            update: ConnectionUpdate,
        ) -> Result<Connection, GatewayError> {
            let stored = Connection {
                id: connection_id,
                source_device_id: 0,
                target_device_id: 0,
                connection_type: update.connection_type.clone().unwrap_or_default(),
                port_info: update.port_info.clone().unwrap_or_default(),
                speed: update.speed.clone().unwrap_or_default(),
            };
            self.relabelled.lock().unwrap().push((connection_id, update));
            Ok(stored)
        }

        async fn delete_connection(&self, connection_id: ConnectionId) -> Result<(), GatewayError> {
            self.deleted.lock().unwrap().push(connection_id);
            Ok(())
        }
    }

    fn make_device(id: DeviceId, rack_id: RackId, position_u: u32) -> Device {
        Device {
            id,
            rack_id,
            name: format!("dev-{id}"),
            icon: String::new(),
            kind: DeviceKind::Server,
            position_u,
            size_u: 1,
            status: HealthStatus::Online,
            model: None,
            ip_address: None,
            health_check_url: None,
            specs: std::collections::BTreeMap::new(),
        }
    }

    fn make_connection(id: ConnectionId, source: DeviceId, target: DeviceId) -> Connection {
        Connection {
            id,
            source_device_id: source,
            target_device_id: target,
            connection_type: String::new(),
            port_info: String::new(),
            speed: String::new(),
        }
    }

    fn make_rack(id: RackId) -> Rack {
        Rack {
            id,
            name: format!("rack-{id}"),
            description: String::new(),
            size_u: 25,
        }
    }

    fn make_use_case(view_mode: ViewMode) -> (MapTopologyUseCase, Arc<RecordingGateway>) {
        let gateway = Arc::new(RecordingGateway::default());
        let uc = MapTopologyUseCase::new(
            Arc::clone(&gateway) as Arc<dyn InventoryGateway>,
            PositionCache::new(),
            view_mode,
        );
        (uc, gateway)
    }

    /// Three devices in one rack, chained 1 -> 2 -> 3.
    fn make_chain_snapshot() -> InventorySnapshot {
        InventorySnapshot {
            racks: vec![make_rack(1)],
            devices: vec![make_device(1, 1, 10), make_device(2, 1, 8), make_device(3, 1, 6)],
            connections: vec![make_connection(100, 1, 2), make_connection(101, 2, 3)],
        }
    }

    // ── render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_grid_render_seeds_every_node_and_fills_the_cache() {
        let (mut uc, _) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();

        let view = uc.render(&snapshot);

        assert_eq!(view.view_mode, ViewMode::Grid);
        assert_eq!(view.graph.nodes.len(), 3);
        assert_eq!(view.positions.len(), 3);
        // Engine output was adopted, so the next render reuses it.
        assert_eq!(uc.cache().len(ViewMode::Grid), 3);
    }

    #[test]
    fn test_pinned_position_survives_re_render() {
        let (mut uc, _) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();
        uc.render(&snapshot);

        uc.pin_node(2, Point::new(555.0, 444.0));
        let view = uc.render(&snapshot);

        assert_eq!(view.positions[&2], Point::new(555.0, 444.0));
    }

    #[test]
    fn test_tree_render_levels_the_chain_top_down() {
        let (mut uc, _) = make_use_case(ViewMode::Tree);
        let snapshot = make_chain_snapshot();

        let view = uc.render(&snapshot);

        // 1 -> 2 -> 3 stacks straight down one level step apart.
        assert_eq!(view.positions[&1], Point::new(80.0, 80.0));
        assert_eq!(view.positions[&2], Point::new(80.0, 230.0));
        assert_eq!(view.positions[&3], Point::new(80.0, 380.0));
    }

    #[test]
    fn test_tree_render_is_idempotent_once_cached() {
        let (mut uc, _) = make_use_case(ViewMode::Tree);
        let snapshot = make_chain_snapshot();

        let first = uc.render(&snapshot);
        let second = uc.render(&snapshot);

        assert_eq!(first.positions, second.positions);
    }

    #[test]
    fn test_pin_in_grid_mode_does_not_leak_into_tree_mode() {
        let (mut uc, _) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();
        uc.render(&snapshot);
        uc.pin_node(1, Point::new(999.0, 999.0));

        uc.set_view_mode(ViewMode::Tree);
        let view = uc.render(&snapshot);

        assert_eq!(view.positions[&1], Point::new(80.0, 80.0));
    }

    // ── Connect gesture ───────────────────────────────────────────────────────

    #[test]
    fn test_select_connection_source_requires_a_known_device() {
        let (mut uc, _) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();

        let result = uc.select_connection_source(&snapshot, 42);

        assert!(matches!(result, Err(TopologyError::UnknownDevice(42))));
        assert_eq!(uc.connection_source(), None);
    }

    #[tokio::test]
    async fn test_complete_connection_without_source_is_an_error() {
        let (mut uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();

        let result = uc.complete_connection(&snapshot, 2, ConnectionLabels::default()).await;

        assert!(matches!(result, Err(TopologyError::NoPendingConnection)));
        assert!(gateway.connected.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_gesture_creates_and_clears_the_source() {
        // Arrange
        let (mut uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();
        uc.select_connection_source(&snapshot, 3).unwrap();

        // Act – connect 3 -> 1 with a speed label
        let labels = ConnectionLabels { speed: "10GbE".to_string(), ..Default::default() };
        let connection = uc.complete_connection(&snapshot, 1, labels).await.unwrap();

        // Assert
        assert_eq!(connection.source_device_id, 3);
        assert_eq!(connection.target_device_id, 1);
        assert_eq!(uc.connection_source(), None, "gesture is over after success");
        let sent = gateway.connected.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].speed, "10GbE");
    }

    #[tokio::test]
    async fn test_duplicate_pair_is_rejected_before_the_gateway() {
        let (mut uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot(); // already has 1 -> 2
        uc.select_connection_source(&snapshot, 1).unwrap();

        let result = uc.complete_connection(&snapshot, 2, ConnectionLabels::default()).await;

        assert!(matches!(
            result,
            Err(TopologyError::DuplicateConnection { source: 1, target: 2 })
        ));
        assert!(gateway.connected.lock().unwrap().is_empty());
        // The source stays selected so the user can pick another target.
        assert_eq!(uc.connection_source(), Some(1));
    }

    #[tokio::test]
    async fn test_reverse_direction_of_an_existing_pair_is_allowed() {
        let (mut uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot(); // has 1 -> 2, not 2 -> 1
        uc.select_connection_source(&snapshot, 2).unwrap();

        let connection = uc
            .complete_connection(&snapshot, 1, ConnectionLabels::default())
            .await
            .unwrap();

        assert_eq!(connection.source_device_id, 2);
        assert_eq!(gateway.connected.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_connection_to_unknown_target_is_an_error() {
        let (mut uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();
        uc.select_connection_source(&snapshot, 1).unwrap();

        let result = uc.complete_connection(&snapshot, 42, ConnectionLabels::default()).await;

        assert!(matches!(result, Err(TopologyError::UnknownDevice(42))));
        assert!(gateway.connected.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_connection_source_abandons_the_gesture() {
        let (mut uc, _) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();
        uc.select_connection_source(&snapshot, 1).unwrap();

        uc.clear_connection_source();

        assert_eq!(uc.connection_source(), None);
    }

    // ── relabel_connection ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_relabel_connection_sends_only_the_changed_labels() {
        // Arrange
        let (uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();
        let update = ConnectionUpdate {
            speed: Some("100GbE".to_string()),
            ..ConnectionUpdate::default()
        };

        // Act
        let connection = uc.relabel_connection(&snapshot, 100, update).await.unwrap();

        // Assert
        assert_eq!(connection.speed, "100GbE");
        let sent = gateway.relabelled.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 100);
        assert_eq!(sent[0].1.speed.as_deref(), Some("100GbE"));
        assert_eq!(sent[0].1.connection_type, None);
    }

    #[tokio::test]
    async fn test_relabel_unknown_connection_is_an_error() {
        let (uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();

        let result = uc.relabel_connection(&snapshot, 999, ConnectionUpdate::default()).await;

        assert!(matches!(result, Err(TopologyError::UnknownConnection(999))));
        assert!(gateway.relabelled.lock().unwrap().is_empty());
    }

    // ── remove_connection ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_remove_connection_deletes_through_the_gateway() {
        let (uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();

        uc.remove_connection(&snapshot, 100).await.unwrap();

        assert_eq!(*gateway.deleted.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn test_remove_unknown_connection_is_an_error() {
        let (uc, gateway) = make_use_case(ViewMode::Grid);
        let snapshot = make_chain_snapshot();

        let result = uc.remove_connection(&snapshot, 999).await;

        assert!(matches!(result, Err(TopologyError::UnknownConnection(999))));
        assert!(gateway.deleted.lock().unwrap().is_empty());
    }
}
