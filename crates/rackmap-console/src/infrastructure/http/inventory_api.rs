//! `reqwest` implementation of the [`InventoryGateway`] port.
//!
//! Endpoint map (all bodies JSON):
//!
//! | Operation                | Method & path                          |
//! |--------------------------|----------------------------------------|
//! | `fetch_racks`            | `GET    /api/racks`                    |
//! | `fetch_devices`          | `GET    /api/devices[?rack_id=]`       |
//! | `fetch_connections`      | `GET    /api/network/connections`      |
//! | `create_device`          | `POST   /api/devices`                  |
//! | `update_device_position` | `PUT    /api/devices/{id}`             |
//! | `create_connection`      | `POST   /api/network/connections`      |
//! | `update_connection`      | `PUT    /api/network/connections/{id}` |
//! | `delete_connection`      | `DELETE /api/network/connections/{id}` |
//!
//! The device update is a partial one: the body carries `position_u` always
//! and `rack_id` only when the move crosses racks, so the service keeps
//! every other field untouched.  The connection update is partial the same
//! way: unset label fields never appear in the body.
//!
//! [`InventoryGateway`]: crate::application::gateway::InventoryGateway

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use rackmap_core::{Connection, ConnectionId, Device, MoveCommand, Rack, RackId};

use crate::application::gateway::{
    ConnectionUpdate, GatewayError, InventoryGateway, NewConnection, NewDevice,
};

/// Upper bound on how much of an error body is echoed into a
/// [`GatewayError::Api`] message.
const ERROR_SNIPPET_CHARS: usize = 200;

/// HTTP adapter for the inventory service.
///
/// Holds a single pooled [`reqwest::Client`]; cloning the gateway shares the
/// pool.
#[derive(Debug, Clone)]
pub struct HttpInventoryGateway {
    client: Client,
    base_url: String,
}

impl HttpInventoryGateway {
    /// Creates a gateway for the service at `base_url` (scheme + host + port,
    /// no trailing path) with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Checks the status and decodes a JSON body, classifying each failure
    /// mode into its own [`GatewayError`] variant.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|source| GatewayError::Decode(source.to_string()))
    }

    /// Checks the status of a response whose body we do not need.
    async fn read_empty(response: Response) -> Result<(), GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), response).await);
        }
        Ok(())
    }

    async fn api_error(status: u16, response: Response) -> GatewayError {
        let body = response.text().await.unwrap_or_default();
        let message: String = body.trim().chars().take(ERROR_SNIPPET_CHARS).collect();
        GatewayError::Api { status, message }
    }
}

/// Body for `PUT /api/devices/{id}`.
///
/// `rack_id` is omitted from the JSON entirely for same-rack moves so the
/// service treats the update as partial.
fn move_body(command: &MoveCommand) -> serde_json::Value {
    let mut body = json!({ "position_u": command.top_u });
    if let Some(rack_id) = command.rack_id {
        body["rack_id"] = json!(rack_id);
    }
    body
}

#[async_trait]
impl InventoryGateway for HttpInventoryGateway {
    async fn fetch_racks(&self) -> Result<Vec<Rack>, GatewayError> {
        let response = self
            .client
            .get(self.endpoint("/api/racks"))
            .send()
            .await
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Self::read_json(response).await
    }

    async fn fetch_devices(&self, rack_id: Option<RackId>) -> Result<Vec<Device>, GatewayError> {
        let mut request = self.client.get(self.endpoint("/api/devices"));
        if let Some(rack_id) = rack_id {
            request = request.query(&[("rack_id", rack_id)]);
        }
        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Self::read_json(response).await
    }

    async fn fetch_connections(&self) -> Result<Vec<Connection>, GatewayError> {
        let response = self
            .client
            .get(self.endpoint("/api/network/connections"))
            .send()
            .await
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Self::read_json(response).await
    }

    async fn create_device(&self, device: NewDevice) -> Result<Device, GatewayError> {
        debug!(rack_id = device.rack_id, name = %device.name, "creating device");
        let response = self
            .client
            .post(self.endpoint("/api/devices"))
            .json(&device)
            .send()
            .await
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Self::read_json(response).await
    }

    async fn update_device_position(&self, command: MoveCommand) -> Result<Device, GatewayError> {
        let url = self.endpoint(&format!("/api/devices/{}", command.device_id));
        debug!(device_id = command.device_id, top_u = command.top_u, "updating device position");
        let response = self
            .client
            .put(url)
            .json(&move_body(&command))
            .send()
            .await
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Self::read_json(response).await
    }

    async fn create_connection(
        &self,
        connection: NewConnection,
    ) -> Result<Connection, GatewayError> {
        debug!(
            source = connection.source_device_id,
            target = connection.target_device_id,
            "creating connection"
        );
        let response = self
            .client
            .post(self.endpoint("/api/network/connections"))
            .json(&connection)
            .send()
            .await
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Self::read_json(response).await
    }

    async fn update_connection(
        &self,
        connection_id: ConnectionId,
        update: ConnectionUpdate,
    ) -> Result<Connection, GatewayError> {
        let url = self.endpoint(&format!("/api/network/connections/{connection_id}"));
        debug!(connection_id, "updating connection labels");
        let response = self
            .client
            .put(url)
            .json(&update)
            .send()
            .await
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Self::read_json(response).await
    }

    async fn delete_connection(&self, connection_id: ConnectionId) -> Result<(), GatewayError> {
        let url = self.endpoint(&format!("/api/network/connections/{connection_id}"));
        debug!(connection_id, "deleting connection");
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|source| GatewayError::Transport(source.to_string()))?;
        Self::read_empty(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_gateway(base: &str) -> HttpInventoryGateway {
        HttpInventoryGateway::new(base, Duration::from_secs(5))
            .expect("client builds without a runtime")
    }

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let gateway = make_gateway("http://localhost:8080");

        assert_eq!(gateway.endpoint("/api/racks"), "http://localhost:8080/api/racks");
    }

    #[test]
    fn test_trailing_slash_on_base_url_is_dropped() {
        let gateway = make_gateway("http://rack-host:9000/");

        assert_eq!(
            gateway.endpoint("/api/network/connections"),
            "http://rack-host:9000/api/network/connections"
        );
    }

    #[test]
    fn test_move_body_omits_rack_for_same_rack_moves() {
        let body = move_body(&MoveCommand {
            device_id: 7,
            rack_id: None,
            top_u: 12,
        });

        assert_eq!(body, json!({ "position_u": 12 }));
    }

    #[test]
    fn test_move_body_carries_rack_for_cross_rack_moves() {
        let body = move_body(&MoveCommand {
            device_id: 7,
            rack_id: Some(3),
            top_u: 1,
        });

        assert_eq!(body, json!({ "position_u": 1, "rack_id": 3 }));
    }

    #[test]
    fn test_new_device_body_uses_wire_field_names() {
        let device = NewDevice::at_slot(2, 5, "edge-sw-01");
        let body = serde_json::to_value(&device).expect("serializes");

        assert_eq!(body["rack_id"], 2);
        assert_eq!(body["position_u"], 5);
        assert_eq!(body["type"], "server");
        assert_eq!(body["status"], "online");
    }
}
