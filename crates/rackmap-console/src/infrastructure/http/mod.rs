//! HTTP infrastructure for the console application.
//!
//! # Sub-modules
//!
//! - **`inventory_api`** – Implements the [`InventoryGateway`] port against
//!   the inventory service's REST API using `reqwest`.  All mutations go
//!   through here; the application layer never sees a URL or a status code.
//!
//! [`InventoryGateway`]: crate::application::gateway::InventoryGateway

pub mod inventory_api;

pub use inventory_api::HttpInventoryGateway;
