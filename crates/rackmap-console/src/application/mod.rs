//! Application layer use cases for the console application.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules, here supplied by `rackmap-core`) and the
//! infrastructure (HTTP/storage/UI plumbing).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "move this
//!   device to the slot it was dropped on, then show the updated rack").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the infrastructure can be swapped without changing this code.
//! - **Contain no network I/O and no file system access**.
//!
//! # Sub-modules
//!
//! - **`gateway`**        – The [`InventoryGateway`](gateway::InventoryGateway)
//!   trait: every read and write against the inventory REST service goes
//!   through it.  The HTTP implementation lives in the infrastructure layer;
//!   tests substitute a recording fake.
//!
//! - **`sync_inventory`** – Fetches racks, devices and connections as one
//!   consistent snapshot.  Every committed mutation is followed by a full
//!   re-fetch rather than a local patch, so the console always renders what
//!   the service actually stored.
//!
//! - **`place_device`**   – Drives the drag-and-drop gesture over the rack
//!   elevation: begin, preview, drop.  A committed drop becomes a position
//!   update against the gateway.  Also covers click-to-create and the
//!   connection create/delete guards.
//!
//! - **`map_topology`**   – Produces the network topology view: builds the
//!   node/edge graph from a snapshot, runs the selected layout engine and
//!   records user-pinned node positions.

pub mod gateway;
pub mod map_topology;
pub mod place_device;
pub mod sync_inventory;
