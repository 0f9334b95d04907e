//! Domain entities for Rackmap.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers. The innermost
//! layer is called the **domain** (or "entities" layer). Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from OS APIs, network libraries, database drivers, or UI
//!   frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//! - Defines the data types and operations that make the system uniquely what it
//!   is: in this case, the concept of rack-unit occupancy and the rules for
//!   where a device may legally be placed.
//!
//! Code in outer layers (infrastructure, application, UI) depends on the domain,
//! but the domain never depends on them. This makes the domain easy to unit-test
//! in isolation.

/// Rack / device / connection records and their identifiers.
pub mod inventory;

/// Per-unit occupancy scanning and top-down elevation rows.
pub mod occupancy;

/// The placement validator: may a device of height H sit at top unit U?
pub mod placement;

/// The drag-and-drop session state machine.
pub mod drag;
