//! Server-side hosting for `inventory-core`.
//!
//! The runtime owns an authoritative [`host::InventoryHost`] and supplies
//! everything the pure engine treats as external: an item catalog loaded
//! from RON data, sinks for items leaving the grids, a single-owner
//! replication registry, and a broadcast event bus for change
//! notifications.

pub mod error;
pub mod events;
pub mod host;
pub mod oracle;
pub mod replication;
pub mod world;

pub use error::{Result, RuntimeError};
pub use events::{Event, EventBus, InventoryEvent, Topic, WorldEvent};
pub use host::InventoryHost;
pub use oracle::{CatalogError, ItemCatalog};
pub use replication::{ReplicationBatch, SubobjectRegistry};
pub use world::{EquipLog, SpawnLog};
