//! Deterministic spatial inventory logic shared across hosts.
//!
//! `inventory-core` defines the canonical grid rules (placement, stacking,
//! swapping, splitting) and exposes pure APIs reusable by servers, offline
//! tools, and tests. All state mutation flows through
//! [`engine::InventoryEngine`]; hosts supply external data and sinks via
//! the [`env`] traits and learn about changes via [`notify`] observers and
//! per-container dirty state.
pub mod config;
pub mod engine;
pub mod env;
pub mod grid;
pub mod item;
pub mod notify;
pub use config::InventoryConfig;
pub use engine::{AddReport, Authority, InventoryEngine, InventoryError, TransferOutcome};
pub use env::{
    EquipSink, GridDims, InventoryEnv, ItemDefinition, ItemKind, ItemOracle, ReplicationRegistry,
    WorldSpawner,
};
pub use grid::{
    Container, ContainerId, DirtyState, EntryFields, EntryList, InventoryEntry, MoveOrigin,
    OccupancyIndex, Placement, RejectReason, Tile,
};
pub use item::{DefinitionId, ItemId, ItemInstance};
pub use notify::{InventoryObserver, ObserverId, ObserverRegistry};

#[cfg(feature = "serde")]
pub use grid::EntrySnapshot;
