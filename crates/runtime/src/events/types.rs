//! Event payloads published by the host.

use inventory_core::{ContainerId, DefinitionId, ItemId};
use serde::{Deserialize, Serialize};

/// Inventory state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    /// A container's settled state changed; remote views should refresh
    /// (or apply the next replication batch).
    Changed { container: ContainerId },
}

/// Items leaving inventory management for the game world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// An item was ejected into the world, by an explicit drop or as
    /// auto-loot overflow.
    ItemSpawned {
        item: ItemId,
        definition: DefinitionId,
        quantity: u32,
    },
}
