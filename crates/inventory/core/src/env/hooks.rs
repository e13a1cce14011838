//! Outward-facing collaborator seams.
//!
//! The grid engine never renders, replicates, or simulates the world; it
//! hands items across these traits and is done with them.

use crate::grid::ContainerId;
use crate::item::{ItemId, ItemInstance};

/// Receives items that leave the inventory system for the game world:
/// auto-loot overflow and explicit drops. Takes ownership of the instance.
pub trait WorldSpawner {
    fn spawn_in_world(&mut self, item: ItemInstance);
}

/// Receives items removed from the grid by an equip request. The
/// equipment/ability layer owns the instance from then on.
pub trait EquipSink {
    fn equip(&mut self, item: ItemInstance);
}

/// Tracks which container replicates which item instance to remote peers.
///
/// Exactly one container owns an item's replication at any time. The
/// engine pairs every entry-list insert/remove with the matching call here;
/// [`transfer`](Self::transfer) re-homes an item in one step so a
/// cross-container move never leaves a window where the item is replicated
/// by no container or by two.
pub trait ReplicationRegistry {
    fn register(&mut self, item: ItemId, owner: ContainerId);
    fn unregister(&mut self, item: ItemId, owner: ContainerId);
    fn transfer(&mut self, item: ItemId, from: ContainerId, to: ContainerId);
}
