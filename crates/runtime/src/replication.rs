//! Replication bookkeeping: which container owns each live item, and the
//! wire batches built from per-container dirty state.

use std::collections::HashMap;

use inventory_core::{
    Container, ContainerId, DirtyState, EntrySnapshot, ItemId, ReplicationRegistry,
};
use serde::{Deserialize, Serialize};

/// Single-owner map of replicated item instances.
///
/// The engine drives every ownership change through the
/// [`ReplicationRegistry`] trait; an item is owned by exactly one container
/// from registration to unregistration. A call that contradicts the map is
/// a host bug upstream, logged and then applied anyway so the map tracks
/// what the engine believes.
#[derive(Default)]
pub struct SubobjectRegistry {
    owners: HashMap<ItemId, ContainerId>,
}

impl SubobjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self, item: ItemId) -> Option<ContainerId> {
        self.owners.get(&item).copied()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, ContainerId)> + '_ {
        self.owners.iter().map(|(item, owner)| (*item, *owner))
    }
}

impl ReplicationRegistry for SubobjectRegistry {
    fn register(&mut self, item: ItemId, owner: ContainerId) {
        if let Some(previous) = self.owners.insert(item, owner) {
            tracing::warn!(%item, %previous, %owner, "re-registered an owned item");
        }
    }

    fn unregister(&mut self, item: ItemId, owner: ContainerId) {
        match self.owners.remove(&item) {
            Some(previous) if previous == owner => {}
            Some(previous) => {
                tracing::warn!(%item, %previous, %owner, "unregistered from wrong owner");
            }
            None => tracing::warn!(%item, %owner, "unregistered an unknown item"),
        }
    }

    fn transfer(&mut self, item: ItemId, from: ContainerId, to: ContainerId) {
        match self.owners.insert(item, to) {
            Some(previous) if previous == from => {}
            Some(previous) => {
                tracing::warn!(%item, %previous, %from, %to, "transferred from wrong owner");
            }
            None => tracing::warn!(%item, %from, %to, "transferred an unknown item"),
        }
    }
}

/// One container's pending changes in wire form.
///
/// Field-level updates carry the changed-field bitmask; a structural
/// change (entry added or removed) additionally carries the full entry
/// snapshot so remote peers can resynchronize the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationBatch {
    pub container: ContainerId,
    pub structural: bool,
    /// `(item, changed-field bits)` in item-id order.
    pub updates: Vec<(ItemId, u8)>,
    pub snapshot: Option<Vec<EntrySnapshot>>,
}

impl ReplicationBatch {
    /// Builds a batch from drained dirty state; `None` when nothing
    /// changed since the last drain.
    pub fn from_dirty(container: &Container, dirty: DirtyState) -> Option<Self> {
        if dirty.is_empty() {
            return None;
        }
        let snapshot = dirty.structural.then(|| container.snapshot());
        Some(Self {
            container: container.id(),
            structural: dirty.structural,
            updates: dirty
                .entries
                .into_iter()
                .map(|(item, fields)| (item, fields.bits()))
                .collect(),
            snapshot,
        })
    }

    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}
