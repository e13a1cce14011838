//! Authoritative entry list and its replication dirty state.
//!
//! The entry list is the single source of truth for one container. Every
//! mutation marks what changed so the replication layer can delta-serialize
//! only the affected records; the occupancy index is derived from this list
//! and never the other way around.

use std::collections::BTreeMap;

use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::config::InventoryConfig;
use crate::item::{ItemId, ItemInstance};

/// A placed item's position/rotation record. `(x, y)` is the top-left cell
/// of the occupied rectangle in container-local coordinates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryEntry {
    pub item: ItemInstance,
    pub x: i32,
    pub y: i32,
    pub rotated: bool,
}

impl InventoryEntry {
    pub fn new(item: ItemInstance, x: i32, y: i32, rotated: bool) -> Self {
        Self {
            item,
            x,
            y,
            rotated,
        }
    }
}

bitflags! {
    /// Which fields of an entry changed since the last replication drain.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EntryFields: u8 {
        const POSITION = 1 << 0;
        const ROTATION = 1 << 1;
        const QUANTITY = 1 << 2;
    }
}

/// Accumulated change metadata between replication drains.
///
/// `structural` corresponds to entries appearing or disappearing (the whole
/// list must be re-walked); `entries` carries per-item field masks for
/// in-place updates such as a quantity change on a partial stack move.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DirtyState {
    pub structural: bool,
    pub entries: BTreeMap<ItemId, EntryFields>,
}

impl DirtyState {
    pub fn is_empty(&self) -> bool {
        !self.structural && self.entries.is_empty()
    }
}

/// Wire-format record for one entry, what remote peers receive.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntrySnapshot {
    pub item: ItemId,
    pub definition: crate::item::DefinitionId,
    pub quantity: u32,
    pub x: i32,
    pub y: i32,
    pub rotated: bool,
}

/// The authoritative, bounded collection of settled entries.
#[derive(Clone, Debug, Default)]
pub struct EntryList {
    entries: ArrayVec<InventoryEntry, { InventoryConfig::MAX_ENTRIES }>,
    dirty: DirtyState,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, item: ItemId) -> Option<&InventoryEntry> {
        self.entries.iter().find(|entry| entry.item.id == item)
    }

    pub(crate) fn get_mut(&mut self, item: ItemId) -> Option<&mut InventoryEntry> {
        self.entries.iter_mut().find(|entry| entry.item.id == item)
    }

    /// Appends a settled entry and marks the list structurally dirty.
    /// Returns false (without mutating) only if the bounded storage is
    /// full, which a bounds-checked placement cannot cause.
    pub(crate) fn insert(&mut self, entry: InventoryEntry) -> bool {
        if self.entries.try_push(entry).is_err() {
            return false;
        }
        self.dirty.structural = true;
        true
    }

    /// Removes the entry owning `item`, returning it (and its instance).
    pub(crate) fn remove(&mut self, item: ItemId) -> Option<InventoryEntry> {
        let index = self.entries.iter().position(|entry| entry.item.id == item)?;
        let entry = self.entries.remove(index);
        self.dirty.structural = true;
        self.dirty.entries.remove(&item);
        entry.into()
    }

    /// Records an in-place field change for delta replication.
    pub(crate) fn mark_item_dirty(&mut self, item: ItemId, fields: EntryFields) {
        *self.dirty.entries.entry(item).or_default() |= fields;
    }

    /// Drains the accumulated dirty state for the replication transport.
    pub fn take_dirty(&mut self) -> DirtyState {
        std::mem::take(&mut self.dirty)
    }

    pub fn dirty(&self) -> &DirtyState {
        &self.dirty
    }

    /// Full wire snapshot of the list, used for initial synchronization of
    /// a joining peer and by the tests pinning the replication contract.
    #[cfg(feature = "serde")]
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.entries
            .iter()
            .map(|entry| EntrySnapshot {
                item: entry.item.id,
                definition: entry.item.definition,
                quantity: entry.item.quantity(),
                x: entry.x,
                y: entry.y,
                rotated: entry.rotated,
            })
            .collect()
    }

    /// Binary encoding of [`snapshot`](Self::snapshot).
    #[cfg(feature = "serde")]
    pub fn encode_snapshot(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&self.snapshot())
    }
}
