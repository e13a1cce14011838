//! One inventory grid: authoritative entries, derived occupancy, cursor.

use std::fmt;

use crate::config::InventoryConfig;
use crate::env::ItemOracle;
use crate::grid::entry::{EntryFields, EntryList, InventoryEntry};
use crate::grid::occupancy::OccupancyIndex;
use crate::item::{ItemId, ItemInstance};

/// Registry key of a container on one host (player backpack, chest, trade
/// window...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// One grid instance.
///
/// # Invariants (after every settled engine operation)
///
/// - No two entries' occupied rectangles overlap and every rectangle lies
///   inside `[0, columns) x [0, rows)`.
/// - The occupancy index matches the entry list cell for cell.
/// - The cursor and the grid never hold the same instance; the cursor holds
///   at most one.
pub struct Container {
    id: ContainerId,
    config: InventoryConfig,
    entries: EntryList,
    occupancy: OccupancyIndex,
    cursor: Option<ItemInstance>,
}

impl Container {
    pub fn new(id: ContainerId, config: InventoryConfig) -> Self {
        let occupancy = OccupancyIndex::new(config.clone());
        Self {
            id,
            config,
            entries: EntryList::new(),
            occupancy,
            cursor: None,
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn columns(&self) -> i32 {
        self.config.columns
    }

    pub fn rows(&self) -> i32 {
        self.config.rows
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        self.entries.entries()
    }

    pub fn entry(&self, item: ItemId) -> Option<&InventoryEntry> {
        self.entries.get(item)
    }

    pub fn cursor(&self) -> Option<&ItemInstance> {
        self.cursor.as_ref()
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    /// Occupant of a cell, for point queries during drag.
    pub fn item_at(&self, x: i32, y: i32) -> Option<ItemId> {
        self.occupancy.get(x, y)
    }

    pub fn items_in_rect(&self, x: i32, y: i32, width: i32, height: i32) -> Vec<ItemId> {
        self.occupancy.items_in_rect(x, y, width, height, None)
    }

    /// Whether this container currently owns `item`, on the grid or cursor.
    pub fn contains(&self, item: ItemId) -> bool {
        self.entries.get(item).is_some() || self.cursor.as_ref().is_some_and(|c| c.id == item)
    }

    /// Sum of definition weight times quantity over grid and cursor.
    pub fn total_weight(&self, items: &dyn ItemOracle) -> f32 {
        let weight_of = |instance: &ItemInstance| {
            items
                .definition(instance.definition)
                .map(|def| def.weight * instance.quantity() as f32)
                .unwrap_or(0.0)
        };
        let grid: f32 = self
            .entries
            .entries()
            .iter()
            .map(|entry| weight_of(&entry.item))
            .sum();
        grid + self.cursor.as_ref().map(weight_of).unwrap_or(0.0)
    }

    /// Drains pending replication dirty state.
    pub fn take_dirty(&mut self) -> crate::grid::entry::DirtyState {
        self.entries.take_dirty()
    }

    #[cfg(feature = "serde")]
    pub fn snapshot(&self) -> Vec<crate::grid::entry::EntrySnapshot> {
        self.entries.snapshot()
    }

    #[cfg(feature = "serde")]
    pub fn encode_snapshot(&self) -> Result<Vec<u8>, bincode::Error> {
        self.entries.encode_snapshot()
    }

    // ===== crate-internal mutation surface (engine only) =====

    pub(crate) fn insert_entry(&mut self, entry: InventoryEntry) -> bool {
        self.entries.insert(entry)
    }

    pub(crate) fn remove_entry(&mut self, item: ItemId) -> Option<InventoryEntry> {
        self.entries.remove(item)
    }

    pub(crate) fn entry_mut(&mut self, item: ItemId) -> Option<&mut InventoryEntry> {
        self.entries.get_mut(item)
    }

    pub(crate) fn mark_item_dirty(&mut self, item: ItemId, fields: EntryFields) {
        self.entries.mark_item_dirty(item, fields);
    }

    pub(crate) fn set_cursor(&mut self, item: ItemInstance) {
        debug_assert!(self.cursor.is_none());
        self.cursor = Some(item);
    }

    pub(crate) fn take_cursor(&mut self) -> Option<ItemInstance> {
        self.cursor.take()
    }

    /// Repaints the occupancy index from the entry list. The engine calls
    /// this once per mutated container, after its last list mutation.
    pub(crate) fn rebuild(&mut self, items: &dyn ItemOracle) {
        self.occupancy.rebuild(self.entries.entries(), items);
    }

    /// Verifies the derived index against the authoritative list; used by
    /// engine debug assertions and tests.
    pub fn occupancy_consistent(&self, items: &dyn ItemOracle) -> bool {
        let mut expected = OccupancyIndex::new(self.config.clone());
        expected.rebuild(self.entries.entries(), items);
        for y in 0..self.config.rows {
            for x in 0..self.config.columns {
                if expected.get(x, y) != self.occupancy.get(x, y) {
                    return false;
                }
            }
        }
        true
    }
}
