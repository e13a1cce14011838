/// Inventory configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InventoryConfig {
    /// Grid width in cells. Fixed after container creation.
    pub columns: i32,
    /// Grid height in cells. Fixed after container creation.
    pub rows: i32,
}

impl InventoryConfig {
    // ===== compile-time constants used as type parameters =====
    /// Upper bound on cells per grid; `columns * rows` must not exceed it.
    pub const MAX_GRID_CELLS: usize = 256;
    /// Upper bound on settled entries per container. Every entry covers at
    /// least one cell, so this also bounds the entry list.
    pub const MAX_ENTRIES: usize = Self::MAX_GRID_CELLS;
    /// Largest footprint edge an item definition may declare.
    pub const MAX_ITEM_EXTENT: i32 = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_COLUMNS: i32 = 10;
    pub const DEFAULT_ROWS: i32 = 10;

    pub fn new(columns: i32, rows: i32) -> Self {
        debug_assert!(columns > 0 && rows > 0);
        debug_assert!((columns as usize) * (rows as usize) <= Self::MAX_GRID_CELLS);
        Self { columns, rows }
    }

    /// Total cell count of a grid with these dimensions.
    pub fn cell_count(&self) -> usize {
        (self.columns as usize) * (self.rows as usize)
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COLUMNS, Self::DEFAULT_ROWS)
    }
}
