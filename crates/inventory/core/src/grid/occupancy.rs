//! Derived per-cell occupancy cache.
//!
//! Rebuilt wholesale from the entry list after every mutation: grids are
//! small, and a full repaint cannot drift the way incremental patching can.
//! If this index ever disagrees with the entry list, the entry list wins.

use crate::config::InventoryConfig;
use crate::env::ItemOracle;
use crate::grid::entry::InventoryEntry;
use crate::item::ItemId;

/// One grid cell of the cache. `is_head` marks the entry's top-left cell so
/// renderers spawn exactly one visual per item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Tile {
    pub item: Option<ItemId>,
    pub is_head: bool,
}

/// O(1) point lookups and O(area) rectangle queries over one container.
#[derive(Clone, Debug)]
pub struct OccupancyIndex {
    config: InventoryConfig,
    tiles: Vec<Tile>,
}

impl OccupancyIndex {
    pub fn new(config: InventoryConfig) -> Self {
        let tiles = vec![Tile::default(); config.cell_count()];
        Self { config, tiles }
    }

    pub fn columns(&self) -> i32 {
        self.config.columns
    }

    pub fn rows(&self) -> i32 {
        self.config.rows
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.config.columns || y >= self.config.rows {
            return None;
        }
        Some((y * self.config.columns + x) as usize)
    }

    /// Repaints every cell from the authoritative entries.
    pub fn rebuild(&mut self, entries: &[InventoryEntry], items: &dyn ItemOracle) {
        self.tiles.fill(Tile::default());

        for entry in entries {
            let dims = items
                .definition(entry.item.definition)
                .map(|def| def.dims_of(entry.rotated))
                .unwrap_or(crate::env::GridDims::UNIT);

            for dy in 0..dims.height {
                for dx in 0..dims.width {
                    if let Some(index) = self.index(entry.x + dx, entry.y + dy) {
                        self.tiles[index] = Tile {
                            item: Some(entry.item.id),
                            is_head: dx == 0 && dy == 0,
                        };
                    }
                }
            }
        }
    }

    /// Occupant of `(x, y)`; out-of-range is empty, never an error.
    pub fn get(&self, x: i32, y: i32) -> Option<ItemId> {
        self.index(x, y).and_then(|index| self.tiles[index].item)
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index(x, y).map(|index| &self.tiles[index])
    }

    /// Distinct items touching any cell of the rectangle, in row-major
    /// first-encountered order. Overlap counting is by item identity: two
    /// cells of the same item contribute one element.
    pub fn items_in_rect(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        exclude: Option<ItemId>,
    ) -> Vec<ItemId> {
        let mut found = Vec::new();
        for cy in y..y + height {
            for cx in x..x + width {
                let Some(occupant) = self.get(cx, cy) else {
                    continue;
                };
                if Some(occupant) == exclude || found.contains(&occupant) {
                    continue;
                }
                found.push(occupant);
            }
        }
        found
    }

    /// True when the rectangle lies fully inside the grid and every cell is
    /// empty or occupied only by items in `ignore`.
    pub fn is_rect_free(&self, x: i32, y: i32, width: i32, height: i32, ignore: &[ItemId]) -> bool {
        if x < 0 || y < 0 || x + width > self.config.columns || y + height > self.config.rows {
            return false;
        }
        for cy in y..y + height {
            for cx in x..x + width {
                if let Some(occupant) = self.get(cx, cy) {
                    if !ignore.contains(&occupant) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{ItemDefinition, ItemKind};
    use crate::item::{DefinitionId, ItemInstance};

    struct TestOracle(Vec<ItemDefinition>);

    impl ItemOracle for TestOracle {
        fn definition(&self, id: DefinitionId) -> Option<ItemDefinition> {
            self.0.iter().find(|def| def.id == id).cloned()
        }
    }

    fn oracle() -> TestOracle {
        TestOracle(vec![
            ItemDefinition::new(DefinitionId(1), ItemKind::Material, 10),
            ItemDefinition::new(DefinitionId(2), ItemKind::Weapon, 1).with_dims(2, 1),
        ])
    }

    fn entry(id: u64, def: u32, x: i32, y: i32, rotated: bool) -> InventoryEntry {
        InventoryEntry::new(
            ItemInstance::new(ItemId(id), DefinitionId(def), 1),
            x,
            y,
            rotated,
        )
    }

    #[test]
    fn rebuild_paints_head_and_body_cells() {
        let mut index = OccupancyIndex::new(InventoryConfig::new(10, 6));
        index.rebuild(&[entry(1, 2, 0, 0, false)], &oracle());

        assert_eq!(index.get(0, 0), Some(ItemId(1)));
        assert_eq!(index.get(1, 0), Some(ItemId(1)));
        assert!(index.tile(0, 0).unwrap().is_head);
        assert!(!index.tile(1, 0).unwrap().is_head);
        assert_eq!(index.get(2, 0), None);
    }

    #[test]
    fn rotation_repaints_the_swapped_footprint() {
        let mut index = OccupancyIndex::new(InventoryConfig::new(10, 6));
        index.rebuild(&[entry(1, 2, 3, 3, true)], &oracle());

        // 2x1 rotated to 1x2.
        assert_eq!(index.get(3, 3), Some(ItemId(1)));
        assert_eq!(index.get(3, 4), Some(ItemId(1)));
        assert_eq!(index.get(4, 3), None);
    }

    #[test]
    fn point_query_out_of_range_is_empty() {
        let index = OccupancyIndex::new(InventoryConfig::new(10, 6));
        assert_eq!(index.get(-1, 0), None);
        assert_eq!(index.get(10, 0), None);
        assert_eq!(index.get(0, 6), None);
    }

    #[test]
    fn rect_query_deduplicates_by_identity() {
        let mut index = OccupancyIndex::new(InventoryConfig::new(10, 6));
        index.rebuild(
            &[entry(1, 2, 0, 0, false), entry(2, 1, 2, 0, false)],
            &oracle(),
        );

        // Rect covers both cells of item 1 plus item 2: two distinct hits.
        let found = index.items_in_rect(0, 0, 3, 1, None);
        assert_eq!(found, vec![ItemId(1), ItemId(2)]);

        let excluded = index.items_in_rect(0, 0, 3, 1, Some(ItemId(1)));
        assert_eq!(excluded, vec![ItemId(2)]);
    }

    #[test]
    fn rect_free_rejects_out_of_bounds_and_respects_ignores() {
        let mut index = OccupancyIndex::new(InventoryConfig::new(10, 6));
        index.rebuild(&[entry(1, 1, 0, 0, false)], &oracle());

        assert!(!index.is_rect_free(9, 0, 2, 1, &[]));
        assert!(!index.is_rect_free(0, 0, 1, 1, &[]));
        assert!(index.is_rect_free(0, 0, 1, 1, &[ItemId(1)]));
        assert!(index.is_rect_free(5, 5, 1, 1, &[]));
    }
}
