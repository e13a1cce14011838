//! Deterministic free-slot search for auto-placement.

use crate::env::GridDims;
use crate::grid::container::Container;

/// First anchor where a footprint of `dims` fits with no overlap,
/// scanning row-major: left to right within a row, top row first. The
/// scan order is part of the contract; auto-looted items land in the
/// same cell on every host that sees the same state.
pub fn find_free_slot(container: &Container, dims: GridDims) -> Option<(i32, i32)> {
    let max_x = container.columns() - dims.width;
    let max_y = container.rows() - dims.height;
    if max_x < 0 || max_y < 0 {
        return None;
    }

    for y in 0..=max_y {
        for x in 0..=max_x {
            if container
                .occupancy()
                .is_rect_free(x, y, dims.width, dims.height, &[])
            {
                return Some((x, y));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InventoryConfig;
    use crate::env::{ItemDefinition, ItemKind, ItemOracle};
    use crate::grid::container::ContainerId;
    use crate::grid::entry::InventoryEntry;
    use crate::item::{DefinitionId, ItemId, ItemInstance};

    struct TestOracle;

    impl ItemOracle for TestOracle {
        fn definition(&self, id: DefinitionId) -> Option<ItemDefinition> {
            Some(match id.0 {
                2 => ItemDefinition::new(id, ItemKind::Weapon, 1).with_dims(2, 2),
                _ => ItemDefinition::new(id, ItemKind::Material, 10),
            })
        }
    }

    fn container(entries: &[(u64, u32, i32, i32)]) -> Container {
        let mut c = Container::new(ContainerId(0), InventoryConfig::new(4, 3));
        for &(id, def, x, y) in entries {
            c.insert_entry(InventoryEntry::new(
                ItemInstance::new(ItemId(id), DefinitionId(def), 1),
                x,
                y,
                false,
            ));
        }
        c.rebuild(&TestOracle);
        c
    }

    #[test]
    fn empty_grid_yields_origin() {
        let c = container(&[]);
        assert_eq!(find_free_slot(&c, GridDims::new(2, 2)), Some((0, 0)));
    }

    #[test]
    fn scan_is_row_major() {
        // Top-left corner taken; next 1x1 slot is to its right, not below.
        let c = container(&[(1, 1, 0, 0)]);
        assert_eq!(find_free_slot(&c, GridDims::UNIT), Some((1, 0)));
    }

    #[test]
    fn wide_footprint_skips_fragmented_rows() {
        // Blockers leave no 2x2 window until the second row.
        let c = container(&[(1, 2, 2, 0), (3, 1, 0, 0)]);
        assert_eq!(find_free_slot(&c, GridDims::new(2, 2)), Some((0, 1)));
    }

    #[test]
    fn oversized_footprint_finds_nothing() {
        let c = container(&[]);
        assert_eq!(find_free_slot(&c, GridDims::new(5, 1)), None);
    }
}
