use crate::config::InventoryConfig;
use crate::item::DefinitionId;

/// Read-only catalog of item definitions.
///
/// The engine treats definition data as an opaque lookup; the host decides
/// where it comes from (data files, generated content, tests).
pub trait ItemOracle: Send + Sync {
    fn definition(&self, id: DefinitionId) -> Option<ItemDefinition>;
}

/// Item definition with common fields and type-specific category.
///
/// # Stacking
///
/// All items have a `max_stack` value:
/// - Weapons/Armor: max_stack = 1 (cannot stack)
/// - Consumables/Materials: max_stack > 1 (stackable)
///
/// # Footprint
///
/// `dims` is the unrotated grid footprint. Definitions without a footprint
/// occupy a single cell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub id: DefinitionId,
    pub kind: ItemKind,
    pub max_stack: u32,
    pub dims: Option<GridDims>,
    /// Weight per unit, used by the container weight accessor.
    pub weight: f32,
}

impl ItemDefinition {
    pub fn new(id: DefinitionId, kind: ItemKind, max_stack: u32) -> Self {
        debug_assert!(max_stack > 0);
        Self {
            id,
            kind,
            max_stack,
            dims: None,
            weight: 0.0,
        }
    }

    pub fn with_dims(mut self, width: i32, height: i32) -> Self {
        self.dims = Some(GridDims::new(width, height));
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Footprint with the rotation flag applied; 1×1 when the definition
    /// declares none.
    pub fn dims_of(&self, rotated: bool) -> GridDims {
        let dims = self.dims.unwrap_or(GridDims::UNIT);
        if rotated { dims.rotated() } else { dims }
    }

    pub fn is_equippable(&self) -> bool {
        matches!(self.kind, ItemKind::Weapon | ItemKind::Armor)
    }
}

/// Item category. The ability/equipment layer interprets these further;
/// the grid only cares whether `request_equip` applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    Weapon,
    Armor,
    Consumable,
    Material,
    Custom(u16),
}

/// Grid footprint of an item in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridDims {
    pub width: i32,
    pub height: i32,
}

impl GridDims {
    pub const UNIT: Self = Self {
        width: 1,
        height: 1,
    };

    pub fn new(width: i32, height: i32) -> Self {
        debug_assert!(width >= 1 && width <= InventoryConfig::MAX_ITEM_EXTENT);
        debug_assert!(height >= 1 && height <= InventoryConfig::MAX_ITEM_EXTENT);
        Self { width, height }
    }

    /// The footprint with its axes swapped.
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}
