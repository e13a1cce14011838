//! External collaborator seams: item definitions, world hand-off,
//! replication ownership.

mod hooks;
mod items;

pub use hooks::{EquipSink, ReplicationRegistry, WorldSpawner};
pub use items::{GridDims, ItemDefinition, ItemKind, ItemOracle};

/// Bundle of collaborator references handed to every engine operation.
///
/// The oracle is read-only; the sinks are mutated as items leave the grid.
pub struct InventoryEnv<'a> {
    pub items: &'a dyn ItemOracle,
    pub world: &'a mut dyn WorldSpawner,
    pub equip: &'a mut dyn EquipSink,
    pub replication: &'a mut dyn ReplicationRegistry,
}

impl<'a> InventoryEnv<'a> {
    pub fn new(
        items: &'a dyn ItemOracle,
        world: &'a mut dyn WorldSpawner,
        equip: &'a mut dyn EquipSink,
        replication: &'a mut dyn ReplicationRegistry,
    ) -> Self {
        Self {
            items,
            world,
            equip,
            replication,
        }
    }
}
