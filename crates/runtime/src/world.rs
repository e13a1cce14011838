//! Hand-off sinks: items leaving inventory management.

use inventory_core::{EquipSink, ItemInstance, WorldSpawner};

use crate::events::{Event, EventBus, WorldEvent};

/// World spawner that records ejected items and announces them on the bus.
///
/// A real game host would replace this with actual actor spawning; the
/// recorded list doubles as the authority on what left the grids.
pub struct SpawnLog {
    bus: EventBus,
    spawned: Vec<ItemInstance>,
}

impl SpawnLog {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            spawned: Vec::new(),
        }
    }

    pub fn spawned(&self) -> &[ItemInstance] {
        &self.spawned
    }
}

impl WorldSpawner for SpawnLog {
    fn spawn_in_world(&mut self, item: ItemInstance) {
        tracing::debug!(id = %item.id, definition = %item.definition, quantity = item.quantity(), "item spawned in world");
        self.bus.publish(Event::World(WorldEvent::ItemSpawned {
            item: item.id,
            definition: item.definition,
            quantity: item.quantity(),
        }));
        self.spawned.push(item);
    }
}

/// Equipment sink that records what the engine handed over.
#[derive(Default)]
pub struct EquipLog {
    equipped: Vec<ItemInstance>,
}

impl EquipLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equipped(&self) -> &[ItemInstance] {
        &self.equipped
    }
}

impl EquipSink for EquipLog {
    fn equip(&mut self, item: ItemInstance) {
        tracing::debug!(id = %item.id, definition = %item.definition, "item equipped");
        self.equipped.push(item);
    }
}
