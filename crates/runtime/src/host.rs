//! Server host façade over the inventory engine.

use std::sync::Arc;

use inventory_core::{
    AddReport, Authority, Container, ContainerId, DefinitionId, InventoryConfig, InventoryEngine,
    InventoryEnv, ItemId, TransferOutcome,
};

use crate::error::Result;
use crate::events::{Event, EventBus, InventoryEvent};
use crate::oracle::ItemCatalog;
use crate::replication::{ReplicationBatch, SubobjectRegistry};
use crate::world::{EquipLog, SpawnLog};

/// Owns the authoritative engine together with its host-side
/// collaborators: the item catalog, the ownership registry, the world and
/// equipment sinks, and the event bus change notifications fan out on.
pub struct InventoryHost {
    engine: InventoryEngine,
    catalog: ItemCatalog,
    registry: SubobjectRegistry,
    spawner: SpawnLog,
    equipment: EquipLog,
    bus: EventBus,
}

impl InventoryHost {
    pub fn new(catalog: ItemCatalog) -> Self {
        let bus = EventBus::new();
        let mut engine = InventoryEngine::new(Authority::Server);
        {
            let bus = bus.clone();
            engine
                .observers_mut()
                .subscribe(Arc::new(move |container: ContainerId| {
                    bus.publish(Event::Inventory(InventoryEvent::Changed { container }));
                }));
        }
        Self {
            engine,
            catalog,
            registry: SubobjectRegistry::new(),
            spawner: SpawnLog::new(bus.clone()),
            equipment: EquipLog::new(),
            bus,
        }
    }

    /// Handle for subscribing to host events.
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn create_container(&mut self, config: InventoryConfig) -> ContainerId {
        let id = self.engine.create_container(config);
        tracing::debug!(%id, "container created");
        id
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.engine.container(id)
    }

    pub fn registry(&self) -> &SubobjectRegistry {
        &self.registry
    }

    pub fn world(&self) -> &SpawnLog {
        &self.spawner
    }

    pub fn equipment(&self) -> &EquipLog {
        &self.equipment
    }

    pub fn transfer(
        &mut self,
        source: ContainerId,
        item: ItemId,
        dest: ContainerId,
        x: i32,
        y: i32,
        rotated: bool,
    ) -> Result<TransferOutcome> {
        let mut env = InventoryEnv::new(
            &self.catalog,
            &mut self.spawner,
            &mut self.equipment,
            &mut self.registry,
        );
        let outcome = self
            .engine
            .request_transfer(&mut env, source, item, dest, x, y, rotated)?;
        tracing::debug!(%source, %item, %dest, x, y, rotated, ?outcome, "transfer");
        Ok(outcome)
    }

    pub fn pickup(&mut self, container: ContainerId, item: ItemId) -> Result<()> {
        let mut env = InventoryEnv::new(
            &self.catalog,
            &mut self.spawner,
            &mut self.equipment,
            &mut self.registry,
        );
        self.engine.request_pickup(&mut env, container, item)?;
        tracing::debug!(%container, %item, "pickup");
        Ok(())
    }

    pub fn place(
        &mut self,
        container: ContainerId,
        x: i32,
        y: i32,
        rotated: bool,
    ) -> Result<TransferOutcome> {
        let mut env = InventoryEnv::new(
            &self.catalog,
            &mut self.spawner,
            &mut self.equipment,
            &mut self.registry,
        );
        let outcome = self.engine.request_place(&mut env, container, x, y, rotated)?;
        tracing::debug!(%container, x, y, rotated, ?outcome, "place");
        Ok(outcome)
    }

    pub fn drop_item(&mut self, container: ContainerId, item: ItemId) -> Result<()> {
        let mut env = InventoryEnv::new(
            &self.catalog,
            &mut self.spawner,
            &mut self.equipment,
            &mut self.registry,
        );
        self.engine.request_drop(&mut env, container, item)?;
        tracing::debug!(%container, %item, "drop from grid");
        Ok(())
    }

    pub fn drop_cursor(&mut self, container: ContainerId) -> Result<ItemId> {
        let mut env = InventoryEnv::new(
            &self.catalog,
            &mut self.spawner,
            &mut self.equipment,
            &mut self.registry,
        );
        let dropped = self.engine.request_drop_cursor(&mut env, container)?;
        tracing::debug!(%container, item = %dropped, "drop from cursor");
        Ok(dropped)
    }

    pub fn split_stack(
        &mut self,
        container: ContainerId,
        item: ItemId,
        amount: u32,
    ) -> Result<ItemId> {
        let mut env = InventoryEnv::new(
            &self.catalog,
            &mut self.spawner,
            &mut self.equipment,
            &mut self.registry,
        );
        let new_item = self
            .engine
            .request_split_stack(&mut env, container, item, amount)?;
        tracing::debug!(%container, %item, amount, %new_item, "split");
        Ok(new_item)
    }

    pub fn equip(&mut self, container: ContainerId, item: ItemId) -> Result<()> {
        let mut env = InventoryEnv::new(
            &self.catalog,
            &mut self.spawner,
            &mut self.equipment,
            &mut self.registry,
        );
        self.engine.request_equip(&mut env, container, item)?;
        tracing::debug!(%container, %item, "equip");
        Ok(())
    }

    pub fn add_item(
        &mut self,
        container: ContainerId,
        definition: DefinitionId,
        quantity: u32,
    ) -> Result<AddReport> {
        let mut env = InventoryEnv::new(
            &self.catalog,
            &mut self.spawner,
            &mut self.equipment,
            &mut self.registry,
        );
        let report = self
            .engine
            .add_item_definition(&mut env, container, definition, quantity)?;
        tracing::debug!(%container, %definition, quantity, ?report, "auto-loot");
        Ok(report)
    }

    /// Drains one container's dirty state into a wire batch; `None` when
    /// nothing changed since the last drain.
    pub fn flush(&mut self, container: ContainerId) -> Option<ReplicationBatch> {
        let dirty = self.engine.take_dirty(container)?;
        let batch = ReplicationBatch::from_dirty(self.engine.container(container)?, dirty);
        if let Some(batch) = &batch {
            tracing::debug!(
                %container,
                structural = batch.structural,
                updates = batch.updates.len(),
                "replication flush"
            );
        }
        batch
    }
}
