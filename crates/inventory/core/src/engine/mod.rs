//! Authoritative inventory engine.
//!
//! All mutation flows through [`InventoryEngine`] request methods, which
//! follow one shape: validate every precondition against current state,
//! classify the requested placement, then apply the whole mutation or
//! nothing. There is no rollback path; a request that cannot complete
//! returns before the first write.
//!
//! After each mutation the engine rebuilds the occupancy index of every
//! touched container and fires one observer notification per container.

mod errors;

pub use errors::InventoryError;

use std::collections::BTreeMap;

use crate::config::InventoryConfig;
use crate::env::{InventoryEnv, ItemOracle};
use crate::grid::entry::DirtyState;
use crate::grid::{
    Container, ContainerId, EntryFields, InventoryEntry, MoveOrigin, Placement, RejectReason,
    find_free_slot, placement, stacking,
};
use crate::item::{DefinitionId, ItemId, ItemInstance};
use crate::notify::ObserverRegistry;

/// Whether this engine instance may mutate state.
///
/// Remote engines hold mirrored state for display and prediction; every
/// mutating request on them fails with
/// [`InventoryError::NotAuthoritative`] without touching anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authority {
    Server,
    Remote,
}

/// What a completed transfer or place request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Item moved onto an empty rectangle.
    Placed,
    /// Quantities merged into an existing stack. `moved` may be zero when
    /// the destination stack was already full.
    Stacked { moved: u32 },
    /// Item exchanged positions with the single occupant.
    Swapped { displaced: ItemId },
    /// Invalid target; nothing changed anywhere.
    Rejected(RejectReason),
}

/// Quantity accounting for an auto-loot request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Units merged into existing stacks.
    pub merged: u32,
    /// Units placed as new stacks in free slots.
    pub placed: u32,
    /// Units that did not fit and were handed to the world spawner.
    pub spawned: u32,
}

/// Authoritative owner of all containers on a host.
pub struct InventoryEngine {
    authority: Authority,
    containers: BTreeMap<ContainerId, Container>,
    next_item: u64,
    next_container: u32,
    observers: ObserverRegistry,
}

impl InventoryEngine {
    pub fn new(authority: Authority) -> Self {
        Self {
            authority,
            containers: BTreeMap::new(),
            next_item: 0,
            next_container: 0,
            observers: ObserverRegistry::new(),
        }
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn create_container(&mut self, config: InventoryConfig) -> ContainerId {
        let id = ContainerId(self.next_container);
        self.next_container += 1;
        self.containers.insert(id, Container::new(id, config));
        id
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// Drains the pending dirty state of one container for replication.
    pub fn take_dirty(&mut self, id: ContainerId) -> Option<DirtyState> {
        self.containers.get_mut(&id).map(Container::take_dirty)
    }

    pub fn observers_mut(&mut self) -> &mut ObserverRegistry {
        &mut self.observers
    }

    /// Fresh never-reused item identity.
    fn allocate_item_id(&mut self) -> ItemId {
        self.next_item += 1;
        ItemId(self.next_item)
    }

    fn require_authority(&self) -> Result<(), InventoryError> {
        match self.authority {
            Authority::Server => Ok(()),
            Authority::Remote => Err(InventoryError::NotAuthoritative),
        }
    }

    fn lookup(&self, id: ContainerId) -> Result<&Container, InventoryError> {
        self.containers
            .get(&id)
            .ok_or(InventoryError::UnknownContainer(id))
    }

    fn lookup_mut(&mut self, id: ContainerId) -> Result<&mut Container, InventoryError> {
        self.containers
            .get_mut(&id)
            .ok_or(InventoryError::UnknownContainer(id))
    }

    /// Rebuilds one container's occupancy and notifies observers. Called
    /// exactly once per mutated container, after all writes to it.
    fn settle(&mut self, items: &dyn ItemOracle, id: ContainerId) {
        if let Some(container) = self.containers.get_mut(&id) {
            container.rebuild(items);
            debug_assert!(container.occupancy_consistent(items));
        }
        self.observers.notify(id);
    }

    /// Moves a settled item onto a target rectangle, possibly in another
    /// container. Resolves to a plain move, a stack merge, a position
    /// swap, or a rejection, per the placement rules.
    pub fn request_transfer(
        &mut self,
        env: &mut InventoryEnv<'_>,
        source: ContainerId,
        item: ItemId,
        dest: ContainerId,
        x: i32,
        y: i32,
        rotated: bool,
    ) -> Result<TransferOutcome, InventoryError> {
        self.require_authority()?;

        let (placement, mover, origin_x, origin_y, origin_rotated) = {
            let source_c = self.lookup(source)?;
            let entry = source_c
                .entry(item)
                .ok_or(InventoryError::ItemNotFound(item, source))?;
            let mover = entry.item.clone();
            let origin = MoveOrigin {
                container: source_c,
                x: entry.x,
                y: entry.y,
                rotated: entry.rotated,
            };
            let dest_c = self.lookup(dest)?;
            let placement =
                placement::classify(dest_c, env.items, &mover, x, y, rotated, Some(origin));
            (placement, mover, entry.x, entry.y, entry.rotated)
        };
        let def = env
            .items
            .definition(mover.definition)
            .ok_or(InventoryError::UnknownDefinition(mover.definition))?;

        match placement {
            Placement::Reject(reason) => Ok(TransferOutcome::Rejected(reason)),

            Placement::Place => {
                if source == dest {
                    let container = self.lookup_mut(source)?;
                    let entry = container
                        .entry_mut(item)
                        .ok_or(InventoryError::ItemNotFound(item, source))?;
                    let rotation_changed = entry.rotated != rotated;
                    entry.x = x;
                    entry.y = y;
                    entry.rotated = rotated;
                    let mut fields = EntryFields::POSITION;
                    if rotation_changed {
                        fields |= EntryFields::ROTATION;
                    }
                    container.mark_item_dirty(item, fields);
                    self.settle(env.items, source);
                } else {
                    if self.lookup(dest)?.entries().len() >= InventoryConfig::MAX_ENTRIES {
                        return Err(InventoryError::CapacityExceeded(dest));
                    }
                    let removed = self
                        .lookup_mut(source)?
                        .remove_entry(item)
                        .ok_or(InventoryError::ItemNotFound(item, source))?;
                    let inserted = self
                        .lookup_mut(dest)?
                        .insert_entry(InventoryEntry::new(removed.item, x, y, rotated));
                    debug_assert!(inserted);
                    env.replication.transfer(item, source, dest);
                    self.settle(env.items, source);
                    self.settle(env.items, dest);
                }
                Ok(TransferOutcome::Placed)
            }

            Placement::Stack { into } => {
                let dest_quantity = self
                    .lookup(dest)?
                    .entry(into)
                    .ok_or(InventoryError::ItemNotFound(into, dest))?
                    .item
                    .quantity();
                let moved = stacking::resolve(def.max_stack, dest_quantity, mover.quantity());
                if moved == 0 {
                    return Ok(TransferOutcome::Stacked { moved: 0 });
                }

                if moved == mover.quantity() {
                    // Whole source stack merges; the source instance dies.
                    self.lookup_mut(source)?
                        .remove_entry(item)
                        .ok_or(InventoryError::ItemNotFound(item, source))?;
                    let dest_c = self.lookup_mut(dest)?;
                    dest_c
                        .entry_mut(into)
                        .ok_or(InventoryError::ItemNotFound(into, dest))?
                        .item
                        .add_stack(moved, def.max_stack);
                    dest_c.mark_item_dirty(into, EntryFields::QUANTITY);
                    env.replication.unregister(item, source);
                } else {
                    let source_c = self.lookup_mut(source)?;
                    source_c
                        .entry_mut(item)
                        .ok_or(InventoryError::ItemNotFound(item, source))?
                        .item
                        .remove_stack(moved);
                    source_c.mark_item_dirty(item, EntryFields::QUANTITY);
                    let dest_c = self.lookup_mut(dest)?;
                    dest_c
                        .entry_mut(into)
                        .ok_or(InventoryError::ItemNotFound(into, dest))?
                        .item
                        .add_stack(moved, def.max_stack);
                    dest_c.mark_item_dirty(into, EntryFields::QUANTITY);
                }

                self.settle(env.items, source);
                if dest != source {
                    self.settle(env.items, dest);
                }
                Ok(TransferOutcome::Stacked { moved })
            }

            Placement::Swap { displaced } => {
                if source == dest {
                    let container = self.lookup_mut(source)?;
                    {
                        let entry = container
                            .entry_mut(item)
                            .ok_or(InventoryError::ItemNotFound(item, source))?;
                        entry.x = x;
                        entry.y = y;
                        entry.rotated = rotated;
                    }
                    container.mark_item_dirty(item, EntryFields::POSITION | EntryFields::ROTATION);
                    {
                        // The displaced item takes over the vacated
                        // rectangle with the mover's original rotation,
                        // which is what the reciprocal-fit check probed.
                        let entry = container
                            .entry_mut(displaced)
                            .ok_or(InventoryError::ItemNotFound(displaced, source))?;
                        entry.x = origin_x;
                        entry.y = origin_y;
                        entry.rotated = origin_rotated;
                    }
                    container
                        .mark_item_dirty(displaced, EntryFields::POSITION | EntryFields::ROTATION);
                    self.settle(env.items, source);
                } else {
                    let mover_entry = self
                        .lookup_mut(source)?
                        .remove_entry(item)
                        .ok_or(InventoryError::ItemNotFound(item, source))?;
                    let displaced_entry = self
                        .lookup_mut(dest)?
                        .remove_entry(displaced)
                        .ok_or(InventoryError::ItemNotFound(displaced, dest))?;
                    let inserted = self
                        .lookup_mut(dest)?
                        .insert_entry(InventoryEntry::new(mover_entry.item, x, y, rotated));
                    debug_assert!(inserted);
                    let inserted = self.lookup_mut(source)?.insert_entry(InventoryEntry::new(
                        displaced_entry.item,
                        origin_x,
                        origin_y,
                        origin_rotated,
                    ));
                    debug_assert!(inserted);
                    env.replication.transfer(item, source, dest);
                    env.replication.transfer(displaced, dest, source);
                    self.settle(env.items, source);
                    self.settle(env.items, dest);
                }
                Ok(TransferOutcome::Swapped { displaced })
            }
        }
    }

    /// Lifts a settled item onto the container's cursor.
    pub fn request_pickup(
        &mut self,
        env: &mut InventoryEnv<'_>,
        container: ContainerId,
        item: ItemId,
    ) -> Result<(), InventoryError> {
        self.require_authority()?;

        let c = self.lookup_mut(container)?;
        if c.cursor().is_some() {
            return Err(InventoryError::CursorOccupied(container));
        }
        let removed = c
            .remove_entry(item)
            .ok_or(InventoryError::ItemNotFound(item, container))?;
        c.set_cursor(removed.item);
        self.settle(env.items, container);
        Ok(())
    }

    /// Drops the cursor item onto a target rectangle in the same
    /// container. A single occupant of a different definition is lifted
    /// onto the cursor in exchange; no reciprocal fit applies because the
    /// cursor has no rectangle of its own.
    pub fn request_place(
        &mut self,
        env: &mut InventoryEnv<'_>,
        container: ContainerId,
        x: i32,
        y: i32,
        rotated: bool,
    ) -> Result<TransferOutcome, InventoryError> {
        self.require_authority()?;

        let (placement, held) = {
            let c = self.lookup(container)?;
            let held = c
                .cursor()
                .ok_or(InventoryError::CursorEmpty(container))?
                .clone();
            let placement = placement::classify(c, env.items, &held, x, y, rotated, None);
            (placement, held)
        };
        let def = env
            .items
            .definition(held.definition)
            .ok_or(InventoryError::UnknownDefinition(held.definition))?;

        match placement {
            Placement::Reject(reason) => Ok(TransferOutcome::Rejected(reason)),

            Placement::Place => {
                if self.lookup(container)?.entries().len() >= InventoryConfig::MAX_ENTRIES {
                    return Err(InventoryError::CapacityExceeded(container));
                }
                let c = self.lookup_mut(container)?;
                let held = c
                    .take_cursor()
                    .ok_or(InventoryError::CursorEmpty(container))?;
                let inserted = c.insert_entry(InventoryEntry::new(held, x, y, rotated));
                debug_assert!(inserted);
                self.settle(env.items, container);
                Ok(TransferOutcome::Placed)
            }

            Placement::Stack { into } => {
                let dest_quantity = self
                    .lookup(container)?
                    .entry(into)
                    .ok_or(InventoryError::ItemNotFound(into, container))?
                    .item
                    .quantity();
                let moved = stacking::resolve(def.max_stack, dest_quantity, held.quantity());
                if moved == 0 {
                    return Ok(TransferOutcome::Stacked { moved: 0 });
                }

                let destroyed = moved == held.quantity();
                let c = self.lookup_mut(container)?;
                let mut held = c
                    .take_cursor()
                    .ok_or(InventoryError::CursorEmpty(container))?;
                let held_id = held.id;
                if !destroyed {
                    held.remove_stack(moved);
                    c.set_cursor(held);
                }
                c.entry_mut(into)
                    .ok_or(InventoryError::ItemNotFound(into, container))?
                    .item
                    .add_stack(moved, def.max_stack);
                c.mark_item_dirty(into, EntryFields::QUANTITY);
                if destroyed {
                    env.replication.unregister(held_id, container);
                }
                self.settle(env.items, container);
                Ok(TransferOutcome::Stacked { moved })
            }

            Placement::Swap { displaced } => {
                let c = self.lookup_mut(container)?;
                let held = c
                    .take_cursor()
                    .ok_or(InventoryError::CursorEmpty(container))?;
                let occupant = c
                    .remove_entry(displaced)
                    .ok_or(InventoryError::ItemNotFound(displaced, container))?;
                let inserted = c.insert_entry(InventoryEntry::new(held, x, y, rotated));
                debug_assert!(inserted);
                c.set_cursor(occupant.item);
                self.settle(env.items, container);
                Ok(TransferOutcome::Swapped { displaced })
            }
        }
    }

    /// Ejects a settled item into the world.
    pub fn request_drop(
        &mut self,
        env: &mut InventoryEnv<'_>,
        container: ContainerId,
        item: ItemId,
    ) -> Result<(), InventoryError> {
        self.require_authority()?;

        let removed = self
            .lookup_mut(container)?
            .remove_entry(item)
            .ok_or(InventoryError::ItemNotFound(item, container))?;
        env.replication.unregister(item, container);
        env.world.spawn_in_world(removed.item);
        self.settle(env.items, container);
        Ok(())
    }

    /// Ejects the cursor item into the world. Returns the ejected id.
    pub fn request_drop_cursor(
        &mut self,
        env: &mut InventoryEnv<'_>,
        container: ContainerId,
    ) -> Result<ItemId, InventoryError> {
        self.require_authority()?;

        let held = self
            .lookup_mut(container)?
            .take_cursor()
            .ok_or(InventoryError::CursorEmpty(container))?;
        let id = held.id;
        env.replication.unregister(id, container);
        env.world.spawn_in_world(held);
        // Grid cells are untouched; only the cursor changed.
        self.observers.notify(container);
        Ok(id)
    }

    /// Splits `amount` units off a settled stack into a fresh instance at
    /// the first free slot. The free-slot search runs before any write;
    /// a full grid aborts the whole request.
    pub fn request_split_stack(
        &mut self,
        env: &mut InventoryEnv<'_>,
        container: ContainerId,
        item: ItemId,
        amount: u32,
    ) -> Result<ItemId, InventoryError> {
        self.require_authority()?;

        let (definition, slot) = {
            let c = self.lookup(container)?;
            let entry = c
                .entry(item)
                .ok_or(InventoryError::ItemNotFound(item, container))?;
            let quantity = entry.item.quantity();
            if amount == 0 || amount >= quantity {
                return Err(InventoryError::InvalidSplit { amount, quantity });
            }
            let def = env
                .items
                .definition(entry.item.definition)
                .ok_or(InventoryError::UnknownDefinition(entry.item.definition))?;
            if c.entries().len() >= InventoryConfig::MAX_ENTRIES {
                return Err(InventoryError::CapacityExceeded(container));
            }
            let dims = def.dims_of(false);
            let slot = find_free_slot(c, dims).ok_or(InventoryError::NoFreeSlot {
                container,
                width: dims.width,
                height: dims.height,
            })?;
            (def.id, slot)
        };

        let new_id = self.allocate_item_id();
        let c = self.lookup_mut(container)?;
        c.entry_mut(item)
            .ok_or(InventoryError::ItemNotFound(item, container))?
            .item
            .remove_stack(amount);
        c.mark_item_dirty(item, EntryFields::QUANTITY);
        let inserted = c.insert_entry(InventoryEntry::new(
            ItemInstance::new(new_id, definition, amount),
            slot.0,
            slot.1,
            false,
        ));
        debug_assert!(inserted);
        env.replication.register(new_id, container);
        self.settle(env.items, container);
        Ok(new_id)
    }

    /// Removes a weapon or armor item from the grid and hands it to the
    /// equipment sink.
    pub fn request_equip(
        &mut self,
        env: &mut InventoryEnv<'_>,
        container: ContainerId,
        item: ItemId,
    ) -> Result<(), InventoryError> {
        self.require_authority()?;

        {
            let c = self.lookup(container)?;
            let entry = c
                .entry(item)
                .ok_or(InventoryError::ItemNotFound(item, container))?;
            let def = env
                .items
                .definition(entry.item.definition)
                .ok_or(InventoryError::UnknownDefinition(entry.item.definition))?;
            if !def.is_equippable() {
                return Err(InventoryError::NotEquippable(def.id));
            }
        }

        let removed = self
            .lookup_mut(container)?
            .remove_entry(item)
            .ok_or(InventoryError::ItemNotFound(item, container))?;
        env.replication.unregister(item, container);
        env.equip.equip(removed.item);
        self.settle(env.items, container);
        Ok(())
    }

    /// Auto-loots `quantity` units of a definition into a container: first
    /// tops up existing stacks of the same definition, then opens new
    /// stacks at free slots, and finally hands whatever still does not fit
    /// to the world spawner.
    pub fn add_item_definition(
        &mut self,
        env: &mut InventoryEnv<'_>,
        container: ContainerId,
        definition: DefinitionId,
        quantity: u32,
    ) -> Result<AddReport, InventoryError> {
        self.require_authority()?;

        let mut report = AddReport::default();
        if quantity == 0 {
            return Ok(report);
        }
        let def = env
            .items
            .definition(definition)
            .ok_or(InventoryError::UnknownDefinition(definition))?;
        let mut remaining = quantity;

        // First pass: top up existing stacks of the same definition, in
        // entry-list order.
        let candidates: Vec<ItemId> = self
            .lookup(container)?
            .entries()
            .iter()
            .filter(|entry| entry.item.definition == definition)
            .map(|entry| entry.item.id)
            .collect();
        for id in candidates {
            if remaining == 0 {
                break;
            }
            let c = self.lookup_mut(container)?;
            let added = c
                .entry_mut(id)
                .ok_or(InventoryError::ItemNotFound(id, container))?
                .item
                .add_stack(remaining, def.max_stack);
            if added > 0 {
                c.mark_item_dirty(id, EntryFields::QUANTITY);
                remaining -= added;
                report.merged += added;
            }
        }

        // Second pass: new stacks at free slots, then world overflow. The
        // occupancy index is rebuilt after every insertion so the next
        // search sees it.
        let dims = def.dims_of(false);
        while remaining > 0 {
            let chunk = remaining.min(def.max_stack);
            let slot = {
                let c = self.lookup(container)?;
                if c.entries().len() >= InventoryConfig::MAX_ENTRIES {
                    None
                } else {
                    find_free_slot(c, dims)
                }
            };
            match slot {
                Some((x, y)) => {
                    let id = self.allocate_item_id();
                    let c = self.lookup_mut(container)?;
                    let inserted = c.insert_entry(InventoryEntry::new(
                        ItemInstance::new(id, definition, chunk),
                        x,
                        y,
                        false,
                    ));
                    debug_assert!(inserted);
                    c.rebuild(env.items);
                    env.replication.register(id, container);
                    report.placed += chunk;
                }
                None => {
                    let id = self.allocate_item_id();
                    env.world
                        .spawn_in_world(ItemInstance::new(id, definition, chunk));
                    report.spawned += chunk;
                }
            }
            remaining -= chunk;
        }

        if report.merged + report.placed > 0 {
            self.settle(env.items, container);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{EquipSink, ItemDefinition, ItemKind, ReplicationRegistry, WorldSpawner};
    use std::collections::BTreeMap;

    struct Catalog(Vec<ItemDefinition>);

    impl ItemOracle for Catalog {
        fn definition(&self, id: DefinitionId) -> Option<ItemDefinition> {
            self.0.iter().find(|def| def.id == id).cloned()
        }
    }

    fn catalog() -> Catalog {
        Catalog(vec![
            ItemDefinition::new(DefinitionId(1), ItemKind::Material, 10).with_weight(0.5),
            ItemDefinition::new(DefinitionId(2), ItemKind::Weapon, 1)
                .with_dims(2, 2)
                .with_weight(4.0),
            ItemDefinition::new(DefinitionId(3), ItemKind::Armor, 1)
                .with_dims(1, 2)
                .with_weight(2.0),
            ItemDefinition::new(DefinitionId(4), ItemKind::Consumable, 5),
        ])
    }

    #[derive(Default)]
    struct World(Vec<ItemInstance>);

    impl WorldSpawner for World {
        fn spawn_in_world(&mut self, item: ItemInstance) {
            self.0.push(item);
        }
    }

    #[derive(Default)]
    struct Equipment(Vec<ItemInstance>);

    impl EquipSink for Equipment {
        fn equip(&mut self, item: ItemInstance) {
            self.0.push(item);
        }
    }

    /// Single-owner map that panics on any ownership contract violation.
    #[derive(Default)]
    struct Ownership(BTreeMap<ItemId, ContainerId>);

    impl ReplicationRegistry for Ownership {
        fn register(&mut self, item: ItemId, owner: ContainerId) {
            assert!(self.0.insert(item, owner).is_none(), "{item} double-registered");
        }

        fn unregister(&mut self, item: ItemId, owner: ContainerId) {
            assert_eq!(self.0.remove(&item), Some(owner), "{item} wrong owner");
        }

        fn transfer(&mut self, item: ItemId, from: ContainerId, to: ContainerId) {
            assert_eq!(self.0.insert(item, to), Some(from), "{item} wrong owner");
        }
    }

    struct Harness {
        catalog: Catalog,
        world: World,
        equipment: Equipment,
        ownership: Ownership,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                catalog: catalog(),
                world: World::default(),
                equipment: Equipment::default(),
                ownership: Ownership::default(),
            }
        }

        fn env(&mut self) -> InventoryEnv<'_> {
            InventoryEnv::new(
                &self.catalog,
                &mut self.world,
                &mut self.equipment,
                &mut self.ownership,
            )
        }

        /// Places an entry directly into a container, bypassing the
        /// request path, and registers its ownership.
        fn seed(
            &mut self,
            engine: &mut InventoryEngine,
            container: ContainerId,
            id: u64,
            definition: u32,
            quantity: u32,
            x: i32,
            y: i32,
        ) -> ItemId {
            let item = ItemId(id);
            let c = engine.containers.get_mut(&container).unwrap();
            assert!(c.insert_entry(InventoryEntry::new(
                ItemInstance::new(item, DefinitionId(definition), quantity),
                x,
                y,
                false,
            )));
            c.rebuild(&self.catalog);
            c.take_dirty();
            self.ownership.0.insert(item, container);
            item
        }
    }

    fn server_with_grid() -> (InventoryEngine, ContainerId) {
        let mut engine = InventoryEngine::new(Authority::Server);
        let id = engine.create_container(InventoryConfig::new(10, 6));
        (engine, id)
    }

    /// Total units of one definition across grids, cursors, the world
    /// sink, and the equipment sink.
    fn total_units(engine: &InventoryEngine, harness: &Harness, definition: u32) -> u32 {
        let def = DefinitionId(definition);
        let mut sum = 0;
        for container in engine.containers() {
            for entry in container.entries() {
                if entry.item.definition == def {
                    sum += entry.item.quantity();
                }
            }
            if let Some(held) = container.cursor() {
                if held.definition == def {
                    sum += held.quantity();
                }
            }
        }
        for item in harness.world.0.iter().chain(harness.equipment.0.iter()) {
            if item.definition == def {
                sum += item.quantity();
            }
        }
        sum
    }

    #[test]
    fn place_moves_entry_and_marks_position_dirty() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let item = h.seed(&mut engine, grid, 100, 2, 1, 0, 0);

        let outcome = engine
            .request_transfer(&mut h.env(), grid, item, grid, 4, 2, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Placed);

        let entry = engine.container(grid).unwrap().entry(item).unwrap();
        assert_eq!((entry.x, entry.y), (4, 2));
        assert_eq!(engine.container(grid).unwrap().item_at(0, 0), None);
        assert_eq!(engine.container(grid).unwrap().item_at(5, 3), Some(item));

        let dirty = engine.take_dirty(grid).unwrap();
        assert!(!dirty.structural);
        assert_eq!(dirty.entries.get(&item), Some(&EntryFields::POSITION));
    }

    #[test]
    fn rotated_place_marks_rotation_and_repaints_footprint() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let item = h.seed(&mut engine, grid, 100, 3, 1, 0, 0); // 1x2

        let outcome = engine
            .request_transfer(&mut h.env(), grid, item, grid, 5, 0, true)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Placed);

        // Rotated 1x2 covers two cells in a row.
        let c = engine.container(grid).unwrap();
        assert_eq!(c.item_at(5, 0), Some(item));
        assert_eq!(c.item_at(6, 0), Some(item));
        assert_eq!(c.item_at(5, 1), None);

        let dirty = engine.take_dirty(grid).unwrap();
        assert_eq!(
            dirty.entries.get(&item),
            Some(&(EntryFields::POSITION | EntryFields::ROTATION))
        );
    }

    #[test]
    fn out_of_bounds_transfer_rejects_without_touching_state() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let item = h.seed(&mut engine, grid, 100, 2, 1, 3, 3);

        let outcome = engine
            .request_transfer(&mut h.env(), grid, item, grid, 9, 0, false)
            .unwrap();
        assert_eq!(
            outcome,
            TransferOutcome::Rejected(RejectReason::OutOfBounds)
        );

        let entry = engine.container(grid).unwrap().entry(item).unwrap();
        assert_eq!((entry.x, entry.y), (3, 3));
        assert!(engine.take_dirty(grid).unwrap().is_empty());
    }

    #[test]
    fn partial_stack_leaves_source_remainder() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let dest = h.seed(&mut engine, grid, 100, 1, 7, 0, 0);
        let source = h.seed(&mut engine, grid, 101, 1, 6, 5, 0);

        let outcome = engine
            .request_transfer(&mut h.env(), grid, source, grid, 0, 0, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Stacked { moved: 3 });

        let c = engine.container(grid).unwrap();
        assert_eq!(c.entry(dest).unwrap().item.quantity(), 10);
        assert_eq!(c.entry(source).unwrap().item.quantity(), 3);
        assert_eq!(total_units(&engine, &h, 1), 13);

        let dirty = engine.take_dirty(grid).unwrap();
        assert_eq!(dirty.entries.get(&dest), Some(&EntryFields::QUANTITY));
        assert_eq!(dirty.entries.get(&source), Some(&EntryFields::QUANTITY));
        assert!(!dirty.structural);
    }

    #[test]
    fn full_stack_merge_destroys_source_instance() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let dest = h.seed(&mut engine, grid, 100, 1, 4, 0, 0);
        let source = h.seed(&mut engine, grid, 101, 1, 3, 5, 0);

        let outcome = engine
            .request_transfer(&mut h.env(), grid, source, grid, 0, 0, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Stacked { moved: 3 });

        let c = engine.container(grid).unwrap();
        assert_eq!(c.entry(dest).unwrap().item.quantity(), 7);
        assert!(c.entry(source).is_none());
        assert!(!h.ownership.0.contains_key(&source));
        assert_eq!(total_units(&engine, &h, 1), 7);
        assert!(engine.take_dirty(grid).unwrap().structural);
    }

    #[test]
    fn stack_onto_full_destination_moves_nothing() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let dest = h.seed(&mut engine, grid, 100, 1, 10, 0, 0);
        let source = h.seed(&mut engine, grid, 101, 1, 5, 5, 0);

        let outcome = engine
            .request_transfer(&mut h.env(), grid, source, grid, 0, 0, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Stacked { moved: 0 });

        let c = engine.container(grid).unwrap();
        assert_eq!(c.entry(dest).unwrap().item.quantity(), 10);
        assert_eq!(c.entry(source).unwrap().item.quantity(), 5);
        assert!(engine.take_dirty(grid).unwrap().is_empty());
    }

    #[test]
    fn same_container_swap_exchanges_rectangles() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let sword = h.seed(&mut engine, grid, 100, 2, 1, 0, 0); // 2x2
        let plate = h.seed(&mut engine, grid, 101, 3, 1, 5, 0); // 1x2

        let outcome = engine
            .request_transfer(&mut h.env(), grid, sword, grid, 5, 0, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Swapped { displaced: plate });

        let c = engine.container(grid).unwrap();
        let sword_entry = c.entry(sword).unwrap();
        let plate_entry = c.entry(plate).unwrap();
        assert_eq!((sword_entry.x, sword_entry.y), (5, 0));
        assert_eq!((plate_entry.x, plate_entry.y), (0, 0));
        assert!(c.occupancy_consistent(&h.catalog));
    }

    #[test]
    fn adjacent_unit_items_swap_positions() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let herbs = h.seed(&mut engine, grid, 100, 1, 1, 0, 0);
        let potion = h.seed(&mut engine, grid, 101, 4, 1, 1, 0);

        let outcome = engine
            .request_transfer(&mut h.env(), grid, herbs, grid, 1, 0, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Swapped { displaced: potion });

        let c = engine.container(grid).unwrap();
        assert_eq!(c.item_at(1, 0), Some(herbs));
        assert_eq!(c.item_at(0, 0), Some(potion));
    }

    #[test]
    fn infeasible_swap_rejects_and_leaves_both_items() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        // 1x1 mover whose origin corner is crowded so a 2x2 cannot land.
        let pebble = h.seed(&mut engine, grid, 100, 1, 1, 0, 0);
        let sword = h.seed(&mut engine, grid, 101, 2, 1, 4, 0);
        h.seed(&mut engine, grid, 102, 1, 1, 1, 1);

        let outcome = engine
            .request_transfer(&mut h.env(), grid, pebble, grid, 4, 0, false)
            .unwrap();
        assert_eq!(
            outcome,
            TransferOutcome::Rejected(RejectReason::SwapInfeasible)
        );

        let c = engine.container(grid).unwrap();
        assert_eq!((c.entry(pebble).unwrap().x, c.entry(pebble).unwrap().y), (0, 0));
        assert_eq!((c.entry(sword).unwrap().x, c.entry(sword).unwrap().y), (4, 0));
        assert!(engine.take_dirty(grid).unwrap().is_empty());
    }

    #[test]
    fn cross_container_place_transfers_ownership() {
        let mut h = Harness::new();
        let mut engine = InventoryEngine::new(Authority::Server);
        let backpack = engine.create_container(InventoryConfig::new(10, 6));
        let stash = engine.create_container(InventoryConfig::new(8, 8));
        let item = h.seed(&mut engine, backpack, 100, 2, 1, 0, 0);

        let outcome = engine
            .request_transfer(&mut h.env(), backpack, item, stash, 3, 3, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Placed);

        assert!(engine.container(backpack).unwrap().entry(item).is_none());
        assert!(engine.container(stash).unwrap().entry(item).is_some());
        assert_eq!(h.ownership.0.get(&item), Some(&stash));
        // Both sides report a structural change.
        assert!(engine.take_dirty(backpack).unwrap().structural);
        assert!(engine.take_dirty(stash).unwrap().structural);
    }

    #[test]
    fn cross_container_swap_moves_ownership_both_ways() {
        let mut h = Harness::new();
        let mut engine = InventoryEngine::new(Authority::Server);
        let backpack = engine.create_container(InventoryConfig::new(10, 6));
        let stash = engine.create_container(InventoryConfig::new(8, 8));
        let sword = h.seed(&mut engine, backpack, 100, 2, 1, 0, 0);
        let plate = h.seed(&mut engine, stash, 101, 3, 1, 2, 2);

        let outcome = engine
            .request_transfer(&mut h.env(), backpack, sword, stash, 2, 2, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Swapped { displaced: plate });

        assert_eq!(h.ownership.0.get(&sword), Some(&stash));
        assert_eq!(h.ownership.0.get(&plate), Some(&backpack));
        let plate_entry = engine.container(backpack).unwrap().entry(plate).unwrap();
        assert_eq!((plate_entry.x, plate_entry.y), (0, 0));
    }

    #[test]
    fn pickup_then_place_round_trips_through_cursor() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let item = h.seed(&mut engine, grid, 100, 2, 1, 0, 0);

        engine.request_pickup(&mut h.env(), grid, item).unwrap();
        {
            let c = engine.container(grid).unwrap();
            assert_eq!(c.cursor().map(|held| held.id), Some(item));
            assert!(c.entry(item).is_none());
            assert_eq!(c.item_at(0, 0), None);
        }

        let outcome = engine
            .request_place(&mut h.env(), grid, 6, 2, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Placed);
        let c = engine.container(grid).unwrap();
        assert!(c.cursor().is_none());
        assert_eq!(c.item_at(7, 3), Some(item));
    }

    #[test]
    fn pickup_with_occupied_cursor_fails() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let first = h.seed(&mut engine, grid, 100, 1, 1, 0, 0);
        let second = h.seed(&mut engine, grid, 101, 1, 1, 1, 0);

        engine.request_pickup(&mut h.env(), grid, first).unwrap();
        let err = engine
            .request_pickup(&mut h.env(), grid, second)
            .unwrap_err();
        assert_eq!(err, InventoryError::CursorOccupied(grid));
        assert!(engine.container(grid).unwrap().entry(second).is_some());
    }

    #[test]
    fn cursor_place_onto_occupant_lifts_it_in_exchange() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let sword = h.seed(&mut engine, grid, 100, 2, 1, 0, 0);
        let plate = h.seed(&mut engine, grid, 101, 3, 1, 5, 0);

        engine.request_pickup(&mut h.env(), grid, sword).unwrap();
        let outcome = engine
            .request_place(&mut h.env(), grid, 5, 0, false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Swapped { displaced: plate });

        let c = engine.container(grid).unwrap();
        assert_eq!(c.cursor().map(|held| held.id), Some(plate));
        assert_eq!(c.item_at(5, 0), Some(sword));
    }

    #[test]
    fn drop_spawns_in_world_and_releases_ownership() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let item = h.seed(&mut engine, grid, 100, 1, 5, 0, 0);

        engine.request_pickup(&mut h.env(), grid, item).unwrap();
        let dropped = engine.request_drop_cursor(&mut h.env(), grid).unwrap();
        assert_eq!(dropped, item);

        assert!(engine.container(grid).unwrap().cursor().is_none());
        assert!(!h.ownership.0.contains_key(&item));
        assert_eq!(h.world.0.len(), 1);
        assert_eq!(h.world.0[0].quantity(), 5);
    }

    #[test]
    fn drop_from_grid_frees_the_footprint() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let sword = h.seed(&mut engine, grid, 100, 2, 1, 0, 0);

        engine.request_drop(&mut h.env(), grid, sword).unwrap();

        let c = engine.container(grid).unwrap();
        assert!(c.entry(sword).is_none());
        assert_eq!(c.item_at(0, 0), None);
        assert!(!h.ownership.0.contains_key(&sword));
        assert_eq!(h.world.0.len(), 1);
        assert!(engine.take_dirty(grid).unwrap().structural);
    }

    #[test]
    fn split_creates_new_instance_at_first_free_slot() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let stack = h.seed(&mut engine, grid, 100, 1, 8, 0, 0);

        let half = engine
            .request_split_stack(&mut h.env(), grid, stack, 3)
            .unwrap();

        let c = engine.container(grid).unwrap();
        assert_eq!(c.entry(stack).unwrap().item.quantity(), 5);
        let half_entry = c.entry(half).unwrap();
        assert_eq!(half_entry.item.quantity(), 3);
        // Row-major scan lands immediately right of the original.
        assert_eq!((half_entry.x, half_entry.y), (1, 0));
        assert_eq!(h.ownership.0.get(&half), Some(&grid));
        assert_eq!(total_units(&engine, &h, 1), 8);

        let dirty = engine.take_dirty(grid).unwrap();
        assert!(dirty.structural);
        assert_eq!(dirty.entries.get(&stack), Some(&EntryFields::QUANTITY));
    }

    #[test]
    fn split_rejects_degenerate_amounts() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let stack = h.seed(&mut engine, grid, 100, 1, 4, 0, 0);

        for amount in [0, 4, 9] {
            let err = engine
                .request_split_stack(&mut h.env(), grid, stack, amount)
                .unwrap_err();
            assert_eq!(err, InventoryError::InvalidSplit { amount, quantity: 4 });
        }
        assert_eq!(
            engine.container(grid).unwrap().entry(stack).unwrap().item.quantity(),
            4
        );
    }

    #[test]
    fn split_aborts_before_mutation_when_grid_is_full() {
        let mut h = Harness::new();
        let mut engine = InventoryEngine::new(Authority::Server);
        let grid = engine.create_container(InventoryConfig::new(2, 1));
        let stack = h.seed(&mut engine, grid, 100, 1, 6, 0, 0);
        h.seed(&mut engine, grid, 101, 4, 1, 1, 0);

        let err = engine
            .request_split_stack(&mut h.env(), grid, stack, 2)
            .unwrap_err();
        assert_eq!(
            err,
            InventoryError::NoFreeSlot {
                container: grid,
                width: 1,
                height: 1
            }
        );
        assert_eq!(
            engine.container(grid).unwrap().entry(stack).unwrap().item.quantity(),
            6
        );
        assert!(engine.take_dirty(grid).unwrap().is_empty());
    }

    #[test]
    fn equip_removes_item_and_feeds_the_sink() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let sword = h.seed(&mut engine, grid, 100, 2, 1, 0, 0);

        engine.request_equip(&mut h.env(), grid, sword).unwrap();

        assert!(engine.container(grid).unwrap().entry(sword).is_none());
        assert!(!h.ownership.0.contains_key(&sword));
        assert_eq!(h.equipment.0.len(), 1);
        assert_eq!(h.equipment.0[0].id, sword);
    }

    #[test]
    fn equip_rejects_non_equippable_kinds() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let herbs = h.seed(&mut engine, grid, 100, 1, 3, 0, 0);

        let err = engine.request_equip(&mut h.env(), grid, herbs).unwrap_err();
        assert_eq!(err, InventoryError::NotEquippable(DefinitionId(1)));
        assert!(engine.container(grid).unwrap().entry(herbs).is_some());
    }

    #[test]
    fn auto_loot_tops_up_stacks_before_opening_new_ones() {
        let mut h = Harness::new();
        let (mut engine, grid) = server_with_grid();
        let existing = h.seed(&mut engine, grid, 100, 1, 7, 0, 0);

        let report = engine
            .add_item_definition(&mut h.env(), grid, DefinitionId(1), 15)
            .unwrap();
        assert_eq!(
            report,
            AddReport {
                merged: 3,
                placed: 12,
                spawned: 0
            }
        );

        let c = engine.container(grid).unwrap();
        assert_eq!(c.entry(existing).unwrap().item.quantity(), 10);
        // 12 remaining units open a full stack and a partial one.
        let new_quantities: Vec<u32> = c
            .entries()
            .iter()
            .filter(|entry| entry.item.id != existing)
            .map(|entry| entry.item.quantity())
            .collect();
        assert_eq!(new_quantities, vec![10, 2]);
        assert_eq!(total_units(&engine, &h, 1), 22);
    }

    #[test]
    fn auto_loot_overflow_spawns_in_world() {
        let mut h = Harness::new();
        let mut engine = InventoryEngine::new(Authority::Server);
        let grid = engine.create_container(InventoryConfig::new(2, 1));
        h.seed(&mut engine, grid, 100, 4, 5, 0, 0);
        h.seed(&mut engine, grid, 101, 1, 1, 1, 0);

        let report = engine
            .add_item_definition(&mut h.env(), grid, DefinitionId(4), 8)
            .unwrap();
        assert_eq!(
            report,
            AddReport {
                merged: 0,
                placed: 0,
                spawned: 8
            }
        );
        // Overflow arrives as max-stack chunks.
        let spawned: Vec<u32> = h.world.0.iter().map(ItemInstance::quantity).collect();
        assert_eq!(spawned, vec![5, 3]);
        assert_eq!(total_units(&engine, &h, 4), 13);
    }

    #[test]
    fn remote_engine_refuses_every_mutation() {
        let mut h = Harness::new();
        let mut engine = InventoryEngine::new(Authority::Remote);
        let grid = engine.create_container(InventoryConfig::default());
        let item = h.seed(&mut engine, grid, 100, 1, 5, 0, 0);

        assert_eq!(
            engine.request_transfer(&mut h.env(), grid, item, grid, 1, 1, false),
            Err(InventoryError::NotAuthoritative)
        );
        assert_eq!(
            engine.request_pickup(&mut h.env(), grid, item),
            Err(InventoryError::NotAuthoritative)
        );
        assert_eq!(
            engine.request_split_stack(&mut h.env(), grid, item, 2),
            Err(InventoryError::NotAuthoritative)
        );
        assert_eq!(
            engine.add_item_definition(&mut h.env(), grid, DefinitionId(1), 1),
            Err(InventoryError::NotAuthoritative)
        );
        assert!(engine.take_dirty(grid).unwrap().is_empty());
    }

    #[test]
    fn observers_fire_once_per_settled_container() {
        use std::sync::{Arc, Mutex};

        let mut h = Harness::new();
        let mut engine = InventoryEngine::new(Authority::Server);
        let backpack = engine.create_container(InventoryConfig::new(10, 6));
        let stash = engine.create_container(InventoryConfig::new(8, 8));
        let item = h.seed(&mut engine, backpack, 100, 2, 1, 0, 0);

        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let log = Arc::clone(&log);
            engine.observers_mut().subscribe(Arc::new(move |id: ContainerId| {
                log.lock().unwrap().push(id);
            }));
        }

        engine
            .request_transfer(&mut h.env(), backpack, item, stash, 0, 0, false)
            .unwrap();
        assert_eq!(log.lock().unwrap().as_slice(), &[backpack, stash]);
    }
}
