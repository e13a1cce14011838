//! Item instance identity and typed stack-count access.
//!
//! An [`ItemInstance`] is an owned value with a typed `quantity` field.
//! Identity ([`ItemId`]) determines ownership: an instance lives in exactly
//! one container's entry list (or its cursor) at a time, and moving it
//! between containers moves the value.

use std::fmt;

/// Unique identity of one item instance on a host.
///
/// Allocated monotonically by the engine; never reused. Equality of ids,
/// not of contents, is what every overlap and ownership rule counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Identity of an item definition in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefinitionId(pub u32);

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def#{}", self.0)
    }
}

/// One stackable item instance.
///
/// # Invariants
///
/// - `0 < quantity <= definition.max_stack` while the instance exists; a
///   quantity that would reach zero means the instance must be destroyed by
///   its owner, never kept around empty.
/// - Quantity moves only through [`add_stack`](Self::add_stack) /
///   [`remove_stack`](Self::remove_stack), which clamp rather than wrap.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemInstance {
    pub id: ItemId,
    pub definition: DefinitionId,
    quantity: u32,
}

impl ItemInstance {
    pub fn new(id: ItemId, definition: DefinitionId, quantity: u32) -> Self {
        debug_assert!(quantity > 0);
        Self {
            id,
            definition,
            quantity,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Adds up to `amount`, clamped so the result never exceeds `max_stack`.
    /// Returns how much was actually added.
    pub fn add_stack(&mut self, amount: u32, max_stack: u32) -> u32 {
        let space = max_stack.saturating_sub(self.quantity);
        let added = amount.min(space);
        self.quantity += added;
        added
    }

    /// Removes up to `amount`, clamped at the current quantity. Returns how
    /// much was actually removed; the caller must destroy the instance if
    /// the quantity hits zero.
    pub fn remove_stack(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.quantity);
        self.quantity -= removed;
        removed
    }
}
