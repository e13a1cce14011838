//! Engine operation errors.
//!
//! Errors are reserved for requests that reference state which does not
//! exist or violate a hard precondition. A request naming real state that
//! merely targets an invalid drop rectangle is not an error; it resolves
//! to [`Rejected`](crate::engine::TransferOutcome::Rejected) and leaves
//! every container untouched.

use crate::grid::ContainerId;
use crate::item::{DefinitionId, ItemId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InventoryError {
    /// Mutating request on an engine that does not hold authority.
    #[error("engine is not authoritative")]
    NotAuthoritative,

    #[error("unknown container: {0}")]
    UnknownContainer(ContainerId),

    #[error("{0} is not settled in {1}")]
    ItemNotFound(ItemId, ContainerId),

    #[error("catalog has no definition for {0}")]
    UnknownDefinition(DefinitionId),

    /// Pickup while the cursor already holds an item.
    #[error("cursor of {0} already holds an item")]
    CursorOccupied(ContainerId),

    /// Place or drop with nothing on the cursor.
    #[error("cursor of {0} is empty")]
    CursorEmpty(ContainerId),

    /// Destination entry list is full; checked before anything mutates.
    #[error("{0} is at entry capacity")]
    CapacityExceeded(ContainerId),

    /// Split destination search found no open rectangle.
    #[error("no free slot in {container} for a {width}x{height} footprint")]
    NoFreeSlot {
        container: ContainerId,
        width: i32,
        height: i32,
    },

    /// Split amount must leave both halves non-empty.
    #[error("cannot split {amount} out of a stack of {quantity}")]
    InvalidSplit { amount: u32, quantity: u32 },

    #[error("{0} is not equippable")]
    NotEquippable(DefinitionId),
}
