//! Spatial grid state: containers, their entry lists, the occupancy
//! index derived from them, and the pure placement rules the engine
//! evaluates before mutating anything.

pub mod container;
pub mod entry;
pub mod free_slot;
pub mod occupancy;
pub mod placement;
pub mod stacking;

pub use container::{Container, ContainerId};
pub use entry::{DirtyState, EntryFields, EntryList, InventoryEntry};
pub use free_slot::find_free_slot;
pub use occupancy::{OccupancyIndex, Tile};
pub use placement::{MoveOrigin, Placement, RejectReason};

#[cfg(feature = "serde")]
pub use entry::EntrySnapshot;
