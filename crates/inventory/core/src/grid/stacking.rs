//! Stack merge arithmetic.
//!
//! One function decides how much moves when two stacks of the same
//! definition meet. Callers apply the result through
//! [`ItemInstance::add_stack`](crate::item::ItemInstance::add_stack) /
//! [`ItemInstance::remove_stack`](crate::item::ItemInstance::remove_stack)
//! so the clamping stays in one place.

/// How many units transfer from a source stack into a destination stack
/// capped at `max_stack`. Zero when the destination is already full; a
/// zero-unit merge is a valid no-op, not a failure.
pub fn resolve(max_stack: u32, dest_quantity: u32, source_quantity: u32) -> u32 {
    let space = max_stack.saturating_sub(dest_quantity);
    source_quantity.min(space)
}
