//! Pure placement classification: what dropping an item onto a target
//! rectangle would do, before anything mutates.

use crate::env::ItemOracle;
use crate::grid::container::Container;
use crate::item::{ItemId, ItemInstance};

/// The mover's settled position, needed for the swap reciprocal-fit check.
/// Cursor-held items have no origin rectangle and pass `None` instead.
#[derive(Clone, Copy)]
pub struct MoveOrigin<'a> {
    pub container: &'a Container,
    pub x: i32,
    pub y: i32,
    pub rotated: bool,
}

/// Outcome of classifying a requested placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Target rectangle is empty: plain move.
    Place,
    /// Single overlap with the same definition: merge quantities into the
    /// occupant. Classified even when the occupant is already full; the
    /// stacking resolver may then move zero, which is a valid no-op.
    Stack { into: ItemId },
    /// Single overlap with a different definition: exchange positions.
    Swap { displaced: ItemId },
    Reject(RejectReason),
}

/// Why a placement was rejected. Rejections are expected outcomes of
/// invalid drag targets, not errors; they surface as silent no-ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RejectReason {
    /// Target rectangle exits the grid extents.
    OutOfBounds,
    /// More than one distinct item under the target rectangle.
    AmbiguousOverlap,
    /// The displaced item cannot fit back at the mover's origin.
    SwapInfeasible,
}

/// Classifies dropping `mover` onto `(dest_x, dest_y)` in `dest` with the
/// given rotation.
///
/// Overlaps are counted by distinct item identity. When the mover is
/// settled in `dest` itself (same-container move), its own cells are
/// excluded from the overlap query.
pub fn classify(
    dest: &Container,
    items: &dyn ItemOracle,
    mover: &ItemInstance,
    dest_x: i32,
    dest_y: i32,
    dest_rotated: bool,
    origin: Option<MoveOrigin<'_>>,
) -> Placement {
    let dims = items
        .definition(mover.definition)
        .map(|def| def.dims_of(dest_rotated))
        .unwrap_or(crate::env::GridDims::UNIT);

    if dest_x < 0
        || dest_y < 0
        || dest_x + dims.width > dest.columns()
        || dest_y + dims.height > dest.rows()
    {
        return Placement::Reject(RejectReason::OutOfBounds);
    }

    let exclude = origin
        .filter(|o| o.container.id() == dest.id())
        .map(|_| mover.id);
    let overlaps = dest
        .occupancy()
        .items_in_rect(dest_x, dest_y, dims.width, dims.height, exclude);

    match overlaps.as_slice() {
        [] => Placement::Place,
        [occupant] => {
            let occupant_entry = match dest.entry(*occupant) {
                Some(entry) => entry,
                None => return Placement::Reject(RejectReason::AmbiguousOverlap),
            };
            if occupant_entry.item.definition == mover.definition {
                return Placement::Stack { into: *occupant };
            }
            match origin {
                Some(origin) => {
                    if reciprocal_fits(items, &occupant_entry.item, mover.id, origin) {
                        Placement::Swap {
                            displaced: *occupant,
                        }
                    } else {
                        Placement::Reject(RejectReason::SwapInfeasible)
                    }
                }
                // Cursor-held mover: the displaced item goes to the cursor
                // the mover vacates, so there is nothing to reciprocate.
                None => Placement::Swap {
                    displaced: *occupant,
                },
            }
        }
        _ => Placement::Reject(RejectReason::AmbiguousOverlap),
    }
}

/// Would `displaced` legally occupy the mover's vacated rectangle?
///
/// The displaced item is re-inserted with the mover's original rotation
/// flag, so its footprint is resolved against that flag. Both items
/// involved in the swap are ignored when probing for stray overlaps.
fn reciprocal_fits(
    items: &dyn ItemOracle,
    displaced: &ItemInstance,
    mover: ItemId,
    origin: MoveOrigin<'_>,
) -> bool {
    let dims = items
        .definition(displaced.definition)
        .map(|def| def.dims_of(origin.rotated))
        .unwrap_or(crate::env::GridDims::UNIT);

    origin.container.occupancy().is_rect_free(
        origin.x,
        origin.y,
        dims.width,
        dims.height,
        &[mover, displaced.id],
    )
}
