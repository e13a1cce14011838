//! Host event plumbing: typed payloads on a topic-routed broadcast bus.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{InventoryEvent, WorldEvent};
