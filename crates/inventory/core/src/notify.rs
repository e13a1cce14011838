//! Per-container change observers.
//!
//! Every engine operation that mutates a container ends with exactly one
//! notification for that container, after its occupancy index has been
//! rebuilt. Observers see a consistent container; what they do with the
//! signal (UI refresh, replication flush, logging) is the host's business.

use std::sync::Arc;

use crate::grid::ContainerId;

/// Callback invoked after a container's state settles.
pub trait InventoryObserver: Send + Sync {
    fn inventory_changed(&self, container: ContainerId);
}

impl<F> InventoryObserver for F
where
    F: Fn(ContainerId) + Send + Sync,
{
    fn inventory_changed(&self, container: ContainerId) {
        self(container)
    }
}

/// Handle for removing a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Registry of change observers, notified in subscription order.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Arc<dyn InventoryObserver>)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn InventoryObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Removes a subscription; unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: ObserverId) {
        self.observers.retain(|(existing, _)| *existing != id);
    }

    pub fn notify(&self, container: ContainerId) {
        for (_, observer) in &self.observers {
            observer.inventory_changed(container);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
