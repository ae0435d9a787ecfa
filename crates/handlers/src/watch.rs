//! Dynamic watch registration for factory-spawned splitter contracts.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use alloy::primitives::Address;

/// Capability the delivery subsystem exposes: route future events from an
/// address to the splitter handlers. Registration logically completes before
/// any event from that address can be delivered (delivery-layer ordering).
pub trait WatchRegistry {
    fn watch(&self, address: Address);
}

/// Thread-safe address set shared between the reconciler and the delivery
/// loop's log filter.
#[derive(Clone, Default)]
pub struct SharedWatchSet {
    inner: Arc<Mutex<HashSet<Address>>>,
}

impl SharedWatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add previously indexed splitter addresses, e.g. on startup.
    pub fn seed<I: IntoIterator<Item = Address>>(&self, addresses: I) {
        let mut set = self.inner.lock().expect("watch set lock poisoned");
        set.extend(addresses);
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.inner
            .lock()
            .expect("watch set lock poisoned")
            .contains(address)
    }

    /// Current watched addresses, for building a log filter.
    pub fn snapshot(&self) -> Vec<Address> {
        self.inner
            .lock()
            .expect("watch set lock poisoned")
            .iter()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("watch set lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WatchRegistry for SharedWatchSet {
    fn watch(&self, address: Address) {
        let mut set = self.inner.lock().expect("watch set lock poisoned");
        if set.insert(address) {
            tracing::info!(splitter = %address, "Watching new splitter contract");
        }
    }
}
