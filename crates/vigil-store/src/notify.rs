//! Change notification fan-out

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use vigil_domain::traits::{ChangeCallback, EdgeChange, Subscription};

/// Registered change callbacks
///
/// Callbacks are cloned out of the registry before being invoked, so a
/// callback may (un)subscribe without deadlocking.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    callbacks: Mutex<BTreeMap<u64, ChangeCallback>>,
}

impl Subscribers {
    pub(crate) fn add(&self, callback: ChangeCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.insert(id, callback);
        }
        Subscription::new(id)
    }

    pub(crate) fn remove(&self, subscription: Subscription) {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.remove(&subscription.id());
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub(crate) fn notify(&self, change: &EdgeChange) {
        let callbacks: Vec<ChangeCallback> = match self.callbacks.lock() {
            Ok(callbacks) => callbacks.values().cloned().collect(),
            Err(_) => return,
        };

        tracing::debug!(
            edge = %change.edge_id,
            kind = ?change.kind,
            subscribers = callbacks.len(),
            "Notifying edge change"
        );

        for callback in callbacks {
            callback(change);
        }
    }
}
