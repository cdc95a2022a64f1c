//! Running-state publish/subscribe

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, Weak},
};
use tracing::warn;

/// Callback invoked with the new `running` value
pub type Listener = Arc<dyn Fn(bool) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Listener registry notified on every running/paused/completed change.
///
/// `running == false` is published for both pause and completion; listeners
/// that care about the difference query the timer when they are called.
#[derive(Default)]
pub struct StateBroadcast {
    registry: Arc<Mutex<Registry>>,
}

/// Handle returned by [`StateBroadcast::subscribe`]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the listener. Does nothing if the broadcast is already gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.lock() {
                registry.listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

impl StateBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut registry = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.push((id, Arc::new(callback)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `running` to every listener registered at call time.
    ///
    /// The registry is snapshotted first so callbacks may subscribe or
    /// unsubscribe freely. A failing listener is logged and skipped.
    pub fn publish(&self, running: bool) {
        let snapshot: Vec<Listener> = match self.registry.lock() {
            Ok(registry) => registry.listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .listeners
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect(),
        };

        for listener in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(running))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("State listener failed: {:#}", e),
                Err(_) => warn!("State listener panicked"),
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .lock()
            .map(|registry| registry.listeners.len())
            .unwrap_or(0)
    }
}
