//! Path-keyed observer registry owned by a [`super::StateManager`].

use super::merge::StatePath;
use super::tree::ExtensionState;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

pub type Listener = Arc<dyn Fn(&ExtensionState) + Send + Sync>;

struct Registration {
    id: u64,
    path: StatePath,
    callback: Listener,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    registrations: Mutex<Vec<Registration>>,
}

impl ListenerRegistry {
    pub(crate) fn register(self: &Arc<Self>, path: StatePath, callback: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(Registration { id, path, callback });
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Returns true when the registration existed.
    fn remove(&self, id: u64) -> bool {
        let mut registrations = self.lock();
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        registrations.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.lock().iter().any(|registration| registration.id == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Callbacks whose watched sub-tree differs between `before` and `after`,
    /// in registration order.
    ///
    /// The lock is released before the caller runs them, so a callback may
    /// subscribe or unsubscribe without deadlocking.
    pub(crate) fn affected(&self, before: &Value, after: &Value) -> Vec<Listener> {
        self.lock()
            .iter()
            .filter(|registration| registration.path.changed(before, after))
            .map(|registration| Arc::clone(&registration.callback))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`super::StateManager::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    /// Removes exactly this registration. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
