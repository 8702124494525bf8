//! Canonical in-memory state with persistence and change notification.
//!
//! [`StateManager`] owns one [`ExtensionState`] tree. Reads are synchronous
//! snapshots; writes deep-merge a JSON partial onto the tree, persist the
//! whole result through a [`PersistentStore`], and notify the listeners whose
//! watched sub-tree actually changed.
//!
//! Writes on one manager are serialized, so two concurrent `set_state` calls
//! never lose each other's keys; overlapping leaves end up with the value of
//! whichever call acquired the write lock last.

pub mod listeners;
pub mod merge;
pub mod tree;


use crate::core::store::{PersistentStore, StoreError};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

pub use listeners::{Listener, Subscription};
pub use merge::{deep_merge, partial_from_path, StatePath};
pub use tree::{
    ConversationsState, ExtensionState, Settings, SortOrder, Theme, UiState, UserState,
    SECTIONS, SECTION_CONVERSATIONS, SECTION_SETTINGS, SECTION_UI, SECTION_USER,
};

use listeners::ListenerRegistry;

#[derive(Debug, Error)]
pub enum StateError {
    /// The in-memory state was updated but could not be written to the store.
    #[error("failed to persist state: {0}")]
    Persistence(#[from] StoreError),

    /// The update was rejected and the state is unchanged.
    #[error("invalid state update: {0}")]
    InvalidUpdate(String),
}

pub struct StateManager {
    state: RwLock<ExtensionState>,
    listeners: Arc<ListenerRegistry>,
    store: Arc<dyn PersistentStore>,
    write_lock: tokio::sync::Mutex<()>,
}

impl StateManager {
    /// Builds the state from whatever the store holds, filling gaps from the
    /// compiled-in defaults.
    ///
    /// Never fails: an unreadable store or an unusable section falls back to
    /// defaults and is logged.
    pub async fn load(store: Arc<dyn PersistentStore>) -> Self {
        let persisted = match store.get(&SECTIONS).await {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!(error = %err, "Could not read persisted state; starting from defaults");
                Map::new()
            }
        };
        let state = restore_sections(persisted);

        Self {
            state: RwLock::new(state),
            listeners: Arc::new(ListenerRegistry::default()),
            store,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Owned deep copy of the current state.
    pub fn get_state(&self) -> ExtensionState {
        self.read().clone()
    }

    /// Owned copy of the sub-tree at `path`, if present.
    pub fn select(&self, path: impl Into<StatePath>) -> Option<Value> {
        let path = path.into();
        let tree = self.read().to_tree().ok()?;
        path.lookup(&tree).cloned()
    }

    /// Deep-merges `partial` into the state, persists the result, and notifies
    /// affected listeners.
    ///
    /// `partial` must be an object whose top-level keys are state sections,
    /// and the merged tree must still fit the schema; otherwise nothing
    /// changes and [`StateError::InvalidUpdate`] is returned.
    ///
    /// A store failure is reported as [`StateError::Persistence`] after the
    /// in-memory update and notifications have already happened.
    pub async fn set_state(&self, partial: Value) -> Result<(), StateError> {
        let Value::Object(sections) = &partial else {
            return Err(StateError::InvalidUpdate(
                "state update must be an object".to_string(),
            ));
        };
        // The root has no `extra` map; an unknown section would vanish.
        if let Some(unknown) = sections
            .keys()
            .find(|key| !SECTIONS.contains(&key.as_str()))
        {
            return Err(StateError::InvalidUpdate(format!(
                "unknown state section '{unknown}'"
            )));
        }

        let _guard = self.write_lock.lock().await;
        let before = self.tree()?;
        let mut merged = before.clone();
        deep_merge(&mut merged, partial);
        let next = ExtensionState::from_tree(merged)
            .map_err(|err| StateError::InvalidUpdate(err.to_string()))?;
        // Diff and persist the typed form, so equivalent spellings of the
        // same value never count as a change.
        let after = next
            .to_tree()
            .map_err(|err| StateError::InvalidUpdate(err.to_string()))?;

        self.commit(next, &before, &after).await
    }

    pub async fn update_user(&self, partial: Value) -> Result<(), StateError> {
        self.set_state(section_partial(SECTION_USER, partial)).await
    }

    pub async fn update_conversations(&self, partial: Value) -> Result<(), StateError> {
        self.set_state(section_partial(SECTION_CONVERSATIONS, partial))
            .await
    }

    pub async fn update_ui(&self, partial: Value) -> Result<(), StateError> {
        self.set_state(section_partial(SECTION_UI, partial)).await
    }

    pub async fn update_settings(&self, partial: Value) -> Result<(), StateError> {
        self.set_state(section_partial(SECTION_SETTINGS, partial))
            .await
    }

    /// Replaces the state with the initial defaults and persists them.
    pub async fn reset_state(&self) -> Result<(), StateError> {
        let _guard = self.write_lock.lock().await;
        let before = self.tree()?;
        let next = ExtensionState::initial();
        let after = next
            .to_tree()
            .map_err(|err| StateError::InvalidUpdate(err.to_string()))?;

        self.commit(next, &before, &after).await
    }

    /// Empties the persistent store. The in-memory state is left as is.
    pub async fn clear_storage(&self) -> Result<(), StateError> {
        self.store.clear().await?;
        debug!("Cleared persisted state");
        Ok(())
    }

    /// Registers `callback` to run with the full new state whenever the
    /// sub-tree at `path` changes. The empty path watches everything.
    pub fn subscribe<F>(&self, path: impl Into<StatePath>, callback: F) -> Subscription
    where
        F: Fn(&ExtensionState) + Send + Sync + 'static,
    {
        self.listeners.register(path.into(), Arc::new(callback))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    async fn commit(
        &self,
        next: ExtensionState,
        before: &Value,
        after: &Value,
    ) -> Result<(), StateError> {
        *self.write() = next.clone();

        let persisted = self.persist(after).await;
        if let Err(err) = &persisted {
            warn!(error = %err, "State updated in memory but not persisted");
        }

        let affected = self.listeners.affected(before, after);
        debug!(listeners = affected.len(), "State updated");
        for listener in affected {
            listener(&next);
        }

        persisted
    }

    async fn persist(&self, tree: &Value) -> Result<(), StateError> {
        let entries: Map<String, Value> = SECTIONS
            .iter()
            .filter_map(|section| {
                tree.get(*section)
                    .map(|value| ((*section).to_string(), value.clone()))
            })
            .collect();
        self.store.set(entries).await?;
        Ok(())
    }

    fn tree(&self) -> Result<Value, StateError> {
        self.read()
            .to_tree()
            .map_err(|err| StateError::InvalidUpdate(err.to_string()))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ExtensionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ExtensionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("state", &*self.read())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

fn section_partial(section: &str, partial: Value) -> Value {
    let mut map = Map::new();
    map.insert(section.to_string(), partial);
    Value::Object(map)
}

/// Merges each persisted section onto its default. A section that is not an
/// object, or that no longer fits the schema, is dropped in favour of the
/// default.
fn restore_sections(persisted: Map<String, Value>) -> ExtensionState {
    let defaults = ExtensionState::initial();
    let mut tree = match defaults.to_tree() {
        Ok(tree) => tree,
        Err(_) => return defaults,
    };

    for (section, stored) in persisted {
        if !stored.is_object() {
            warn!(section = %section, "Ignoring persisted section that is not an object");
            continue;
        }
        let mut candidate = tree.clone();
        deep_merge(&mut candidate, section_partial(&section, stored));
        match ExtensionState::from_tree(candidate.clone()) {
            Ok(_) => tree = candidate,
            Err(err) => {
                warn!(section = %section, error = %err, "Ignoring persisted section that does not match the schema");
            }
        }
    }

    ExtensionState::from_tree(tree).unwrap_or(defaults)
}
