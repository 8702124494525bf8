use super::{PersistentStore, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// In-process store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `entries`, as if a previous run had
    /// persisted them.
    pub fn with_entries(entries: Map<String, Value>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Copy of everything currently stored.
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| {
                entries
                    .get(*key)
                    .map(|value| ((*key).to_string(), value.clone()))
            })
            .collect())
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError> {
        let mut stored = self.entries.lock().await;
        for (key, value) in entries {
            stored.insert(key, value);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}
