use super::{PersistentStore, StoreError};
use async_trait::async_trait;
use directories::ProjectDirs;
use serde_json::{Map, Value};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

/// Store backed by one JSON document on disk.
///
/// Every write rewrites the whole document through a temp file in the same
/// directory, so a crash mid-write leaves the previous contents in place.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    io_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Location used when no explicit state path is configured.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "chatshelf", "chatshelf")
            .map(|dirs| dirs.data_dir().join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let path = self.path.clone();
        run_blocking(move || read_document(&path)).await
    }

    async fn write_document(&self, document: Map<String, Value>) -> Result<(), StoreError> {
        let path = self.path.clone();
        run_blocking(move || write_document(&path, &document)).await
    }
}

#[async_trait]
impl PersistentStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let _guard = self.io_lock.lock().await;
        let mut document = self.read_document().await?;
        Ok(keys
            .iter()
            .filter_map(|key| document.remove(*key).map(|value| ((*key).to_string(), value)))
            .collect())
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError> {
        let _guard = self.io_lock.lock().await;
        // A corrupt document is overwritten rather than blocking every write.
        let mut document = match self.read_document().await {
            Ok(document) => document,
            Err(StoreError::Corrupt { .. }) => Map::new(),
            Err(err) => return Err(err),
        };
        for (key, value) in entries {
            document.insert(key, value);
        }
        self.write_document(document).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.io_lock.lock().await;
        let path = self.path.clone();
        run_blocking(move || match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        })
        .await
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| StoreError::Unavailable(format!("storage task failed: {err}")))?
}

fn read_document(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document(path: &Path, document: &Map<String, Value>) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());

    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    let contents = serde_json::to_vec_pretty(document)?;
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .map_err(io_err)?;

    temp_file.write_all(&contents).map_err(io_err)?;
    temp_file.as_file_mut().sync_all().map_err(io_err)?;
    temp_file
        .persist(path)
        .map_err(|err| io_err(err.error))?;
    Ok(())
}
