//! File-backed storage.
//!
//! Every key lives in a single JSON object on disk. Writes go to a sibling temp file that is
//! then renamed over the original, so a crash mid-write leaves the previous contents intact.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use super::{LocalStorage, StorageError};

type Entries = BTreeMap<String, String>;

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Store entries in the JSON file at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries, StorageError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(StorageError::Malformed),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(error) => Err(error.into()),
        }
    }

    async fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(entries).map_err(StorageError::Encode)?;
        let tmp = self.path.with_extension("tmp");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), keys = entries.len(), "wrote storage file");

        Ok(())
    }
}

#[async_trait]
impl LocalStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;

        Ok(self.read_entries().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.read_entries().await?;

        entries.insert(key.to_string(), value.to_string());

        self.write_entries(&entries).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.read_entries().await?;

        if entries.remove(key).is_none() {
            return Ok(());
        }

        self.write_entries(&entries).await
    }
}
