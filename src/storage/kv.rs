//! Key-value backends.
//!
//! Each key maps to one serialized string. `set` replaces the whole value and
//! either fully succeeds or leaves the previous value in place.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{StorageConfig, StorageError};

/// A string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Backend identifier for logging.
    fn name(&self) -> &'static str;

    /// Read a value. An unset key is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One JSON file per key under the data directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StorageConfig,
}

impl FileStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.config.key_path(key)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => {
                debug!("Read {} bytes from {:?}", contents.len(), path);
                Ok(Some(contents))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.config.data_dir).await?;

        let path = self.path_for(key);
        let tmp_path = self
            .config
            .data_dir
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4()));

        let write = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(value.as_bytes()).await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, &path).await
        };

        if let Err(e) = write.await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(e));
        }

        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}

/// Volatile in-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
