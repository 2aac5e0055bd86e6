use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, error};

use shared_models::error::PortalError;

/// File-backed key/value store standing in for browser local storage.
///
/// The whole file is one JSON object; every write rewrites it through a
/// sibling temp file followed by a rename.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, PortalError>
    where
        T: DeserializeOwned,
    {
        let mut entries = self.read_all().await?;
        match entries.remove(key) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| PortalError::Storage(format!("entry '{}' is corrupt: {}", key, e))),
            None => Ok(None),
        }
    }

    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), PortalError>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value)
            .map_err(|e| PortalError::Storage(e.to_string()))?;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await?;
        debug!("Stored local key {}", key);
        Ok(())
    }

    /// Returns whether the key existed.
    pub async fn remove(&self, key: &str) -> Result<bool, PortalError> {
        let mut entries = self.read_all().await?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.write_all(&entries).await?;
            debug!("Removed local key {}", key);
        }
        Ok(existed)
    }

    async fn read_all(&self) -> Result<Map<String, Value>, PortalError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                error!("Failed to read {}: {}", self.path.display(), e);
                return Err(PortalError::Storage(e.to_string()));
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PortalError::Storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(PortalError::Storage(format!(
                "{} is not valid JSON: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_all(&self, entries: &Map<String, Value>) -> Result<(), PortalError> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| PortalError::Storage(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PortalError::Storage(e.to_string()))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| PortalError::Storage(e.to_string()))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            error!("Failed to replace {}: {}", self.path.display(), e);
            PortalError::Storage(e.to_string())
        })
    }
}
