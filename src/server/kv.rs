//! Key-value table backing the record service

use crate::error::{CbciError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

enum Backing {
    /// One `<key>.json` file per key
    Files(PathBuf),
    Memory(Mutex<HashMap<String, Value>>),
}

pub struct KvTable {
    backing: Backing,
}

impl KvTable {
    pub fn files(dir: PathBuf) -> Self {
        KvTable {
            backing: Backing::Files(dir),
        }
    }

    pub fn memory() -> Self {
        KvTable {
            backing: Backing::Memory(Mutex::new(HashMap::new())),
        }
    }

    pub fn describe(&self) -> String {
        match &self.backing {
            Backing::Files(dir) => dir.display().to_string(),
            Backing::Memory(_) => "memory".to_string(),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        match &self.backing {
            Backing::Files(dir) => {
                let path = dir.join(format!("{}.json", key));
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
            Backing::Memory(map) => Ok(map.lock().await.get(key).cloned()),
        }
    }

    pub async fn set(&self, key: &str, value: &Value) -> Result<()> {
        match &self.backing {
            Backing::Files(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                let path = dir.join(format!("{}.json", key));
                let tmp_path = dir.join(format!("{}.json.tmp-{}", key, std::process::id()));
                tokio::fs::write(&tmp_path, serde_json::to_vec(value)?).await?;
                if cfg!(windows) && tokio::fs::try_exists(&path).await? {
                    tokio::fs::remove_file(&path).await?;
                }
                tokio::fs::rename(&tmp_path, &path).await?;
            }
            Backing::Memory(map) => {
                map.lock().await.insert(key.to_string(), value.clone());
            }
        }
        debug!(key, "kv entry written");
        Ok(())
    }

    /// The sequence under `key`; unset reads as empty
    pub async fn get_list(&self, key: &str) -> Result<Vec<Value>> {
        match self.get(key).await? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(CbciError::Remote(format!("value under '{}' is not a list", key))),
        }
    }

    pub async fn set_list(&self, key: &str, items: Vec<Value>) -> Result<()> {
        self.set(key, &Value::Array(items)).await
    }
}
