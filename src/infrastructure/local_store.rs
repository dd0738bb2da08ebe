//! Persistent key-value store on the local file system
//!
//! One JSON file per key under the store directory. Reads never fail: a
//! missing, unreadable or corrupt entry reads as empty and is logged.

use crate::error::Result;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: PathBuf) -> Self {
        LocalStore { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Raw value stored under `key`, `None` when missing or unreadable
    pub fn get(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, error = %e, "local store read failed");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "local store entry is not valid JSON");
                None
            }
        }
    }

    /// Sequence stored under `key`; anything else reads as empty
    pub fn get_list(&self, key: &str) -> Vec<Value> {
        match self.get(key) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                warn!(key, "local store entry is not an array");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Store `value` under `key` with a write-then-rename replace
    pub fn set(&self, key: &str, value: &Value) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        let path = self.path_for(key);
        let tmp_path = self
            .dir
            .join(format!("{}.json.tmp-{}", key, std::process::id()));

        let contents = serde_json::to_string(value)?;
        fs::write(&tmp_path, contents)?;

        // On Windows, `rename` does not overwrite existing files.
        if cfg!(windows) && path.exists() {
            fs::remove_file(&path)?;
        }
        fs::rename(&tmp_path, &path)?;

        debug!(key, "local store entry written");
        Ok(())
    }

    pub fn set_list(&self, key: &str, items: Vec<Value>) -> Result<()> {
        self.set(key, &Value::Array(items))
    }

    /// Boolean flag; missing or non-boolean reads as false
    pub fn get_flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(flag)) => flag,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    pub fn set_flag(&self, key: &str, flag: bool) -> Result<()> {
        self.set(key, &Value::Bool(flag))
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, &Value::String(value.to_string()))
    }

    /// Delete `key`; removing a missing key is not an error
    pub fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().join("store"));
        (temp, store)
    }

    #[test]
    fn test_missing_key_reads_empty() {
        let (_temp, store) = store();
        assert!(store.get("notices").is_none());
        assert!(store.get_list("notices").is_empty());
    }

    #[test]
    fn test_list_round_trip_is_deep_equal() {
        let (_temp, store) = store();
        let items = vec![
            json!({"id": "2", "title": "둘", "nested": {"a": [1, 2, 3]}}),
            json!({"id": "1", "title": "one", "important": true, "progress": 40}),
        ];
        store.set_list("notices", items.clone()).unwrap();
        assert_eq!(store.get_list("notices"), items);
    }

    #[test]
    fn test_corrupt_entry_degrades_to_empty() {
        let (_temp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("lessons.json"), "{not json").unwrap();
        assert!(store.get_list("lessons").is_empty());
    }

    #[test]
    fn test_non_array_entry_reads_as_empty_list() {
        let (_temp, store) = store();
        store.set("research", &json!({"id": "x"})).unwrap();
        assert!(store.get_list("research").is_empty());
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let (_temp, store) = store();
        store.set_list("cbci", vec![json!({"id": "1"})]).unwrap();
        store.set_list("cbci", vec![]).unwrap();

        assert!(store.get_list("cbci").is_empty());
        let names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["cbci.json".to_string()]);
    }

    #[test]
    fn test_flags_and_strings() {
        let (_temp, store) = store();
        assert!(!store.get_flag("isLoggedIn"));
        store.set_flag("isLoggedIn", true).unwrap();
        assert!(store.get_flag("isLoggedIn"));

        store.set("isMaster", &json!("true")).unwrap();
        assert!(store.get_flag("isMaster"));

        store.set_string("session", "token").unwrap();
        assert_eq!(store.get_string("session").as_deref(), Some("token"));
        store.remove("session").unwrap();
        store.remove("session").unwrap();
        assert!(store.get_string("session").is_none());
    }
}
