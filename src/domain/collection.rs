//! Whole-collection read-modify-write over JSON documents
//!
//! Both backing stores (the local store and the server's KV table) keep each
//! kind as one JSON array and mutate it with these functions, so the two paths
//! cannot drift apart.

use crate::error::{CbciError, Result};
use serde_json::{Map, Value};

fn id_of(document: &Value) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

/// A new document needs an id that is not blank, not a dot segment and not
/// already in the collection.
pub fn check_new_id(items: &[Value], document: &Value) -> Result<()> {
    let id = id_of(document).unwrap_or("");
    if id.trim().is_empty() {
        return Err(CbciError::Validation("id is required".to_string()));
    }
    if id == "." || id == ".." {
        return Err(CbciError::Validation(format!("id cannot be '{}'", id)));
    }
    if find_by_id(items, id).is_some() {
        return Err(CbciError::Validation(format!(
            "a record with id {} already exists",
            id
        )));
    }
    Ok(())
}

/// Insert a document at the front (newest-first order)
pub fn insert_newest_first(items: &mut Vec<Value>, document: Value) {
    items.insert(0, document);
}

/// Find the first document with the given id
pub fn find_by_id<'a>(items: &'a [Value], id: &str) -> Option<&'a Value> {
    items.iter().find(|d| id_of(d) == Some(id))
}

/// Shallow-merge `patch` into the document with the given id.
///
/// Fields missing from the patch keep their stored value. An `id` in the patch
/// is ignored. Returns the merged document, or `None` with `items` untouched.
pub fn merge_by_id(items: &mut [Value], id: &str, patch: &Map<String, Value>) -> Option<Value> {
    let merged = preview_merge(items, id, patch)?;
    let slot = items.iter_mut().find(|d| id_of(d) == Some(id))?;
    *slot = merged.clone();
    Some(merged)
}

/// Replace the document with the same id as `document`. Returns false when absent.
pub fn replace_by_id(items: &mut [Value], document: Value) -> bool {
    let Some(id) = id_of(&document).map(str::to_string) else {
        return false;
    };
    match items.iter_mut().find(|d| id_of(d) == Some(id.as_str())) {
        Some(slot) => {
            *slot = document;
            true
        }
        None => false,
    }
}

/// Apply the merge to a copy, leaving `items` untouched
pub fn preview_merge(items: &[Value], id: &str, patch: &Map<String, Value>) -> Option<Value> {
    let mut merged = find_by_id(items, id)?.clone();
    if let Value::Object(fields) = &mut merged {
        for (key, value) in patch {
            if key != "id" {
                fields.insert(key.clone(), value.clone());
            }
        }
    }
    Some(merged)
}

/// Remove every document with the given id. Returns how many were removed.
pub fn remove_by_id(items: &mut Vec<Value>, id: &str) -> usize {
    let before = items.len();
    items.retain(|d| id_of(d) != Some(id));
    before - items.len()
}
