//! Storage facade over interchangeable backends
//!
//! `ContentStore` is the only entry point callers use for records. Which
//! backend sits behind it is decided once, at startup, from the site config.

use crate::domain::collection;
use crate::domain::{ApiResponse, Record, RecordKind};
use crate::error::{CbciError, Result};
use crate::infrastructure::{BackendKind, Config, FileSystemRepository, LocalStore, RemoteClient};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The four verbs every backing store supports for every kind
#[async_trait]
pub trait CollectionBackend: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn list(&self, kind: RecordKind) -> Result<Vec<Value>>;

    async fn create(&self, kind: RecordKind, document: Value) -> Result<Value>;

    /// Merge `patch` into the record with `id`. Fails with `NotFound` when absent.
    async fn update(&self, kind: RecordKind, id: &str, patch: Map<String, Value>) -> Result<Value>;

    /// Remove the record with `id`; absent ids are not an error
    async fn delete(&self, kind: RecordKind, id: &str) -> Result<()>;
}

/// Backend over the local key-value store
pub struct LocalBackend {
    store: LocalStore,
    lock: Mutex<()>,
}

impl LocalBackend {
    pub fn new(store: LocalStore) -> Self {
        LocalBackend {
            store,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl CollectionBackend for LocalBackend {
    fn backend_tag(&self) -> &'static str {
        "local"
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<Value>> {
        Ok(self.store.get_list(kind.storage_key()))
    }

    async fn create(&self, kind: RecordKind, document: Value) -> Result<Value> {
        kind.check_document(&document)?;
        let _guard = self.lock.lock().await;
        let mut items = self.store.get_list(kind.storage_key());
        collection::check_new_id(&items, &document)?;
        collection::insert_newest_first(&mut items, document.clone());
        self.store.set_list(kind.storage_key(), items)?;
        Ok(document)
    }

    async fn update(&self, kind: RecordKind, id: &str, patch: Map<String, Value>) -> Result<Value> {
        let _guard = self.lock.lock().await;
        let mut items = self.store.get_list(kind.storage_key());
        let merged = collection::preview_merge(&items, id, &patch)
            .ok_or_else(|| CbciError::NotFound(kind.not_found_message()))?;
        kind.check_document(&merged)?;
        collection::replace_by_id(&mut items, merged.clone());
        self.store.set_list(kind.storage_key(), items)?;
        Ok(merged)
    }

    async fn delete(&self, kind: RecordKind, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.store.get_list(kind.storage_key());
        if collection::remove_by_id(&mut items, id) > 0 {
            self.store.set_list(kind.storage_key(), items)?;
        }
        Ok(())
    }
}

/// Backend over the HTTP record service
pub struct RemoteBackend {
    client: RemoteClient,
}

impl RemoteBackend {
    pub fn new(client: RemoteClient) -> Self {
        RemoteBackend { client }
    }

    async fn call(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let reply = self.client.send(method, segments, body).await?;
        if reply.body.success {
            return Ok(reply.body.data);
        }
        let message = reply
            .body
            .error
            .unwrap_or_else(|| format!("request failed with HTTP {}", reply.status.as_u16()));
        Err(match reply.status {
            StatusCode::NOT_FOUND => CbciError::NotFound(message),
            StatusCode::BAD_REQUEST => CbciError::Validation(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CbciError::Auth(message),
            _ => CbciError::Remote(message),
        })
    }
}

fn require_data(data: Option<Value>) -> Result<Value> {
    data.ok_or_else(|| CbciError::Transport("reply is missing data".to_string()))
}

#[async_trait]
impl CollectionBackend for RemoteBackend {
    fn backend_tag(&self) -> &'static str {
        "remote"
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<Value>> {
        match self.call(Method::GET, &[kind.route()], None).await? {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(CbciError::Transport(format!(
                "expected a list of records, got {}",
                other
            ))),
            None => Ok(Vec::new()),
        }
    }

    async fn create(&self, kind: RecordKind, document: Value) -> Result<Value> {
        let data = self.call(Method::POST, &[kind.route()], Some(&document)).await?;
        require_data(data)
    }

    async fn update(&self, kind: RecordKind, id: &str, patch: Map<String, Value>) -> Result<Value> {
        let data = self
            .call(Method::PUT, &[kind.route(), id], Some(&Value::Object(patch)))
            .await?;
        require_data(data)
    }

    async fn delete(&self, kind: RecordKind, id: &str) -> Result<()> {
        self.call(Method::DELETE, &[kind.route(), id], None).await?;
        Ok(())
    }
}

/// The storage abstraction handed to every use case
#[derive(Clone)]
pub struct ContentStore {
    backend: Arc<dyn CollectionBackend>,
}

impl ContentStore {
    pub fn new(backend: Arc<dyn CollectionBackend>) -> Self {
        ContentStore { backend }
    }

    pub fn local(store: LocalStore) -> Self {
        Self::new(Arc::new(LocalBackend::new(store)))
    }

    pub fn remote(client: RemoteClient) -> Self {
        Self::new(Arc::new(RemoteBackend::new(client)))
    }

    /// Pick the backend named by the config (or CBCIMATH_BACKEND)
    pub fn from_config(config: &Config, repository: &FileSystemRepository) -> Result<Self> {
        let store = match config.effective_backend()? {
            BackendKind::Local => Self::local(repository.local_store()),
            BackendKind::Remote => Self::remote(RemoteClient::from_config(&config.remote)?),
        };
        debug!(backend = store.backend_tag(), "content store ready");
        Ok(store)
    }

    pub fn backend_tag(&self) -> &'static str {
        self.backend.backend_tag()
    }

    pub async fn try_list_documents(&self, kind: RecordKind) -> Result<Vec<Value>> {
        self.backend.list(kind).await
    }

    /// Validate then prepend a document
    pub async fn try_create_document(&self, kind: RecordKind, document: Value) -> Result<Value> {
        kind.check_document(&document)?;
        self.backend.create(kind, document).await
    }

    pub async fn try_update_document(&self, kind: RecordKind, id: &str, patch: Value) -> Result<Value> {
        let Value::Object(patch) = patch else {
            return Err(CbciError::Validation("update must be a JSON object".to_string()));
        };
        self.backend.update(kind, id, patch).await
    }

    pub async fn try_delete_document(&self, kind: RecordKind, id: &str) -> Result<()> {
        self.backend.delete(kind, id).await
    }

    /// Every record of a kind, newest first. Never fails: a backend failure
    /// reads as an empty, degraded success.
    pub async fn list_documents(&self, kind: RecordKind) -> ApiResponse<Vec<Value>> {
        match self.try_list_documents(kind).await {
            Ok(items) => ApiResponse::ok(items),
            Err(e) => {
                warn!(%kind, backend = self.backend_tag(), error = %e, "listing failed, returning empty");
                ApiResponse::degraded(Vec::new(), e.to_string())
            }
        }
    }

    pub async fn create_document(&self, kind: RecordKind, document: Value) -> ApiResponse<Value> {
        respond(kind, "create", self.try_create_document(kind, document).await)
    }

    pub async fn update_document(&self, kind: RecordKind, id: &str, patch: Value) -> ApiResponse<Value> {
        respond(kind, "update", self.try_update_document(kind, id, patch).await)
    }

    pub async fn delete_document(&self, kind: RecordKind, id: &str) -> ApiResponse<()> {
        respond(kind, "delete", self.try_delete_document(kind, id).await)
    }

    pub async fn get_all<R: Record>(&self) -> ApiResponse<Vec<R>> {
        let response = self.list_documents(R::KIND).await;
        response.map(|items| {
            items
                .into_iter()
                .filter_map(|document| match serde_json::from_value::<R>(document) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(kind = %R::KIND, error = %e, "skipping undecodable record");
                        None
                    }
                })
                .collect()
        })
    }

    /// Validate then prepend a record
    pub async fn create<R: Record>(&self, record: &R) -> ApiResponse<R> {
        if let Err(e) = record.validate() {
            return ApiResponse::fail(e.to_string());
        }
        let document = match serde_json::to_value(record) {
            Ok(document) => document,
            Err(e) => return ApiResponse::fail(e.to_string()),
        };
        decode(self.create_document(R::KIND, document).await)
    }

    pub async fn update<R: Record>(&self, id: &str, patch: Value) -> ApiResponse<R> {
        decode(self.update_document(R::KIND, id, patch).await)
    }

    pub async fn delete<R: Record>(&self, id: &str) -> ApiResponse<()> {
        self.delete_document(R::KIND, id).await
    }
}

fn respond<T>(kind: RecordKind, verb: &str, result: Result<T>) -> ApiResponse<T> {
    match result {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => {
            debug!(%kind, verb, error = %e, "storage operation failed");
            ApiResponse::fail(e.to_string())
        }
    }
}

fn decode<R: Record>(response: ApiResponse<Value>) -> ApiResponse<R> {
    match response {
        ApiResponse {
            success: true,
            data: Some(document),
            ..
        } => match serde_json::from_value(document) {
            Ok(record) => ApiResponse::ok(record),
            Err(e) => ApiResponse::fail(format!("undecodable record: {}", e)),
        },
        ApiResponse { success: true, .. } => ApiResponse::fail("reply is missing data"),
        ApiResponse { error, .. } => ApiResponse {
            success: false,
            data: None,
            error,
        },
    }
}
