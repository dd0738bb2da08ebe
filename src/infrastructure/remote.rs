//! HTTP client for the record service

use crate::domain::ApiResponse;
use crate::error::{CbciError, Result};
use crate::infrastructure::config::RemoteConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// A decoded reply: the HTTP status plus the contract body, if there was one
#[derive(Debug, Clone)]
pub struct RemoteReply {
    pub status: StatusCode,
    pub body: ApiResponse<Value>,
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    client: reqwest::Client,
}

fn default_headers(anon_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if !anon_key.is_empty() {
        let value = HeaderValue::from_str(&format!("Bearer {anon_key}"))
            .map_err(|e| CbciError::Config(format!("invalid anon key: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, anon_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .default_headers(default_headers(anon_key)?)
            .build()
            .map_err(|e| CbciError::Transport(format!("client setup failed: {e}")))?;
        Ok(RemoteClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(remote: &RemoteConfig) -> Result<Self> {
        Self::new(remote.api_base_url()?, &remote.anon_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of `segments` under the base URL, each percent-encoded as a
    /// single path segment
    pub fn url_for(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CbciError::Config(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| CbciError::Config(format!("base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one request. Every reply that carries a `{success, ...}` body is
    /// returned as is, whatever its status; anything else is a transport error.
    #[instrument(name = "remote_send", skip(self, body), fields(base = %self.base_url))]
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<RemoteReply> {
        let url = self.url_for(segments)?;
        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CbciError::Transport(format!("request to {url} failed: {e}")))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CbciError::Transport(format!("read body failed: {e}")))?;
        debug!(%status, len = bytes.len(), "remote reply");

        match serde_json::from_slice::<ApiResponse<Value>>(&bytes) {
            Ok(body) => Ok(RemoteReply { status, body }),
            Err(_) if !status.is_success() => Err(CbciError::Transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ))),
            Err(e) => Err(CbciError::Transport(format!("undecodable reply: {e}"))),
        }
    }
}
