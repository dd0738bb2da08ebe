//! Hosted auth provider (user creation and password sign-in)

use crate::error::{CbciError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

/// Tokens returned by a successful password sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Value,
}

impl AuthSession {
    pub fn email(&self) -> Option<&str> {
        self.user.get("email").and_then(Value::as_str)
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create a confirmed user carrying `name` in its metadata
    async fn create_user(&self, email: &str, password: &str, name: &str) -> Result<Value>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;
}

/// Supabase GoTrue over REST
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    url: String,
    key: String,
    client: reqwest::Client,
}

/// Pull the human-readable message out of a provider error body
fn provider_message(body: &Value) -> Option<String> {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

impl SupabaseAuth {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        SupabaseAuth {
            url: url.into().trim_end_matches('/').to_string(),
            key: key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Service-role client from SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| CbciError::Config("SUPABASE_URL is not set".to_string()))?;
        let key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| CbciError::Config("SUPABASE_SERVICE_ROLE_KEY is not set".to_string()))?;
        Ok(Self::new(url, key))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.key)
            .map_err(|e| CbciError::Config(format!("invalid auth key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.key))
            .map_err(|e| CbciError::Config(format!("invalid auth key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}{}", self.url, path);
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| CbciError::Transport(format!("auth provider unreachable: {e}")))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            Ok(body)
        } else {
            Err(CbciError::Auth(
                provider_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            ))
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[instrument(name = "auth_create_user", skip(self, password))]
    async fn create_user(&self, email: &str, password: &str, name: &str) -> Result<Value> {
        let user = self
            .post(
                "/auth/v1/admin/users",
                json!({
                    "email": email,
                    "password": password,
                    "user_metadata": { "name": name },
                    "email_confirm": true,
                }),
            )
            .await?;
        info!("user created");
        Ok(user)
    }

    #[instrument(name = "auth_sign_in", skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let body = self
            .post(
                "/auth/v1/token?grant_type=password",
                json!({ "email": email, "password": password }),
            )
            .await?;
        serde_json::from_value(body)
            .map_err(|e| CbciError::Auth(format!("unexpected sign-in reply: {e}")))
    }
}
