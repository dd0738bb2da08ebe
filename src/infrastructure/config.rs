//! Configuration management

use crate::error::{CbciError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the per-site metadata directory
pub const SITE_DIR: &str = ".cbcimath";

/// Which backing store the storage facade talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Files under `.cbcimath/store`
    #[default]
    Local,
    /// The HTTP service (`cbcimath serve` or a deployed edge function)
    Remote,
}

impl FromStr for BackendKind {
    type Err = CbciError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" => Ok(BackendKind::Remote),
            _ => Err(CbciError::Config(format!("Invalid backend: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_function")]
    pub function: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
}

fn default_function() -> String {
    "make-server".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            project_id: None,
            anon_key: String::new(),
            function: default_function(),
            base_url: None,
            auth_url: None,
        }
    }
}

impl RemoteConfig {
    /// Base URL of the record API
    pub fn api_base_url(&self) -> Result<String> {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.trim().trim_end_matches('/').to_string());
        }
        match self.project_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(format!(
                "https://{}.supabase.co/functions/v1/{}",
                id.trim(),
                self.function
            )),
            _ => Err(CbciError::Config(
                "Remote backend needs remote.base_url or remote.project_id".to_string(),
            )),
        }
    }

    /// Base URL of the auth provider
    pub fn auth_base_url(&self) -> Result<String> {
        if let Some(url) = self.auth_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.trim().trim_end_matches('/').to_string());
        }
        match self.project_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(format!("https://{}.supabase.co", id.trim())),
            _ => Err(CbciError::Config(
                "Sign-in needs remote.auth_url or remote.project_id".to_string(),
            )),
        }
    }
}

/// Administrative login, verified against a stored hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password_sha256: String,
}

/// SHA-256 hex digest used for the admin password
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

impl AdminConfig {
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        AdminConfig {
            username: username.into(),
            email: None,
            password_sha256: hash_password(password),
        }
    }

    /// Whether `user` names this admin account
    pub fn is_admin_user(&self, user: &str) -> bool {
        let user = user.trim().to_lowercase();
        user == self.username.to_lowercase()
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase() == user)
    }

    pub fn verify(&self, user: &str, password: &str) -> bool {
        self.is_admin_user(user) && hash_password(password) == self.password_sha256.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// KV table directory, relative to the site root unless absolute
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Reject requests that lack `Authorization: Bearer <remote.anon_key>`
    #[serde(default)]
    pub require_token: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(SITE_DIR).join("server")
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            data_dir: default_data_dir(),
            require_token: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendKind,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminConfig>,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Create a new config with default values
    pub fn new(backend: BackendKind) -> Self {
        Config {
            backend,
            created: Utc::now(),
            remote: RemoteConfig::default(),
            admin: None,
            server: ServerConfig::default(),
        }
    }

    /// Load config from .cbcimath/config.toml in the given directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(SITE_DIR).join("config.toml");

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CbciError::NotCbciDirectory(path.to_path_buf())
            } else {
                CbciError::Io(e)
            }
        })?;

        toml::from_str(&contents)
            .map_err(|e| CbciError::Config(format!("Failed to parse config.toml: {}", e)))
    }

    /// Save config to .cbcimath/config.toml in the given directory
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let site_dir = path.join(SITE_DIR);
        let config_path = site_dir.join("config.toml");

        if !site_dir.exists() {
            fs::create_dir(&site_dir)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CbciError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Backend to use, honoring the CBCIMATH_BACKEND override
    pub fn effective_backend(&self) -> Result<BackendKind> {
        match std::env::var("CBCIMATH_BACKEND") {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(self.backend),
        }
    }

    /// Server data directory resolved against the site root
    pub fn server_data_dir(&self, root: &Path) -> PathBuf {
        if self.server.data_dir.is_absolute() {
            self.server.data_dir.clone()
        } else {
            root.join(&self.server.data_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_config_defaults() {
        let config = Config::new(BackendKind::Local);
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.remote.function, "make-server");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::new(BackendKind::Remote);
        config.remote.project_id = Some("abcd".to_string());
        config.admin = Some(AdminConfig::new("master", "secret!!"));

        config.save_to_dir(temp.path()).unwrap();
        assert!(temp.path().join(".cbcimath/config.toml").exists());

        let loaded = Config::load_from_dir(temp.path()).unwrap();
        assert_eq!(loaded.backend, BackendKind::Remote);
        assert_eq!(loaded.remote, config.remote);
        assert_eq!(loaded.admin, config.admin);
        assert_eq!(loaded.created, config.created);
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from_dir(temp.path());
        match result.unwrap_err() {
            CbciError::NotCbciDirectory(_) => {}
            other => panic!("Expected NotCbciDirectory error, got {}", other),
        }
    }

    #[test]
    fn test_minimal_config_parses() {
        let config: Config = toml::from_str("created = \"2025-01-01T00:00:00Z\"\n").unwrap();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_api_base_url_from_project() {
        let remote = RemoteConfig {
            project_id: Some("xyz".to_string()),
            ..RemoteConfig::default()
        };
        assert_eq!(
            remote.api_base_url().unwrap(),
            "https://xyz.supabase.co/functions/v1/make-server"
        );
        assert_eq!(remote.auth_base_url().unwrap(), "https://xyz.supabase.co");
    }

    #[test]
    fn test_api_base_url_override_wins() {
        let remote = RemoteConfig {
            project_id: Some("xyz".to_string()),
            base_url: Some("http://127.0.0.1:9000/".to_string()),
            ..RemoteConfig::default()
        };
        assert_eq!(remote.api_base_url().unwrap(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_api_base_url_missing() {
        assert!(matches!(
            RemoteConfig::default().api_base_url(),
            Err(CbciError::Config(_))
        ));
    }

    #[test]
    fn test_admin_verify() {
        let mut admin = AdminConfig::new("master", "master!!");
        admin.email = Some("master@cbcimath.com".to_string());
        assert!(admin.verify("Master", "master!!"));
        assert!(admin.verify(" master@cbcimath.com ", "master!!"));
        assert!(!admin.verify("master", "wrong"));
        assert!(!admin.verify("someone", "master!!"));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Remote".parse::<BackendKind>().unwrap(), BackendKind::Remote);
        assert!(matches!(
            "cloud".parse::<BackendKind>(),
            Err(CbciError::Config(_))
        ));
    }

    #[test]
    fn test_server_data_dir_relative_to_root() {
        let config = Config::new(BackendKind::Local);
        let root = Path::new("/srv/site");
        assert_eq!(
            config.server_data_dir(root),
            PathBuf::from("/srv/site/.cbcimath/server")
        );
    }
}
