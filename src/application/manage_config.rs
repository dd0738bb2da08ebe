//! Config management use case

use crate::error::{CbciError, Result};
use crate::infrastructure::config::{hash_password, AdminConfig};
use crate::infrastructure::{BackendKind, Config, FileSystemRepository, SiteRepository};
use std::path::PathBuf;
use std::str::FromStr;

const KEYS: &str = "backend, created, remote.project_id, remote.anon_key, remote.function, \
    remote.base_url, remote.auth_url, admin.username, admin.email, admin.password, \
    server.bind, server.data_dir, server.require_token";

fn unknown_key(key: &str) -> CbciError {
    CbciError::Config(format!(
        "Unknown config key: '{}'. Valid keys are: {}",
        key, KEYS
    ))
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Service for managing site configuration
pub struct ConfigService {
    repository: FileSystemRepository,
}

impl ConfigService {
    pub fn new(repository: FileSystemRepository) -> Self {
        ConfigService { repository }
    }

    /// Get a single config value
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.repository.load_config()?;
        let admin = config.admin.as_ref();

        match key {
            "backend" => Ok(format!("{:?}", config.backend).to_lowercase()),
            "created" => Ok(config.created.to_rfc3339()),
            "remote.project_id" => Ok(config.remote.project_id.unwrap_or_default()),
            "remote.anon_key" => Ok(config.remote.anon_key),
            "remote.function" => Ok(config.remote.function),
            "remote.base_url" => Ok(config.remote.base_url.unwrap_or_default()),
            "remote.auth_url" => Ok(config.remote.auth_url.unwrap_or_default()),
            "admin.username" => Ok(admin.map(|a| a.username.clone()).unwrap_or_default()),
            "admin.email" => Ok(admin.and_then(|a| a.email.clone()).unwrap_or_default()),
            "admin.password" => Err(CbciError::Config(
                "'admin.password' is write-only".to_string(),
            )),
            "server.bind" => Ok(config.server.bind),
            "server.data_dir" => Ok(config.server.data_dir.display().to_string()),
            "server.require_token" => Ok(config.server.require_token.to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a config value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.repository.load_config()?;

        match key {
            "backend" => config.backend = BackendKind::from_str(value)?,
            "created" => {
                return Err(CbciError::Config(
                    "Cannot modify 'created' field (read-only)".to_string(),
                ));
            }
            "remote.project_id" => config.remote.project_id = optional(value),
            "remote.anon_key" => config.remote.anon_key = value.trim().to_string(),
            "remote.function" => config.remote.function = value.trim().to_string(),
            "remote.base_url" => config.remote.base_url = optional(value),
            "remote.auth_url" => config.remote.auth_url = optional(value),
            "admin.username" | "admin.email" | "admin.password" => {
                let admin = config.admin.get_or_insert_with(|| AdminConfig {
                    username: "master".to_string(),
                    email: None,
                    password_sha256: String::new(),
                });
                match key {
                    "admin.username" => {
                        admin.username = optional(value).ok_or_else(|| {
                            CbciError::Config("admin.username cannot be empty".to_string())
                        })?
                    }
                    "admin.email" => admin.email = optional(value),
                    _ => {
                        if value.is_empty() {
                            return Err(CbciError::Config(
                                "admin.password cannot be empty".to_string(),
                            ));
                        }
                        admin.password_sha256 = hash_password(value);
                    }
                }
            }
            "server.bind" => config.server.bind = value.trim().to_string(),
            "server.data_dir" => config.server.data_dir = PathBuf::from(value.trim()),
            "server.require_token" => {
                config.server.require_token = value.trim().parse().map_err(|_| {
                    CbciError::Config(format!(
                        "Invalid value for server.require_token: {} (expected true or false)",
                        value
                    ))
                })?
            }
            _ => return Err(unknown_key(key)),
        }

        self.repository.save_config(&config)?;
        Ok(())
    }

    /// List all config values
    pub fn list(&self) -> Result<Config> {
        self.repository.load_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service() -> (TempDir, ConfigService) {
        let temp = TempDir::new().unwrap();
        let repo = FileSystemRepository::new(temp.path().to_path_buf());
        repo.initialize().unwrap();
        repo.save_config(&Config::new(BackendKind::Local)).unwrap();
        (temp, ConfigService::new(repo))
    }

    #[test]
    fn test_get_and_set_backend() {
        let (_temp, service) = service();
        assert_eq!(service.get("backend").unwrap(), "local");
        service.set("backend", "remote").unwrap();
        assert_eq!(service.get("backend").unwrap(), "remote");
        assert!(service.set("backend", "cloud").is_err());
    }

    #[test]
    fn test_admin_password_is_stored_hashed() {
        let (_temp, service) = service();
        service.set("admin.password", "s3cret!!").unwrap();

        let config = service.list().unwrap();
        let admin = config.admin.unwrap();
        assert_eq!(admin.username, "master");
        assert_ne!(admin.password_sha256, "s3cret!!");
        assert!(admin.verify("master", "s3cret!!"));
        assert!(service.get("admin.password").is_err());
    }

    #[test]
    fn test_optional_remote_fields_clear_on_empty() {
        let (_temp, service) = service();
        service.set("remote.base_url", "http://127.0.0.1:8080").unwrap();
        assert_eq!(service.get("remote.base_url").unwrap(), "http://127.0.0.1:8080");
        service.set("remote.base_url", "").unwrap();
        assert_eq!(service.get("remote.base_url").unwrap(), "");
    }

    #[test]
    fn test_created_is_read_only() {
        let (_temp, service) = service();
        assert!(service.set("created", "2020-01-01T00:00:00Z").is_err());
    }

    #[test]
    fn test_unknown_key() {
        let (_temp, service) = service();
        match service.get("editor") {
            Err(CbciError::Config(msg)) => assert!(msg.contains("Unknown config key")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_require_token_parses_bool() {
        let (_temp, service) = service();
        service.set("server.require_token", "true").unwrap();
        assert_eq!(service.get("server.require_token").unwrap(), "true");
        assert!(service.set("server.require_token", "yes").is_err());
    }
}
