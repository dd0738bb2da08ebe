//! Login state persisted in the local store

use crate::error::{CbciError, Result};
use crate::infrastructure::config::AdminConfig;
use crate::infrastructure::{AuthProvider, LocalStore, RemoteClient};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

const LOGGED_IN: &str = "isLoggedIn";
const MASTER: &str = "isMaster";
const TOKEN: &str = "session";
const USER: &str = "currentUser";

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_logged_in: bool,
    pub is_master: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

pub struct SessionService<'a> {
    store: &'a LocalStore,
}

impl<'a> SessionService<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        SessionService { store }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            is_logged_in: self.store.get_flag(LOGGED_IN),
            is_master: self.store.get_flag(MASTER),
            user: self.store.get_string(USER),
        }
    }

    /// Fail with `NotLoggedIn` unless a session is active
    pub fn require_login(&self) -> Result<SessionStatus> {
        let status = self.status();
        if status.is_logged_in {
            Ok(status)
        } else {
            Err(CbciError::NotLoggedIn)
        }
    }

    /// Administrative login against the configured `[admin]` credential
    pub fn login_master(
        &self,
        admin: Option<&AdminConfig>,
        user: &str,
        password: &str,
    ) -> Result<SessionStatus> {
        let admin = admin.ok_or_else(|| {
            CbciError::Auth("administrative login is not configured".to_string())
        })?;
        if !admin.verify(user, password) {
            return Err(CbciError::Auth("invalid administrator credentials".to_string()));
        }

        self.store.set_flag(LOGGED_IN, true)?;
        self.store.set_flag(MASTER, true)?;
        self.store.set_string(USER, &admin.username)?;
        self.store.remove(TOKEN)?;
        info!(user = %admin.username, "administrator logged in");
        Ok(self.status())
    }

    /// Password sign-in through the auth provider
    pub async fn login(
        &self,
        provider: &dyn AuthProvider,
        email: &str,
        password: &str,
    ) -> Result<SessionStatus> {
        let session = provider.sign_in(email, password).await?;

        self.store.set_flag(LOGGED_IN, true)?;
        self.store.set_flag(MASTER, false)?;
        self.store.set_string(USER, session.email().unwrap_or(email))?;
        self.store.set_string(TOKEN, &session.access_token)?;
        info!(user = email, "logged in");
        Ok(self.status())
    }

    pub fn logout(&self) -> Result<SessionStatus> {
        self.store.set_flag(LOGGED_IN, false)?;
        self.store.set_flag(MASTER, false)?;
        self.store.remove(TOKEN)?;
        self.store.remove(USER)?;
        Ok(self.status())
    }
}

/// Check sign-up input before anything is sent
pub fn validate_signup(email: &str, password: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CbciError::Validation("name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(CbciError::Validation(format!("invalid email: {}", email)));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CbciError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Register a user through the record service's `/signup` route
pub async fn signup(client: &RemoteClient, email: &str, password: &str, name: &str) -> Result<Value> {
    validate_signup(email, password, name)?;
    let body = json!({ "email": email, "password": password, "name": name });
    let reply = client.send(Method::POST, &["signup"], Some(&body)).await?;
    if reply.body.success {
        Ok(reply.body.data.unwrap_or(Value::Null))
    } else {
        Err(CbciError::Auth(reply.body.error.unwrap_or_else(|| {
            format!("sign-up failed with HTTP {}", reply.status.as_u16())
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::AuthSession;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FakeAuth;

    #[async_trait]
    impl AuthProvider for FakeAuth {
        async fn create_user(&self, email: &str, _password: &str, name: &str) -> Result<Value> {
            Ok(json!({"email": email, "user_metadata": {"name": name}}))
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
            if password == "right-password" {
                Ok(AuthSession {
                    access_token: "tok".to_string(),
                    refresh_token: None,
                    user: json!({"email": email}),
                })
            } else {
                Err(CbciError::Auth("Invalid login credentials".to_string()))
            }
        }
    }

    fn store() -> (TempDir, LocalStore) {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::new(temp.path().to_path_buf());
        (temp, store)
    }

    #[test]
    fn test_master_login_sets_both_flags() {
        let (_temp, store) = store();
        let session = SessionService::new(&store);
        let admin = AdminConfig::new("master", "admin-pass");

        assert!(session.require_login().is_err());
        let status = session.login_master(Some(&admin), "master", "admin-pass").unwrap();
        assert!(status.is_logged_in);
        assert!(status.is_master);
        assert_eq!(status.user.as_deref(), Some("master"));
        assert!(session.require_login().is_ok());
    }

    #[test]
    fn test_master_login_rejects_wrong_password_and_missing_config() {
        let (_temp, store) = store();
        let session = SessionService::new(&store);
        let admin = AdminConfig::new("master", "admin-pass");

        assert!(matches!(
            session.login_master(Some(&admin), "master", "nope"),
            Err(CbciError::Auth(_))
        ));
        assert!(matches!(
            session.login_master(None, "master", "admin-pass"),
            Err(CbciError::Auth(_))
        ));
        assert!(!session.status().is_logged_in);
    }

    #[tokio::test]
    async fn test_provider_login_and_logout() {
        let (_temp, store) = store();
        let session = SessionService::new(&store);

        let status = session.login(&FakeAuth, "t@example.com", "right-password").await.unwrap();
        assert!(status.is_logged_in);
        assert!(!status.is_master);
        assert_eq!(store.get_string("session").as_deref(), Some("tok"));

        let status = session.logout().unwrap();
        assert!(!status.is_logged_in);
        assert!(status.user.is_none());
        assert!(store.get_string("session").is_none());
    }

    #[tokio::test]
    async fn test_provider_error_is_propagated() {
        let (_temp, store) = store();
        let session = SessionService::new(&store);
        match session.login(&FakeAuth, "t@example.com", "wrong").await {
            Err(CbciError::Auth(msg)) => assert_eq!(msg, "Invalid login credentials"),
            other => panic!("Expected Auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_signup() {
        assert!(validate_signup("t@example.com", "123456", "Kim").is_ok());
        assert!(validate_signup("t@example.com", "12345", "Kim").is_err());
        assert!(validate_signup("not-an-email", "123456", "Kim").is_err());
        assert!(validate_signup("t@example.com", "123456", " ").is_err());
    }
}
