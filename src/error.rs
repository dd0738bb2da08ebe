//! Error types for cbcimath

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cbcimath
#[derive(Debug, Error)]
pub enum CbciError {
    #[error("Not a cbcimath directory: {0}")]
    NotCbciDirectory(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unknown record kind: {0}")]
    UnknownKind(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Server error: {0}")]
    Server(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CbciError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CbciError::NotCbciDirectory(_) => 2,
            CbciError::Validation(_) | CbciError::UnknownKind(_) => 3,
            CbciError::NotFound(_) => 4,
            CbciError::NotLoggedIn | CbciError::Auth(_) => 5,
            CbciError::Transport(_) | CbciError::Remote(_) => 6,
            _ => 1,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            CbciError::NotCbciDirectory(path) => {
                format!(
                    "Not a cbcimath directory: {}\n\n\
                    Suggestions:\n\
                    • Run 'cbcimath init' in this directory to create a new site\n\
                    • Navigate to an existing cbcimath directory\n\
                    • Set CBCIMATH_ROOT environment variable to your site path",
                    path.display()
                )
            }
            CbciError::UnknownKind(kind) => {
                format!(
                    "Unknown record kind: '{}'\n\n\
                    Valid kinds: notices, lessons, research, evaluations, cbci\n\
                    Example: cbcimath list notices",
                    kind
                )
            }
            CbciError::NotLoggedIn => "Not logged in\n\n\
                Suggestions:\n\
                • Log in with 'cbcimath login <email> --password <password>'\n\
                • Check the session with 'cbcimath whoami'"
                .to_string(),
            CbciError::Transport(msg) => {
                format!(
                    "Transport error: {}\n\n\
                    Suggestions:\n\
                    • Check that the remote service is reachable\n\
                    • Verify remote.base_url or remote.project_id: cbcimath config --list\n\
                    • Switch to the local store: cbcimath config backend local",
                    msg
                )
            }
            CbciError::Config(msg) => {
                if msg.contains("Invalid backend") {
                    format!(
                        "{}\n\n\
                        Valid backends: local, remote\n\
                        Example: cbcimath config backend remote",
                        msg
                    )
                } else {
                    msg.clone()
                }
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using CbciError
pub type Result<T> = std::result::Result<T, CbciError>;
