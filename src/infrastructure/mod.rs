//! Infrastructure layer - External I/O and persistence

pub mod auth;
pub mod config;
pub mod local_store;
pub mod remote;
pub mod repository;

pub use auth::{AuthProvider, AuthSession, SupabaseAuth};
pub use config::{BackendKind, Config};
pub use local_store::LocalStore;
pub use remote::{RemoteClient, RemoteReply};
pub use repository::{FileSystemRepository, SiteRepository};
