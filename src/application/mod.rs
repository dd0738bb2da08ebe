//! Application layer - Use cases and orchestration

pub mod catalog;
pub mod ingest;
pub mod init;
pub mod manage_config;
pub mod records;
pub mod search;
pub mod session;
pub mod store;

pub use ingest::IngestService;
pub use manage_config::ConfigService;
pub use records::RecordService;
pub use search::SearchService;
pub use session::{SessionService, SessionStatus};
pub use store::{CollectionBackend, ContentStore, LocalBackend, RemoteBackend};
