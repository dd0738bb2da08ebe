//! cbcimath - Curriculum-based math teaching materials
//!
//! Notices, lesson, research, evaluation and CBCI design materials stored
//! behind one storage facade, backed either by a local key-value store or by
//! the bundled HTTP record service.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod server;

pub use error::CbciError;
