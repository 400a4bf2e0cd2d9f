//! Remote Backup Library
//!
//! Creates, lists, restores and deletes gzip tarball backups of a data
//! directory behind a Basic-auth guarded HTTP API.

pub mod api;
pub mod archive;
pub mod backup;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fs;
pub mod logs;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
