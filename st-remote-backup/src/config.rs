//! Configuration management for the backup service.
//!
//! Loads configuration from an optional TOML file, then applies environment
//! variable overrides (a `.env` file is honoured).

use crate::archive::targz::DEFAULT_COMPRESSION_LEVEL;
use crate::logs::{DEFAULT_MAX_LINES, DEFAULT_UTC_OFFSET_MINUTES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the static control panel
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that is backed up and restored into
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding the archives
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// File name prefix of new archives
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,

    /// Gzip level (0-9)
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Initial username; empty together with `password` disables auth
    #[serde(default)]
    pub username: String,

    /// Initial password
    #[serde(default)]
    pub password: String,

    /// Persisted credential pair, overrides the two fields above when present
    #[serde(default = "default_credential_file")]
    pub credential_file: PathBuf,

    /// Realm announced in `WWW-Authenticate`
    #[serde(default = "default_realm")]
    pub realm: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Lines kept for `/logs`
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Offset of log timestamps from UTC, in minutes
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

// Default values
fn default_port() -> u16 {
    8787
}

/// Directory of the running executable. Relative defaults resolve here so
/// they do not depend on the working directory.
pub fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("/"))
}

fn default_public_dir() -> PathBuf {
    install_dir().join("public")
}

fn default_body_limit() -> usize {
    1024 * 1024 // 1MB
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/root/sillytavern/data")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/opt/st-remote-backup/backups")
}

fn default_archive_prefix() -> String {
    "st-data".to_string()
}

fn default_compression_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

fn default_credential_file() -> PathBuf {
    install_dir().join("cred.json")
}

fn default_realm() -> String {
    "st-backup".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_lines() -> usize {
    DEFAULT_MAX_LINES
}

fn default_utc_offset_minutes() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_dir: default_public_dir(),
            body_limit: default_body_limit(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backup_dir: default_backup_dir(),
            archive_prefix: default_archive_prefix(),
            compression_level: default_compression_level(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            credential_file: default_credential_file(),
            realm: default_realm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_lines: default_max_lines(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl Config {
    /// Load configuration: `.env`, then the TOML file (if any), then the
    /// process environment
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PORT`, `DATA_DIR`, `BACKUP_DIR`, `BASIC_USER`, `BASIC_PASS`,
    /// `CRED_FILE`, `PUBLIC_DIR`, `LOG_LEVEL` and `LOG_MAX` as returned by
    /// `lookup`. Unparsable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = lookup("PUBLIC_DIR") {
            self.server.public_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("BACKUP_DIR") {
            self.storage.backup_dir = PathBuf::from(dir);
        }
        if let Some(user) = lookup("BASIC_USER") {
            self.auth.username = user;
        }
        if let Some(pass) = lookup("BASIC_PASS") {
            self.auth.password = pass;
        }
        if let Some(file) = lookup("CRED_FILE") {
            self.auth.credential_file = PathBuf::from(file);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(max) = lookup("LOG_MAX").and_then(|v| v.parse().ok()) {
            self.log.max_lines = max;
        }
    }
}
