//! Backup operations: create, list, restore and delete archives.
//!
//! The backup directory is the only index: every regular file in it is a
//! backup. Operations share no in-flight state and are not serialized
//! against each other.

use crate::archive::Archiver;
use crate::fs::PathFilter;
use crate::utils::BackupError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// A backup archive as found in the backup directory
#[derive(Debug, Clone, Serialize)]
pub struct BackupArchive {
    pub name: String,
    pub size: u64,
    #[serde(serialize_with = "serialize_millis")]
    pub mtime: DateTime<Utc>,
}

/// Outcome of a successful create
#[derive(Debug, Clone)]
pub struct CreatedBackup {
    pub name: String,
    pub size_bytes: u64,
    pub entries: usize,
    pub elapsed: Duration,
}

pub struct BackupService {
    data_dir: PathBuf,
    backup_dir: PathBuf,
    archive_prefix: String,
    filter: Arc<PathFilter>,
    archiver: Arc<dyn Archiver>,
}

impl BackupService {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        archive_prefix: impl Into<String>,
        filter: PathFilter,
        archiver: Arc<dyn Archiver>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_dir: backup_dir.into(),
            archive_prefix: archive_prefix.into(),
            filter: Arc::new(filter),
            archiver,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Archive the data directory into a new timestamped file.
    ///
    /// A failed archiver run may leave a partial file behind.
    pub async fn create(&self) -> Result<CreatedBackup, BackupError> {
        let name = archive_name(&self.archive_prefix, Utc::now());
        let started = Instant::now();

        let result = self.create_named(&name, started).await;
        if let Err(e) = &result {
            error!(
                "[backup] error: name={} time={}ms {}",
                name,
                started.elapsed().as_millis(),
                e
            );
        }
        result
    }

    async fn create_named(
        &self,
        name: &str,
        started: Instant,
    ) -> Result<CreatedBackup, BackupError> {
        self.ensure_backup_dir().await?;

        let destination = self.backup_dir.join(name);
        let archiver = self.archiver.clone();
        let filter = self.filter.clone();
        let root = self.data_dir.clone();
        let target = destination.clone();
        let stats =
            tokio::task::spawn_blocking(move || archiver.create(&root, &filter, &target)).await??;

        let size_bytes = tokio::fs::metadata(&destination)
            .await
            .map_err(BackupError::io("Failed to stat", &destination))?
            .len();
        let elapsed = started.elapsed();

        info!(
            "[backup] done name={} size={:.2}MB entries={} time={}ms",
            name,
            size_bytes as f64 / 1_048_576.0,
            stats.entries,
            elapsed.as_millis()
        );

        Ok(CreatedBackup {
            name: name.to_string(),
            size_bytes,
            entries: stats.entries,
            elapsed,
        })
    }

    /// Regular files in the backup directory, newest first.
    /// A missing backup directory is created and listed as empty.
    pub async fn list(&self) -> Result<Vec<BackupArchive>, BackupError> {
        let result = self.scan().await;
        match &result {
            Ok(items) => info!("[list] ok count={}", items.len()),
            Err(e) => error!("[list] error: {}", e),
        }
        result
    }

    async fn scan(&self) -> Result<Vec<BackupArchive>, BackupError> {
        self.ensure_backup_dir().await?;

        let mut items = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.backup_dir)
            .await
            .map_err(BackupError::io("Failed to read", &self.backup_dir))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(BackupError::io("Failed to read", &self.backup_dir))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(BackupError::io("Failed to stat", entry.path()))?;
            if !file_type.is_file() {
                continue;
            }

            let metadata = entry
                .metadata()
                .await
                .map_err(BackupError::io("Failed to stat", entry.path()))?;
            let mtime = metadata
                .modified()
                .map_err(BackupError::io("Failed to stat", entry.path()))?;

            items.push(BackupArchive {
                name: entry.file_name().to_string_lossy().to_string(),
                size: metadata.len(),
                mtime: mtime.into(),
            });
        }

        items.sort_by(|a, b| b.mtime.cmp(&a.mtime));
        Ok(items)
    }

    /// Extract an archive over the data directory.
    ///
    /// Conflicting files are overwritten in place; there is no snapshot or
    /// rollback, so a failure mid-extraction leaves a partial restore.
    pub async fn restore(&self, name: &str) -> Result<(), BackupError> {
        let file_name = sanitize_name(name)?;
        let started = Instant::now();

        let source = self.backup_dir.join(&file_name);
        let result = async {
            tokio::fs::metadata(&source)
                .await
                .map_err(BackupError::io("Failed to access", &source))?;

            let archiver = self.archiver.clone();
            let destination = self.data_dir.clone();
            let archive = source.clone();
            tokio::task::spawn_blocking(move || archiver.extract(&archive, &destination))
                .await??;
            Ok::<(), BackupError>(())
        }
        .await;

        match &result {
            Ok(()) => info!(
                "[restore] done name={} time={}ms",
                file_name,
                started.elapsed().as_millis()
            ),
            Err(e) => error!(
                "[restore] error: name={} time={}ms {}",
                file_name,
                started.elapsed().as_millis(),
                e
            ),
        }
        result
    }

    /// Remove an archive. A missing file is an error.
    pub async fn delete(&self, name: &str) -> Result<(), BackupError> {
        let file_name = sanitize_name(name)?;
        let path = self.backup_dir.join(&file_name);

        let result = tokio::fs::remove_file(&path)
            .await
            .map_err(BackupError::io("Failed to delete", &path));

        match &result {
            Ok(()) => info!("[delete] done name={}", file_name),
            Err(e) => error!("[delete] error: name={} {}", file_name, e),
        }
        result
    }

    async fn ensure_backup_dir(&self) -> Result<(), BackupError> {
        tokio::fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(BackupError::io("Failed to create", &self.backup_dir))
    }
}

/// `{prefix}-{ISO-8601 UTC with ':' and '.' replaced by '-'}.tar.gz`
pub fn archive_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}.{}",
        prefix,
        at.format("%Y-%m-%dT%H-%M-%S-%3fZ"),
        ARCHIVE_EXTENSION
    )
}

/// Reduce a requested archive name to its final path component so it can
/// only address files directly inside the backup directory.
pub fn sanitize_name(name: &str) -> Result<String, BackupError> {
    if name.is_empty() {
        return Err(BackupError::InvalidName("name required".into()));
    }

    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| BackupError::InvalidName(format!("invalid name: {name}")))
}

fn serialize_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
