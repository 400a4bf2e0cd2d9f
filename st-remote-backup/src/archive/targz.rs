//! Gzip-compressed tar archives built with `tar` and `flate2`.

use super::{ArchiveStats, Archiver};
use crate::fs::{walker::walk_directory, PathFilter};
use crate::utils::ArchiveError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Default gzip level, favouring speed over ratio
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 1;

#[derive(Debug, Clone)]
pub struct TarGzArchiver {
    compression: Compression,
}

impl TarGzArchiver {
    /// `level` is clamped to the gzip range 0-9
    pub fn new(level: u32) -> Self {
        Self {
            compression: Compression::new(level.min(9)),
        }
    }
}

impl Default for TarGzArchiver {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl Archiver for TarGzArchiver {
    fn create(
        &self,
        root: &Path,
        filter: &PathFilter,
        destination: &Path,
    ) -> Result<ArchiveStats, ArchiveError> {
        let entries =
            walk_directory(root, filter).map_err(ArchiveError::io("Failed to scan", root))?;

        let file = File::create(destination)
            .map_err(ArchiveError::io("Failed to create archive", destination))?;
        let encoder = GzEncoder::new(BufWriter::new(file), self.compression);
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);

        let mut stats = ArchiveStats::default();
        for entry in &entries {
            let result = if entry.is_dir {
                builder.append_dir(&entry.relative_path, &entry.path)
            } else {
                builder.append_path_with_name(&entry.path, &entry.relative_path)
            };
            result.map_err(ArchiveError::io("Failed to add", &entry.path))?;

            stats.entries += 1;
            if !entry.is_dir && !entry.is_symlink {
                stats.files += 1;
                stats.bytes += entry.size;
            }
        }

        let encoder = builder
            .into_inner()
            .map_err(ArchiveError::io("Failed to finish", destination))?;
        let mut writer = encoder
            .finish()
            .map_err(ArchiveError::io("Failed to compress", destination))?;
        writer
            .flush()
            .map_err(ArchiveError::io("Failed to write", destination))?;

        debug!(
            "Archived {} entries ({} files, {} bytes) into {}",
            stats.entries,
            stats.files,
            stats.bytes,
            destination.display()
        );

        Ok(stats)
    }

    fn extract(&self, source: &Path, destination: &Path) -> Result<(), ArchiveError> {
        let file = File::open(source).map_err(ArchiveError::io("Failed to open", source))?;
        let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        archive.set_overwrite(true);
        archive.set_preserve_mtime(true);
        archive
            .unpack(destination)
            .map_err(ArchiveError::io("Failed to extract", source))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn entry_names(archive_path: &Path) -> Vec<String> {
        let file = File::open(archive_path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                e.unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .trim_end_matches('/')
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_create_applies_filter() -> Result<(), Box<dyn std::error::Error>> {
        let data = TempDir::new()?;
        let out = TempDir::new()?;

        fs::write(data.path().join("keep.txt"), b"0123456789")?;
        fs::create_dir_all(data.path().join(".git"))?;
        fs::write(data.path().join(".git/HEAD"), b"ref")?;
        fs::create_dir_all(data.path().join("third-party/_cache"))?;
        fs::write(data.path().join("third-party/_cache/kept.bin"), b"abc")?;
        fs::write(data.path().join("nested.zip"), b"zip")?;

        let destination = out.path().join("backup.tar.gz");
        let stats = TarGzArchiver::default().create(
            data.path(),
            &PathFilter::default(),
            &destination,
        )?;

        assert_eq!(stats.files, 2);
        assert_eq!(stats.bytes, 13);
        assert_eq!(stats.entries, 4);
        assert_eq!(
            entry_names(&destination),
            vec![
                "keep.txt",
                "third-party",
                "third-party/_cache",
                "third-party/_cache/kept.bin"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_extract_overwrites_in_place() -> Result<(), Box<dyn std::error::Error>> {
        let data = TempDir::new()?;
        let out = TempDir::new()?;
        let archiver = TarGzArchiver::new(6);

        fs::create_dir_all(data.path().join("chats"))?;
        fs::write(data.path().join("chats/a.jsonl"), b"original")?;

        let destination = out.path().join("backup.tar.gz");
        archiver.create(data.path(), &PathFilter::default(), &destination)?;

        fs::write(data.path().join("chats/a.jsonl"), b"changed later")?;
        fs::write(data.path().join("extra.txt"), b"untouched")?;

        archiver.extract(&destination, data.path())?;

        let mut restored = String::new();
        File::open(data.path().join("chats/a.jsonl"))?.read_to_string(&mut restored)?;
        assert_eq!(restored, "original");
        // Restore does not remove files missing from the archive
        assert!(data.path().join("extra.txt").exists());
        Ok(())
    }

    #[test]
    fn test_extract_missing_archive_fails() {
        let data = TempDir::new().unwrap();
        let err = TarGzArchiver::default()
            .extract(&data.path().join("nope.tar.gz"), data.path())
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to open"));
    }

    #[test]
    fn test_create_into_missing_directory_fails() {
        let data = TempDir::new().unwrap();
        let err = TarGzArchiver::default()
            .create(
                data.path(),
                &PathFilter::default(),
                &data.path().join("missing/dir/out.tar.gz"),
            )
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to create archive"));
    }
}
