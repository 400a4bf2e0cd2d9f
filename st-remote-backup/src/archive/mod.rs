//! Archive creation and extraction.
//!
//! [`Archiver`] is the seam between backup operations and the archive
//! format. [`TarGzArchiver`] is the in-process gzip tar implementation.

pub mod targz;

pub use targz::TarGzArchiver;

use crate::fs::PathFilter;
use crate::utils::ArchiveError;
use std::path::Path;

/// Counters reported after an archive has been written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    /// Entries written (directories, files and symlinks)
    pub entries: usize,

    /// Regular files written
    pub files: usize,

    /// Uncompressed bytes of regular files
    pub bytes: u64,
}

/// Blocking archive operations. Callers run these on the blocking pool.
pub trait Archiver: Send + Sync {
    /// Archive the entries of `root` accepted by `filter` into `destination`
    fn create(
        &self,
        root: &Path,
        filter: &PathFilter,
        destination: &Path,
    ) -> Result<ArchiveStats, ArchiveError>;

    /// Unpack `source` into `destination`, overwriting existing files
    fn extract(&self, source: &Path, destination: &Path) -> Result<(), ArchiveError>;
}
