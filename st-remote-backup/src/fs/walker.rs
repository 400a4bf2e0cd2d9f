//! Directory traversal for archive creation.
//!
//! Walks the data directory without following symlinks and prunes every
//! entry the [`PathFilter`] rejects, so nothing beneath an excluded
//! directory is ever visited.

use super::filter::PathFilter;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// An entry discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the entry
    pub path: PathBuf,

    /// Relative path from the root
    pub relative_path: PathBuf,

    /// File size in bytes (0 for directories and symlinks)
    pub size: u64,

    /// Is this a directory?
    pub is_dir: bool,

    /// Is this a symlink?
    pub is_symlink: bool,
}

impl FileInfo {
    fn from_entry(entry: &DirEntry, root: &Path) -> std::io::Result<Self> {
        let metadata = entry.metadata()?;
        let path = entry.path().to_path_buf();
        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        let is_symlink = entry.path_is_symlink();

        Ok(Self {
            path,
            relative_path,
            size: if metadata.is_file() { metadata.len() } else { 0 },
            is_dir: metadata.is_dir(),
            is_symlink,
        })
    }
}

/// Walk a directory tree and collect every entry the filter accepts.
///
/// The root itself is not reported. Directories are reported before their
/// contents.
///
/// # Example
/// ```no_run
/// use st_remote_backup::fs::{filter::PathFilter, walker::walk_directory};
/// use std::path::Path;
///
/// let entries = walk_directory(Path::new("/data"), &PathFilter::default()).unwrap();
/// println!("Found {} entries", entries.len());
/// ```
pub fn walk_directory(root: &Path, filter: &PathFilter) -> std::io::Result<Vec<FileInfo>> {
    let mut entries = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| filter.should_include(&relative_key(entry.path(), root)));

    for entry in walker {
        let entry = entry?;
        entries.push(FileInfo::from_entry(&entry, root)?);
    }

    Ok(entries)
}

/// Render a path relative to `root` with `/` separators, the form the
/// filter rules are written in.
pub fn relative_key(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
