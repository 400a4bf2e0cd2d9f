//! Inclusion rules for entries of the data directory.
//!
//! Keeps the core data in a backup while leaving out earlier backups,
//! repository history, dependency trees, caches and nested archives.

/// Rule sets deciding which relative paths enter an archive.
///
/// Rules are evaluated in a fixed order and the first exclusion wins:
/// prefix, always-excluded segment, cache-like segment (unless the path
/// lives under a passthrough directory), archive suffix.
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Paths equal to or nested under these are excluded
    pub excluded_prefixes: Vec<String>,

    /// Segment names excluded wherever they appear
    pub excluded_segments: Vec<String>,

    /// Segment names excluded outside the passthrough directories
    pub cache_segments: Vec<String>,

    /// First segments whose content is kept verbatim even if it looks cache-like
    pub passthrough_dirs: Vec<String>,

    /// File name endings that are never archived
    pub excluded_suffixes: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            excluded_prefixes: strings(&["default-user/backups"]),
            excluded_segments: strings(&[".git", "node_modules"]),
            cache_segments: strings(&[
                "_cache",
                "_uploads",
                "_storage",
                "_webpack",
                ".cache",
                ".parcel-cache",
                ".vite",
                "coverage",
            ]),
            passthrough_dirs: strings(&["third-party"]),
            excluded_suffixes: strings(&[".zip", ".tar", ".tar.gz"]),
        }
    }
}

impl PathFilter {
    /// Decide whether a `/`-separated path relative to the data directory
    /// belongs in a backup.
    pub fn should_include(&self, relative_path: &str) -> bool {
        let path = normalize(relative_path);

        if self
            .excluded_prefixes
            .iter()
            .any(|prefix| is_under(path, prefix))
        {
            return false;
        }

        let segments: Vec<&str> = path.split('/').collect();

        if segments
            .iter()
            .any(|segment| self.excluded_segments.iter().any(|s| s == segment))
        {
            return false;
        }

        let passthrough = self.passthrough_dirs.iter().any(|dir| dir == segments[0]);
        if !passthrough
            && segments
                .iter()
                .any(|segment| self.cache_segments.iter().any(|s| s == segment))
        {
            return false;
        }

        if self
            .excluded_suffixes
            .iter()
            .any(|suffix| path.ends_with(suffix.as_str()))
        {
            return false;
        }

        true
    }
}

fn normalize(path: &str) -> &str {
    if path == "." {
        return "";
    }
    path.strip_prefix("./").unwrap_or(path)
}

fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_files_are_included() {
        let filter = PathFilter::default();
        assert!(filter.should_include("settings.json"));
        assert!(filter.should_include("default-user/chats/alice/2024-01-01.jsonl"));
        assert!(filter.should_include(""));
        assert!(filter.should_include("."));
    }

    #[test]
    fn test_backup_history_prefix_is_excluded() {
        let filter = PathFilter::default();
        assert!(!filter.should_include("default-user/backups"));
        assert!(!filter.should_include("default-user/backups/chat.jsonl"));
        assert!(!filter.should_include("./default-user/backups/a/b"));
        // Only whole segments match the prefix
        assert!(filter.should_include("default-user/backups-old/chat.jsonl"));
    }

    #[test]
    fn test_vcs_and_dependency_dirs_excluded_anywhere() {
        let filter = PathFilter::default();
        for path in [
            ".git",
            ".git/HEAD",
            "./.git/objects/ab/cdef",
            "extensions/foo/.git/config",
            "node_modules/left-pad/index.js",
            "third-party/plugin/node_modules/x.js",
            "third-party/.git/HEAD",
        ] {
            assert!(!filter.should_include(path), "{path} should be excluded");
        }
    }

    #[test]
    fn test_cache_like_segments_excluded_outside_passthrough() {
        let filter = PathFilter::default();
        assert!(!filter.should_include("_cache/thumb.png"));
        assert!(!filter.should_include("default-user/_uploads/img.png"));
        assert!(!filter.should_include("extensions/app/.vite/deps.js"));
        assert!(!filter.should_include("coverage"));
    }

    #[test]
    fn test_passthrough_dir_keeps_cache_like_content() {
        let filter = PathFilter::default();
        assert!(filter.should_include("third-party/_cache/data.bin"));
        assert!(filter.should_include("third-party/lib/.cache/index"));
        assert!(filter.should_include("./third-party/coverage/report.html"));
        // Passthrough only applies to the first segment
        assert!(!filter.should_include("plugins/third-party/_cache/data.bin"));
    }

    #[test]
    fn test_archive_suffixes_excluded_even_under_passthrough() {
        let filter = PathFilter::default();
        for path in [
            "old.zip",
            "exports/chat.tar",
            "exports/chat.tar.gz",
            "third-party/bundle.zip",
            "third-party/_cache/bundle.tar.gz",
        ] {
            assert!(!filter.should_include(path), "{path} should be excluded");
        }
        assert!(filter.should_include("exports/chat.gz"));
    }

    #[test]
    fn test_custom_rules() {
        let filter = PathFilter {
            excluded_prefixes: strings(&["tmp"]),
            excluded_segments: Vec::new(),
            cache_segments: Vec::new(),
            passthrough_dirs: Vec::new(),
            excluded_suffixes: strings(&[".log"]),
        };
        assert!(!filter.should_include("tmp/a"));
        assert!(!filter.should_include("logs/server.log"));
        assert!(filter.should_include(".git/HEAD"));
    }
}
