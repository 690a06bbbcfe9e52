//! Directory scanning with extension and folder filters.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::rule::{normalize_extension, normalize_extension_set};

/// Folder names that are never descended into, regardless of configuration.
pub const ALWAYS_EXCLUDED_FOLDERS: [&str; 6] =
    [".git", ".vs", ".idea", "__pycache__", ".svn", ".hg"];

/// Default filter lists, tuned for legacy .NET/web trees: source and SQL
/// files in, compiled artifacts out, package and build output folders pruned.
pub const DEFAULT_INCLUDE_EXTENSIONS: &str = ".cs,.ts,.tsx,.js,.jsx,.sql";
pub const DEFAULT_EXCLUDE_EXTENSIONS: &str = ".dll,.exe,.pdb";
pub const DEFAULT_EXCLUDE_FOLDERS: &str = "bin,obj,node_modules,packages,dist,build";

/// Extension and folder filters applied during a scan.
///
/// Extension filters are normalized (lowercase, leading dot) at construction
/// time. An empty include set means "all extensions". Exclusion wins over
/// inclusion. Folder names are matched exactly, case-insensitively, against
/// directory basenames.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    include_extensions: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_folders: HashSet<String>,
}

impl ScanConfig {
    /// Build a config from comma-separated filter lists.
    pub fn new(include_extensions: &str, exclude_extensions: &str, exclude_folders: &str) -> Self {
        Self {
            include_extensions: normalize_extension_set(include_extensions),
            exclude_extensions: normalize_extension_set(exclude_extensions),
            exclude_folders: exclude_folders
                .split(',')
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// No filters at all: every readable file outside the hidden and
    /// always-excluded folders is scanned.
    pub fn include_all() -> Self {
        Self::new("", "", "")
    }

    pub fn include_extensions(&self) -> &HashSet<String> {
        &self.include_extensions
    }

    pub fn exclude_extensions(&self) -> &HashSet<String> {
        &self.exclude_extensions
    }

    pub fn exclude_folders(&self) -> &HashSet<String> {
        &self.exclude_folders
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_INCLUDE_EXTENSIONS,
            DEFAULT_EXCLUDE_EXTENSIONS,
            DEFAULT_EXCLUDE_FOLDERS,
        )
    }
}

/// The normalized extension of a path (e.g. `".cs"`), or `""` if it has none.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(normalize_extension)
        .unwrap_or_default()
}

/// Walks directory trees, pruning excluded folders and filtering files.
///
/// Excluded and hidden directories are never descended into, so their
/// contents are invisible no matter how deeply they nest. Symbolic links are
/// not followed. Unreadable entries are logged and skipped.
#[derive(Debug, Clone)]
pub struct PathScanner {
    config: ScanConfig,
}

impl PathScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Lazily yield the files under `root` that pass the filters.
    ///
    /// A root that does not exist or is not a directory yields nothing.
    pub fn scan<'a>(&'a self, root: &Path) -> impl Iterator<Item = PathBuf> + 'a {
        let walker = root.is_dir().then(|| {
            WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(move |entry| self.should_descend(entry))
        });
        walker
            .into_iter()
            .flatten()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!("skipping unreadable entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(DirEntry::into_path)
            .filter(move |path| self.should_include_file(path))
    }

    /// Whether a file passes the extension filters.
    pub fn should_include_file(&self, path: &Path) -> bool {
        let extension = file_extension(path);
        if self.config.exclude_extensions.contains(&extension) {
            return false;
        }
        self.config.include_extensions.is_empty()
            || self.config.include_extensions.contains(&extension)
    }

    /// Whether a directory basename is excluded from traversal.
    pub fn should_exclude_folder(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        ALWAYS_EXCLUDED_FOLDERS.contains(&lowered.as_str())
            || self.config.exclude_folders.contains(&lowered)
    }

    // The root itself always passes, even when its own name would be pruned
    // one level down.
    fn should_descend(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !name.starts_with('.') && !self.should_exclude_folder(&name)
    }
}

impl Default for PathScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
