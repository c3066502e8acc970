use crate::error::ScanError;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names that never contain project routes.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "__pycache__",
    "venv",
    "env",
    "site-packages",
    "dist",
    "build",
];

/// Turns a walk failure into a [`ScanError`] for the entry it happened on.
fn walk_error(root: &Path, error: walkdir::Error) -> ScanError {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = error.to_string();
    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));

    ScanError { path, source }
}

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks through a project directory to find source files
/// with the configured extensions, optionally restricted to one exact file name (such as
/// Django's `urls.py`). It automatically skips hidden entries and dependency or build
/// directories like `node_modules` and `__pycache__`.
///
/// # Example
///
/// ```no_run
/// use apimatic::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project")).with_extensions(&["py"]);
/// let result = scanner.scan();
/// println!("Found {} Python files", result.files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    extensions: Vec<String>,
    file_name: Option<String>,
}

/// Result of directory scanning operation.
///
/// Contains the list of discovered files and any warnings encountered during scanning.
pub struct ScanResult {
    /// Paths of all matching files, in traversal order
    pub files: Vec<PathBuf>,
    /// Entries that could not be visited (e.g., unreadable directories)
    pub warnings: Vec<ScanError>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    ///
    /// Without further configuration every file is a candidate.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The root directory to scan
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            extensions: Vec::new(),
            file_name: None,
        }
    }

    /// Restricts the scan to files with one of the given extensions (without the dot).
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Restricts the scan to files with exactly this name.
    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }

    /// Scans the directory tree and collects all matching files.
    ///
    /// If any directories or files cannot be accessed, warnings are logged and added to
    /// the result, but scanning continues. Entries are visited in file-name order, so
    /// results are stable across runs.
    pub fn scan(&self) -> ScanResult {
        let mut files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_skipped_dir =
                    e.file_type().is_dir() && SKIPPED_DIRS.contains(&file_name.as_ref());

                !is_hidden && !is_skipped_dir
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file() && self.matches(path) {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    warn!("Failed to access path: {}", e);
                    warnings.push(walk_error(&self.root_path, e));
                }
            }
        }

        debug!(
            "Scanned {}: {} matching files",
            self.root_path.display(),
            files.len()
        );

        ScanResult { files, warnings }
    }

    fn matches(&self, path: &Path) -> bool {
        if let Some(ref wanted) = self.file_name {
            if path.file_name().and_then(|n| n.to_str()) != Some(wanted.as_str()) {
                return false;
            }
        }

        if self.extensions.is_empty() {
            return true;
        }

        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Reads a source file as text.
///
/// Invalid UTF-8 sequences are replaced rather than treated as errors, so only
/// genuine I/O failures (missing file, permissions) are reported.
pub fn read_source(path: &Path) -> Result<String, ScanError> {
    let bytes = fs::read(path).map_err(|source| ScanError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Renders `path` relative to `root` with `/` separators.
///
/// Falls back to the full path when `path` is not under `root`.
pub fn relative_display(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
