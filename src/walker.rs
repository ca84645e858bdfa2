//! Sequential depth-first directory traversal.
//!
//! Uses the `ignore` crate's walker with its standard filters switched off:
//! hidden-file and pattern policy belong to the scanner, and `.gitignore`
//! handling is opt-in. Entries within a directory are visited in file-name
//! order, directories before their children.

use std::error::Error as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;

use crate::config::ScanConfig;
use crate::record::relative_path;

/// Errors raised while walking.
///
/// Everything except [`WalkError::Entry`] aborts the walk.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("symlink loop detected: {path}")]
    SymlinkLoop { path: PathBuf },

    /// A single non-directory entry could not be inspected, e.g. a dangling
    /// symlink under `follow_symlinks`.
    #[error("cannot stat {path}: {source}")]
    Entry {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    /// Whether the walk as a whole has failed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WalkError::Entry { .. })
    }
}

/// Options for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Deepest allowed separator count in a root-relative path (None = unlimited).
    pub max_depth: Option<usize>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Respect .gitignore patterns.
    pub respect_gitignore: bool,
}

impl WalkOptions {
    /// Set maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

impl From<&ScanConfig> for WalkOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            max_depth: Some(config.max_depth),
            follow_symlinks: config.follow_links,
            respect_gitignore: config.respect_gitignore,
        }
    }
}

/// Entry from directory walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Path to the entry.
    pub path: PathBuf,
    /// Root-relative, `/`-separated path.
    pub relative: String,
    /// Separators in `relative` (direct children of the root are 0).
    pub depth: usize,
    /// Whether this is a regular file.
    pub is_file: bool,
    /// File size in bytes (files only; `None` if stat failed).
    pub size: Option<u64>,
}

impl WalkEntry {
    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.relative.rsplit('/').next().unwrap_or(&self.relative)
    }

    pub fn is_hidden(&self) -> bool {
        self.file_name().starts_with('.')
    }
}

/// Walk a directory tree, yielding every entry below `root`.
///
/// The root directory itself is not yielded. A root that is a regular file
/// yields just that file. I/O errors come back as `Err` items: failures to
/// read a directory and symlink loops are fatal, a failure to stat a single
/// non-directory entry is reported as [`WalkError::Entry`].
///
/// # Examples
///
/// ```no_run
/// use promptcat::walker::{walk, WalkOptions};
/// use std::path::Path;
///
/// for entry in walk(Path::new("."), &WalkOptions::default()).unwrap() {
///     let entry = entry.unwrap();
///     println!("{} (depth {})", entry.relative, entry.depth);
/// }
/// ```
pub fn walk(
    root: &Path,
    options: &WalkOptions,
) -> Result<impl Iterator<Item = Result<WalkEntry, WalkError>>, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let root = root.to_path_buf();
    let root_is_file = root.is_file();

    let mut builder = WalkBuilder::new(&root);
    builder
        .standard_filters(false)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name(|a, b| a.cmp(b))
        // ignore counts the root as depth 0, one more than our separator count
        .max_depth(options.max_depth.map(|d| d.saturating_add(1)));

    if options.respect_gitignore {
        builder
            .git_ignore(true)
            .git_exclude(true)
            .git_global(true)
            .require_git(false);
    }

    let walker = builder.build();

    Ok(walker.filter_map(move |result| match result {
        Ok(entry) => {
            if entry.depth() == 0 && !root_is_file {
                return None;
            }

            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            let size = if is_file {
                entry.metadata().ok().map(|m| m.len())
            } else {
                None
            };
            let relative = relative_path(&root, entry.path());
            let depth = relative.matches('/').count();

            Some(Ok(WalkEntry {
                path: entry.into_path(),
                relative,
                depth,
                is_file,
                size,
            }))
        }
        Err(err) => convert_error(err, None).map(Err),
    }))
}

/// Convert an `ignore` error, unwrapping the path/depth context it carries.
///
/// Returns `None` for errors that only concern ignore-file parsing; those are
/// logged and skipped.
fn convert_error(err: ignore::Error, path: Option<PathBuf>) -> Option<WalkError> {
    match err {
        ignore::Error::WithPath { path, err } => convert_error(*err, Some(path)),
        ignore::Error::WithDepth { err, .. } => convert_error(*err, path),
        ignore::Error::Loop { child, .. } => Some(WalkError::SymlinkLoop { path: child }),
        ignore::Error::Io(source) => {
            let source = strip_context(source);
            let Some(path) = path else {
                return Some(WalkError::Io {
                    path: PathBuf::from("<walk error>"),
                    source,
                });
            };

            if !is_directory(&path) {
                Some(WalkError::Entry { path, source })
            } else if source.kind() == io::ErrorKind::PermissionDenied {
                Some(WalkError::PermissionDenied { path })
            } else {
                Some(WalkError::Io { path, source })
            }
        }
        other => {
            tracing::warn!(error = %other, "skipping invalid ignore rule");
            None
        }
    }
}

/// Follows symlinks; a dangling link is not a directory.
fn is_directory(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_dir())
}

/// Unwrap an I/O error that carries its own path context down to the OS error,
/// so the path is not printed twice.
fn strip_context(source: io::Error) -> io::Error {
    let code = source
        .get_ref()
        .and_then(|inner| inner.source())
        .and_then(|inner| inner.downcast_ref::<io::Error>())
        .and_then(io::Error::raw_os_error);

    match code {
        Some(code) => io::Error::from_raw_os_error(code),
        None => source,
    }
}
