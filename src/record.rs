//! The per-file record produced by a scan.

use std::path::{Component, Path};

use serde::Serialize;

use crate::tokens::TokenCount;

/// One processed text file.
///
/// `content` is `None` when the file has not been loaded yet (deferred scans,
/// records handed back by a picker). An empty file is `Some(String::new())`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    /// Root-relative path, always `/`-separated.
    pub path: String,
    pub content: Option<String>,
    /// Size on disk in bytes.
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_info: Option<TokenCount>,
}

impl FileRecord {
    pub fn loaded(
        path: impl Into<String>,
        content: impl Into<String>,
        size: u64,
        token_info: Option<TokenCount>,
    ) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
            size,
            token_info,
        }
    }

    pub fn unloaded(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            content: None,
            size,
            token_info: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Sort records by path, the only ordering output ever relies on.
pub fn sort_by_path(records: &mut [FileRecord]) {
    records.sort_by(|a, b| a.path.cmp(&b.path));
}

/// Root-relative, `/`-separated form of `path`.
///
/// When `path` is the root itself (a single-file scan) the file name is used.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_content_is_loaded() {
        let empty = FileRecord::loaded("a.txt", "", 0, None);
        assert!(empty.is_loaded());
        assert_eq!(empty.content(), Some(""));

        let pending = FileRecord::unloaded("a.txt", 0);
        assert!(!pending.is_loaded());
        assert_eq!(pending.content(), None);
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = PathBuf::from("project");
        let path = root.join("src").join("deep").join("lib.rs");
        assert_eq!(relative_path(&root, &path), "src/deep/lib.rs");
    }

    #[test]
    fn test_relative_path_of_root_file() {
        let root = PathBuf::from("project/main.rs");
        assert_eq!(relative_path(&root, &root), "main.rs");
    }

    #[test]
    fn test_sort_by_path() {
        let mut records = vec![
            FileRecord::loaded("b.txt", "", 0, None),
            FileRecord::loaded("a/z.txt", "", 0, None),
            FileRecord::loaded("a.txt", "", 0, None),
        ];
        sort_by_path(&mut records);
        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["a.txt", "a/z.txt", "b.txt"]);
    }

    #[test]
    fn test_serialize_unloaded_content_as_null() {
        let json = serde_json::to_value(FileRecord::unloaded("x.rs", 3)).unwrap();
        assert!(json["content"].is_null());
        assert!(json.get("token_info").is_none());
    }
}
