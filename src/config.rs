//! Scan configuration.
//!
//! A [`ScanConfig`] is built once (by the CLI or the [`crate::builder::Promptcat`]
//! builder), validated, and then only read.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::tokens::TokenizerSpec;

/// Default maximum file size: 10 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Default maximum directory depth.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Invalid configuration, detected before any scanning starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("path '{0}' does not exist")]
    PathNotFound(PathBuf),

    #[error("invalid output mode '{0}' (expected tree, files, or both)")]
    InvalidOutputMode(String),
}

/// Options for a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Directory (or single file) to scan.
    pub root: PathBuf,
    /// If non-empty, a path must match one of these.
    pub include: Vec<String>,
    /// `None` selects the built-in deny-list.
    pub exclude: Option<Vec<String>>,
    /// Files larger than this are skipped.
    pub max_size: u64,
    /// Maximum number of separators in a root-relative path.
    pub max_depth: usize,
    /// Include files whose name starts with `.`.
    pub include_hidden: bool,
    /// Worker threads for file reads (0 = one per CPU).
    pub threads: usize,
    /// Token counting; `None` disables it.
    pub tokenizer: Option<TokenizerSpec>,
    /// Honour `.gitignore` and `.git/info/exclude`.
    pub respect_gitignore: bool,
    /// Follow symbolic links.
    pub follow_links: bool,
    /// Classify files but leave their content unloaded.
    pub defer_content: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            include: Vec::new(),
            exclude: None,
            max_size: DEFAULT_MAX_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            include_hidden: false,
            threads: 0,
            tokenizer: None,
            respect_gitignore: false,
            follow_links: false,
            defer_content: false,
        }
    }
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Check everything that can be checked without walking the tree.
    ///
    /// Tokenizer problems are reported when the tokenizer is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.exists() {
            return Err(ConfigError::PathNotFound(self.root.clone()));
        }
        Ok(())
    }
}

/// Which sections to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    Tree,
    Files,
    #[default]
    Both,
}

impl OutputMode {
    pub fn includes_tree(self) -> bool {
        matches!(self, OutputMode::Tree | OutputMode::Both)
    }

    pub fn includes_files(self) -> bool {
        matches!(self, OutputMode::Files | OutputMode::Both)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Tree => write!(f, "tree"),
            OutputMode::Files => write!(f, "files"),
            OutputMode::Both => write!(f, "both"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tree" => Ok(OutputMode::Tree),
            "files" => Ok(OutputMode::Files),
            "both" => Ok(OutputMode::Both),
            _ => Err(ConfigError::InvalidOutputMode(s.to_string())),
        }
    }
}

/// Split a comma-separated pattern list, dropping empty items.
pub fn split_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.max_size, 10 * 1024 * 1024);
        assert_eq!(config.max_depth, 20);
        assert!(config.exclude.is_none());
        assert!(config.tokenizer.is_none());
        assert!(!config.include_hidden);
    }

    #[test]
    fn test_validate_missing_root() {
        let config = ScanConfig::new("/nonexistent/promptcat/root");
        assert!(matches!(config.validate(), Err(ConfigError::PathNotFound(_))));
    }

    #[test]
    fn test_validate_existing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ScanConfig::new(dir.path()).validate().is_ok());
    }

    #[test]
    fn test_output_mode_from_str() {
        assert_eq!("tree".parse::<OutputMode>().unwrap(), OutputMode::Tree);
        assert_eq!("files".parse::<OutputMode>().unwrap(), OutputMode::Files);
        assert_eq!("both".parse::<OutputMode>().unwrap(), OutputMode::Both);
        assert!(matches!(
            "xml".parse::<OutputMode>(),
            Err(ConfigError::InvalidOutputMode(_))
        ));
    }

    #[test]
    fn test_output_mode_sections() {
        assert!(OutputMode::Tree.includes_tree());
        assert!(!OutputMode::Tree.includes_files());
        assert!(OutputMode::Both.includes_tree() && OutputMode::Both.includes_files());
    }

    #[test]
    fn test_split_patterns() {
        assert_eq!(split_patterns("*.rs, *.toml,,"), vec!["*.rs", "*.toml"]);
        assert!(split_patterns("").is_empty());
    }
}
