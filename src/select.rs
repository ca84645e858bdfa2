//! Choosing which scanned files end up in the prompt.
//!
//! A [`Picker`] sees the scanned records and returns a [`Selection`].
//! Records handed back unloaded are read again with [`materialize`] before
//! rendering.

use tracing::{debug, warn};

use crate::filter::match_pattern;
use crate::record::FileRecord;
use crate::scanner::{FileError, Scanner};

/// Outcome of a picker.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// At least one record was chosen.
    Selected(Vec<FileRecord>),
    /// Nothing matched.
    Empty,
    /// The user backed out.
    Cancelled,
}

impl Selection {
    /// `Selected` for a non-empty list, `Empty` otherwise.
    pub fn from_records(records: Vec<FileRecord>) -> Self {
        if records.is_empty() {
            Selection::Empty
        } else {
            Selection::Selected(records)
        }
    }

    pub fn into_records(self) -> Option<Vec<FileRecord>> {
        match self {
            Selection::Selected(records) => Some(records),
            Selection::Empty | Selection::Cancelled => None,
        }
    }
}

/// Narrows a set of scanned records.
pub trait Picker {
    fn pick(&mut self, records: &[FileRecord]) -> Selection;
}

/// Selects every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Picker for AcceptAll {
    fn pick(&mut self, records: &[FileRecord]) -> Selection {
        Selection::from_records(records.to_vec())
    }
}

/// Selects records whose path matches any of a list of patterns.
///
/// Patterns use the same rules as include/exclude lists.
///
/// # Examples
///
/// ```
/// use promptcat::record::FileRecord;
/// use promptcat::select::{PatternPicker, Picker, Selection};
///
/// let records = vec![
///     FileRecord::unloaded("src/main.rs", 10),
///     FileRecord::unloaded("README.md", 10),
/// ];
/// let mut picker = PatternPicker::new(vec!["*.rs".into()]);
/// let Selection::Selected(chosen) = picker.pick(&records) else { panic!() };
/// assert_eq!(chosen[0].path, "src/main.rs");
/// ```
#[derive(Debug, Clone)]
pub struct PatternPicker {
    patterns: Vec<String>,
}

impl PatternPicker {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Picker for PatternPicker {
    fn pick(&mut self, records: &[FileRecord]) -> Selection {
        let chosen: Vec<FileRecord> = records
            .iter()
            .filter(|r| self.patterns.iter().any(|p| match_pattern(p, &r.path)))
            .cloned()
            .collect();

        debug!(
            patterns = self.patterns.len(),
            chosen = chosen.len(),
            of = records.len(),
            "pattern selection"
        );
        Selection::from_records(chosen)
    }
}

/// Ensure every record has its content, reading unloaded ones from disk.
///
/// Records that fail to load are returned as failures; records that now look
/// binary are dropped silently.
pub fn materialize(
    records: Vec<FileRecord>,
    scanner: &Scanner,
) -> (Vec<FileRecord>, Vec<FileError>) {
    let mut loaded = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for record in records {
        if record.is_loaded() {
            loaded.push(record);
            continue;
        }

        match scanner.load(&record) {
            Ok(Some(full)) => loaded.push(full),
            Ok(None) => debug!(path = %record.path, "dropping file that is now binary"),
            Err(err) => {
                warn!(path = err.path(), error = %err, "skipping file");
                failures.push(err);
            }
        }
    }

    (loaded, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use std::fs;
    use tempfile::TempDir;

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths.iter().map(|p| FileRecord::unloaded(*p, 0)).collect()
    }

    #[test]
    fn test_pattern_picker() {
        let all = records(&["src/lib.rs", "docs/guide.md", "Cargo.toml"]);
        let mut picker = PatternPicker::new(vec!["**/*.md".into(), "Cargo.toml".into()]);

        let chosen = picker.pick(&all).into_records().unwrap();
        let paths: Vec<_> = chosen.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["docs/guide.md", "Cargo.toml"]);
    }

    #[test]
    fn test_pattern_picker_no_match_is_empty() {
        let mut picker = PatternPicker::new(vec!["*.go".into()]);
        assert_eq!(picker.pick(&records(&["a.rs"])), Selection::Empty);
    }

    #[test]
    fn test_accept_all() {
        assert_eq!(AcceptAll.pick(&[]), Selection::Empty);
        let all = records(&["a.rs", "b.rs"]);
        assert_eq!(AcceptAll.pick(&all), Selection::Selected(all.clone()));
    }

    #[test]
    fn test_cancelled_has_no_records() {
        assert!(Selection::Cancelled.into_records().is_none());
        assert!(Selection::Empty.into_records().is_none());
    }

    #[test]
    fn test_materialize() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("bin.dat"), [0u8; 32]).unwrap();

        let scanner = Scanner::new(ScanConfig {
            exclude: Some(Vec::new()),
            ..ScanConfig::new(dir.path())
        })
        .unwrap();

        let input = vec![
            FileRecord::unloaded("a.txt", 5),
            FileRecord::loaded("kept.txt", "already here", 12, None),
            FileRecord::unloaded("bin.dat", 32),
            FileRecord::unloaded("missing.txt", 1),
        ];
        let (loaded, failures) = materialize(input, &scanner);

        let paths: Vec<_> = loaded.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["a.txt", "kept.txt"]);
        assert_eq!(loaded[0].content(), Some("alpha"));
        assert_eq!(loaded[1].content(), Some("already here"));

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path(), "missing.txt");
    }
}
