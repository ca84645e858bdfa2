//! Fluent builder API for promptcat.
//!
//! Wraps [`ScanConfig`] and [`Scanner`] for library users who want the whole
//! pipeline (scan, optional selection, render) in a few calls.

use std::path::PathBuf;

use crate::config::{OutputMode, ScanConfig};
use crate::errors::PromptcatError;
use crate::output::{render_json, Renderer};
use crate::record::{sort_by_path, FileRecord};
use crate::scanner::{FileError, Scanner};
use crate::select::{materialize, Picker, Selection};
use crate::tokens::{TokenizerKind, TokenizerSpec};

/// Builder for packing a directory into a prompt.
///
/// # Examples
///
/// ```no_run
/// use promptcat::builder::Promptcat;
/// use promptcat::config::OutputMode;
///
/// let result = Promptcat::new("./project")
///     .include(&["*.rs"])
///     .tokenizer("gpt-4".parse().unwrap())
///     .scan()
///     .unwrap();
///
/// println!("{}", result.render(OutputMode::Both).unwrap());
/// println!("Total tokens: {}", result.total_tokens());
/// ```
#[derive(Debug, Clone)]
pub struct Promptcat {
    config: ScanConfig,
}

impl Promptcat {
    /// Create a new builder for the given root path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            config: ScanConfig::new(root),
        }
    }

    /// Only process paths matching one of these patterns.
    pub fn include(mut self, patterns: &[&str]) -> Self {
        self.config.include = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Replace the built-in exclude list. An empty slice excludes nothing.
    pub fn exclude(mut self, patterns: &[&str]) -> Self {
        self.config.exclude = Some(patterns.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Skip files larger than `bytes`.
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.config.max_size = bytes;
        self
    }

    /// Set maximum directory depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Include hidden files.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    /// Worker threads for reading files (0 = one per CPU).
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Count tokens with `kind` against the default limit.
    pub fn tokenizer(mut self, kind: TokenizerKind) -> Self {
        self.config.tokenizer = Some(TokenizerSpec::new(kind));
        self
    }

    /// Count tokens with a fully specified tokenizer.
    pub fn tokenizer_spec(mut self, spec: TokenizerSpec) -> Self {
        self.config.tokenizer = Some(spec);
        self
    }

    /// Honour `.gitignore` files.
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.config.respect_gitignore = respect;
        self
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.config.follow_links = follow;
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn into_config(self) -> ScanConfig {
        self.config
    }

    /// Scan and return every text file found.
    pub fn scan(self) -> Result<PromptcatResult, PromptcatError> {
        let scanner = Scanner::new(self.config)?;
        let report = scanner.scan()?;

        let mut records = report.records;
        sort_by_path(&mut records);

        Ok(PromptcatResult {
            records,
            failures: report.failures,
        })
    }

    /// Scan without loading content, let `picker` choose, then load the
    /// chosen files.
    ///
    /// Returns `Selection::Empty` or `Selection::Cancelled` unchanged when the
    /// picker chose nothing.
    pub fn scan_with(
        mut self,
        picker: &mut dyn Picker,
    ) -> Result<(Selection, Vec<FileError>), PromptcatError> {
        self.config.defer_content = true;
        let scanner = Scanner::new(self.config)?;
        let report = scanner.scan()?;

        let mut records = report.records;
        sort_by_path(&mut records);

        let mut failures = report.failures;
        let selection = match picker.pick(&records) {
            Selection::Selected(chosen) => {
                let (loaded, load_failures) = materialize(chosen, &scanner);
                failures.extend(load_failures);
                Selection::from_records(loaded)
            }
            other => other,
        };

        Ok((selection, failures))
    }
}

/// Result of a promptcat scan.
#[derive(Debug)]
pub struct PromptcatResult {
    /// Records sorted by path.
    pub records: Vec<FileRecord>,
    /// Files dropped because they could not be read or tokenized.
    pub failures: Vec<FileError>,
}

impl PromptcatResult {
    /// Paths of all records.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.path.as_str())
    }

    /// Get the record for a specific path.
    pub fn record_for(&self, path: &str) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.path == path)
    }

    /// Total token count across all records.
    pub fn total_tokens(&self) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.token_info.as_ref())
            .map(|t| t.count)
            .sum()
    }

    /// Render with the default style.
    pub fn render(&self, mode: OutputMode) -> Result<String, PromptcatError> {
        Ok(Renderer::default().render(&self.records, mode)?)
    }

    pub fn to_json(&self) -> Result<String, PromptcatError> {
        Ok(render_json(&self.records)?)
    }
}
