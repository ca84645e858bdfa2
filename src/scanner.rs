//! Concurrent file collection.
//!
//! The directory walk is sequential; reading, binary classification and token
//! counting run on a dedicated rayon pool. Records come back in no particular
//! order. Renderers sort them.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::errors::PromptcatError;
use crate::filter::{is_binary, PatternMatcher, BINARY_SAMPLE_SIZE};
use crate::record::{relative_path, FileRecord};
use crate::tokens::{Tokenizer, TokenizerError, TokenizerRegistry};
use crate::walker::{walk, WalkError, WalkOptions};

/// Buffer size used for the read after the binary sample.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A problem with one file. The file is dropped, the scan continues.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to count tokens in {path}: {source}")]
    Tokenize {
        path: String,
        #[source]
        source: TokenizerError,
    },
}

impl FileError {
    /// Root-relative path of the file that failed.
    pub fn path(&self) -> &str {
        match self {
            FileError::Io { path, .. } | FileError::Tokenize { path, .. } => path,
        }
    }
}

/// Everything a scan produced.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Text files that were read (or classified, for deferred scans).
    pub records: Vec<FileRecord>,
    /// Files dropped because of an I/O or tokenizer failure.
    pub failures: Vec<FileError>,
    /// Files dropped by binary detection.
    pub binary_skipped: usize,
}

/// A file that passed the walk-time gates.
#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    relative: String,
}

enum Outcome {
    Text(FileRecord),
    Binary,
}

/// Collects text files below a root according to a [`ScanConfig`].
///
/// # Examples
///
/// ```no_run
/// use promptcat::config::ScanConfig;
/// use promptcat::scanner::Scanner;
///
/// let scanner = Scanner::new(ScanConfig::new("./project")).unwrap();
/// let report = scanner.scan().unwrap();
/// for record in &report.records {
///     println!("{} ({} bytes)", record.path, record.size);
/// }
/// ```
pub struct Scanner {
    config: ScanConfig,
    matcher: PatternMatcher,
    tokenizer: Option<Box<dyn Tokenizer>>,
    pool: rayon::ThreadPool,
}

impl Scanner {
    /// Validate `config` and build the matcher, tokenizer and worker pool.
    pub fn new(config: ScanConfig) -> Result<Self, PromptcatError> {
        Self::with_registry(config, &TokenizerRegistry::default())
    }

    /// Like [`Scanner::new`], resolving the tokenizer through `registry`.
    pub fn with_registry(
        config: ScanConfig,
        registry: &TokenizerRegistry,
    ) -> Result<Self, PromptcatError> {
        config.validate()?;

        let tokenizer = config
            .tokenizer
            .as_ref()
            .map(|spec| registry.build(spec))
            .transpose()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("promptcat-read-{i}"))
            .build()?;

        let matcher = PatternMatcher::new(config.include.clone(), config.exclude.clone());

        Ok(Self {
            config,
            matcher,
            tokenizer,
            pool,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Name of the active tokenizer, if any.
    pub fn tokenizer_name(&self) -> Option<String> {
        self.tokenizer.as_ref().map(|t| t.name())
    }

    /// Walk the root and process every candidate file.
    ///
    /// Fails only on traversal errors. Per-file problems end up in
    /// [`ScanReport::failures`].
    pub fn scan(&self) -> Result<ScanReport, PromptcatError> {
        debug!(
            root = %self.config.root.display(),
            threads = self.pool.current_num_threads(),
            "starting scan"
        );

        let mut report = ScanReport::default();
        let candidates = self.candidates(&mut report.failures)?;
        let defer = self.config.defer_content;

        let outcomes: Vec<Result<Outcome, FileError>> = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|candidate| self.process(&candidate.path, &candidate.relative, defer))
                .collect()
        });

        for outcome in outcomes {
            match outcome {
                Ok(Outcome::Text(record)) => report.records.push(record),
                Ok(Outcome::Binary) => report.binary_skipped += 1,
                Err(err) => report.failures.push(err),
            }
        }

        for failure in &report.failures {
            warn!(path = failure.path(), error = %failure, "skipping file");
        }

        debug!(
            records = report.records.len(),
            failures = report.failures.len(),
            binary = report.binary_skipped,
            "scan finished"
        );
        Ok(report)
    }

    /// Read one record's file from disk, with content and token count.
    ///
    /// Returns `Ok(None)` when the file now looks binary.
    pub fn load(&self, record: &FileRecord) -> Result<Option<FileRecord>, FileError> {
        let path = if self.config.root.is_file() {
            self.config.root.clone()
        } else {
            self.config.root.join(&record.path)
        };

        match self.process(&path, &record.path, false)? {
            Outcome::Text(loaded) => Ok(Some(loaded)),
            Outcome::Binary => Ok(None),
        }
    }

    /// Walk the tree and apply the hidden, size and pattern gates.
    fn candidates(&self, failures: &mut Vec<FileError>) -> Result<Vec<Candidate>, PromptcatError> {
        let options = WalkOptions::from(&self.config);
        let mut candidates = Vec::new();

        for entry in walk(&self.config.root, &options)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(WalkError::Entry { path, source }) => {
                    failures.push(FileError::Io {
                        path: relative_path(&self.config.root, &path),
                        source,
                    });
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if !entry.is_file {
                continue;
            }
            if !self.config.include_hidden && entry.is_hidden() {
                continue;
            }

            let size = match entry.size {
                Some(size) => size,
                None => match fs::metadata(&entry.path) {
                    Ok(meta) => meta.len(),
                    Err(source) => {
                        failures.push(FileError::Io {
                            path: entry.relative,
                            source,
                        });
                        continue;
                    }
                },
            };
            if size > self.config.max_size {
                debug!(path = %entry.relative, size, "skipping oversized file");
                continue;
            }

            if !self.matcher.should_process(&entry.relative) {
                continue;
            }

            candidates.push(Candidate {
                path: entry.path,
                relative: entry.relative,
            });
        }

        Ok(candidates)
    }

    fn process(&self, path: &Path, relative: &str, defer: bool) -> Result<Outcome, FileError> {
        let io_err = |source: std::io::Error| FileError::Io {
            path: relative.to_string(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let size = file.metadata().map_err(io_err)?.len();
        let mut reader = BufReader::with_capacity(READ_CHUNK_SIZE, file);

        let mut bytes = Vec::with_capacity(BINARY_SAMPLE_SIZE);
        reader
            .by_ref()
            .take(BINARY_SAMPLE_SIZE as u64)
            .read_to_end(&mut bytes)
            .map_err(io_err)?;

        if is_binary(&bytes) {
            debug!(path = relative, "skipping binary file");
            return Ok(Outcome::Binary);
        }

        if defer {
            debug!(path = relative, "deferring content");
            return Ok(Outcome::Text(FileRecord::unloaded(relative, size)));
        }

        reader.read_to_end(&mut bytes).map_err(io_err)?;
        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };

        let token_info = match &self.tokenizer {
            Some(tokenizer) => Some(tokenizer.count_tokens(&content).map_err(|source| {
                FileError::Tokenize {
                    path: relative.to_string(),
                    source,
                }
            })?),
            None => None,
        };

        Ok(Outcome::Text(FileRecord::loaded(relative, content, size, token_info)))
    }
}

/// Scan `config.root` with the default tokenizer registry and return the records.
pub fn collect(config: &ScanConfig) -> Result<Vec<FileRecord>, PromptcatError> {
    Ok(Scanner::new(config.clone())?.scan()?.records)
}
