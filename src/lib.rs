//! promptcat - Pack a directory of source files into a single LLM prompt.
//!
//! promptcat walks a directory tree, keeps the text files that pass the
//! include/exclude patterns and size limits, optionally counts their tokens,
//! and renders a tree view plus the normalized contents as one text blob.
//!
//! # Quick Start
//!
//! ```no_run
//! use promptcat::builder::Promptcat;
//! use promptcat::config::OutputMode;
//! use promptcat::tokens::TokenizerKind;
//!
//! let result = Promptcat::new("./my-project")
//!     .include(&["*.rs", "Cargo.toml"])
//!     .tokenizer(TokenizerKind::Claude)
//!     .scan()
//!     .unwrap();
//!
//! println!("{}", result.render(OutputMode::Both).unwrap());
//! println!("Total tokens: {}", result.total_tokens());
//! ```
//!
//! # Modules
//!
//! - [`config`] - Scan configuration and output modes
//! - [`filter`] - Include/exclude patterns and binary detection
//! - [`tokens`] - Token counting against a context budget
//! - [`walker`] - Ordered directory traversal
//! - [`scanner`] - Concurrent reading of candidate files
//! - [`tree`] - Tree view rendering
//! - [`output`] - Content view, token summary and JSON output
//! - [`select`] - Narrowing scanned files before rendering
//! - [`builder`] - Fluent API over the whole pipeline
//! - [`logging`] - Tracing subscriber setup for the binary

pub mod builder;
pub mod config;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod output;
pub mod record;
pub mod scanner;
pub mod select;
pub mod tokens;
pub mod tree;
pub mod walker;

// Re-export key types at crate root for convenience
pub use builder::{Promptcat, PromptcatResult};
pub use config::{ConfigError, OutputMode, ScanConfig};
pub use errors::PromptcatError;
pub use filter::{is_binary, match_pattern, PatternMatcher};
pub use output::{OutputError, RenderStyle, Renderer};
pub use record::FileRecord;
pub use scanner::{collect, FileError, ScanReport, Scanner};
pub use select::{Picker, Selection};
pub use tokens::{TokenCount, Tokenizer, TokenizerError, TokenizerKind, TokenizerSpec};
pub use tree::{FileNode, NodeKind};
pub use walker::WalkError;
