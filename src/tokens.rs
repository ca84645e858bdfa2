//! Token counting for LLM context budget management.
//!
//! A [`Tokenizer`] counts the tokens of one text blob and reports them against
//! a configured budget. Variants are created through a [`TokenizerRegistry`]
//! keyed by [`TokenizerKind`], so construction failures (unknown kind, missing
//! model file) surface once, before any file is scanned.
//!
//! Built-in variants:
//!
//! - BPE encoders from `tiktoken-rs` (`gpt-3.5-turbo`, `gpt-4`, `claude` use
//!   cl100k_base, `gpt-4o` uses o200k_base)
//! - pretrained `tokenizer.json` vocabularies via the `tokenizers` crate
//!   (`huggingface`, requires the `huggingface` feature)
//! - a ~4 characters per token estimate (`estimate`)

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::Serialize;
use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// Budget used when none is configured.
pub const DEFAULT_TOKEN_LIMIT: usize = 4096;

/// Fraction of the limit at which a file is flagged.
const WARN_RATIO: f64 = 0.8;

/// Errors from tokenizer construction or counting.
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("unsupported tokenizer type: {0}")]
    Unsupported(String),

    #[error("tokenizer '{0}' requires a model path")]
    MissingModelPath(TokenizerKind),

    #[error("token limit must be greater than zero")]
    InvalidLimit,

    #[error("failed to load {kind} tokenizer: {message}")]
    Load { kind: TokenizerKind, message: String },

    #[error("failed to encode text: {0}")]
    Encode(String),
}

/// Token count of one text blob against a budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenCount {
    pub count: usize,
    pub limit: usize,
    pub usage_percent: f64,
    pub over_limit: bool,
    pub warn_limit: usize,
}

impl TokenCount {
    /// Build a count against `limit`. A zero limit reports 0% usage.
    pub fn new(count: usize, limit: usize) -> Self {
        let usage_percent = if limit == 0 {
            0.0
        } else {
            count as f64 / limit as f64 * 100.0
        };

        Self {
            count,
            limit,
            usage_percent,
            over_limit: count > limit,
            warn_limit: (limit as f64 * WARN_RATIO) as usize,
        }
    }
}

/// Capability to count tokens.
pub trait Tokenizer: Send + Sync {
    /// Count the tokens in `text` against this tokenizer's limit.
    fn count_tokens(&self, text: &str) -> Result<TokenCount, TokenizerError>;

    /// Human-readable name, e.g. `tiktoken-gpt-4`.
    fn name(&self) -> String;
}

/// Known tokenizer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenizerKind {
    Gpt35Turbo,
    Gpt4,
    Gpt4o,
    Claude,
    HuggingFace,
    Estimate,
}

impl TokenizerKind {
    pub fn all() -> &'static [TokenizerKind] {
        &[
            TokenizerKind::Gpt35Turbo,
            TokenizerKind::Gpt4,
            TokenizerKind::Gpt4o,
            TokenizerKind::Claude,
            TokenizerKind::HuggingFace,
            TokenizerKind::Estimate,
        ]
    }

    /// Whether this kind needs a model file on disk.
    pub fn requires_model_path(self) -> bool {
        matches!(self, TokenizerKind::HuggingFace)
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenizerKind::Gpt35Turbo => "gpt-3.5-turbo",
            TokenizerKind::Gpt4 => "gpt-4",
            TokenizerKind::Gpt4o => "gpt-4o",
            TokenizerKind::Claude => "claude",
            TokenizerKind::HuggingFace => "huggingface",
            TokenizerKind::Estimate => "estimate",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TokenizerKind {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gpt-3.5-turbo" | "gpt-3.5" | "gpt35" => Ok(TokenizerKind::Gpt35Turbo),
            "gpt-4" | "gpt4" => Ok(TokenizerKind::Gpt4),
            "gpt-4o" | "gpt4o" => Ok(TokenizerKind::Gpt4o),
            "claude" => Ok(TokenizerKind::Claude),
            "huggingface" | "hf" => Ok(TokenizerKind::HuggingFace),
            "estimate" | "heuristic" => Ok(TokenizerKind::Estimate),
            _ => Err(TokenizerError::Unsupported(s.to_string())),
        }
    }
}

/// Everything needed to construct a tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerSpec {
    pub kind: TokenizerKind,
    pub model_path: Option<PathBuf>,
    pub limit: usize,
}

impl TokenizerSpec {
    pub fn new(kind: TokenizerKind) -> Self {
        Self {
            kind,
            model_path: None,
            limit: DEFAULT_TOKEN_LIMIT,
        }
    }

    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Constructor registered for a [`TokenizerKind`].
pub type TokenizerFactory = fn(&TokenizerSpec) -> Result<Box<dyn Tokenizer>, TokenizerError>;

/// Maps tokenizer kinds to their constructors.
///
/// # Examples
///
/// ```
/// use promptcat::tokens::{TokenizerKind, TokenizerRegistry, TokenizerSpec};
///
/// let registry = TokenizerRegistry::default();
/// let tokenizer = registry
///     .build(&TokenizerSpec::new(TokenizerKind::Estimate).limit(10))
///     .unwrap();
/// let count = tokenizer.count_tokens("abcdefgh").unwrap();
/// assert_eq!(count.count, 2);
/// assert_eq!(count.usage_percent, 20.0);
/// ```
pub struct TokenizerRegistry {
    factories: HashMap<TokenizerKind, TokenizerFactory>,
}

impl TokenizerRegistry {
    /// Registry without any variants.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register(&mut self, kind: TokenizerKind, factory: TokenizerFactory) -> &mut Self {
        self.factories.insert(kind, factory);
        self
    }

    pub fn contains(&self, kind: TokenizerKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Construct the tokenizer described by `spec`.
    pub fn build(&self, spec: &TokenizerSpec) -> Result<Box<dyn Tokenizer>, TokenizerError> {
        if spec.limit == 0 {
            return Err(TokenizerError::InvalidLimit);
        }
        if spec.kind.requires_model_path() && spec.model_path.is_none() {
            return Err(TokenizerError::MissingModelPath(spec.kind));
        }

        let factory = self
            .factories
            .get(&spec.kind)
            .ok_or_else(|| TokenizerError::Unsupported(spec.kind.to_string()))?;
        factory(spec)
    }
}

impl Default for TokenizerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(TokenizerKind::Gpt35Turbo, BpeTokenizer::factory)
            .register(TokenizerKind::Gpt4, BpeTokenizer::factory)
            .register(TokenizerKind::Gpt4o, BpeTokenizer::factory)
            .register(TokenizerKind::Claude, BpeTokenizer::factory)
            .register(TokenizerKind::Estimate, EstimateTokenizer::factory);
        #[cfg(feature = "huggingface")]
        registry.register(TokenizerKind::HuggingFace, HuggingFaceTokenizer::factory);
        registry
    }
}

// ============================================================================
// BPE (tiktoken)
// ============================================================================

/// BPE vocabulary used by the tiktoken-backed kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// cl100k_base: GPT-4, GPT-3.5-turbo; also used to approximate Claude
    Cl100kBase,
    /// o200k_base: GPT-4o
    O200kBase,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Cl100kBase => write!(f, "cl100k_base"),
            Encoding::O200kBase => write!(f, "o200k_base"),
        }
    }
}

// Cached vocabularies - initialized once per encoding
static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn get_bpe(encoding: Encoding) -> Option<&'static CoreBPE> {
    match encoding {
        Encoding::Cl100kBase => CL100K
            .get_or_init(|| tiktoken_rs::cl100k_base().ok())
            .as_ref(),
        Encoding::O200kBase => O200K
            .get_or_init(|| tiktoken_rs::o200k_base().ok())
            .as_ref(),
    }
}

/// Tokenizer backed by a tiktoken BPE vocabulary.
pub struct BpeTokenizer {
    bpe: &'static CoreBPE,
    kind: TokenizerKind,
    encoding: Encoding,
    limit: usize,
}

impl BpeTokenizer {
    pub fn new(kind: TokenizerKind, limit: usize) -> Result<Self, TokenizerError> {
        let encoding = match kind {
            TokenizerKind::Gpt35Turbo | TokenizerKind::Gpt4 | TokenizerKind::Claude => {
                Encoding::Cl100kBase
            }
            TokenizerKind::Gpt4o => Encoding::O200kBase,
            other => return Err(TokenizerError::Unsupported(other.to_string())),
        };

        let bpe = get_bpe(encoding).ok_or_else(|| TokenizerError::Load {
            kind,
            message: format!("{} vocabulary unavailable", encoding),
        })?;

        Ok(Self {
            bpe,
            kind,
            encoding,
            limit,
        })
    }

    fn factory(spec: &TokenizerSpec) -> Result<Box<dyn Tokenizer>, TokenizerError> {
        Ok(Box::new(Self::new(spec.kind, spec.limit)?))
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Tokenizer for BpeTokenizer {
    fn count_tokens(&self, text: &str) -> Result<TokenCount, TokenizerError> {
        let count = self.bpe.encode_ordinary(text).len();
        Ok(TokenCount::new(count, self.limit))
    }

    fn name(&self) -> String {
        format!("tiktoken-{}", self.kind)
    }
}

// ============================================================================
// Pretrained vocabulary (tokenizers)
// ============================================================================

/// Tokenizer loaded from a pretrained `tokenizer.json`.
#[cfg(feature = "huggingface")]
pub struct HuggingFaceTokenizer {
    inner: tokenizers::Tokenizer,
    model_path: PathBuf,
    limit: usize,
}

#[cfg(feature = "huggingface")]
impl HuggingFaceTokenizer {
    pub fn from_file(path: impl Into<PathBuf>, limit: usize) -> Result<Self, TokenizerError> {
        let model_path = path.into();
        let inner =
            tokenizers::Tokenizer::from_file(&model_path).map_err(|e| TokenizerError::Load {
                kind: TokenizerKind::HuggingFace,
                message: format!("{}: {}", model_path.display(), e),
            })?;

        Ok(Self {
            inner,
            model_path,
            limit,
        })
    }

    fn factory(spec: &TokenizerSpec) -> Result<Box<dyn Tokenizer>, TokenizerError> {
        let path = spec
            .model_path
            .as_ref()
            .ok_or(TokenizerError::MissingModelPath(spec.kind))?;
        Ok(Box::new(Self::from_file(path, spec.limit)?))
    }
}

#[cfg(feature = "huggingface")]
impl Tokenizer for HuggingFaceTokenizer {
    fn count_tokens(&self, text: &str) -> Result<TokenCount, TokenizerError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;
        Ok(TokenCount::new(encoding.get_ids().len(), self.limit))
    }

    fn name(&self) -> String {
        let file = self
            .model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("huggingface-{}", file)
    }
}

// ============================================================================
// Estimate
// ============================================================================

/// ~4 characters per token, no vocabulary needed.
pub struct EstimateTokenizer {
    limit: usize,
}

impl EstimateTokenizer {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    fn factory(spec: &TokenizerSpec) -> Result<Box<dyn Tokenizer>, TokenizerError> {
        Ok(Box::new(Self::new(spec.limit)))
    }
}

impl Tokenizer for EstimateTokenizer {
    fn count_tokens(&self, text: &str) -> Result<TokenCount, TokenizerError> {
        Ok(TokenCount::new(estimate_count(text), self.limit))
    }

    fn name(&self) -> String {
        "estimate".to_string()
    }
}

/// Rough approximation: code sits around 3.5 chars/token, prose around 4.2.
fn estimate_count(text: &str) -> usize {
    text.len().div_ceil(4)
}
