//! File filtering: include/exclude glob rules and the binary-content heuristic.
//!
//! Paths handed to the matcher are root-relative and slash-separated. Pattern
//! semantics:
//!
//! - a pattern without wildcards matches whole path segments (`target` matches
//!   `target/debug/app.d` and `crates/x/target/foo`, not `targets.txt`)
//! - a `**/` prefix matches the remainder at any depth
//! - anything else is a single-segment glob tried against the full path and
//!   against the basename
//!
//! Malformed globs never match and never abort a scan.

use std::borrow::Cow;

use glob::{MatchOptions, Pattern};

/// Number of leading bytes inspected by [`is_binary`].
pub const BINARY_SAMPLE_SIZE: usize = 512;

/// Fraction of suspicious bytes above which a sample is considered binary.
const BINARY_THRESHOLD: f64 = 0.3;

const WILDCARDS: &[char] = &['*', '?', '['];

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Built-in exclude list used when the caller supplies none.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Build output and dependencies
    "target",
    "node_modules",
    "dist",
    "build",
    // Binaries and objects
    "*.exe",
    "*.dll",
    "*.so",
    "*.dylib",
    "*.o",
    "*.obj",
    // Images
    "*.jpg",
    "*.jpeg",
    "*.png",
    "*.gif",
    "*.bmp",
    "*.ico",
    "*.svg",
    "*.webp",
    "*.tiff",
    "*.raw",
    "*.heic",
    // Archives
    "*.zip",
    "*.tar",
    "*.gz",
    "*.7z",
    "*.rar",
    // Language caches
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
];

/// Returns the default exclude patterns as owned strings.
pub fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect()
}

/// A compiled pattern.
#[derive(Debug, Clone)]
enum Rule {
    /// No wildcard: whole-segment match.
    Segment(String),
    /// `**/rest`: `rest` tried against every suffix of the path.
    AnyDepth(Option<Pattern>),
    /// Single-segment glob against the full path or the basename.
    Glob(Option<Pattern>),
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    rule: Rule,
}

impl CompiledPattern {
    fn new(pattern: &str) -> Self {
        let source = to_slash(pattern).into_owned();
        let rule = if let Some(rest) = source.strip_prefix("**/") {
            Rule::AnyDepth(Pattern::new(rest).ok())
        } else if !source.contains(WILDCARDS) {
            Rule::Segment(source.clone())
        } else {
            Rule::Glob(Pattern::new(&source).ok())
        };
        Self { source, rule }
    }

    fn matches(&self, path: &str) -> bool {
        if self.source == path {
            return true;
        }

        match &self.rule {
            Rule::Segment(segment) => matches_segment(segment, path),
            Rule::AnyDepth(Some(pattern)) => {
                let mut suffix = path;
                loop {
                    if pattern.matches_with(suffix, GLOB_OPTIONS) {
                        return true;
                    }
                    match suffix.find('/') {
                        Some(idx) => suffix = &suffix[idx + 1..],
                        None => return false,
                    }
                }
            }
            Rule::Glob(Some(pattern)) => {
                pattern.matches_with(path, GLOB_OPTIONS)
                    || pattern.matches_with(basename(path), GLOB_OPTIONS)
            }
            Rule::AnyDepth(None) | Rule::Glob(None) => false,
        }
    }
}

/// Decides whether a root-relative path survives include/exclude rules.
///
/// # Examples
///
/// ```
/// use promptcat::filter::PatternMatcher;
///
/// let matcher = PatternMatcher::new(vec!["*.rs".into()], None);
/// assert!(matcher.should_process("src/main.rs"));
/// assert!(!matcher.should_process("README.md"));
/// assert!(!matcher.should_process("target/debug/build.rs"));
/// ```
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    include: Vec<CompiledPattern>,
    exclude: Vec<CompiledPattern>,
}

impl PatternMatcher {
    /// Compile include and exclude lists. `exclude: None` selects
    /// [`DEFAULT_EXCLUDES`]; `Some(vec![])` excludes nothing.
    pub fn new(include: Vec<String>, exclude: Option<Vec<String>>) -> Self {
        let exclude = exclude.unwrap_or_else(default_excludes);
        Self {
            include: compile_all(&include),
            exclude: compile_all(&exclude),
        }
    }

    /// Matcher that accepts every path.
    pub fn accept_all() -> Self {
        Self::new(Vec::new(), Some(Vec::new()))
    }

    pub fn should_process(&self, path: &str) -> bool {
        let path = to_slash(path);

        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(&path)) {
            return false;
        }

        !self.exclude.iter().any(|p| p.matches(&path))
    }

    /// True if `path` matches any include pattern, ignoring excludes.
    pub fn matches_include(&self, path: &str) -> bool {
        let path = to_slash(path);
        self.include.iter().any(|p| p.matches(&path))
    }

    pub fn include_patterns(&self) -> impl Iterator<Item = &str> {
        self.include.iter().map(|p| p.source.as_str())
    }

    pub fn exclude_patterns(&self) -> impl Iterator<Item = &str> {
        self.exclude.iter().map(|p| p.source.as_str())
    }
}

fn compile_all(patterns: &[String]) -> Vec<CompiledPattern> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(CompiledPattern::new)
        .collect()
}

/// Test a single pattern against a path.
///
/// ```
/// use promptcat::filter::match_pattern;
///
/// assert!(match_pattern("**/*.go", "a/b/c.go"));
/// assert!(!match_pattern("**/*.go", "a/b/c.txt"));
/// ```
pub fn match_pattern(pattern: &str, path: &str) -> bool {
    CompiledPattern::new(pattern).matches(&to_slash(path))
}

/// Classify a byte sample as binary.
///
/// Counts NUL, low control bytes below 7 (except 4 and 5) and control bytes
/// in `15..=31`. Tab, LF, CR and the rest of `7..=14` are tolerated.
///
/// ```
/// use promptcat::filter::is_binary;
///
/// assert!(!is_binary(b""));
/// assert!(!is_binary(b"fn main() {\n\tprintln!();\r\n}"));
/// assert!(is_binary(&[0u8; 16]));
/// ```
pub fn is_binary(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }

    let suspicious = sample.iter().filter(|&&b| is_suspicious_byte(b)).count();
    suspicious as f64 / sample.len() as f64 > BINARY_THRESHOLD
}

fn is_suspicious_byte(b: u8) -> bool {
    b == 0 || (b < 7 && b != 4 && b != 5) || (15..32).contains(&b)
}

/// Every start offset is tried; occurrences of a multi-segment literal overlap.
fn matches_segment(segment: &str, path: &str) -> bool {
    if segment.is_empty() || segment.len() > path.len() {
        return false;
    }

    let bytes = path.as_bytes();
    (0..=path.len() - segment.len()).any(|idx| {
        let end = idx + segment.len();
        let starts = idx == 0 || bytes[idx - 1] == b'/';
        let ends = end == bytes.len() || bytes[end] == b'/';
        starts && ends && path.is_char_boundary(idx) && path[idx..].starts_with(segment)
    })
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn to_slash(path: &str) -> Cow<'_, str> {
    if std::path::MAIN_SEPARATOR == '\\' && path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_depth_pattern() {
        assert!(match_pattern("**/*.go", "a/b/c.go"));
        assert!(match_pattern("**/*.go", "c.go"));
        assert!(!match_pattern("**/*.go", "a/b/c.txt"));
        assert!(match_pattern("**/b/*.go", "a/b/c.go"));
        assert!(!match_pattern("**/x/*.go", "a/b/c.go"));
    }

    #[test]
    fn test_glob_matches_basename_or_full_path() {
        assert!(match_pattern("*.rs", "src/deep/lib.rs"));
        assert!(match_pattern("src/*.rs", "src/lib.rs"));
        assert!(!match_pattern("src/*.rs", "src/deep/lib.rs"));
        assert!(match_pattern("lib.?s", "src/lib.rs"));
        assert!(match_pattern("[ab].txt", "dir/a.txt"));
        assert!(!match_pattern("[ab].txt", "dir/c.txt"));
    }

    #[test]
    fn test_segment_pattern() {
        assert!(match_pattern(".git", ".git/HEAD"));
        assert!(match_pattern("node_modules", "web/node_modules/react/index.js"));
        assert!(match_pattern("target", "target"));
        assert!(match_pattern("build", "docs/build"));
        assert!(!match_pattern("target", "targets.txt"));
        assert!(!match_pattern("build", "src/rebuild/main.rs"));
        assert!(!match_pattern("git", ".gitignore"));
        assert!(match_pattern("src/gen", "src/gen/out.rs"));
    }

    #[test]
    fn test_segment_pattern_overlapping_occurrences() {
        assert!(match_pattern("a/a", "ba/a/a"));
        assert!(match_pattern("x/x", "x/x/x"));
        assert!(!match_pattern("a/a", "ba/a/ab"));
    }

    #[test]
    fn test_malformed_glob_never_matches() {
        assert!(!match_pattern("[abc", "dir/[abcd"));
        assert!(!match_pattern("**/[", "a/b"));
        let matcher = PatternMatcher::new(Vec::new(), Some(vec!["[oops".into()]));
        assert!(matcher.should_process("a/b.txt"));
    }

    #[test]
    fn test_identical_pattern_always_matches() {
        assert!(match_pattern("weird[name.txt", "weird[name.txt"));
        for path in ["a/b.txt", "x[1].rs", "dir/*star", "plain"] {
            let matcher = PatternMatcher::new(vec![path.to_string()], Some(Vec::new()));
            assert!(matcher.should_process(path), "{path}");
        }
    }

    #[test]
    fn test_include_required_when_present() {
        let matcher = PatternMatcher::new(vec!["*.rs".into(), "*.toml".into()], Some(Vec::new()));
        assert!(matcher.should_process("Cargo.toml"));
        assert!(matcher.should_process("src/lib.rs"));
        assert!(!matcher.should_process("README.md"));
    }

    #[test]
    fn test_excludes_apply_to_included_paths() {
        let matcher = PatternMatcher::new(vec!["*.js".into()], None);
        assert!(matcher.should_process("web/app.js"));
        assert!(!matcher.should_process("web/node_modules/react/index.js"));
    }

    #[test]
    fn test_default_excludes() {
        let matcher = PatternMatcher::new(Vec::new(), None);
        assert!(!matcher.should_process(".git/config"));
        assert!(!matcher.should_process("target/debug/app"));
        assert!(!matcher.should_process("assets/logo.png"));
        assert!(!matcher.should_process("pkg/__pycache__/mod.pyc"));
        assert!(matcher.should_process("src/main.rs"));
        assert_eq!(matcher.exclude_patterns().count(), DEFAULT_EXCLUDES.len());
    }

    #[test]
    fn test_empty_exclude_list_disables_defaults() {
        let matcher = PatternMatcher::new(Vec::new(), Some(Vec::new()));
        assert!(matcher.should_process("target/debug/app"));
        assert!(PatternMatcher::accept_all().should_process(".git/HEAD"));
    }

    #[test]
    fn test_is_binary_empty() {
        assert!(!is_binary(&[]));
    }

    #[test]
    fn test_is_binary_nul_heavy() {
        let mut sample = vec![b'a'; 60];
        sample.extend(std::iter::repeat(0u8).take(40));
        assert!(is_binary(&sample));
    }

    #[test]
    fn test_is_binary_threshold_is_strict() {
        // exactly 30% suspicious is still text
        let mut sample = vec![b'a'; 70];
        sample.extend(std::iter::repeat(0u8).take(30));
        assert!(!is_binary(&sample));
    }

    #[test]
    fn test_is_binary_printable_text() {
        let text = b"Hello, world!\n\tindented\r\nmore text {} [] 0123456789 ~!@#$%^&*()";
        assert!(!is_binary(text));
    }

    #[test]
    fn test_is_binary_tolerated_controls() {
        assert!(!is_binary(&[4u8; 32]));
        assert!(!is_binary(&[5u8; 32]));
        for b in 7u8..=14 {
            assert!(!is_binary(&[b; 32]), "byte {b}");
        }
    }

    #[test]
    fn test_is_binary_counted_controls() {
        for b in [1u8, 2, 3, 6, 15, 27, 31] {
            assert!(is_binary(&[b; 32]), "byte {b}");
        }
    }
}
