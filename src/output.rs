//! Output formatting for promptcat.
//!
//! Renders scanned records as a plain-text prompt: a tree view, a content
//! view with normalized indentation, or both. A JSON document is available
//! for programmatic consumers. Records are always sorted by path before
//! rendering; the order they arrive in never matters.

use serde::Serialize;
use thiserror::Error;

use crate::config::OutputMode;
use crate::record::FileRecord;
use crate::tree;

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("content of {0} was never loaded")]
    ContentNotLoaded(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Glyphs and constants used by the renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    /// Tree glyph for a child that has later siblings.
    pub branch: &'static str,
    /// Tree glyph for the last child.
    pub last_branch: &'static str,
    /// Prefix continuation below a non-last directory.
    pub vertical: &'static str,
    /// Prefix continuation below the last directory.
    pub space: &'static str,
    /// Character of the rule under each file header.
    pub rule: char,
    pub rule_width: usize,
    /// One indentation level in normalized content.
    pub indent_unit: &'static str,
    /// Per-file usage (percent) at which a warning line is printed.
    pub warn_percent: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            branch: "├─",
            last_branch: "└─",
            vertical: "│ ",
            space: "  ",
            rule: '=',
            rule_width: 48,
            indent_unit: "  ",
            warn_percent: 80.0,
        }
    }
}

/// Aggregate token usage across records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenSummary {
    pub total: usize,
    /// Largest limit any record was counted against.
    pub limit: usize,
    pub usage_percent: f64,
}

/// Renders records with a fixed [`RenderStyle`].
///
/// # Examples
///
/// ```
/// use promptcat::config::OutputMode;
/// use promptcat::output::Renderer;
/// use promptcat::record::FileRecord;
///
/// let records = vec![FileRecord::loaded("main.rs", "fn main() {\n}", 13, None)];
/// let output = Renderer::default().render(&records, OutputMode::Files).unwrap();
/// assert!(output.starts_with("\nFile: main.rs\n"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    style: RenderStyle,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Render the sections selected by `mode`.
    pub fn render(&self, records: &[FileRecord], mode: OutputMode) -> Result<String, OutputError> {
        match mode {
            OutputMode::Tree => Ok(self.render_tree(records)),
            OutputMode::Files => self.render_files(records),
            OutputMode::Both => {
                let mut output = self.render_tree(records);
                output.push_str("\nFile Contents:\n");
                output.push_str(&self.render_files(records)?);
                Ok(output)
            }
        }
    }

    pub fn render_tree(&self, records: &[FileRecord]) -> String {
        tree::render_tree(records, &self.style)
    }

    /// Content view: token summary (if any), then one block per file.
    ///
    /// Every record must be loaded.
    pub fn render_files(&self, records: &[FileRecord]) -> Result<String, OutputError> {
        let sorted = sorted(records);
        let mut output = String::new();

        if let Some(summary) = summarize_tokens(records) {
            output.push_str(&format_summary(&summary));
        }

        let rule: String = std::iter::repeat(self.style.rule)
            .take(self.style.rule_width)
            .collect();

        for record in sorted {
            let content = record
                .content()
                .ok_or_else(|| OutputError::ContentNotLoaded(record.path.clone()))?;

            output.push_str(&format!("\nFile: {}\n", record.path));
            output.push_str(&rule);
            output.push('\n');

            if let Some(info) = &record.token_info {
                if info.usage_percent >= self.style.warn_percent {
                    output.push_str(&format!(
                        "⚠️ Token usage: {} ({:.1}% of limit)\n",
                        info.count, info.usage_percent
                    ));
                }
            }

            output.push_str(&normalize(content, self.style.indent_unit));
            output.push('\n');
        }

        Ok(output)
    }
}

/// Render with the default style.
pub fn render(records: &[FileRecord], mode: OutputMode) -> Result<String, OutputError> {
    Renderer::default().render(records, mode)
}

/// Content view with the default style.
pub fn render_files(records: &[FileRecord]) -> Result<String, OutputError> {
    Renderer::default().render_files(records)
}

/// Re-indent source text with two spaces per level.
///
/// Lines ending in `{` or `[` open a level, lines starting with `}` or `]`
/// close one, and any other indented line snaps to half its original width
/// (tabs count as four columns). Trailing whitespace is removed and blank
/// lines are kept empty.
///
/// ```
/// use promptcat::output::normalize_indentation;
///
/// let input = "fn main() {\n\n  let x = 1;   \n}";
/// assert_eq!(normalize_indentation(input), "fn main() {\n\n  let x = 1;\n}");
/// ```
pub fn normalize_indentation(content: &str) -> String {
    normalize(content, RenderStyle::default().indent_unit)
}

fn normalize(content: &str, unit: &str) -> String {
    let mut depth = 0usize;
    let mut lines = Vec::new();

    for line in content.split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            lines.push(String::new());
            continue;
        }

        let width = leading_width(line);
        let text = line.trim();

        if text.ends_with('{') || text.ends_with('[') {
            lines.push(format!("{}{}", unit.repeat(depth), text));
            depth += 1;
        } else if text.starts_with('}') || text.starts_with(']') {
            depth = depth.saturating_sub(1);
            lines.push(format!("{}{}", unit.repeat(depth), text));
        } else {
            if width > 0 {
                depth = width / 2;
            }
            lines.push(format!("{}{}", unit.repeat(depth), text));
        }
    }

    lines.join("\n")
}

/// Columns of leading whitespace; a tab counts as four.
fn leading_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Sum token counts over records that have them.
///
/// Returns `None` when no record carries token information.
pub fn summarize_tokens(records: &[FileRecord]) -> Option<TokenSummary> {
    let mut counted = records.iter().filter_map(|r| r.token_info.as_ref()).peekable();
    counted.peek()?;

    let (total, limit) = counted.fold((0usize, 0usize), |(total, limit), info| {
        (total + info.count, limit.max(info.limit))
    });
    let usage_percent = if limit == 0 {
        0.0
    } else {
        total as f64 / limit as f64 * 100.0
    };

    Some(TokenSummary {
        total,
        limit,
        usage_percent,
    })
}

fn format_summary(summary: &TokenSummary) -> String {
    format!(
        "Token Summary:\nTotal Tokens: {}\nToken Limit: {}\nUsage: {:.1}%\n\n",
        summary.total, summary.limit, summary.usage_percent
    )
}

fn sorted(records: &[FileRecord]) -> Vec<&FileRecord> {
    let mut sorted: Vec<&FileRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    sorted
}

// ============================================================================
// JSON Formatting
// ============================================================================

#[derive(Serialize)]
struct JsonDocument<'a> {
    files: Vec<&'a FileRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<TokenSummary>,
}

/// Pretty-printed JSON with the sorted records and the token summary.
///
/// Unloaded content serializes as `null`.
pub fn render_json(records: &[FileRecord]) -> Result<String, OutputError> {
    let document = JsonDocument {
        files: sorted(records),
        summary: summarize_tokens(records),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenCount;

    fn record(path: &str, content: &str) -> FileRecord {
        FileRecord::loaded(path, content, content.len() as u64, None)
    }

    fn counted(path: &str, content: &str, count: usize, limit: usize) -> FileRecord {
        FileRecord::loaded(
            path,
            content,
            content.len() as u64,
            Some(TokenCount::new(count, limit)),
        )
    }

    #[test]
    fn test_normalize_braces() {
        let input = "fn main() {\nlet x = [\n1,\n]\n}";
        assert_eq!(
            normalize_indentation(input),
            "fn main() {\n  let x = [\n    1,\n  ]\n}"
        );
    }

    #[test]
    fn test_normalize_snaps_to_half_width() {
        let input = "def f():\n    return 1\n\nx = 2";
        // An unindented line keeps the previous depth.
        assert_eq!(
            normalize_indentation(input),
            "def f():\n    return 1\n\n    x = 2"
        );
    }

    #[test]
    fn test_normalize_tabs_and_trailing_whitespace() {
        let input = "a\n\t\tb   \n  \t\nc\r";
        assert_eq!(normalize_indentation(input), "a\n        b\n\n        c");
    }

    #[test]
    fn test_normalize_closing_never_negative() {
        assert_eq!(normalize_indentation("}\n]\nx"), "}\n]\nx");
    }

    #[test]
    fn test_normalize_trailing_newline_kept() {
        assert_eq!(normalize_indentation("x\n"), "x\n");
        assert_eq!(normalize_indentation(""), "");
    }

    #[test]
    fn test_summary() {
        let records = vec![counted("a.txt", "a", 40, 100), counted("b.txt", "b", 50, 100)];
        let summary = summarize_tokens(&records).unwrap();
        assert_eq!(summary.total, 90);
        assert_eq!(summary.limit, 100);
        assert_eq!(format!("{:.1}", summary.usage_percent), "90.0");

        let output = render_files(&records).unwrap();
        assert!(output.starts_with(
            "Token Summary:\nTotal Tokens: 90\nToken Limit: 100\nUsage: 90.0%\n\n"
        ));
        // Neither file reaches 80% of the shared limit on its own.
        assert!(!output.contains("Token usage"));
    }

    #[test]
    fn test_summary_absent_without_tokens() {
        assert!(summarize_tokens(&[record("a.txt", "a")]).is_none());
        assert!(summarize_tokens(&[]).is_none());
    }

    #[test]
    fn test_render_files_exact() {
        let records = vec![record("b.rs", "}"), record("a.rs", "x {\ny\n}")];
        let rule = "=".repeat(48);
        let expected = format!("\nFile: a.rs\n{rule}\nx {{\n  y\n}}\n\nFile: b.rs\n{rule}\n}}\n");
        assert_eq!(render_files(&records).unwrap(), expected);
    }

    #[test]
    fn test_warning_line() {
        let records = vec![counted("big.txt", "text", 85, 100)];
        let output = render_files(&records).unwrap();
        assert!(output.contains("⚠️ Token usage: 85 (85.0% of limit)\n"));

        let records = vec![counted("ok.txt", "text", 79, 100)];
        assert!(!render_files(&records).unwrap().contains("Token usage"));
    }

    #[test]
    fn test_unloaded_content_is_an_error() {
        let records = vec![FileRecord::unloaded("lazy.txt", 3)];
        assert!(matches!(
            render_files(&records),
            Err(OutputError::ContentNotLoaded(path)) if path == "lazy.txt"
        ));
        // The tree view does not need content.
        assert!(render(&records, OutputMode::Tree).is_ok());
    }

    #[test]
    fn test_modes() {
        let records = vec![record("a/b.txt", "hello")];

        let tree = render(&records, OutputMode::Tree).unwrap();
        assert!(tree.starts_with(".\n└─ a\n"));
        assert!(!tree.contains("File:"));

        let files = render(&records, OutputMode::Files).unwrap();
        assert!(files.starts_with("\nFile: a/b.txt\n"));
        assert!(!files.contains("directories"));

        let both = render(&records, OutputMode::Both).unwrap();
        assert_eq!(both, format!("{tree}\nFile Contents:\n{files}"));
    }

    #[test]
    fn test_render_is_order_independent() {
        let forward = vec![record("a.txt", "1"), record("b/c.txt", "2")];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();
        assert_eq!(
            render(&forward, OutputMode::Both).unwrap(),
            render(&reversed, OutputMode::Both).unwrap()
        );
    }

    #[test]
    fn test_custom_style() {
        let renderer = Renderer::new(RenderStyle {
            rule: '-',
            rule_width: 4,
            indent_unit: "\t",
            ..RenderStyle::default()
        });
        let output = renderer
            .render_files(&[record("a.rs", "f {\nx\n}")])
            .unwrap();
        assert_eq!(output, "\nFile: a.rs\n----\nf {\n\tx\n}\n");
    }

    #[test]
    fn test_json_document() {
        let records = vec![
            counted("b.txt", "two", 2, 10),
            FileRecord::unloaded("a.txt", 1),
        ];
        let json: serde_json::Value = serde_json::from_str(&render_json(&records).unwrap()).unwrap();

        assert_eq!(json["files"][0]["path"], "a.txt");
        assert!(json["files"][0]["content"].is_null());
        assert_eq!(json["files"][1]["token_info"]["count"], 2);
        assert_eq!(json["summary"]["total"], 2);
        assert_eq!(json["summary"]["limit"], 10);
    }
}
